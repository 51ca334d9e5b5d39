use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera access denied: {0}")]
    AccessDenied(String),
    #[error("no camera frame at {}", .0.display())]
    NotFound(PathBuf),
    #[error("camera is not open")]
    NotOpen,
    #[error("camera returned an empty frame")]
    EmptyFrame,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// One still image taken from the live feed
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
}

impl Frame {
    pub fn new(bytes: Vec<u8>, media_type: &'static str) -> Self {
        Self { bytes, media_type }
    }
}

/// A video source the round can take stills from
pub trait Camera {
    /// Start the stream. Called once when a round is set up.
    fn open(&mut self) -> Result<(), CameraError>;
    fn capture(&mut self) -> Result<Frame, CameraError>;
    /// Stop the stream. Called exactly once by [`CameraGuard`].
    fn release(&mut self);
}

/// Reads the most recent snapshot an external capture tool keeps writing to
/// `path` (e.g. `ffmpeg -f v4l2 -i /dev/video0 -update 1 -r 2 frame.jpg`).
#[derive(Debug, Clone)]
pub struct SnapshotCamera {
    path: PathBuf,
    open: bool,
}

impl SnapshotCamera {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            open: false,
        }
    }
}

impl Camera for SnapshotCamera {
    fn open(&mut self) -> Result<(), CameraError> {
        match fs::File::open(&self.path) {
            Ok(_) => {
                info!("camera opened at {}", self.path.display());
                self.open = true;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(CameraError::NotFound(self.path.clone()))
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                Err(CameraError::AccessDenied(self.path.display().to_string()))
            }
            Err(e) => Err(CameraError::Io(e)),
        }
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        if !self.open {
            return Err(CameraError::NotOpen);
        }
        let bytes = fs::read(&self.path)?;
        if bytes.is_empty() {
            return Err(CameraError::EmptyFrame);
        }
        Ok(Frame::new(bytes, media_type_for(&self.path)))
    }

    fn release(&mut self) {
        if self.open {
            debug!("camera released at {}", self.path.display());
        }
        self.open = false;
    }
}

/// Serves the same in-memory frame on every capture
#[derive(Debug, Clone)]
pub struct StillCamera {
    frame: Frame,
    open: bool,
}

impl StillCamera {
    pub fn new(frame: Frame) -> Self {
        Self { frame, open: false }
    }
}

impl Camera for StillCamera {
    fn open(&mut self) -> Result<(), CameraError> {
        self.open = true;
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        if !self.open {
            return Err(CameraError::NotOpen);
        }
        Ok(self.frame.clone())
    }

    fn release(&mut self) {
        self.open = false;
    }
}

/// A camera that was never configured; opening it is refused
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCamera;

impl Camera for NoCamera {
    fn open(&mut self) -> Result<(), CameraError> {
        Err(CameraError::AccessDenied("no camera configured".to_string()))
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        Err(CameraError::NotOpen)
    }

    fn release(&mut self) {}
}

/// Scoped ownership of an opened camera; releases it when dropped
pub struct CameraGuard {
    camera: Box<dyn Camera>,
}

impl CameraGuard {
    pub fn acquire(mut camera: Box<dyn Camera>) -> Result<Self, CameraError> {
        camera.open()?;
        Ok(Self { camera })
    }

    pub fn capture(&mut self) -> Result<Frame, CameraError> {
        self.camera.capture()
    }
}

impl Drop for CameraGuard {
    fn drop(&mut self) {
        self.camera.release();
    }
}

impl std::fmt::Debug for CameraGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraGuard").finish_non_exhaustive()
    }
}

fn media_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}
