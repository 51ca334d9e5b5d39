use std::collections::HashMap;
use std::time::{Duration, Instant};

/// The timers a round can have running. Ties on the same instant fire in
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    /// pre-round 3, 2, 1 overlay
    Countdown,
    /// the per-second drawing timer
    Drawing,
    /// how long a guess stays on screen before the next prompt
    GuessDwell,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    due: Instant,
    period: Option<Duration>,
}

/// Explicit, caller-driven timers. Nothing fires on its own: the owner polls
/// `next_due` with the current instant and handles each expiry in order.
#[derive(Debug, Default)]
pub struct Scheduler {
    timers: HashMap<TimerKind, Entry>,
}

const MIN_PERIOD: Duration = Duration::from_millis(1);

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every `period`, first at `now + period`. Replaces a running timer of the same kind.
    pub fn schedule_repeating(&mut self, kind: TimerKind, period: Duration, now: Instant) {
        let period = period.max(MIN_PERIOD);
        self.timers.insert(
            kind,
            Entry {
                due: now + period,
                period: Some(period),
            },
        );
    }

    /// Fire once at `now + delay`. Replaces a running timer of the same kind.
    pub fn schedule_once(&mut self, kind: TimerKind, delay: Duration, now: Instant) {
        self.timers.insert(
            kind,
            Entry {
                due: now + delay,
                period: None,
            },
        );
    }

    /// Returns whether a timer was actually running. Safe to call repeatedly.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.timers.remove(&kind).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.timers.contains_key(&kind)
    }

    pub fn is_idle(&self) -> bool {
        self.timers.is_empty()
    }

    /// Pops the earliest expiry at or before `now`. Repeating timers are
    /// re-armed one period later, so a late poll yields every missed fire.
    pub fn next_due(&mut self, now: Instant) -> Option<TimerKind> {
        let (kind, entry) = self
            .timers
            .iter()
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(k, e)| (e.due, **k))
            .map(|(k, e)| (*k, *e))?;

        match entry.period {
            Some(period) => {
                if let Some(e) = self.timers.get_mut(&kind) {
                    e.due = entry.due + period;
                }
            }
            None => {
                self.timers.remove(&kind);
            }
        }

        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    #[test]
    fn test_nothing_due_before_period() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_repeating(TimerKind::Drawing, SEC, t0);
        assert_eq!(s.next_due(t0), None);
        assert_eq!(s.next_due(t0 + Duration::from_millis(999)), None);
        assert_eq!(s.next_due(t0 + SEC), Some(TimerKind::Drawing));
        assert_eq!(s.next_due(t0 + SEC), None);
    }

    #[test]
    fn test_repeating_catches_up() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_repeating(TimerKind::Drawing, SEC, t0);
        let mut fired = 0;
        while s.next_due(t0 + Duration::from_millis(3500)).is_some() {
            fired += 1;
        }
        assert_eq!(fired, 3);
        assert!(s.is_scheduled(TimerKind::Drawing));
    }

    #[test]
    fn test_once_fires_once() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_once(TimerKind::GuessDwell, 3 * SEC, t0);
        assert_eq!(s.next_due(t0 + 5 * SEC), Some(TimerKind::GuessDwell));
        assert_eq!(s.next_due(t0 + 10 * SEC), None);
        assert!(!s.is_scheduled(TimerKind::GuessDwell));
    }

    #[test]
    fn test_fires_in_due_order() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_once(TimerKind::GuessDwell, Duration::from_millis(1500), t0);
        s.schedule_repeating(TimerKind::Drawing, SEC, t0);
        let later = t0 + 2 * SEC;
        assert_eq!(s.next_due(later), Some(TimerKind::Drawing));
        assert_eq!(s.next_due(later), Some(TimerKind::GuessDwell));
        assert_eq!(s.next_due(later), Some(TimerKind::Drawing));
        assert_eq!(s.next_due(later), None);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_repeating(TimerKind::Countdown, SEC, t0);
        assert!(s.cancel(TimerKind::Countdown));
        assert!(!s.cancel(TimerKind::Countdown));
        assert_eq!(s.next_due(t0 + 5 * SEC), None);
    }

    #[test]
    fn test_reschedule_replaces() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_once(TimerKind::GuessDwell, SEC, t0);
        s.schedule_once(TimerKind::GuessDwell, 5 * SEC, t0);
        assert_eq!(s.next_due(t0 + 2 * SEC), None);
        assert_eq!(s.next_due(t0 + 5 * SEC), Some(TimerKind::GuessDwell));
    }

    #[test]
    fn test_cancel_all() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_repeating(TimerKind::Countdown, SEC, t0);
        s.schedule_repeating(TimerKind::Drawing, SEC, t0);
        s.cancel_all();
        assert!(s.is_idle());
    }
}
