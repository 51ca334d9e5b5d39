pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use scribble::{
    round::{RoundView, Verdict},
    session::Session,
};
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
/// Remaining seconds at which the timer turns red
const HURRY_SECS: u32 = 10;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn verdict_style(verdict: Verdict) -> Style {
    match verdict {
        Verdict::Correct => bold().fg(Color::Green),
        Verdict::Incorrect => bold().fg(Color::Red),
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match (self.state(), self.game.round()) {
            (AppState::Playing, Some(round)) => render_playing(&round.view(), area, buf),
            _ => render_game_over(self.game.session(), area, buf),
        }
    }
}

pub fn render_playing(view: &RoundView, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // time and score
            Constraint::Length(1),
            Constraint::Length(1), // prompt
            Constraint::Length(1),
            Constraint::Length(1), // last guess
            Constraint::Min(1),    // countdown or notices
            Constraint::Length(1), // help
        ])
        .split(area);

    let status = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    let timer_style = if view.started && view.remaining_seconds <= HURRY_SECS {
        bold().fg(Color::Red)
    } else {
        bold()
    };
    Paragraph::new(Span::styled(
        format!("Time: {}s", view.remaining_seconds),
        timer_style,
    ))
    .alignment(Alignment::Left)
    .render(status[0], buf);

    Paragraph::new(Span::styled(format!("Score: {}", view.score), bold()))
        .alignment(Alignment::Right)
        .render(status[1], buf);

    let prompt_line = match (&view.prompt, view.countdown) {
        (_, Some(_)) => Line::from(Span::styled("Get ready...", dim())),
        (Some(prompt), None) => Line::from(vec![
            Span::raw("Draw this: "),
            Span::styled(prompt.clone(), bold().fg(Color::Magenta)),
        ]),
        (None, None) => Line::from(Span::styled(
            "Press (s) to start drawing",
            dim().add_modifier(Modifier::ITALIC),
        )),
    };
    Paragraph::new(prompt_line)
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    let guess_line = match (&view.last_guess, view.guessing) {
        (Some(guess), _) => Some(Line::from(vec![
            Span::raw("AI's Guess: "),
            Span::styled(guess.text.clone(), verdict_style(guess.verdict)),
        ])),
        (None, true) => Some(Line::from(vec![
            Span::raw("AI's Guess: "),
            Span::styled("...", dim()),
        ])),
        (None, false) => None,
    };
    if let Some(line) = guess_line {
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }

    if let Some(value) = view.countdown {
        render_countdown(value, chunks[5], buf);
    } else if let Some(ref notice) = view.camera_notice {
        Paragraph::new(Span::styled(notice.clone(), Style::default().fg(Color::Red)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[5], buf);
    } else if view.prompt.is_some() && !view.guessing {
        Paragraph::new(Span::styled(
            "Hold your drawing up to the camera, then ask the AI",
            dim(),
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[5], buf);
    }

    render_help(&playing_help(view), chunks[6], buf);
}

fn playing_help(view: &RoundView) -> Vec<(&'static str, &'static str)> {
    if !view.started {
        return vec![("(s)tart", "s"), ("(esc)ape", "esc")];
    }
    let guess = if view.guessing {
        ("Guessing...", "...")
    } else {
        ("(g)uess", "g")
    };
    vec![guess, ("(e)nd", "e"), ("(esc)ape", "esc")]
}

fn render_help(items: &[(&str, &str)], area: Rect, buf: &mut Buffer) {
    let full = items
        .iter()
        .map(|(long, _)| *long)
        .collect::<Vec<_>>()
        .join(" / ");
    let text = if full.width() <= area.width as usize {
        full
    } else {
        items
            .iter()
            .map(|(_, short)| *short)
            .collect::<Vec<_>>()
            .join(" ")
    };

    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(area, buf);
}

fn render_countdown(value: u32, area: Rect, buf: &mut Buffer) {
    let overlay = centered(area, 15, 5);
    Clear.render(overlay, buf);
    Paragraph::new(Span::styled(
        value.to_string(),
        bold().fg(Color::Yellow),
    ))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Get ready")
            .title_alignment(Alignment::Center),
    )
    .render(overlay, buf);
}

pub fn render_game_over(session: &Session, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // headline
            Constraint::Length(1), // final score
            Constraint::Length(1),
            Constraint::Min(1), // guess log
            Constraint::Length(1), // help
        ])
        .split(area);

    Paragraph::new(Span::styled("Time's Up!", bold().fg(Color::Yellow)))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!("Your Final Score: {}", session.score()),
        bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let lines: Vec<Line> = if session.results().is_empty() {
        vec![Line::from(Span::styled("No guesses this time.", dim()))]
    } else {
        session
            .results()
            .iter()
            .enumerate()
            .map(|(idx, result)| {
                Line::from(vec![
                    Span::styled(format!("{:>2}. ", idx + 1), dim()),
                    Span::raw(format!("{} ", result.prompt)),
                    Span::styled("-> ", dim()),
                    Span::styled(
                        result.guess.clone(),
                        verdict_style(result.is_correct.into()),
                    ),
                ])
            })
            .collect()
    };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    render_help(&[("(r) play again", "r"), ("(esc)ape", "esc")], chunks[4], buf);
}

/// Rectangle of at most `width` x `height` centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
