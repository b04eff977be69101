use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use crate::app::{App, AppState};
use crate::storage::StorageBackend;
use crate::timer::Clock;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
// words shown ahead of the cursor
const LOOKAHEAD: usize = 30;
// already-typed words kept on screen
const LOOKBEHIND: usize = 5;

impl<C: Clock, B: StorageBackend> Widget for &App<C, B> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Typing => render_typing(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn render_typing<C: Clock, B: StorageBackend>(app: &App<C, B>, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let underlined_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::UNDERLINED);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    let mut timer_text = format!("{:.1}", app.timer.remaining_time().as_secs_f64());
    if app.is_paused() {
        timer_text.push_str("  (paused)");
    }
    Paragraph::new(Span::styled(timer_text, dim_bold_style))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let session = &app.session;
    let current = session.current_index();
    let mut spans = Vec::new();

    for (idx, word) in session
        .words()
        .iter()
        .enumerate()
        .skip(current.saturating_sub(LOOKBEHIND))
        .take(LOOKBEHIND + LOOKAHEAD)
    {
        let span = if let Some(response) = session.responses().get(&idx) {
            let style = if response.correct {
                green_bold_style
            } else {
                red_bold_style
            };
            Span::styled(word.clone(), style)
        } else if idx == current {
            let style = if session.is_on_track() {
                underlined_style
            } else {
                underlined_style.fg(Color::Red)
            };
            let shown = if session.input().is_empty() {
                word.clone()
            } else {
                session.input().to_string()
            };
            Span::styled(shown, style)
        } else {
            Span::styled(word.clone(), dim_bold_style)
        };
        spans.push(span);
        spans.push(Span::raw(" "));
    }

    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        "(tab) pause  (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);
}

fn render_results<C: Clock, B: StorageBackend>(app: &App<C, B>, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    if let Some(result) = &app.last_result {
        let summary = format!(
            "{} wpm   {}% acc   {}/{} words",
            result.wpm, result.accuracy, result.words_correct, result.words_attempted
        );
        Paragraph::new(Span::styled(summary, bold_style.fg(Color::Magenta)))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        let keystrokes = format!(
            "{} keystrokes in {:.0}s",
            result.characters_typed, result.duration_secs
        );
        Paragraph::new(Span::styled(keystrokes, italic_style))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
    }

    if let Some(best) = app.best_wpm() {
        Paragraph::new(Span::styled(format!("best: {best} wpm"), italic_style))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }

    Paragraph::new(Span::styled("(n)ew   (esc)ape", italic_style))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);
}
