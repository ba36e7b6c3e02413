use ansi_to_tui::IntoText;
use chrono::Local;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::app::{AppState, InputMode, ViewMode};
use crate::layout::inset;
use crate::store::LogEntry;
use crate::theme::Theme;

const TIMESTAMP_FORMAT: &str = "%b %e %H:%M:%S";
const TIMESTAMP_WIDTH: usize = 15;

/// Draw the entire UI
pub fn draw(frame: &mut Frame, state: &AppState) {
    let area = frame.area();
    let log_area = state.layout.log_pane().intersection(area);
    let detail_area = state.layout.detail_pane().intersection(area);
    let query_area = state.layout.query_line().intersection(area);

    draw_log_pane(frame, state, log_area);
    draw_detail_pane(frame, state, detail_area);
    draw_query_line(frame, state, query_area);

    // Draw help overlay if active
    if state.show_help {
        draw_help_overlay(frame, &state.theme);
    }
}

fn pane_block<'a>(title: String, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border))
        .title(Span::styled(title, Style::default().fg(theme.title)))
}

/// Draw the list of entries with the match count and scroll percentage
/// on the bottom border
fn draw_log_pane(frame: &mut Frame, state: &AppState, area: Rect) {
    if area.width < 2 || area.height < 2 {
        return;
    }
    let theme = &state.theme;

    let title = match state.view_mode {
        ViewMode::All => " log ".to_string(),
        ViewMode::MatchesOnly => " log [matches] ".to_string(),
    };
    let status = Style::default().fg(theme.status);
    let mut block = pane_block(title, theme)
        .title_bottom(Line::styled(format!(" {} ", state.matches.status_text()), status));
    if let Some(pct) = state.percent() {
        block = block.title_bottom(Line::styled(format!(" {:02}% ", pct), status).right_aligned());
    }

    let inner = inset(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    if state.store.is_empty() {
        let msg = Paragraph::new("No entries").style(Style::default().fg(theme.empty_state));
        frame.render_widget(msg, inner);
        return;
    }
    if state.active_len() == 0 {
        let msg = Paragraph::new("No entries match the current query")
            .style(Style::default().fg(theme.warning_message));
        frame.render_widget(msg, inner);
        return;
    }

    let width = inner.width as usize;
    let annotate = state.view_mode == ViewMode::All;
    let lines: Vec<Line> = state
        .visible_rows()
        .into_iter()
        .filter_map(|(is_cursor, idx)| {
            let entry = state.store.get(idx)?;
            let marked = annotate && state.matches.contains(idx);
            Some(log_row(entry, marked, is_cursor, width, theme))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

/// One row of the log pane: marker, timestamp, level code and message
fn log_row(entry: &LogEntry, marked: bool, is_cursor: bool, width: usize, theme: &Theme) -> Line<'static> {
    let base = if is_cursor {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };

    let mut spans = Vec::with_capacity(8);

    // The marker column is never reversed
    spans.push(Span::styled(
        if marked { "* " } else { "  " },
        Style::default().fg(theme.match_marker).add_modifier(Modifier::BOLD),
    ));

    let timestamp = entry
        .timestamp
        .map(|ts| ts.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| " ".repeat(TIMESTAMP_WIDTH));
    spans.push(Span::styled(format!("{} ", timestamp), base.fg(theme.timestamp)));

    let (code, color) = theme.level_code(&entry.level);
    spans.push(Span::styled(code, color.map_or(base, |c| base.fg(c))));
    spans.push(Span::styled(" ", base));

    let message = entry.message.replace(['\n', '\r'], " ");
    if entry.has_ansi() {
        match message.as_bytes().into_text() {
            Ok(text) => {
                for line in text.lines {
                    spans.extend(line.spans.into_iter().map(|span| span.patch_style(base)));
                }
            }
            Err(_) => spans.push(Span::styled(message, base)),
        }
    } else {
        spans.push(Span::styled(message, base));
    }

    let mut line = Line::from(spans);
    let used = line.width();
    if is_cursor && used < width {
        line.push_span(Span::styled(" ".repeat(width - used), base));
    }
    line
}

/// Draw the pretty-printed record of the selected entry
fn draw_detail_pane(frame: &mut Frame, state: &AppState, area: Rect) {
    if area.width < 2 || area.height < 2 {
        return;
    }
    let theme = &state.theme;

    let mut block = pane_block(" json ".to_string(), theme);
    if let Some(msg) = &state.status_message {
        block = block.title_bottom(
            Line::styled(format!(" {} ", msg), Style::default().fg(theme.warning_message)).right_aligned(),
        );
    }

    let text = state.detail_text().unwrap_or_default();
    let scroll = u16::try_from(state.detail_scroll).unwrap_or(u16::MAX);
    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(theme.json))
        .scroll((scroll, 0))
        .block(block);
    frame.render_widget(paragraph, area);
}

/// Draw the validity glyph followed by the query text (or the live editor)
fn draw_query_line(frame: &mut Frame, state: &AppState, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let theme = &state.theme;
    let validity = state.editor.validity();
    let glyph_color = match validity {
        crate::editor::Validity::Unset => theme.query_unset,
        crate::editor::Validity::Valid => theme.query_valid,
        crate::editor::Validity::Invalid => theme.query_invalid,
    };
    let glyph = Span::styled(
        format!("{} ", validity.glyph()),
        Style::default().fg(glyph_color).add_modifier(Modifier::BOLD),
    );

    match state.mode {
        InputMode::Editing => {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Length(2), // glyph
                    Constraint::Min(1),    // textarea
                ])
                .split(area);

            frame.render_widget(Paragraph::new(Line::from(glyph)), chunks[0]);
            frame.render_widget(state.editor.textarea(), chunks[1]);
        }
        InputMode::Navigating => {
            let line = Line::from(vec![glyph, Span::raw(state.editor.text())]);
            frame.render_widget(Paragraph::new(line), area);
        }
    }
}

/// Draw the help overlay
fn draw_help_overlay(frame: &mut Frame, theme: &Theme) {
    let area = frame.area();

    // Center the help box
    let width = 52.min(area.width.saturating_sub(4));
    let height = 24.min(area.height.saturating_sub(2));
    let x = (area.width - width) / 2;
    let y = (area.height - height) / 2;
    let help_area = Rect::new(x, y, width, height);

    // Clear background
    frame.render_widget(Clear, help_area);

    let help_text = vec![
        Line::from(Span::styled("Keyboard Shortcuts", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  j/k, ↑/↓     Next/previous entry"),
        Line::from("  J/K          Page down/up"),
        Line::from("  g/G          Go to first/last entry"),
        Line::from("  h/l          Shrink/grow log pane"),
        Line::from("  d/u          Scroll record down/up"),
        Line::from(""),
        Line::from("Query:"),
        Line::from("  / or :       Edit query"),
        Line::from("  Enter/Esc    Apply/cancel while editing"),
        Line::from("  Ctrl+u       Clear query text"),
        Line::from("  n/N          Next/previous match"),
        Line::from("  f            Toggle matches-only view"),
        Line::from(""),
        Line::from("Other:"),
        Line::from("  y            Copy record to clipboard"),
        Line::from("  ?            Toggle this help"),
        Line::from("  q, Ctrl+c    Quit"),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.help_border))
        .style(Style::default().bg(theme.help_bg));

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, help_area);
}
