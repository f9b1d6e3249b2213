use crate::core::PlayerCore;
use crate::media::MediaWidget;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use std::time::Duration;

const APP_TITLE_WITH_VERSION: &str = "tunebox v0.1.0  ";

#[derive(Clone, Copy)]
struct Palette {
    bg: Color,
    panel_bg: Color,
    panel_alt_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    selected_bg: Color,
}

const PALETTE: Palette = Palette {
    bg: Color::Rgb(34, 21, 44),
    panel_bg: Color::Rgb(51, 29, 68),
    panel_alt_bg: Color::Rgb(66, 38, 86),
    border: Color::Rgb(255, 116, 164),
    text: Color::Rgb(255, 233, 250),
    muted: Color::Rgb(224, 173, 219),
    accent: Color::Rgb(159, 110, 163),
    alert: Color::Rgb(255, 199, 150),
    selected_bg: Color::Rgb(90, 49, 114),
};

pub fn playlist_rect(area: Rect) -> Rect {
    let [_, body, _] = main_layout(area);
    let [playlist, _] = body_layout(body);
    playlist
}

fn main_layout(area: Rect) -> [Rect; 3] {
    Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(8),
        Constraint::Length(3),
    ])
    .areas(area)
}

fn body_layout(area: Rect) -> [Rect; 2] {
    Layout::horizontal([Constraint::Percentage(66), Constraint::Percentage(34)]).areas(area)
}

pub fn draw<W: MediaWidget>(
    frame: &mut Frame,
    core: &PlayerCore<W>,
    command_buffer: &str,
    command_mode: bool,
) {
    let colors = PALETTE;
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );

    let [header_area, body_area, footer_area] = main_layout(frame.area());
    let entries = core.entries();

    let transport = if core.is_playing() { "Playing" } else { "Paused" };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            APP_TITLE_WITH_VERSION,
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("Tracks {}", entries.len()),
            Style::default().fg(colors.text),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(transport, Style::default().fg(colors.alert)),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(
            format!("Volume {}%", (core.volume() * 100.0).round() as u16),
            Style::default().fg(colors.muted),
        ),
    ]))
    .block(panel_block("Status", colors.panel_bg, colors.text, colors.border));
    frame.render_widget(header, header_area);

    let [playlist_area, info_area] = body_layout(body_area);
    let cursor = core.cursor();
    let items: Vec<ListItem> = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let marker = if cursor == Some(idx) { "  > " } else { "    " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(colors.muted)),
                Span::styled(entry.name.as_str(), Style::default().fg(colors.text)),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select((!entries.is_empty()).then_some(core.selected));

    let list = List::new(items)
        .block(panel_block(
            "Playlist",
            colors.panel_bg,
            colors.text,
            colors.border,
        ))
        .highlight_style(
            Style::default()
                .bg(colors.selected_bg)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("-> ");
    frame.render_stateful_widget(list, playlist_area, &mut state);

    let now_playing = cursor.and_then(|idx| entries.get(idx));
    let position = cursor
        .map(|idx| format!("{}/{}", idx + 1, entries.len()))
        .unwrap_or_else(|| format!("-/{}", entries.len()));
    let info_text = vec![
        Line::from(Span::styled(
            "Now Playing:",
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            now_playing.map_or("-", |entry| entry.name.as_str()),
            Style::default().fg(colors.text).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Position  {position}"),
            Style::default().fg(colors.alert),
        )),
        Line::from(Span::styled(
            format!(
                "Time      {}",
                progress_label(core.widget().position(), core.widget().duration())
            ),
            Style::default().fg(colors.alert),
        )),
        Line::from(Span::styled(
            format!("Output    {}", output_state(core.widget())),
            Style::default().fg(colors.muted),
        )),
        Line::from(Span::styled(
            format!(
                "Track id  {}",
                now_playing.map_or_else(|| String::from("-"), |entry| entry.id.to_string())
            ),
            Style::default().fg(colors.muted),
        )),
        Line::from(Span::styled(
            format!(
                "Device    {}",
                core.widget().output_name().unwrap_or_else(|| String::from("-"))
            ),
            Style::default().fg(colors.muted),
        )),
    ];
    let info_block = Paragraph::new(info_text)
        .block(panel_block(
            "Now Playing",
            colors.panel_alt_bg,
            colors.text,
            colors.border,
        ))
        .wrap(Wrap { trim: true });
    frame.render_widget(info_block, info_area);

    let footer_line = if command_mode {
        Line::from(vec![
            Span::styled(":", Style::default().fg(colors.accent)),
            Span::styled(command_buffer, Style::default().fg(colors.text)),
        ])
    } else {
        Line::from(vec![
            Span::styled(
                "Keys: Enter select, Space play/pause, n next, b previous, +/- volume, : command, Ctrl+C quit",
                Style::default().fg(colors.muted),
            ),
            Span::styled("  |  ", Style::default().fg(colors.muted)),
            Span::styled(core.status.as_str(), Style::default().fg(colors.text)),
        ])
    };
    let footer = Paragraph::new(footer_line).block(panel_block(
        "Message",
        colors.panel_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(footer, footer_area);
}

fn format_clock(time: Duration) -> String {
    let secs = time.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// `elapsed / total`, with `--:--` standing in for an unknown length.
fn progress_label(position: Option<Duration>, duration: Option<Duration>) -> String {
    match (position, duration) {
        (None, _) => String::from("-"),
        (Some(position), Some(duration)) => {
            format!("{} / {}", format_clock(position.min(duration)), format_clock(duration))
        }
        (Some(position), None) => format!("{} / --:--", format_clock(position)),
    }
}

fn output_state<W: MediaWidget>(widget: &W) -> &'static str {
    if !widget.has_source() {
        "idle"
    } else if widget.is_paused() {
        "paused"
    } else {
        "playing"
    }
}

fn panel_block(title: &str, bg: Color, fg: Color, border: Color) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(fg).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(bg))
}
