//! One-row top bar with the collective name, now playing and volume.
//!
//! Not focusable.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use colectivo_proto::protocol::PlaybackStatus;

use crate::{
    app_state::AppState,
    theme::{accent_color, C_ACCENT, C_CONNECTING, C_ERROR, C_MUTED, C_PLAYING, C_SECONDARY},
};

pub const TITLE: &str = "colectivo";
pub const TAGLINE: &str = "artes, oficios y radio comunitaria";

pub fn draw(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(48)])
        .split(area);

    let left = Line::from(vec![
        Span::styled(
            format!(" {} ", TITLE),
            Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(TAGLINE, Style::default().fg(C_SECONDARY)),
    ]);
    frame.render_widget(Paragraph::new(left), cols[0]);
    frame.render_widget(
        Paragraph::new(now_playing_line(state).right_aligned()),
        cols[1],
    );
}

fn now_playing_line(state: &AppState) -> Line<'static> {
    let Some(station) = state.current_station() else {
        return Line::from(Span::styled("radio apagada ", Style::default().fg(C_MUTED)));
    };
    let (icon, color) = match state.radio.status {
        PlaybackStatus::Idle => ("■", C_MUTED),
        PlaybackStatus::Loading => ("◌", C_CONNECTING),
        PlaybackStatus::Playing => ("▶", C_PLAYING),
        PlaybackStatus::Errored => ("✗", C_ERROR),
    };
    Line::from(vec![
        Span::styled(format!("{} ", icon), Style::default().fg(color)),
        Span::styled(
            station.name.clone(),
            Style::default().fg(accent_color(&station.accent)),
        ),
        Span::styled(
            format!("  vol {}% ", state.radio.playback.volume),
            Style::default().fg(C_SECONDARY),
        ),
    ])
}
