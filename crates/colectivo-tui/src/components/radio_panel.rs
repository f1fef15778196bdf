//! RadioPanel component, right pane: station list, program info, volume.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use colectivo_proto::protocol::{LiveState, PlaybackStatus, RadioCommand, RadioStation};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        accent_color, style_default, style_secondary, C_BADGE_LIVE, C_BADGE_RECORDED,
        C_CONNECTING, C_ERROR, C_MUTED, C_PLAYING, C_SELECTION_BG, C_TAG,
    },
    widgets::pane_chrome::{pane_chrome, Badge},
};

const VOLUME_STEP: i32 = 5;

pub struct RadioPanel {
    cursor: usize,
    /// Station the controller was on at the last draw; the cursor follows
    /// it when it moves on its own (n/p, auto-advance).
    followed: Option<usize>,
    list_state: ListState,
}

impl RadioPanel {
    pub fn new() -> Self {
        Self {
            cursor: 0,
            followed: None,
            list_state: ListState::default(),
        }
    }

    fn follow_current(&mut self, state: &AppState) {
        let current = state.radio.current_station;
        if self.followed != Some(current) {
            self.followed = Some(current);
            self.cursor = current;
        }
        let n = state.radio.stations.len();
        if n > 0 && self.cursor >= n {
            self.cursor = n - 1;
        }
    }

    fn status_badge(status: PlaybackStatus) -> Option<Badge<'static>> {
        match status {
            PlaybackStatus::Idle => None,
            PlaybackStatus::Loading => Some(Badge {
                text: "CARGANDO",
                color: C_CONNECTING,
            }),
            PlaybackStatus::Playing => Some(Badge {
                text: "SONANDO",
                color: C_PLAYING,
            }),
            PlaybackStatus::Errored => Some(Badge {
                text: "ERROR",
                color: C_ERROR,
            }),
        }
    }

    fn render_item(station: &RadioStation, is_current: bool, is_cursor: bool) -> ListItem<'static> {
        let accent = accent_color(&station.accent);
        let badge_color = match station.live_state {
            LiveState::Live => C_BADGE_LIVE,
            LiveState::Recorded => C_BADGE_RECORDED,
        };
        let marker = if is_current { "▶ " } else { "  " };
        let mut name_style = Style::default().fg(accent);
        if is_current {
            name_style = name_style.add_modifier(Modifier::BOLD);
        }
        let line = Line::from(vec![
            Span::styled(marker, Style::default().fg(accent)),
            Span::styled(station.name.clone(), name_style),
            Span::raw("  "),
            Span::styled(
                station.live_state.badge_label(),
                Style::default().fg(badge_color),
            ),
            Span::styled(format!("  {}", station.genre), Style::default().fg(C_TAG)),
            Span::styled(format!("  {} oyentes", station.listeners), style_secondary()),
        ]);
        let item = ListItem::new(line);
        if is_cursor {
            item.style(Style::default().bg(C_SELECTION_BG))
        } else {
            item
        }
    }

    fn detail_lines(state: &AppState) -> Vec<Line<'static>> {
        let Some(station) = state.current_station() else {
            return Vec::new();
        };
        let playback = &state.radio.playback;
        let status = match state.radio.status {
            PlaybackStatus::Idle => Span::styled("En pausa", Style::default().fg(C_MUTED)),
            PlaybackStatus::Loading => {
                Span::styled("Conectando…", Style::default().fg(C_CONNECTING))
            }
            PlaybackStatus::Playing => Span::styled("Sonando", Style::default().fg(C_PLAYING)),
            PlaybackStatus::Errored => Span::styled(
                playback
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "Error".to_string()),
                Style::default().fg(C_ERROR),
            ),
        };
        vec![
            Line::from(Span::styled(
                station.name.clone(),
                Style::default()
                    .fg(accent_color(&station.accent))
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(station.description.clone(), style_default())),
            Line::from(vec![
                Span::styled("Ahora: ", style_secondary()),
                Span::styled(station.current_program.clone(), style_default()),
            ]),
            Line::from(vec![
                Span::styled("Después: ", style_secondary()),
                Span::styled(station.next_program.clone(), style_default()),
            ]),
            Line::from(status),
            volume_line(playback.volume),
        ]
    }
}

impl Default for RadioPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn volume_line(volume: u8) -> Line<'static> {
    const CELLS: usize = 20;
    let filled = (volume as usize * CELLS + 50) / 100;
    Line::from(vec![
        Span::styled("vol ", style_secondary()),
        Span::styled("█".repeat(filled), Style::default().fg(C_PLAYING)),
        Span::styled("░".repeat(CELLS - filled), Style::default().fg(C_MUTED)),
        Span::styled(format!(" {:>3}%", volume), style_default()),
    ])
}

impl Component for RadioPanel {
    fn id(&self) -> ComponentId {
        ComponentId::RadioPanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }
        let n = state.radio.stations.len();
        let volume = state.radio.playback.volume as i32;
        match key.code {
            KeyCode::Up | KeyCode::Char('k') if n > 0 => {
                self.cursor = (self.cursor + n - 1) % n;
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') if n > 0 => {
                self.cursor = (self.cursor + 1) % n;
                Vec::new()
            }
            KeyCode::Enter if n > 0 => vec![Action::SendCommand(RadioCommand::Select {
                station_idx: self.cursor,
            })],
            KeyCode::Char(' ') => vec![Action::SendCommand(RadioCommand::Toggle)],
            KeyCode::Char('n') => vec![Action::SendCommand(RadioCommand::Next)],
            KeyCode::Char('p') => vec![Action::SendCommand(RadioCommand::Prev)],
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Right => {
                vec![Action::SendCommand(RadioCommand::Volume {
                    value: volume + VOLUME_STEP,
                })]
            }
            KeyCode::Char('-') | KeyCode::Left => vec![Action::SendCommand(RadioCommand::Volume {
                value: volume - VOLUME_STEP,
            })],
            KeyCode::Char('q') => vec![Action::Quit],
            _ => Vec::new(),
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        self.follow_current(state);
        let block = pane_chrome("radio", focused, Self::status_badge(state.radio.status));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if state.radio.stations.is_empty() {
            let msg = if state.connected {
                "  sin estaciones"
            } else {
                "  iniciando la radio…"
            };
            frame.render_widget(
                Paragraph::new(Span::styled(msg, Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(7)])
            .split(inner);

        let items: Vec<ListItem> = state
            .radio
            .stations
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Self::render_item(s, i == state.radio.current_station, focused && i == self.cursor)
            })
            .collect();
        self.list_state.select(Some(self.cursor));
        frame.render_stateful_widget(List::new(items), rows[0], &mut self.list_state);

        frame.render_widget(
            Paragraph::new(Self::detail_lines(state)).wrap(Wrap { trim: true }),
            rows[1],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colectivo_proto::catalog::builtin_stations;
    use colectivo_proto::config::LinksConfig;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn state() -> AppState {
        let mut state = AppState::new(LinksConfig::default());
        state.radio.stations = builtin_stations();
        state.radio.playback.volume = 70;
        state
    }

    #[test]
    fn test_cursor_wraps_and_enter_selects() {
        let state = state();
        let mut panel = RadioPanel::new();
        panel.handle_key(key(KeyCode::Up), &state);
        assert_eq!(panel.cursor, state.radio.stations.len() - 1);
        let actions = panel.handle_key(key(KeyCode::Enter), &state);
        assert!(matches!(
            actions.as_slice(),
            [Action::SendCommand(RadioCommand::Select { station_idx })]
                if *station_idx == state.radio.stations.len() - 1
        ));
    }

    #[test]
    fn test_volume_keys_step_from_current() {
        let state = state();
        let mut panel = RadioPanel::new();
        let actions = panel.handle_key(key(KeyCode::Char('+')), &state);
        assert!(matches!(
            actions.as_slice(),
            [Action::SendCommand(RadioCommand::Volume { value: 75 })]
        ));
        let actions = panel.handle_key(key(KeyCode::Char('-')), &state);
        assert!(matches!(
            actions.as_slice(),
            [Action::SendCommand(RadioCommand::Volume { value: 65 })]
        ));
    }

    #[test]
    fn test_cursor_follows_controller() {
        let mut state = state();
        let mut panel = RadioPanel::new();
        panel.follow_current(&state);
        state.radio.current_station = 2;
        panel.follow_current(&state);
        assert_eq!(panel.cursor, 2);
    }

    #[test]
    fn test_volume_bar() {
        let line = volume_line(50);
        let bar: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(bar.contains(&"█".repeat(10)));
        assert!(bar.ends_with(" 50%"));
    }
}
