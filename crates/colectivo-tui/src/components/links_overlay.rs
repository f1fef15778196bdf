//! LinksOverlay component: centered popup with the contact and donation
//! links.  Number keys copy a link to the clipboard.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use colectivo_proto::links::{handoff_link, method_link, LinkMethod, PLACEHOLDER};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_MUTED, C_PANEL_BORDER_FOCUSED, C_PRIMARY, C_SECONDARY, C_TAG},
};

pub struct LinksOverlay;

impl LinksOverlay {
    pub fn new() -> Self {
        Self
    }

    /// Every link in display order.  WhatsApp carries the visitor's last
    /// question so the human picks up where the bot left off.
    pub fn entries(state: &AppState) -> Vec<(LinkMethod, String)> {
        LinkMethod::ALL
            .iter()
            .map(|&m| {
                let url = match m {
                    LinkMethod::WhatsApp => {
                        handoff_link(&state.links, state.last_user_text.as_deref())
                    }
                    _ => method_link(m, &state.links),
                };
                (m, url)
            })
            .collect()
    }
}

impl Default for LinksOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for LinksOverlay {
    fn id(&self) -> ComponentId {
        ComponentId::LinksOverlay
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }
        match key.code {
            KeyCode::Esc | KeyCode::F(2) | KeyCode::Char('q') => vec![Action::ToggleLinks],
            KeyCode::Char(c @ '1'..='4') => {
                let idx = (c as u8 - b'1') as usize;
                match Self::entries(state).into_iter().nth(idx) {
                    Some((method, url)) => vec![Action::CopyLink {
                        label: method.label().to_string(),
                        url,
                    }],
                    None => Vec::new(),
                }
            }
            // modal: swallow everything else
            _ => Vec::new(),
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let popup = centered_rect(70, 12, area);

        let mut lines = vec![
            Line::from(Span::styled(
                " contacto y donaciones",
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        for (i, (method, url)) in Self::entries(state).iter().enumerate() {
            let url_style = if url == PLACEHOLDER {
                Style::default().fg(C_MUTED)
            } else {
                Style::default().fg(C_TAG)
            };
            let shown = if url == PLACEHOLDER {
                "(sin configurar)".to_string()
            } else {
                url.clone()
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!(" {}  ", i + 1),
                    Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{:<10}", method.label()), Style::default().fg(C_SECONDARY)),
                Span::styled(shown, url_style),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            " 1-4 copia el enlace · esc cierra",
            Style::default().fg(C_MUTED),
        )));

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(C_PANEL_BORDER_FOCUSED))
                        .style(Style::default().bg(Color::Rgb(18, 18, 26))),
                )
                .wrap(Wrap { trim: false }),
            popup,
        );
    }
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use colectivo_proto::config::LinksConfig;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_unconfigured_links_are_placeholders() {
        let state = AppState::new(LinksConfig::default());
        for (_, url) in LinksOverlay::entries(&state) {
            assert_eq!(url, PLACEHOLDER);
        }
    }

    #[test]
    fn test_number_key_copies_matching_link() {
        let mut state = AppState::new(LinksConfig {
            whatsapp_phone: "+57 300 123 4567".to_string(),
            patreon_url: "https://patreon.com/colectivo".to_string(),
            ..LinksConfig::default()
        });
        state.last_user_text = Some("¿tienen becas?".to_string());
        let mut overlay = LinksOverlay::new();

        match overlay.handle_key(key(KeyCode::Char('3')), &state).as_slice() {
            [Action::CopyLink { label, url }] => {
                assert_eq!(label, "Patreon");
                assert_eq!(url, "https://patreon.com/colectivo");
            }
            other => panic!("unexpected {:?}", other),
        }
        match overlay.handle_key(key(KeyCode::Char('1')), &state).as_slice() {
            [Action::CopyLink { url, .. }] => {
                assert!(url.starts_with("https://wa.me/573001234567?text="));
                assert!(url.contains("becas"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_escape_closes() {
        let state = AppState::new(LinksConfig::default());
        let mut overlay = LinksOverlay::new();
        assert!(matches!(
            overlay.handle_key(key(KeyCode::Esc), &state).as_slice(),
            [Action::ToggleLinks]
        ));
        assert!(overlay.handle_key(key(KeyCode::Char('x')), &state).is_empty());
    }
}
