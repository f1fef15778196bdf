//! Bottom rows: playback banner and the key hints for whatever has focus.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::action::ComponentId;
use crate::theme::{style_muted, C_ACCENT, C_CONNECTING, C_ERROR, C_PLAYING, C_SEPARATOR};

const CHAT_KEYS: &[(&str, &str)] = &[
    ("Enter", "enviar"),
    ("↑↓", "sugerencias"),
    ("PgUp/PgDn", "historial"),
    ("Ctrl-R", "reiniciar"),
    ("Tab", "radio"),
    ("F2", "enlaces"),
    ("Ctrl-C", "salir"),
];

const RADIO_KEYS: &[(&str, &str)] = &[
    ("↑↓/jk", "mover"),
    ("Enter", "elegir"),
    ("Space", "play/pausa"),
    ("n/p", "estación"),
    ("+/-", "volumen"),
    ("Tab", "chat"),
    ("F2", "enlaces"),
    ("q", "salir"),
];

const LINK_KEYS: &[(&str, &str)] = &[("1-4", "copiar enlace"), ("Esc", "cerrar")];

fn keys_for(focus: ComponentId) -> &'static [(&'static str, &'static str)] {
    match focus {
        ComponentId::ChatPanel => CHAT_KEYS,
        ComponentId::RadioPanel => RADIO_KEYS,
        ComponentId::LinksOverlay => LINK_KEYS,
    }
}

/// Station core reachability dot, then the current playback error.
pub fn draw_status_line(frame: &mut Frame, area: Rect, status: Option<&str>, connected: bool) {
    let dot = if connected {
        Span::styled(" ● ", Style::new().fg(C_PLAYING))
    } else {
        Span::styled(" ○ ", Style::new().fg(C_CONNECTING))
    };
    let mut spans = vec![dot];
    if let Some(msg) = status {
        spans.push(Span::styled(msg.to_string(), Style::new().fg(C_ERROR)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub fn draw_separator(frame: &mut Frame, area: Rect) {
    frame.render_widget(
        Paragraph::new(Span::styled(
            "┄".repeat(area.width as usize),
            Style::new().fg(C_SEPARATOR),
        )),
        area,
    );
}

fn keys_line(focus: ComponentId) -> Line<'static> {
    let key_style = Style::new().fg(C_ACCENT).add_modifier(Modifier::BOLD);
    let mut spans = Vec::new();
    for (key, what) in keys_for(focus) {
        spans.push(Span::styled(format!(" {}", key), key_style));
        spans.push(Span::styled(format!(" {} ", what), style_muted()));
    }
    Line::from(spans)
}

pub fn draw_keys_bar(frame: &mut Frame, area: Rect, focus: ComponentId) {
    frame.render_widget(Paragraph::new(keys_line(focus)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_every_pane_advertises_quit_or_close() {
        assert!(text(&keys_line(ComponentId::ChatPanel)).contains("Ctrl-C salir"));
        assert!(text(&keys_line(ComponentId::RadioPanel)).contains("q salir"));
        assert!(text(&keys_line(ComponentId::LinksOverlay)).contains("Esc cerrar"));
    }
}
