//! Colours and shared styles.  Warm, paper-and-ink palette after the
//! collective's printed flyers: terracotta accent, ochre for people,
//! teal for the assistant.

use ratatui::style::{Color, Modifier, Style};

// ── base ──────────────────────────────────────────────────────────────────────

pub const C_BG: Color = Color::Rgb(24, 20, 18);
pub const C_PRIMARY: Color = Color::Rgb(236, 226, 210);
pub const C_SECONDARY: Color = Color::Rgb(166, 150, 132);
pub const C_MUTED: Color = Color::Rgb(98, 86, 76);
pub const C_SEPARATOR: Color = Color::Rgb(54, 46, 40);
pub const C_ACCENT: Color = Color::Rgb(214, 110, 76);
pub const C_SELECTION_BG: Color = Color::Rgb(48, 38, 32);
pub const C_PANEL_BORDER: Color = C_SEPARATOR;
pub const C_PANEL_BORDER_FOCUSED: Color = C_ACCENT;

// ── chat ──────────────────────────────────────────────────────────────────────

pub const C_USER: Color = Color::Rgb(226, 178, 84);
pub const C_BOT: Color = Color::Rgb(92, 176, 164);
pub const C_INPUT_BG: Color = Color::Rgb(34, 28, 24);
pub const C_INPUT_FG: Color = C_USER;

// ── radio ─────────────────────────────────────────────────────────────────────

pub const C_PLAYING: Color = Color::Rgb(134, 190, 102);
pub const C_CONNECTING: Color = Color::Rgb(232, 170, 72);
pub const C_ERROR: Color = Color::Rgb(224, 84, 72);
pub const C_TAG: Color = Color::Rgb(140, 156, 196);
pub const C_BADGE_LIVE: Color = C_ERROR;
pub const C_BADGE_RECORDED: Color = Color::Rgb(170, 130, 190);

// ── toasts ────────────────────────────────────────────────────────────────────

pub const C_TOAST_INFO: Color = C_BOT;
pub const C_TOAST_SUCCESS: Color = C_PLAYING;
pub const C_TOAST_WARNING: Color = C_CONNECTING;
pub const C_TOAST_ERROR: Color = C_ERROR;

/// `#rrggbb` (hash optional) to a colour; anything else gets the accent.
pub fn accent_color(hex: &str) -> Color {
    let hex = hex.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return C_ACCENT;
    }
    match u32::from_str_radix(hex, 16) {
        Ok(rgb) => Color::Rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8),
        Err(_) => C_ACCENT,
    }
}

pub fn style_default() -> Style {
    Style::new().fg(C_PRIMARY)
}

pub fn style_secondary() -> Style {
    Style::new().fg(C_SECONDARY)
}

pub fn style_muted() -> Style {
    Style::new().fg(C_MUTED)
}

pub fn style_selected_focused() -> Style {
    Style::new()
        .fg(C_PRIMARY)
        .bg(C_SELECTION_BG)
        .add_modifier(Modifier::BOLD)
}

pub fn style_focused_border() -> Style {
    Style::new().fg(C_PANEL_BORDER_FOCUSED)
}

pub fn style_unfocused_border() -> Style {
    Style::new().fg(C_PANEL_BORDER)
}
