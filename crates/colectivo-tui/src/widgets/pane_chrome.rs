//! Rounded pane border: title with a focus dot, optional badge on the right.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders},
};

use crate::theme::{
    style_focused_border, style_muted, style_unfocused_border, C_ACCENT, C_BG, C_PRIMARY,
};

/// Short status word drawn reversed in the pane header ("SONANDO").
pub struct Badge<'a> {
    pub text: &'a str,
    pub color: Color,
}

pub fn pane_chrome<'a>(title: &'a str, focused: bool, badge: Option<Badge<'a>>) -> Block<'a> {
    let title = if focused {
        Line::from(vec![
            Span::styled(" ● ", Style::new().fg(C_ACCENT)),
            Span::styled(
                title,
                Style::new().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
        ])
    } else {
        Line::from(Span::styled(format!(" ○ {} ", title), style_muted()))
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if focused {
            style_focused_border()
        } else {
            style_unfocused_border()
        })
        .title(title);

    if let Some(badge) = badge {
        let chip = Span::styled(
            format!(" {} ", badge.text),
            Style::new()
                .fg(C_BG)
                .bg(badge.color)
                .add_modifier(Modifier::BOLD),
        );
        block = block.title_top(Line::from(chip).right_aligned());
    }
    block
}
