//! Toasts: short messages stacked in the top-right corner of the body.
//!
//! Lifetimes are counted in UI ticks (100 ms each), so expiry follows the
//! App loop rather than the wall clock.  One slot is reserved for a
//! progress line ("Conectando con …") that stays until dismissed.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::theme::{C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS, C_TOAST_WARNING};

const MAX_SHOWN: usize = 3;
const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    /// Ticks a toast of this level stays up.
    fn ttl(self) -> u16 {
        match self {
            Level::Info | Level::Success => 30,
            Level::Warning => 40,
            Level::Error => 60,
        }
    }

    fn glyph(self) -> &'static str {
        match self {
            Level::Info => "i",
            Level::Success => "✓",
            Level::Warning => "!",
            Level::Error => "✗",
        }
    }

    fn color(self) -> Color {
        match self {
            Level::Info => C_TOAST_INFO,
            Level::Success => C_TOAST_SUCCESS,
            Level::Warning => C_TOAST_WARNING,
            Level::Error => C_TOAST_ERROR,
        }
    }
}

#[derive(Debug)]
struct Toast {
    text: String,
    level: Level,
    ticks_left: u16,
}

#[derive(Debug, Default)]
pub struct ToastManager {
    /// Newest last.
    toasts: Vec<Toast>,
    progress: Option<(String, usize)>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, text: String, level: Level) {
        // repeating a message refreshes it instead of stacking a copy
        self.toasts.retain(|t| t.text != text);
        self.toasts.push(Toast {
            text,
            level,
            ticks_left: level.ttl(),
        });
        if self.toasts.len() > MAX_SHOWN {
            self.toasts.remove(0);
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(text.into(), Level::Info);
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(text.into(), Level::Success);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.push(text.into(), Level::Warning);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(text.into(), Level::Error);
    }

    /// Show a progress line.  Same text again keeps the animation going.
    pub fn spinner(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.progress.as_ref().map(|(t, _)| t) != Some(&text) {
            self.progress = Some((text, 0));
        }
    }

    pub fn dismiss_spinner(&mut self) {
        self.progress = None;
    }

    pub fn tick(&mut self) {
        for t in &mut self.toasts {
            t.ticks_left = t.ticks_left.saturating_sub(1);
        }
        self.toasts.retain(|t| t.ticks_left > 0);
        if let Some((_, frame)) = self.progress.as_mut() {
            *frame = frame.wrapping_add(1);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty() && self.progress.is_none()
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::with_capacity(MAX_SHOWN + 1);
        if let Some((text, frame)) = &self.progress {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{} ", SPINNER[frame % SPINNER.len()]),
                    Style::default().fg(C_TOAST_INFO),
                ),
                Span::raw(text.clone()),
            ]));
        }
        for t in self.toasts.iter().rev() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{} ", t.level.glyph()),
                    Style::default()
                        .fg(t.level.color())
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(t.text.clone(), Style::default().fg(t.level.color())),
            ]));
        }
        lines
    }

    /// Draw the stack in the top-right corner of `area`.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if self.is_empty() {
            return;
        }
        let lines = self.lines();
        let widest = lines.iter().map(Line::width).max().unwrap_or(0) as u16;
        let width = (widest + 4).min(area.width).min(72);
        let height = (lines.len() as u16 + 2).min(area.height);
        if width < 6 || height < 3 {
            return;
        }
        let rect = Rect {
            x: area.x + area.width - width,
            y: area.y,
            width,
            height,
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(C_TOAST_INFO));
        frame.render_widget(Clear, rect);
        frame.render_widget(Paragraph::new(lines).block(block), rect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_message_is_refreshed_not_stacked() {
        let mut toasts = ToastManager::new();
        toasts.info("Enlace copiado");
        toasts.tick();
        toasts.info("Enlace copiado");
        assert_eq!(toasts.toasts.len(), 1);
        assert_eq!(toasts.toasts[0].ticks_left, Level::Info.ttl());
    }

    #[test]
    fn test_toasts_expire_by_ticks_and_cap() {
        let mut toasts = ToastManager::new();
        toasts.info("a");
        toasts.error("b");
        for _ in 0..Level::Info.ttl() {
            toasts.tick();
        }
        assert_eq!(toasts.toasts.len(), 1);
        assert_eq!(toasts.toasts[0].level, Level::Error);

        for i in 0..5 {
            toasts.warning(format!("w{}", i));
        }
        assert_eq!(toasts.toasts.len(), MAX_SHOWN);
        assert_eq!(toasts.toasts.last().map(|t| t.text.as_str()), Some("w4"));
    }

    #[test]
    fn test_progress_stays_until_dismissed() {
        let mut toasts = ToastManager::new();
        toasts.spinner("Conectando…");
        for _ in 0..100 {
            toasts.tick();
        }
        toasts.spinner("Conectando…");
        assert_eq!(toasts.progress.as_ref().map(|(_, f)| *f), Some(100));
        assert_eq!(toasts.lines().len(), 1);
        toasts.dismiss_spinner();
        assert!(toasts.is_empty());
    }
}
