//! ChatPanel component, left pane: transcript, suggested questions, draft.
//!
//! Owns the `ChatEngine`.  Sending a line only queues the reply; the App
//! runs the typing timer and hands the ticket back through `complete_reply`.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};
use unicode_width::UnicodeWidthChar;

use colectivo_proto::chat::{ChatEngine, PendingReply};
use colectivo_proto::protocol::ChatMessage;
use colectivo_proto::rules::{self, ResponseRule};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        style_muted, style_selected_focused, C_BOT, C_INPUT_BG, C_INPUT_FG, C_MUTED, C_SECONDARY,
        C_USER,
    },
    widgets::pane_chrome::{pane_chrome, Badge},
};

const TYPING_FRAMES: &[&str] = &["·  ", "·· ", "···"];

pub struct ChatPanel {
    engine: ChatEngine,
    input: Input,
    suggestions: Vec<&'static ResponseRule>,
    /// Highlighted suggestion; only reachable while the draft is empty.
    suggestion_cursor: Option<usize>,
    /// Lines scrolled up from the bottom of the transcript.
    scroll_back: usize,
    typing_frame: usize,
}

impl ChatPanel {
    pub fn new() -> Self {
        Self {
            engine: ChatEngine::new(),
            input: Input::default(),
            suggestions: rules::quick_replies().collect(),
            suggestion_cursor: None,
            scroll_back: 0,
            typing_frame: 0,
        }
    }

    pub fn engine(&self) -> &ChatEngine {
        &self.engine
    }

    /// A typing timer ran out.  Returns false for replies from a reset
    /// conversation.
    pub fn complete_reply(&mut self, pending: PendingReply) -> bool {
        let landed = self.engine.complete_reply(pending).is_some();
        if landed {
            self.scroll_back = 0;
        }
        landed
    }

    pub fn reset(&mut self) {
        self.engine.reset();
        self.input.reset();
        self.suggestion_cursor = None;
        self.scroll_back = 0;
    }

    fn send(&mut self) -> Vec<Action> {
        if self.input.value().is_empty() {
            if let Some(rule) = self.suggestion_cursor.and_then(|i| self.suggestions.get(i).copied()) {
                self.engine.select_quick_reply(rule);
                self.suggestion_cursor = None;
                self.scroll_back = 0;
            }
            return Vec::new();
        }
        self.engine.set_draft(self.input.value());
        match self.engine.submit_draft() {
            Some(pending) => {
                self.input.reset();
                self.scroll_back = 0;
                vec![Action::ReplyQueued(pending)]
            }
            None => Vec::new(),
        }
    }

    fn move_suggestion(&mut self, down: bool) {
        let n = self.suggestions.len();
        if n == 0 {
            return;
        }
        self.suggestion_cursor = Some(match (self.suggestion_cursor, down) {
            (None, true) => 0,
            (None, false) => n - 1,
            (Some(i), true) => (i + 1) % n,
            (Some(i), false) => (i + n - 1) % n,
        });
    }

    fn transcript_lines(&self, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for msg in self.engine.transcript() {
            lines.extend(message_lines(msg, width));
            lines.push(Line::default());
        }
        if self.engine.is_typing() {
            let dots = TYPING_FRAMES[self.typing_frame % TYPING_FRAMES.len()];
            lines.push(Line::from(Span::styled(
                format!("colectivo está escribiendo {}", dots),
                Style::default().fg(C_MUTED).add_modifier(Modifier::ITALIC),
            )));
        }
        lines
    }

    fn draw_suggestions(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let lines: Vec<Line> = self
            .suggestions
            .iter()
            .enumerate()
            .filter_map(|(i, rule)| rule.quick_question.map(|q| (i, q)))
            .map(|(i, question)| {
                let text = format!(" › {}", question);
                let selected = focused && self.suggestion_cursor == Some(i);
                if selected {
                    Line::from(Span::styled(text, style_selected_focused()))
                } else {
                    Line::from(Span::styled(text, Style::default().fg(C_SECONDARY)))
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_input(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let width = area.width.saturating_sub(3) as usize;
        let scroll = self.input.visual_scroll(width);
        let value = self.input.value();
        let span = if value.is_empty() {
            Span::styled("> escribe tu pregunta…", style_muted())
        } else {
            let visible = skip_columns(value, scroll);
            Span::styled(format!("> {}", visible), Style::default().fg(C_INPUT_FG))
        };
        frame.render_widget(
            Paragraph::new(Line::from(span)).style(Style::default().bg(C_INPUT_BG)),
            area,
        );
        if focused {
            let cursor_x = area.x + 2 + self.input.visual_cursor().saturating_sub(scroll) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width.saturating_sub(1)), area.y));
        }
    }
}

impl Default for ChatPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ChatPanel {
    fn id(&self) -> ComponentId {
        ComponentId::ChatPanel
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }
        let draft_empty = self.input.value().is_empty();
        match key.code {
            KeyCode::Enter => self.send(),
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                vec![Action::ResetChat]
            }
            KeyCode::Up if draft_empty => {
                self.move_suggestion(false);
                Vec::new()
            }
            KeyCode::Down if draft_empty => {
                self.move_suggestion(true);
                Vec::new()
            }
            KeyCode::PageUp => {
                self.scroll_back = self.scroll_back.saturating_add(5);
                Vec::new()
            }
            KeyCode::PageDown => {
                self.scroll_back = self.scroll_back.saturating_sub(5);
                Vec::new()
            }
            KeyCode::Esc => {
                self.suggestion_cursor = None;
                Vec::new()
            }
            _ => {
                self.input.handle_event(&Event::Key(key));
                if !self.input.value().is_empty() {
                    self.suggestion_cursor = None;
                }
                Vec::new()
            }
        }
    }

    fn tick(&mut self, _state: &AppState) -> Vec<Action> {
        if self.engine.is_typing() {
            self.typing_frame = self.typing_frame.wrapping_add(1);
        }
        Vec::new()
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::ResetChat = action {
            self.reset();
        }
        Vec::new()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, _state: &AppState) {
        let badge = self.engine.is_typing().then_some(Badge {
            text: "escribiendo…",
            color: C_BOT,
        });
        let block = pane_chrome("chat", focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let suggestion_rows = (self.suggestions.len() as u16).min(inner.height / 3);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(suggestion_rows),
                Constraint::Length(1),
            ])
            .split(inner);

        let lines = self.transcript_lines(rows[0].width as usize);
        let height = rows[0].height as usize;
        let max_back = lines.len().saturating_sub(height);
        self.scroll_back = self.scroll_back.min(max_back);
        let top = lines.len().saturating_sub(height + self.scroll_back);
        frame.render_widget(Paragraph::new(lines).scroll((top as u16, 0)), rows[0]);

        self.draw_suggestions(frame, rows[1], focused);
        self.draw_input(frame, rows[2], focused);
    }
}

fn message_lines(msg: &ChatMessage, width: usize) -> Vec<Line<'static>> {
    let (who, color) = if msg.from_bot {
        ("colectivo", C_BOT)
    } else {
        ("tú", C_USER)
    };
    let stamp = msg
        .timestamp
        .with_timezone(&chrono::Local)
        .format("%H:%M")
        .to_string();
    let mut lines = vec![Line::from(vec![
        Span::styled(who, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  {}", stamp), style_muted()),
    ])];
    lines.extend(
        wrap_text(&msg.text, width.saturating_sub(2))
            .into_iter()
            .map(|l| Line::from(Span::raw(format!("  {}", l)))),
    );
    lines
}

/// Greedy word wrap by display width.  Words wider than `width` are split.
/// What is left of `value` once `cols` display columns have scrolled off the
/// left edge.  A wide char cut in half goes with the scrolled part.
fn skip_columns(value: &str, cols: usize) -> &str {
    let mut skipped = 0;
    for (i, c) in value.char_indices() {
        if skipped >= cols {
            return &value[i..];
        }
        skipped += c.width().unwrap_or(0);
    }
    ""
}

pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_w = 0;
        for word in paragraph.split_whitespace() {
            let word_w: usize = word.chars().map(|c| c.width().unwrap_or(0)).sum();
            let sep = usize::from(line_w > 0);
            if line_w + sep + word_w <= width {
                if sep == 1 {
                    line.push(' ');
                }
                line.push_str(word);
                line_w += sep + word_w;
                continue;
            }
            if line_w > 0 {
                out.push(std::mem::take(&mut line));
                line_w = 0;
            }
            for c in word.chars() {
                let cw = c.width().unwrap_or(0);
                if line_w + cw > width && line_w > 0 {
                    out.push(std::mem::take(&mut line));
                    line_w = 0;
                }
                line.push(c);
                line_w += cw;
            }
        }
        out.push(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use colectivo_proto::config::LinksConfig;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(panel: &mut ChatPanel, state: &AppState, text: &str) {
        for c in text.chars() {
            panel.handle_key(key(KeyCode::Char(c)), state);
        }
    }

    #[test]
    fn test_input_scroll_counts_columns() {
        assert_eq!(skip_columns("hola", 0), "hola");
        assert_eq!(skip_columns("hola", 2), "la");
        assert_eq!(skip_columns("日本語テキスト", 4), "語テキスト");
        assert_eq!(skip_columns("日本語テキスト", 3), "語テキスト");
        assert_eq!(skip_columns("ab日本", 3), "本");
        assert_eq!(skip_columns("hola", 9), "");
    }

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap_text("talleres de cerámica y grabado", 12);
        assert_eq!(lines, vec!["talleres de", "cerámica y", "grabado"]);
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn test_wrap_counts_wide_chars() {
        for line in wrap_text("日本語のテキスト", 4) {
            let w: usize = line.chars().map(|c| c.width().unwrap_or(0)).sum();
            assert!(w <= 4, "{:?}", line);
        }
    }

    #[test]
    fn test_enter_queues_reply_and_clears_input() {
        let state = AppState::new(LinksConfig::default());
        let mut panel = ChatPanel::new();
        type_text(&mut panel, &state, "¿Qué talleres ofrecen?");
        let actions = panel.handle_key(key(KeyCode::Enter), &state);
        assert!(matches!(actions.as_slice(), [Action::ReplyQueued(_)]));
        assert!(panel.input.value().is_empty());
        assert!(panel.engine().is_typing());
    }

    #[test]
    fn test_blank_enter_does_nothing() {
        let state = AppState::new(LinksConfig::default());
        let mut panel = ChatPanel::new();
        type_text(&mut panel, &state, "   ");
        assert!(panel.handle_key(key(KeyCode::Enter), &state).is_empty());
        assert_eq!(panel.engine().transcript().len(), 1);
    }

    #[test]
    fn test_suggestion_answers_immediately() {
        let state = AppState::new(LinksConfig::default());
        let mut panel = ChatPanel::new();
        panel.handle_key(key(KeyCode::Down), &state);
        assert!(panel.handle_key(key(KeyCode::Enter), &state).is_empty());
        assert_eq!(panel.engine().transcript().len(), 3);
        assert!(!panel.engine().is_typing());
    }

    #[test]
    fn test_reset_drops_pending_reply() {
        let state = AppState::new(LinksConfig::default());
        let mut panel = ChatPanel::new();
        type_text(&mut panel, &state, "hola");
        let Some(Action::ReplyQueued(pending)) =
            panel.handle_key(key(KeyCode::Enter), &state).pop()
        else {
            panic!("no reply queued");
        };
        panel.on_action(&Action::ResetChat, &state);
        assert!(!panel.complete_reply(pending));
        assert_eq!(panel.engine().transcript().len(), 1);
    }
}
