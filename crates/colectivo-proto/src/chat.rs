//! Canned-response chat engine.
//!
//! The engine owns the transcript, the draft input and the typing flag.
//! Replies are two-phase: `submit_user_message` records the visitor's line
//! and hands back a `PendingReply`; whoever owns the event loop waits out the
//! typing delay (see `deliver_after`) and passes the ticket to
//! `complete_reply`.  Tickets from before a `reset` are dropped.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::protocol::ChatMessage;
use crate::rules::{self, ResponseRule, FALLBACK_RESPONSE, GREETING};

/// A bot reply that is still "being typed".
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReply {
    epoch: u64,
    prompt: String,
}

impl PendingReply {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

pub struct ChatEngine {
    rules: &'static [ResponseRule],
    transcript: Vec<ChatMessage>,
    draft: String,
    outstanding: usize,
    epoch: u64,
}

impl ChatEngine {
    pub fn new() -> Self {
        Self::with_rules(rules::RULES)
    }

    pub fn with_rules(rules: &'static [ResponseRule]) -> Self {
        Self {
            rules,
            transcript: vec![ChatMessage::bot(GREETING)],
            draft: String::new(),
            outstanding: 0,
            epoch: 0,
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// True while at least one reply is waiting out its delay.
    pub fn is_typing(&self) -> bool {
        self.outstanding > 0
    }

    /// Most recent thing the visitor typed, for the human handoff link.
    pub fn last_user_text(&self) -> Option<&str> {
        self.transcript
            .iter()
            .rev()
            .find(|m| !m.from_bot)
            .map(|m| m.text.as_str())
    }

    /// Map free text to a canned response.  Never fails: anything the table
    /// doesn't cover gets the fallback.
    pub fn classify(&self, text: &str) -> &'static str {
        self.matching_rule(text)
            .map(|r| r.response)
            .unwrap_or(FALLBACK_RESPONSE)
    }

    pub fn matching_rule(&self, text: &str) -> Option<&'static ResponseRule> {
        let lowered = text.to_lowercase();
        self.rules.iter().find(|r| r.matches(&lowered))
    }

    /// Record the visitor's message and start the typing delay.  Blank input
    /// is ignored and returns `None`.
    pub fn submit_user_message(&mut self, text: &str) -> Option<PendingReply> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.transcript.push(ChatMessage::user(trimmed));
        self.draft.clear();
        self.outstanding += 1;
        debug!("chat: queued reply for {:?}", trimmed);
        Some(PendingReply {
            epoch: self.epoch,
            prompt: trimmed.to_string(),
        })
    }

    /// Submit whatever is in the draft buffer.
    pub fn submit_draft(&mut self) -> Option<PendingReply> {
        let text = std::mem::take(&mut self.draft);
        let pending = self.submit_user_message(&text);
        if pending.is_none() {
            // keep whitespace-only drafts as typed
            self.draft = text;
        }
        pending
    }

    /// Append the bot's answer for `pending`.  Returns the new message, or
    /// `None` when the ticket belongs to a session that has since been reset.
    pub fn complete_reply(&mut self, pending: PendingReply) -> Option<&ChatMessage> {
        if pending.epoch != self.epoch {
            debug!("chat: dropping stale reply for {:?}", pending.prompt);
            return None;
        }
        self.outstanding = self.outstanding.saturating_sub(1);
        let response = self.classify(&pending.prompt);
        self.transcript.push(ChatMessage::bot(response));
        self.transcript.last()
    }

    /// Suggested-question button: append the pre-bound question and its
    /// answer right away, without classification or delay.  Rules without a
    /// suggested question are not buttons and leave the transcript alone.
    pub fn select_quick_reply(&mut self, rule: &ResponseRule) {
        let Some(question) = rule.quick_question else {
            debug!("chat: rule '{}' has no quick question", rule.id);
            return;
        };
        self.transcript.push(ChatMessage::user(question));
        self.transcript.push(ChatMessage::bot(rule.response));
    }

    /// Start over with only the greeting.  Replies still in flight are
    /// discarded when they arrive.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.outstanding = 0;
        self.draft.clear();
        self.transcript = vec![ChatMessage::bot(GREETING)];
    }
}

impl Default for ChatEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait out the typing delay, then hand `pending` back through `tx`.  If the
/// receiving widget is gone the reply is silently dropped.
pub async fn deliver_after<T>(delay: Duration, pending: PendingReply, tx: mpsc::Sender<T>)
where
    T: From<PendingReply>,
{
    tokio::time::sleep(delay).await;
    if tx.send(T::from(pending)).await.is_err() {
        debug!("chat: receiver gone, reply discarded");
    }
}
