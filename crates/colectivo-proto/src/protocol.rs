use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Commands the front end sends to the station core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd")]
pub enum RadioCommand {
    Play,
    Pause,
    Toggle,
    Select { station_idx: usize },
    Next,
    Prev,
    Volume { value: i32 },
    GetState,
}

/// Whether a station is broadcasting live or replaying a recording.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LiveState {
    #[default]
    Live,
    Recorded,
}

impl LiveState {
    pub fn badge_label(self) -> &'static str {
        match self {
            LiveState::Live => "EN VIVO",
            LiveState::Recorded => "GRABADO",
        }
    }
}

/// One entry of the station catalog.  Display fields are static; nothing
/// here is refreshed at runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RadioStation {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genre: String,
    pub stream_url: String,
    /// Accent colour as `#rrggbb`.
    #[serde(default)]
    pub accent: String,
    /// Display-only listener count ("1.2k").  Not live.
    #[serde(default)]
    pub listeners: String,
    #[serde(default)]
    pub current_program: String,
    #[serde(default)]
    pub next_program: String,
    #[serde(default)]
    pub live_state: LiveState,
}

/// Detailed playback status of the station controller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle, // not playing, no error
    Loading, // play requested, audio not confirmed yet
    Playing, // playback element reports audio
    Errored, // most recent attempt failed
}

/// Flattened view of the controller for renderers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub volume: u8,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

/// Everything the radio panel needs to draw one frame.  `rev` increases on
/// every change so receivers can drop duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RadioSnapshot {
    #[serde(default)]
    pub rev: u64,
    pub stations: Vec<RadioStation>,
    pub current_station: usize,
    pub status: PlaybackStatus,
    pub playback: PlaybackState,
}

impl RadioSnapshot {
    pub fn current(&self) -> Option<&RadioStation> {
        self.stations.get(self.current_station)
    }
}

/// A transcript entry.  Created once, never edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// UUID v7, so ids sort in creation order.
    pub id: Uuid,
    pub text: String,
    pub from_bot: bool,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(text: impl Into<String>, from_bot: bool) -> Self {
        Self {
            id: Uuid::now_v7(),
            text: text.into(),
            from_bot,
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, false)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(text, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_json_shape() {
        let json = serde_json::to_string(&RadioCommand::Select { station_idx: 2 }).unwrap();
        assert_eq!(json, r#"{"cmd":"Select","station_idx":2}"#);
        let back: RadioCommand = serde_json::from_str(r#"{"cmd":"Volume","value":-4}"#).unwrap();
        assert_eq!(back, RadioCommand::Volume { value: -4 });
    }

    #[test]
    fn test_message_ids_are_time_ordered() {
        let a = ChatMessage::user("hola");
        let b = ChatMessage::bot("¡Hola!");
        assert!(a.id < b.id);
        assert!(!a.from_bot);
        assert!(b.from_bot);
    }

    #[test]
    fn test_station_defaults_from_toml_fields() {
        let station: RadioStation = serde_json::from_str(
            r#"{"id":7,"name":"Patio","stream_url":"https://example.org/patio.mp3"}"#,
        )
        .unwrap();
        assert_eq!(station.live_state, LiveState::Live);
        assert!(station.genre.is_empty());
    }
}
