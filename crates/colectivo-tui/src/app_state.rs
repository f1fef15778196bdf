//! AppState: read-only data handed to every component on render and input.
//!
//! The App event-loop is the only thing that writes to AppState.

use colectivo_proto::config::LinksConfig;
use colectivo_proto::protocol::{RadioSnapshot, RadioStation};

use crate::action::ComponentId;

pub struct AppState {
    // ── Radio ──────────────────────────────────────────────────────────────
    /// Latest snapshot broadcast by the station core.
    pub radio: RadioSnapshot,
    /// False until the first snapshot arrives.
    pub connected: bool,
    /// Error banner; cleared by the next successful transition.
    pub status_line: Option<String>,

    // ── Chat ───────────────────────────────────────────────────────────────
    /// Last thing the visitor typed, carried into the WhatsApp handoff.
    pub last_user_text: Option<String>,

    // ── UI ─────────────────────────────────────────────────────────────────
    pub focus: ComponentId,
    pub show_links: bool,
    pub links: LinksConfig,
}

impl AppState {
    pub fn new(links: LinksConfig) -> Self {
        Self {
            radio: RadioSnapshot::default(),
            connected: false,
            status_line: None,
            last_user_text: None,
            focus: ComponentId::ChatPanel,
            show_links: false,
            links,
        }
    }

    pub fn current_station(&self) -> Option<&RadioStation> {
        self.radio.current()
    }

    /// Take a new snapshot.  Returns the error text if this snapshot
    /// introduced one, so the caller can toast it once.
    pub fn apply_snapshot(&mut self, snapshot: RadioSnapshot) -> Option<String> {
        if self.connected && snapshot.rev <= self.radio.rev {
            return None;
        }
        let previous = self.radio.playback.last_error.take();
        self.status_line = snapshot.playback.last_error.clone();
        let fresh = match (&previous, &snapshot.playback.last_error) {
            (_, None) => None,
            (Some(old), Some(new)) if old == new => None,
            (_, Some(new)) => Some(new.clone()),
        };
        self.radio = snapshot;
        self.connected = true;
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colectivo_proto::protocol::PlaybackStatus;

    fn snapshot(rev: u64, error: Option<&str>) -> RadioSnapshot {
        let mut s = RadioSnapshot {
            rev,
            status: if error.is_some() {
                PlaybackStatus::Errored
            } else {
                PlaybackStatus::Idle
            },
            ..RadioSnapshot::default()
        };
        s.playback.last_error = error.map(str::to_string);
        s
    }

    #[test]
    fn test_error_surfaces_once_and_clears() {
        let mut state = AppState::new(LinksConfig::default());
        assert_eq!(state.apply_snapshot(snapshot(1, None)), None);
        assert_eq!(
            state.apply_snapshot(snapshot(2, Some("falló"))).as_deref(),
            Some("falló")
        );
        assert_eq!(state.status_line.as_deref(), Some("falló"));
        assert_eq!(state.apply_snapshot(snapshot(3, Some("falló"))), None);
        state.apply_snapshot(snapshot(4, None));
        assert!(state.status_line.is_none());
    }

    #[test]
    fn test_older_snapshots_are_dropped() {
        let mut state = AppState::new(LinksConfig::default());
        state.apply_snapshot(snapshot(5, None));
        state.apply_snapshot(snapshot(4, Some("viejo")));
        assert_eq!(state.radio.rev, 5);
        assert!(state.status_line.is_none());
    }
}
