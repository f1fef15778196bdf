//! Station controller: selection, play intent and error recovery for the
//! radio widget.
//!
//! Pure state machine: no I/O, no timers.  User actions are method calls,
//! reports from the playback element arrive as `PlayerEvent`s, and every
//! call returns the `Effect`s the host must carry out (drive the player,
//! arm an auto-advance timer).
//!
//! ```text
//!   Idle/Errored --play()--------------> Loading
//!   Loading      --Playing-------------> Playing
//!   Loading      --Failed(kind)--------> Errored   (UnsupportedFormat: arm auto-advance)
//!   Playing      --Waiting-------------> Loading
//!   Playing      --pause()-------------> Idle
//!   any          --select_station(i)---> Loading if it was active, else Idle
//! ```
//!
//! Each load carries a `LoadToken`; reports and timers holding an older
//! token are ignored, so a late confirmation for an abandoned station can
//! never flip the state.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::protocol::{PlaybackState, PlaybackStatus, RadioSnapshot, RadioStation};

/// Identifies one play attempt: the station and the selection generation
/// it was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadToken {
    pub station: usize,
    pub generation: u64,
}

/// What went wrong with a play attempt.  `Display` is the user-facing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaybackErrorKind {
    #[error("La reproducción fue bloqueada. Presiona play de nuevo para permitir el audio.")]
    PermissionBlocked,
    #[error("Formato de audio no soportado. Probando la siguiente estación…")]
    UnsupportedFormat,
    #[error("La carga del audio se interrumpió.")]
    Aborted,
    #[error("Error de red al conectar con la estación.")]
    Network,
    #[error("No se pudo reproducir la estación.")]
    Generic,
}

impl PlaybackErrorKind {
    /// Bucket a raw player error description.
    pub fn classify(reason: &str) -> Self {
        let r = reason.to_ascii_lowercase();
        if ["permission", "not allowed", "notallowed", "denied", "forbidden", "403"]
            .iter()
            .any(|k| r.contains(k))
        {
            PlaybackErrorKind::PermissionBlocked
        } else if [
            "unrecognized file format",
            "unsupported",
            "notsupported",
            "no audio",
            "format",
            "codec",
        ]
        .iter()
        .any(|k| r.contains(k))
        {
            PlaybackErrorKind::UnsupportedFormat
        } else if r.contains("abort") {
            PlaybackErrorKind::Aborted
        } else if ["network", "loading failed", "timeout", "timed out", "connection", "http"]
            .iter()
            .any(|k| r.contains(k))
        {
            PlaybackErrorKind::Network
        } else {
            PlaybackErrorKind::Generic
        }
    }
}

/// Reports from the playback element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEventKind {
    /// Audio is actually flowing.
    Playing,
    /// Buffering after audio had started.
    Waiting,
    /// The element paused on its own.
    Paused,
    Failed(PlaybackErrorKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerEvent {
    pub token: LoadToken,
    pub kind: PlayerEventKind,
}

/// Work the host must do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Point the playback element at `url`, reload, start playing.
    Load {
        url: String,
        token: LoadToken,
        volume: u8,
    },
    /// Stop and unload whatever is playing.
    Stop,
    SetVolume(u8),
    /// Call `on_auto_advance(token)` after `after`.
    ScheduleAdvance { token: LoadToken, after: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("station catalog is empty")]
    EmptyCatalog,
    #[error("no station at index {index} (catalog has {count})")]
    NoSuchStation { index: usize, count: usize },
}

pub struct StationController {
    stations: Vec<RadioStation>,
    current: usize,
    status: PlaybackStatus,
    volume: u8,
    last_error: Option<PlaybackErrorKind>,
    generation: u64,
    /// Consecutive auto-advances without a successful play.
    advance_streak: usize,
    auto_advance_delay: Duration,
    rev: u64,
}

impl StationController {
    pub fn new(
        stations: Vec<RadioStation>,
        volume: i32,
        auto_advance_delay: Duration,
    ) -> Result<Self, ControllerError> {
        if stations.is_empty() {
            return Err(ControllerError::EmptyCatalog);
        }
        Ok(Self {
            stations,
            current: 0,
            status: PlaybackStatus::Idle,
            volume: clamp_volume(volume),
            last_error: None,
            generation: 0,
            advance_streak: 0,
            auto_advance_delay,
            rev: 1,
        })
    }

    // ── accessors ─────────────────────────────────────────────────────────────

    pub fn stations(&self) -> &[RadioStation] {
        &self.stations
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_station(&self) -> &RadioStation {
        &self.stations[self.current]
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn last_error(&self) -> Option<PlaybackErrorKind> {
        self.last_error
    }

    /// Token of the attempt currently allowed to report.
    pub fn current_token(&self) -> LoadToken {
        LoadToken {
            station: self.current,
            generation: self.generation,
        }
    }

    pub fn playback_state(&self) -> PlaybackState {
        PlaybackState {
            is_playing: self.status == PlaybackStatus::Playing,
            volume: self.volume,
            is_loading: self.status == PlaybackStatus::Loading,
            last_error: self.last_error.map(|e| e.to_string()),
        }
    }

    pub fn snapshot(&self) -> RadioSnapshot {
        RadioSnapshot {
            rev: self.rev,
            stations: self.stations.clone(),
            current_station: self.current,
            status: self.status,
            playback: self.playback_state(),
        }
    }

    fn is_active(&self) -> bool {
        matches!(self.status, PlaybackStatus::Loading | PlaybackStatus::Playing)
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.status != status {
            debug!("station: status {:?} → {:?}", self.status, status);
        }
        self.status = status;
        self.rev += 1;
    }

    // ── user actions ──────────────────────────────────────────────────────────

    /// Start the current station.  A no-op while already loading or playing.
    pub fn play(&mut self) -> Vec<Effect> {
        if self.is_active() {
            return Vec::new();
        }
        self.advance_streak = 0;
        self.last_error = None;
        self.start_loading()
    }

    fn start_loading(&mut self) -> Vec<Effect> {
        self.generation += 1;
        let token = self.current_token();
        let station = &self.stations[self.current];
        info!("station: loading '{}' ({})", station.name, station.stream_url);
        let url = station.stream_url.clone();
        self.set_status(PlaybackStatus::Loading);
        vec![Effect::Load {
            url,
            token,
            volume: self.volume,
        }]
    }

    pub fn pause(&mut self) -> Vec<Effect> {
        if !self.is_active() {
            return Vec::new();
        }
        // Any confirmation still in flight belongs to a dead attempt now.
        self.generation += 1;
        self.last_error = None;
        self.set_status(PlaybackStatus::Idle);
        vec![Effect::Stop]
    }

    pub fn toggle(&mut self) -> Vec<Effect> {
        if self.is_active() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Switch stations.  Playback always stops first; it resumes on the new
    /// station only if the visitor was listening.
    pub fn select_station(&mut self, index: usize) -> Result<Vec<Effect>, ControllerError> {
        if index >= self.stations.len() {
            return Err(ControllerError::NoSuchStation {
                index,
                count: self.stations.len(),
            });
        }
        let was_active = self.is_active();
        let mut effects = vec![Effect::Stop];
        self.generation += 1;
        self.current = index;
        self.last_error = None;
        self.advance_streak = 0;
        if was_active {
            effects.extend(self.start_loading());
        } else {
            self.set_status(PlaybackStatus::Idle);
        }
        Ok(effects)
    }

    pub fn select_next_station(&mut self) -> Vec<Effect> {
        let next = (self.current + 1) % self.stations.len();
        self.select_station(next).unwrap_or_default()
    }

    pub fn select_previous_station(&mut self) -> Vec<Effect> {
        let count = self.stations.len();
        let prev = (self.current + count - 1) % count;
        self.select_station(prev).unwrap_or_default()
    }

    pub fn set_volume(&mut self, value: i32) -> Vec<Effect> {
        self.volume = clamp_volume(value);
        self.rev += 1;
        vec![Effect::SetVolume(self.volume)]
    }

    // ── player reports ────────────────────────────────────────────────────────

    pub fn on_player_event(&mut self, event: PlayerEvent) -> Vec<Effect> {
        if event.token != self.current_token() {
            debug!(
                "station: ignoring {:?} for stale {:?} (current {:?})",
                event.kind,
                event.token,
                self.current_token()
            );
            return Vec::new();
        }

        match event.kind {
            PlayerEventKind::Playing => {
                if self.status == PlaybackStatus::Loading {
                    info!("station: '{}' playing", self.current_station().name);
                    self.last_error = None;
                    self.advance_streak = 0;
                    self.set_status(PlaybackStatus::Playing);
                }
                Vec::new()
            }
            PlayerEventKind::Waiting => {
                if self.status == PlaybackStatus::Playing {
                    self.set_status(PlaybackStatus::Loading);
                }
                Vec::new()
            }
            PlayerEventKind::Paused => {
                if !self.is_active() {
                    return Vec::new();
                }
                // paused elsewhere: release the stream so a later play starts clean
                self.generation += 1;
                self.set_status(PlaybackStatus::Idle);
                vec![Effect::Stop]
            }
            PlayerEventKind::Failed(kind) => self.fail(kind),
        }
    }

    fn fail(&mut self, kind: PlaybackErrorKind) -> Vec<Effect> {
        if !self.is_active() {
            return Vec::new();
        }
        warn!(
            "station: '{}' failed: {:?}",
            self.current_station().name,
            kind
        );
        self.last_error = Some(kind);
        self.set_status(PlaybackStatus::Errored);

        let mut effects = vec![Effect::Stop];
        if kind == PlaybackErrorKind::UnsupportedFormat {
            if self.advance_streak + 1 < self.stations.len() {
                effects.push(Effect::ScheduleAdvance {
                    token: self.current_token(),
                    after: self.auto_advance_delay,
                });
            } else {
                warn!("station: every station failed to decode, giving up auto-advance");
                self.advance_streak = 0;
            }
        }
        effects
    }

    /// Timer armed by `ScheduleAdvance` fired.  Moves on to the next station
    /// and starts it, unless the visitor did something in the meantime.
    pub fn on_auto_advance(&mut self, token: LoadToken) -> Vec<Effect> {
        if token != self.current_token() || self.status != PlaybackStatus::Errored {
            debug!("station: auto-advance for {:?} superseded", token);
            return Vec::new();
        }
        let streak = self.advance_streak + 1;
        self.current = (self.current + 1) % self.stations.len();
        info!(
            "station: auto-advancing to '{}'",
            self.current_station().name
        );
        let mut effects = vec![Effect::Stop];
        effects.extend(self.start_loading());
        self.advance_streak = streak;
        effects
    }
}

fn clamp_volume(value: i32) -> u8 {
    value.clamp(0, 100) as u8
}
