/// StationCore: single-owner event loop for the radio widget.
///
/// All tasks that want to touch playback send `CoreEvent`s here.  The core
/// owns the `StationController` and the player backend (normally
/// `MpvDriver`) exclusively; nothing else talks to mpv.  Controller transitions come back as `Effect`s which
/// the core carries out in order (an effect may itself produce more, e.g. a
/// failed spawn turns into a player failure).
///
/// mpv reports are translated into `PlayerEvent`s by `EventMapper`, which
/// remembers which `LoadToken` each mpv playlist entry was loaded under.
/// After every event the core broadcasts a fresh `RadioSnapshot` if the
/// controller revision moved.
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::time::Duration;

use colectivo_proto::protocol::{PlaybackStatus, RadioCommand, RadioSnapshot};
use colectivo_proto::station::{
    Effect, LoadToken, PlaybackErrorKind, PlayerEvent, PlayerEventKind, StationController,
};
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::mpv::{MpvDriver, MpvEvent, MpvHandle, OBS_CORE_IDLE, OBS_PAUSE};

// ── CoreEvent ─────────────────────────────────────────────────────────────────

/// All inputs into the StationCore loop.
#[derive(Debug)]
pub enum CoreEvent {
    /// A command from the TUI.
    Command(RadioCommand),
    /// Raw mpv unsolicited event (forwarded from the reader task).
    Mpv(MpvEvent),
    /// An auto-advance timer fired.
    AutoAdvance(LoadToken),
    /// Liveness and connect-timeout check.
    HeartbeatTick,
    Shutdown,
}

/// What the core broadcasts to the UI.
#[derive(Debug, Clone)]
pub enum CoreBroadcast {
    StateUpdated(RadioSnapshot),
}

// ── EventMapper ───────────────────────────────────────────────────────────────

/// Translates mpv's view of the world (playlist entries, observed
/// properties, end-file reasons) into controller `PlayerEvent`s.
#[derive(Debug, Default)]
pub struct EventMapper {
    /// mpv playlist_entry_id → the attempt that loaded it.
    entries: HashMap<i64, LoadToken>,
    /// Load sent but mpv has not said which entry it became.
    pending: Option<LoadToken>,
    /// Attempt whose file mpv is currently on.
    active: Option<LoadToken>,
    audio_started: bool,
}

impl EventMapper {
    pub fn begin_load(&mut self, token: LoadToken, entry_id: Option<i64>) {
        match entry_id {
            Some(id) => {
                self.entries.insert(id, token);
                self.pending = None;
            }
            None => self.pending = Some(token),
        }
    }

    pub fn stopped(&mut self) {
        self.pending = None;
        self.active = None;
        self.audio_started = false;
    }

    /// Forget everything, e.g. after the mpv process died.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.stopped();
    }

    pub fn map(&mut self, evt: &MpvEvent) -> Option<PlayerEvent> {
        if let Some((obs_id, data)) = evt.as_property_change() {
            let token = self.active?;
            return match obs_id {
                OBS_CORE_IDLE => match data.as_bool() {
                    Some(false) => {
                        self.audio_started = true;
                        Some(PlayerEvent {
                            token,
                            kind: PlayerEventKind::Playing,
                        })
                    }
                    Some(true) if self.audio_started => Some(PlayerEvent {
                        token,
                        kind: PlayerEventKind::Waiting,
                    }),
                    _ => None,
                },
                OBS_PAUSE if data.as_bool() == Some(true) => Some(PlayerEvent {
                    token,
                    kind: PlayerEventKind::Paused,
                }),
                _ => None,
            };
        }

        match evt.event_name()? {
            "start-file" => {
                let token = match evt.playlist_entry_id() {
                    Some(id) => match self.entries.get(&id).copied() {
                        Some(t) => Some(t),
                        None => {
                            let t = self.pending.take()?;
                            self.entries.insert(id, t);
                            Some(t)
                        }
                    },
                    None => self.pending.take(),
                };
                debug!("mpv: start-file for {:?}", token);
                self.active = token;
                self.audio_started = false;
                None
            }
            "end-file" => {
                let token = match evt.playlist_entry_id() {
                    Some(id) => self.entries.remove(&id),
                    None => self.active,
                }?;
                if self.active == Some(token) {
                    self.active = None;
                    self.audio_started = false;
                }
                let reason = evt.str_field("reason").unwrap_or("unknown");
                let kind = classify_end_file(reason, evt.str_field("file_error"))?;
                Some(PlayerEvent {
                    token,
                    kind: PlayerEventKind::Failed(kind),
                })
            }
            _ => None,
        }
    }
}

/// `None` for endings that are not failures (our own stop/replace, quit).
pub fn classify_end_file(reason: &str, file_error: Option<&str>) -> Option<PlaybackErrorKind> {
    match reason {
        "error" => Some(PlaybackErrorKind::classify(file_error.unwrap_or("error"))),
        // a live stream has no natural end
        "eof" => Some(PlaybackErrorKind::Network),
        "aborted" => Some(PlaybackErrorKind::Aborted),
        _ => None,
    }
}

// ── PlayerBackend ─────────────────────────────────────────────────────────────

/// The process side of the playback element: something that can be started,
/// connected to and checked for liveness.  Commands go over the `MpvHandle`
/// it returns.
pub trait PlayerBackend: Send {
    /// Start (or restart) the player and open its IPC connection.
    fn connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> impl Future<Output = anyhow::Result<MpvHandle>> + Send;

    fn alive(&mut self) -> bool;

    /// Volume a freshly started player comes up at.
    fn set_start_volume(&mut self, volume: u8);

    fn shutdown(&mut self) -> impl Future<Output = ()> + Send;
}

impl PlayerBackend for MpvDriver {
    fn connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> impl Future<Output = anyhow::Result<MpvHandle>> + Send {
        self.spawn_and_connect(event_tx)
    }

    fn alive(&mut self) -> bool {
        self.process_alive()
    }

    fn set_start_volume(&mut self, volume: u8) {
        self.last_volume = volume;
    }

    fn shutdown(&mut self) -> impl Future<Output = ()> + Send {
        self.kill()
    }
}

// ── StationCore ───────────────────────────────────────────────────────────────

pub struct StationCore<B = MpvDriver> {
    controller: StationController,
    backend: B,
    /// Live handle to the mpv IO tasks.  `None` until the first load.
    mpv_handle: Option<MpvHandle>,
    mapper: EventMapper,
    /// Sender cloned into timers, the heartbeat and the mpv forwarder.
    event_tx: mpsc::Sender<CoreEvent>,
    broadcast_tx: broadcast::Sender<CoreBroadcast>,
    connect_timeout: Duration,
    /// Attempt currently waiting for audio, and since when.
    loading_since: Option<(LoadToken, Instant)>,
    last_rev: u64,
}

impl StationCore<MpvDriver> {
    pub fn new(
        controller: StationController,
        connect_timeout: Duration,
        broadcast_tx: broadcast::Sender<CoreBroadcast>,
        event_tx: mpsc::Sender<CoreEvent>,
    ) -> Self {
        let driver = MpvDriver::new(controller.volume());
        Self::with_backend(controller, driver, connect_timeout, broadcast_tx, event_tx)
    }
}

impl<B: PlayerBackend> StationCore<B> {
    pub fn with_backend(
        controller: StationController,
        backend: B,
        connect_timeout: Duration,
        broadcast_tx: broadcast::Sender<CoreBroadcast>,
        event_tx: mpsc::Sender<CoreEvent>,
    ) -> Self {
        Self {
            controller,
            backend,
            mpv_handle: None,
            mapper: EventMapper::default(),
            event_tx,
            broadcast_tx,
            connect_timeout,
            loading_since: None,
            last_rev: 0,
        }
    }

    /// Run the core event loop until `Shutdown`, then kill mpv.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<CoreEvent>) -> anyhow::Result<()> {
        info!("StationCore: starting event loop");

        let heartbeat_tx = self.event_tx.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;
                if heartbeat_tx.send(CoreEvent::HeartbeatTick).await.is_err() {
                    break;
                }
            }
        });

        self.publish();

        while let Some(evt) = event_rx.recv().await {
            if !self.handle_event(evt).await {
                break;
            }
        }

        self.cleanup().await;
        Ok(())
    }

    /// Process one event and publish the result.  False on `Shutdown`.
    async fn handle_event(&mut self, evt: CoreEvent) -> bool {
        match evt {
            CoreEvent::Shutdown => {
                info!("StationCore: shutdown requested");
                return false;
            }
            CoreEvent::Command(cmd) => {
                info!("StationCore: command {:?}", cmd);
                if let Err(e) = self.handle_command(cmd).await {
                    error!("StationCore: command error: {}", e);
                }
            }
            CoreEvent::Mpv(evt) => {
                debug!("mpv event: {:?}", evt.raw);
                if let Some(player_event) = self.mapper.map(&evt) {
                    let effects = self.controller.on_player_event(player_event);
                    self.apply(effects).await;
                }
            }
            CoreEvent::AutoAdvance(token) => {
                let effects = self.controller.on_auto_advance(token);
                self.apply(effects).await;
            }
            CoreEvent::HeartbeatTick => self.heartbeat().await,
        }
        self.publish();
        true
    }

    async fn handle_command(&mut self, cmd: RadioCommand) -> anyhow::Result<()> {
        let effects = match cmd {
            RadioCommand::Play => self.controller.play(),
            RadioCommand::Pause => self.controller.pause(),
            RadioCommand::Toggle => self.controller.toggle(),
            RadioCommand::Select { station_idx } => self.controller.select_station(station_idx)?,
            RadioCommand::Next => self.controller.select_next_station(),
            RadioCommand::Prev => self.controller.select_previous_station(),
            RadioCommand::Volume { value } => self.controller.set_volume(value),
            RadioCommand::GetState => {
                // force a broadcast even if nothing moved
                self.last_rev = 0;
                Vec::new()
            }
        };
        self.apply(effects).await;
        Ok(())
    }

    async fn heartbeat(&mut self) {
        if self.mpv_handle.is_some() && !self.backend.alive() {
            warn!("StationCore: heartbeat: mpv process died");
            self.mpv_handle = None;
            self.mapper.reset();
            self.fail_current(PlaybackErrorKind::Generic).await;
            return;
        }

        if let Some((_, since)) = self.loading_since {
            let elapsed = since.elapsed();
            if elapsed >= self.connect_timeout {
                warn!("mpv: no audio after {}s, giving up", elapsed.as_secs());
                self.fail_current(PlaybackErrorKind::Network).await;
            }
        }
    }

    async fn fail_current(&mut self, kind: PlaybackErrorKind) {
        let effects = self.controller.on_player_event(PlayerEvent {
            token: self.controller.current_token(),
            kind: PlayerEventKind::Failed(kind),
        });
        self.apply(effects).await;
    }

    // ── effects ───────────────────────────────────────────────────────────────

    async fn apply(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            debug!("StationCore: effect {:?}", effect);
            match effect {
                Effect::Load { url, token, volume } => {
                    if let Err(e) = self.load(&url, token, volume).await {
                        warn!("StationCore: load failed: {}", e);
                        queue.extend(self.controller.on_player_event(PlayerEvent {
                            token,
                            kind: PlayerEventKind::Failed(PlaybackErrorKind::Generic),
                        }));
                    }
                }
                Effect::Stop => {
                    self.mapper.stopped();
                    if let Some(handle) = self.mpv_handle.as_ref() {
                        if let Err(e) = handle.stop().await {
                            warn!("StationCore: mpv stop failed: {}", e);
                        }
                    }
                }
                Effect::SetVolume(volume) => {
                    self.backend.set_start_volume(volume);
                    if let Some(handle) = self.mpv_handle.as_ref() {
                        if let Err(e) = handle.set_volume(volume).await {
                            warn!("StationCore: mpv volume failed: {}", e);
                        }
                    }
                }
                Effect::ScheduleAdvance { token, after } => {
                    let tx = self.event_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let _ = tx.send(CoreEvent::AutoAdvance(token)).await;
                    });
                }
            }
        }
        self.track_loading();
    }

    async fn load(&mut self, url: &str, token: LoadToken, volume: u8) -> anyhow::Result<()> {
        self.backend.set_start_volume(volume);
        let handle = self.ensure_mpv_handle().await?;
        // mpv may emit start-file before we see the reply; park the token first
        self.mapper.begin_load(token, None);
        let entry_id = handle.load_stream(url, volume).await?;
        if entry_id.is_some() {
            self.mapper.begin_load(token, entry_id);
        }
        Ok(())
    }

    /// Restart the connect timer whenever a new attempt starts loading.
    fn track_loading(&mut self) {
        if self.controller.status() != PlaybackStatus::Loading {
            self.loading_since = None;
            return;
        }
        let token = self.controller.current_token();
        match self.loading_since {
            Some((t, _)) if t == token => {}
            _ => self.loading_since = Some((token, Instant::now())),
        }
    }

    async fn ensure_mpv_handle(&mut self) -> anyhow::Result<MpvHandle> {
        if self.mpv_handle.is_some() && !self.backend.alive() {
            warn!("StationCore: mpv process died, dropping handle");
            self.mpv_handle = None;
            self.mapper.reset();
        }

        if let Some(handle) = self.mpv_handle.as_ref() {
            return Ok(handle.clone());
        }

        // one forwarder per connection
        let (mpv_tx, mut mpv_rx) = mpsc::channel::<MpvEvent>(64);
        let core_tx = self.event_tx.clone();
        tokio::spawn(async move {
            while let Some(evt) = mpv_rx.recv().await {
                if core_tx.send(CoreEvent::Mpv(evt)).await.is_err() {
                    break;
                }
            }
        });

        let handle = self.backend.connect(mpv_tx).await?;
        handle.observe_properties().await;
        self.mpv_handle = Some(handle.clone());
        Ok(handle)
    }

    fn publish(&mut self) {
        self.track_loading();
        let snapshot = self.controller.snapshot();
        if snapshot.rev != self.last_rev {
            self.last_rev = snapshot.rev;
            let _ = self
                .broadcast_tx
                .send(CoreBroadcast::StateUpdated(snapshot));
        }
    }

    async fn cleanup(&mut self) {
        info!("StationCore: cleanup, killing mpv");
        if let Some(handle) = self.mpv_handle.take() {
            let _ = handle.stop().await;
        }
        self.backend.shutdown().await;
    }
}
