//! App: component-based event loop.
//!
//! - `App` owns the components and `AppState` (read-only for components).
//! - A `tokio::mpsc` channel carries `AppMessage`s in from background tasks:
//!   terminal input, station snapshots, finished chat typing timers.
//! - Components return `Vec<Action>`; App dispatches each Action.
//! - Radio commands flow out to the `StationCore` through `core_tx`.

use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use colectivo_proto::chat::{deliver_after, PendingReply};
use colectivo_proto::config::Config;
use colectivo_proto::links::PLACEHOLDER;
use colectivo_proto::protocol::{PlaybackStatus, RadioCommand, RadioSnapshot};

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;
use crate::component::Component;
use crate::components::{
    chat_panel::ChatPanel, header, links_overlay::LinksOverlay, radio_panel::RadioPanel,
};
use crate::core::{CoreBroadcast, CoreEvent};
use crate::widgets::{status_bar, toast::ToastManager};

/// Everything that can wake the event loop.
#[derive(Debug)]
pub enum AppMessage {
    Event(Event),
    Radio(RadioSnapshot),
    /// A chat typing delay ran out.
    Reply(PendingReply),
}

impl From<PendingReply> for AppMessage {
    fn from(pending: PendingReply) -> Self {
        AppMessage::Reply(pending)
    }
}

pub struct App {
    state: AppState,
    chat: ChatPanel,
    radio: RadioPanel,
    links: LinksOverlay,
    toast: ToastManager,
    core_tx: mpsc::Sender<CoreEvent>,
    reply_delay: Duration,
    msg_tx: mpsc::Sender<AppMessage>,
    msg_rx: Option<mpsc::Receiver<AppMessage>>,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, core_tx: mpsc::Sender<CoreEvent>) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel::<AppMessage>(1024);
        Self {
            state: AppState::new(config.links.clone()),
            chat: ChatPanel::new(),
            radio: RadioPanel::new(),
            links: LinksOverlay::new(),
            toast: ToastManager::new(),
            core_tx,
            reply_delay: config.chat.reply_delay(),
            msg_tx,
            msg_rx: Some(msg_rx),
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(
        mut self,
        mut broadcast_rx: broadcast::Receiver<CoreBroadcast>,
    ) -> anyhow::Result<()> {
        let mut rx = self
            .msg_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("app already running"))?;

        // ── Background task: keyboard events ─────────────────────────────────
        let event_tx = self.msg_tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: station snapshots ────────────────────────────────
        let bc_tx = self.msg_tx.clone();
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(CoreBroadcast::StateUpdated(snapshot)) => {
                        if bc_tx.send(AppMessage::Radio(snapshot)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("broadcast receiver lagged by {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        // the core only broadcasts on change; ask for the current state once
        self.dispatch(Action::SendCommand(RadioCommand::GetState))
            .await;

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let result = self.event_loop(&mut terminal, &mut rx).await;

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        rx: &mut mpsc::Receiver<AppMessage>,
    ) -> anyhow::Result<()> {
        // toast expiry, spinner and typing animation
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    self.handle_message(msg).await;
                    // drain whatever else is queued before the next frame
                    while let Ok(next) = rx.try_recv() {
                        self.handle_message(next).await;
                    }
                    needs_redraw = true;
                }

                _ = ui_tick.tick() => {
                    self.toast.tick();
                    let actions = {
                        let s = &self.state;
                        let mut all = self.chat.tick(s);
                        all.extend(self.radio.tick(s));
                        all
                    };
                    for action in actions {
                        self.dispatch(action).await;
                    }
                    needs_redraw = true;
                }
            }
        }
        Ok(())
    }

    // ── Messages ──────────────────────────────────────────────────────────────

    async fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                for action in self.handle_key(key) {
                    self.dispatch(action).await;
                }
            }
            AppMessage::Event(_) => {}
            AppMessage::Radio(snapshot) => self.on_snapshot(snapshot),
            AppMessage::Reply(pending) => {
                if !self.chat.complete_reply(pending) {
                    debug!("app: reply from a reset conversation dropped");
                }
            }
        }
    }

    fn on_snapshot(&mut self, snapshot: RadioSnapshot) {
        if let Some(error) = self.state.apply_snapshot(snapshot) {
            self.toast.error(error);
        }
        match (self.state.radio.status, self.state.current_station()) {
            (PlaybackStatus::Loading, Some(station)) => {
                let msg = format!("Conectando con {}…", station.name);
                self.toast.spinner(msg);
            }
            _ => self.toast.dismiss_spinner(),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return vec![Action::Quit];
        }
        if self.state.show_links {
            return self.links.handle_key(key, &self.state);
        }
        match key.code {
            KeyCode::F(2) => vec![Action::ToggleLinks],
            KeyCode::Tab | KeyCode::BackTab => vec![Action::FocusNext],
            _ => match self.state.focus {
                ComponentId::RadioPanel => self.radio.handle_key(key, &self.state),
                _ => self.chat.handle_key(key, &self.state),
            },
        }
    }

    // ── Actions ───────────────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action) {
        debug!("dispatch: {:?}", action);
        match action {
            Action::SendCommand(cmd) => {
                if self.core_tx.send(CoreEvent::Command(cmd)).await.is_err() {
                    warn!("station core is gone");
                    self.toast.error("La radio no está disponible");
                }
            }
            Action::ReplyQueued(pending) => {
                self.state.last_user_text = self.chat.engine().last_user_text().map(str::to_string);
                tokio::spawn(deliver_after(
                    self.reply_delay,
                    pending,
                    self.msg_tx.clone(),
                ));
            }
            Action::ResetChat => {
                self.chat.on_action(&Action::ResetChat, &self.state);
                self.state.last_user_text = None;
                self.toast.info("Conversación reiniciada");
            }
            Action::FocusNext => {
                self.state.focus = match self.state.focus {
                    ComponentId::ChatPanel => ComponentId::RadioPanel,
                    _ => ComponentId::ChatPanel,
                };
            }
            Action::ToggleLinks => self.state.show_links = !self.state.show_links,
            Action::CopyLink { label, url } => {
                if url == PLACEHOLDER {
                    self.toast.warning(format!("{} no está configurado", label));
                    return;
                }
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(url.clone())) {
                    Ok(()) => {
                        info!("copied {} link", label);
                        self.toast.success(format!("Enlace de {} copiado", label));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("No se pudo copiar: {}", url));
                    }
                }
            }
            Action::Quit => self.should_quit = true,
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;

        let area = frame.area();
        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Length(1), // separator
                Constraint::Min(6),    // body
                Constraint::Length(1), // status line
                Constraint::Length(1), // keys
            ])
            .split(area);

        header::draw(frame, rows[0], &self.state);
        status_bar::draw_separator(frame, rows[1]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[2]);
        let focus = self.state.focus;
        let overlay = self.state.show_links;
        self.chat.draw(
            frame,
            body[0],
            !overlay && focus == ComponentId::ChatPanel,
            &self.state,
        );
        self.radio.draw(
            frame,
            body[1],
            !overlay && focus == ComponentId::RadioPanel,
            &self.state,
        );

        status_bar::draw_status_line(
            frame,
            rows[3],
            self.state.status_line.as_deref(),
            self.state.connected,
        );
        let keys_focus = if overlay {
            ComponentId::LinksOverlay
        } else {
            focus
        };
        status_bar::draw_keys_bar(frame, rows[4], keys_focus);

        if overlay {
            self.links.draw(frame, rows[2], true, &self.state);
        }
        self.toast.draw(frame, rows[2]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colectivo_proto::catalog::builtin_stations;
    use colectivo_proto::protocol::PlaybackState;

    fn key(code: KeyCode) -> AppMessage {
        AppMessage::Event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn app() -> (App, mpsc::Receiver<CoreEvent>) {
        let (core_tx, core_rx) = mpsc::channel(16);
        (App::new(&Config::default(), core_tx), core_rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_reply_lands_after_typing_delay() {
        let (mut app, _core_rx) = app();
        let mut rx = app.msg_rx.take().unwrap();
        for c in "¿Dónde quedan?".chars() {
            app.handle_message(key(KeyCode::Char(c))).await;
        }
        app.handle_message(key(KeyCode::Enter)).await;
        assert!(app.chat.engine().is_typing());
        assert_eq!(app.state.last_user_text.as_deref(), Some("¿Dónde quedan?"));

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert!(rx.try_recv().is_err());
        tokio::time::sleep(Duration::from_millis(2)).await;

        let msg = rx.recv().await.unwrap();
        app.handle_message(msg).await;
        let transcript = app.chat.engine().transcript();
        assert_eq!(transcript.len(), 3);
        assert!(transcript[2].from_bot);
        assert!(!app.chat.engine().is_typing());
    }

    #[tokio::test]
    async fn test_radio_keys_reach_the_core() {
        let (mut app, mut core_rx) = app();
        app.handle_message(key(KeyCode::Tab)).await;
        assert_eq!(app.state.focus, ComponentId::RadioPanel);
        app.handle_message(key(KeyCode::Char(' '))).await;
        app.handle_message(key(KeyCode::Char('n'))).await;
        assert!(matches!(
            core_rx.recv().await,
            Some(CoreEvent::Command(RadioCommand::Toggle))
        ));
        assert!(matches!(
            core_rx.recv().await,
            Some(CoreEvent::Command(RadioCommand::Next))
        ));
    }

    #[tokio::test]
    async fn test_q_only_quits_from_radio() {
        let (mut app, _core_rx) = app();
        app.handle_message(key(KeyCode::Char('q'))).await;
        assert!(!app.should_quit);
        app.handle_message(key(KeyCode::Tab)).await;
        app.handle_message(key(KeyCode::Char('q'))).await;
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_links_overlay_is_modal() {
        let (mut app, mut core_rx) = app();
        app.handle_message(key(KeyCode::Tab)).await;
        app.handle_message(key(KeyCode::F(2))).await;
        assert!(app.state.show_links);
        app.handle_message(key(KeyCode::Char(' '))).await;
        assert!(core_rx.try_recv().is_err());
        // nothing configured: warns instead of copying
        app.handle_message(key(KeyCode::Char('2'))).await;
        app.handle_message(key(KeyCode::Esc)).await;
        assert!(!app.state.show_links);
    }

    #[tokio::test]
    async fn test_snapshot_error_sets_status_line() {
        let (mut app, _core_rx) = app();
        let snapshot = RadioSnapshot {
            rev: 3,
            stations: builtin_stations(),
            current_station: 0,
            status: PlaybackStatus::Errored,
            playback: PlaybackState {
                volume: 70,
                last_error: Some("Error de red al conectar con la estación.".to_string()),
                ..PlaybackState::default()
            },
        };
        app.handle_message(AppMessage::Radio(snapshot)).await;
        assert!(app.state.connected);
        assert_eq!(
            app.state.status_line.as_deref(),
            Some("Error de red al conectar con la estación.")
        );
        assert!(!app.toast.is_empty());
    }
}
