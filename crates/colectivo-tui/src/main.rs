mod action;
mod app;
mod app_state;
mod component;
mod components;
mod core;
mod mpv;
mod theme;
mod widgets;

use tokio::sync::{broadcast, mpsc};

use colectivo_proto::catalog::load_stations;
use colectivo_proto::station::StationController;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = colectivo_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("colectivo.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // the TUI owns the screen from here on
    eprintln!("colectivo log: {}", log_path.display());

    tracing::info!("colectivo starting…");

    // ── config ───────────────────────────────────────────────────────────────
    let config = match colectivo_proto::config::Config::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("config unreadable, using defaults: {}", e);
            colectivo_proto::config::Config::default()
        }
    };

    // ── Station controller ───────────────────────────────────────────────────
    let stations = load_stations(&config.radio);
    let controller = StationController::new(
        stations,
        config.radio.default_volume as i32,
        config.radio.auto_advance_delay(),
    )?;

    // ── Broadcast channel (StationCore → TUI) ────────────────────────────────
    let (broadcast_tx, broadcast_rx) = broadcast::channel::<core::CoreBroadcast>(256);

    // ── CoreEvent channel (TUI/timers/mpv → StationCore) ─────────────────────
    let (event_tx, event_rx) = mpsc::channel::<core::CoreEvent>(1024);

    let station_core = core::StationCore::new(
        controller,
        config.radio.connect_timeout(),
        broadcast_tx,
        event_tx.clone(),
    );
    let core_task = tokio::spawn(async move {
        if let Err(e) = station_core.run(event_rx).await {
            tracing::error!("StationCore exited with error: {}", e);
        }
    });

    // ── front end ────────────────────────────────────────────────────────────
    let app = app::App::new(&config, event_tx.clone());
    let result = app.run(broadcast_rx).await;

    // stop mpv before leaving
    let _ = event_tx.send(core::CoreEvent::Shutdown).await;
    let _ = core_task.await;
    tracing::info!("colectivo stopped");

    result
}
