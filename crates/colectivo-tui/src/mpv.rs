//! mpv JSON IPC: the radio's single playback element.
//!
//! One IO task per connection owns both socket halves.  It writes queued
//! commands, matches replies to callers by `request_id`, and forwards
//! everything unsolicited (events, property changes) to the core.
//!
//! `MpvDriver` owns the child process.  Spawning kills the previous process
//! first, so a driver never has two streams going.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use colectivo_proto::platform;

/// observe_property ids echoed back in property-change events.
pub const OBS_CORE_IDLE: u64 = 1;
pub const OBS_PAUSE: u64 = 2;

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_ATTEMPTS: u32 = 50;
const CONNECT_INTERVAL: Duration = Duration::from_millis(100);

/// The mpv commands the station core needs.
#[derive(Debug, Clone, PartialEq)]
pub enum MpvCommand {
    LoadFile(String),
    Stop,
    SetVolume(u8),
    SetPause(bool),
    Observe { id: u64, property: &'static str },
}

impl MpvCommand {
    fn to_json(&self) -> Value {
        match self {
            MpvCommand::LoadFile(url) => json!(["loadfile", url, "replace"]),
            MpvCommand::Stop => json!(["stop"]),
            MpvCommand::SetVolume(v) => json!(["set_property", "volume", v]),
            MpvCommand::SetPause(p) => json!(["set_property", "pause", p]),
            MpvCommand::Observe { id, property } => json!(["observe_property", id, property]),
        }
    }
}

/// Something mpv said without being asked.
#[derive(Debug, Clone)]
pub struct MpvEvent {
    pub raw: Value,
}

impl MpvEvent {
    /// `(observe id, data)` when this is a property-change.
    pub fn as_property_change(&self) -> Option<(u64, &Value)> {
        if self.event_name()? != "property-change" {
            return None;
        }
        let id = self.raw.get("id")?.as_u64()?;
        Some((id, self.raw.get("data").unwrap_or(&Value::Null)))
    }

    pub fn event_name(&self) -> Option<&str> {
        self.str_field("event")
    }

    pub fn playlist_entry_id(&self) -> Option<i64> {
        self.raw.get("playlist_entry_id")?.as_i64()
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.raw.get(key)?.as_str()
    }
}

struct Request {
    command: MpvCommand,
    reply: oneshot::Sender<anyhow::Result<Value>>,
}

// ── handle ────────────────────────────────────────────────────────────────────

/// Cloneable sender side of a live connection.
#[derive(Clone)]
pub struct MpvHandle {
    tx: mpsc::Sender<Request>,
}

impl MpvHandle {
    /// Send one command and wait for mpv's reply.
    pub async fn send(&self, command: MpvCommand) -> anyhow::Result<Value> {
        let (reply, rx) = oneshot::channel();
        let what = format!("{:?}", command);
        self.tx
            .send(Request { command, reply })
            .await
            .map_err(|_| anyhow::anyhow!("mpv connection closed"))?;
        tokio::time::timeout(REPLY_TIMEOUT, rx)
            .await
            .map_err(|_| anyhow::anyhow!("mpv did not answer {}", what))?
            .map_err(|_| anyhow::anyhow!("mpv connection dropped during {}", what))?
    }

    /// Replace whatever is playing with `url`.  Returns mpv's playlist entry
    /// id when this mpv build reports one.
    pub async fn load_stream(&self, url: &str, volume: u8) -> anyhow::Result<Option<i64>> {
        if let Err(e) = self.send(MpvCommand::SetVolume(volume)).await {
            debug!("mpv: volume before load failed: {}", e);
        }
        if let Err(e) = self.send(MpvCommand::SetPause(false)).await {
            debug!("mpv: unpause before load failed: {}", e);
        }
        let resp = self.send(MpvCommand::LoadFile(url.to_string())).await?;
        Ok(resp
            .pointer("/data/playlist_entry_id")
            .and_then(Value::as_i64))
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        self.send(MpvCommand::Stop).await.map(|_| ())
    }

    pub async fn set_volume(&self, volume: u8) -> anyhow::Result<()> {
        self.send(MpvCommand::SetVolume(volume)).await.map(|_| ())
    }

    /// Subscribe to the properties `EventMapper` reads.  Needed once per
    /// connection.
    pub async fn observe_properties(&self) {
        for (id, property) in [(OBS_CORE_IDLE, "core-idle"), (OBS_PAUSE, "pause")] {
            if let Err(e) = self.send(MpvCommand::Observe { id, property }).await {
                warn!("mpv: observing {} failed: {}", property, e);
            }
        }
    }
}

// ── connection task ───────────────────────────────────────────────────────────

/// Start the IO task for an already-open connection.
pub fn attach<R, W>(read: R, write: W, event_tx: mpsc::Sender<MpvEvent>) -> MpvHandle
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(connection_task(BufReader::new(read), write, rx, event_tx));
    MpvHandle { tx }
}

async fn connection_task<R, W>(
    reader: BufReader<R>,
    mut writer: W,
    mut requests: mpsc::Receiver<Request>,
    event_tx: mpsc::Sender<MpvEvent>,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut waiting: HashMap<u64, oneshot::Sender<anyhow::Result<Value>>> = HashMap::new();
    let mut next_id: u64 = 1;
    let mut lines = reader.lines();

    let reason = loop {
        tokio::select! {
            req = requests.recv() => {
                let Some(req) = req else { break "handle dropped" };
                let id = next_id;
                next_id += 1;
                let mut line = json!({ "command": req.command.to_json(), "request_id": id }).to_string();
                line.push('\n');
                debug!("mpv ← {}", line.trim_end());
                if let Err(e) = writer.write_all(line.as_bytes()).await {
                    warn!("mpv: write failed: {}", e);
                    let _ = req.reply.send(Err(anyhow::anyhow!("mpv write failed: {}", e)));
                    break "write error";
                }
                waiting.insert(id, req.reply);
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break "socket closed",
                    Err(e) => {
                        warn!("mpv: read failed: {}", e);
                        break "read error";
                    }
                };
                let Some(val) = parse_line(&line) else { continue };
                match val.get("request_id").and_then(Value::as_u64) {
                    Some(id) => match waiting.remove(&id) {
                        Some(reply) => {
                            let _ = reply.send(into_reply(val));
                        }
                        None => debug!("mpv: reply for unknown request {}", id),
                    },
                    None => {
                        if event_tx.send(MpvEvent { raw: val }).await.is_err() {
                            break "core gone";
                        }
                    }
                }
            }
        }
    };

    debug!("mpv: connection task ending ({})", reason);
    for (_, reply) in waiting.drain() {
        let _ = reply.send(Err(anyhow::anyhow!("mpv connection ended: {}", reason)));
    }
}

fn parse_line(line: &str) -> Option<Value> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("mpv: unparseable line {:?}: {}", line, e);
            None
        }
    }
}

fn into_reply(val: Value) -> anyhow::Result<Value> {
    match val.get("error").and_then(Value::as_str) {
        Some("success") => Ok(val),
        Some(err) => Err(anyhow::anyhow!("mpv: {}", err)),
        None => Err(anyhow::anyhow!("mpv: reply without status")),
    }
}

// ── process ───────────────────────────────────────────────────────────────────

pub struct MpvDriver {
    socket_name: String,
    process: Option<tokio::process::Child>,
    /// Volume a freshly spawned process starts at.
    pub last_volume: u8,
}

impl MpvDriver {
    pub fn new(volume: u8) -> Self {
        Self {
            socket_name: platform::mpv_socket_name(),
            process: None,
            last_volume: volume,
        }
    }

    pub fn process_alive(&mut self) -> bool {
        let Some(child) = self.process.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                warn!("mpv exited: {}", status);
                false
            }
            Err(e) => {
                warn!("mpv: try_wait failed: {}", e);
                false
            }
        }
    }

    pub async fn kill(&mut self) {
        if let Some(mut child) = self.process.take() {
            if let Err(e) = child.kill().await {
                debug!("mpv: kill: {}", e);
            }
        }
    }

    fn spawn_process(&mut self) -> anyhow::Result<()> {
        let binary =
            platform::find_mpv_binary().ok_or_else(|| anyhow::anyhow!("mpv binary not found"))?;
        let data_dir = platform::data_dir();
        std::fs::create_dir_all(&data_dir)?;
        let stderr = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(data_dir.join("mpv-stderr.log"))?;

        let child = tokio::process::Command::new(&binary)
            .args(["--no-video", "--idle=yes", "--quiet", "--no-terminal"])
            .arg(platform::mpv_socket_arg())
            .arg(format!("--volume={}", self.last_volume))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()?;
        info!("mpv: started {} (pid {:?})", binary.display(), child.id());
        self.process = Some(child);
        Ok(())
    }

    /// Kill any previous mpv, start a new one and connect to its IPC server.
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;
        #[cfg(unix)]
        {
            let _ = tokio::fs::remove_file(&self.socket_name).await;
        }
        self.spawn_process()?;

        for _ in 0..CONNECT_ATTEMPTS {
            tokio::time::sleep(CONNECT_INTERVAL).await;
            if !self.process_alive() {
                anyhow::bail!("mpv exited during startup");
            }
            if let Some(handle) = connect_ipc(&self.socket_name, event_tx.clone()).await {
                info!("mpv: IPC connected");
                return Ok(handle);
            }
        }
        anyhow::bail!("mpv IPC endpoint never appeared")
    }
}

#[cfg(unix)]
async fn connect_ipc(endpoint: &str, event_tx: mpsc::Sender<MpvEvent>) -> Option<MpvHandle> {
    let stream = tokio::net::UnixStream::connect(endpoint).await.ok()?;
    let (read, write) = stream.into_split();
    Some(attach(read, write, event_tx))
}

#[cfg(windows)]
async fn connect_ipc(endpoint: &str, event_tx: mpsc::Sender<MpvEvent>) -> Option<MpvHandle> {
    let pipe = format!(r"\\.\pipe\{}", endpoint);
    let client = tokio::net::windows::named_pipe::ClientOptions::new()
        .open(&pipe)
        .ok()?;
    let (read, write) = tokio::io::split(client);
    Some(attach(read, write, event_tx))
}
