//! mpv JSON IPC adapter
//!
//! Talks to a running mpv through its `--input-ipc-server` unix socket.
//! Requests carry a `request_id`; a background reader task routes each reply
//! to the request waiting for it and skips event lines, so long-running
//! commands (`dump-cache`) do not block unrelated queries.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// How often seek completion is polled
const SEEK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long OSD messages stay on screen
const OSD_DURATION_MS: u64 = 3000;

type Reply = Result<Value, String>;
type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Reply>>>>;

/// Player port over mpv's JSON IPC
pub struct MpvIpcAdapter {
    socket: PathBuf,
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    pending: PendingMap,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
}

#[derive(Debug, Deserialize)]
struct Track {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    selected: bool,
    #[serde(default)]
    external: bool,
    #[serde(rename = "external-filename")]
    external_filename: Option<String>,
}

impl MpvIpcAdapter {
    /// Connect to the IPC socket of a running mpv
    pub async fn connect(socket: impl AsRef<Path>) -> Result<Self, ClipError> {
        let socket = socket.as_ref().to_path_buf();
        let stream = UnixStream::connect(&socket).await.map_err(|e| {
            ClipError::Player(format!(
                "cannot connect to mpv IPC socket {}: {}",
                socket.display(),
                e
            ))
        })?;
        let (read_half, write_half) = stream.into_split();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let reader = tokio::spawn(read_replies(read_half, Arc::clone(&pending)));
        debug!(socket = %socket.display(), "connected to mpv");

        Ok(Self {
            socket,
            writer: tokio::sync::Mutex::new(write_half),
            pending,
            next_id: AtomicU64::new(1),
            reader,
        })
    }

    pub fn socket(&self) -> &Path {
        &self.socket
    }

    /// Send a command and wait for its reply
    pub async fn command(&self, args: Value) -> Result<Value, ClipError> {
        self.request(args, false).await
    }

    /// Send a command mpv runs off its main thread
    pub async fn command_async(&self, args: Value) -> Result<Value, ClipError> {
        self.request(args, true).await
    }

    async fn request(&self, args: Value, run_async: bool) -> Result<Value, ClipError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut message = json!({ "command": args, "request_id": id });
        if run_async {
            message["async"] = Value::Bool(true);
        }
        let mut line = serde_json::to_string(&message)
            .map_err(|e| ClipError::Player(format!("cannot encode command: {}", e)))?;
        line.push('\n');

        let (tx, rx) = oneshot::channel();
        lock_pending(&self.pending).insert(id, tx);
        trace!(request = %line.trim_end(), "mpv request");

        let written = {
            let mut writer = self.writer.lock().await;
            writer.write_all(line.as_bytes()).await
        };
        if let Err(e) = written {
            lock_pending(&self.pending).remove(&id);
            return Err(ClipError::Player(format!("cannot write to mpv: {}", e)));
        }

        match rx.await {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(error)) => Err(ClipError::Player(format!(
                "mpv rejected {}: {}",
                message["command"], error
            ))),
            Err(_) => Err(ClipError::Player("mpv connection closed".to_string())),
        }
    }

    /// Read a property and deserialize it
    pub async fn get_property<T: DeserializeOwned>(&self, name: &str) -> Result<T, ClipError> {
        let data = self.command(json!(["get_property", name])).await?;
        serde_json::from_value(data)
            .map_err(|e| ClipError::Player(format!("unexpected value for {}: {}", name, e)))
    }

    /// Read a property that may be unavailable
    async fn get_optional<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        match self.get_property(name).await {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(property = name, error = %err, "property unavailable");
                None
            }
        }
    }

    /// Read a track selection property (`aid`, `sid`, `vid`)
    async fn track_id(&self, name: &str) -> Option<i64> {
        self.get_optional::<Value>(name)
            .await
            .and_then(|value| value.as_i64())
    }
}

impl Drop for MpvIpcAdapter {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

fn lock_pending(
    pending: &PendingMap,
) -> std::sync::MutexGuard<'_, HashMap<u64, oneshot::Sender<Reply>>> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Route replies to their requests until the socket closes
async fn read_replies(read_half: OwnedReadHalf, pending: PendingMap) {
    let mut lines = BufReader::new(read_half).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => dispatch_reply(&line, &pending),
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "error reading from mpv");
                break;
            }
        }
    }
    // Dropping the senders wakes every waiter with a closed-connection error
    lock_pending(&pending).clear();
    debug!("mpv connection closed");
}

fn dispatch_reply(line: &str, pending: &PendingMap) {
    let message: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, line, "ignoring malformed mpv message");
            return;
        }
    };
    if let Some(event) = message.get("event") {
        trace!(%event, "mpv event");
        return;
    }
    let Some(id) = message.get("request_id").and_then(Value::as_u64) else {
        return;
    };
    let Some(tx) = lock_pending(pending).remove(&id) else {
        return;
    };
    let reply = match message.get("error").and_then(Value::as_str) {
        Some("success") | None => Ok(message.get("data").cloned().unwrap_or(Value::Null)),
        Some(error) => Err(error.to_string()),
    };
    let _ = tx.send(reply);
}

#[async_trait]
impl PlayerPort for MpvIpcAdapter {
    async fn playback_state(&self) -> Result<PlaybackState, ClipError> {
        let path: String = self.get_property("path").await?;
        let tracks: Vec<Track> = self.get_optional("track-list").await.unwrap_or_default();
        let subtitle_file = tracks
            .into_iter()
            .find(|t| t.kind == "sub" && t.selected && t.external)
            .and_then(|t| t.external_filename.map(PathBuf::from));

        Ok(PlaybackState {
            path,
            title: self.get_optional("media-title").await,
            is_network: self
                .get_optional("demuxer-via-network")
                .await
                .unwrap_or(false),
            sub_delay: self.get_optional("sub-delay").await.unwrap_or(0.0),
            audio_track: self.track_id("aid").await,
            subtitle_track: self.track_id("sid").await,
            video_track: self.track_id("vid").await,
            subtitle_file,
            volume: self.get_optional("volume").await.unwrap_or(100.0),
            mute: self.get_optional("mute").await.unwrap_or(false),
            crop: None,
        })
    }

    async fn time_pos(&self) -> Result<f64, ClipError> {
        self.get_property("time-pos").await
    }

    async fn dump_cache(&self, start: f64, end: f64, path: &Path) -> Result<(), ClipError> {
        debug!(start, end, path = %path.display(), "dumping demuxer cache");
        self.command_async(json!([
            "dump-cache",
            start,
            end,
            path.to_string_lossy()
        ]))
        .await
        .map(|_| ())
    }

    async fn seek_keyframe(&self, target: f64) -> Result<f64, ClipError> {
        self.command(json!(["seek", target, "absolute+keyframes"]))
            .await?;
        loop {
            tokio::time::sleep(SEEK_POLL_INTERVAL).await;
            let seeking: bool = self.get_optional("seeking").await.unwrap_or(false);
            if !seeking {
                break;
            }
        }
        let achieved = self.time_pos().await?;
        debug!(target, achieved, "seek settled");
        Ok(achieved)
    }

    async fn show_text(&self, message: &str) {
        if let Err(err) = self
            .command(json!(["show-text", message, OSD_DURATION_MS]))
            .await
        {
            warn!(error = %err, "cannot show message on mpv");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UnixListener;

    /// Minimal mpv stand-in answering property reads from a fixed table
    async fn serve_fake_mpv(listener: UnixListener, properties: Value) {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let request: Value = serde_json::from_str(&line).unwrap();
            let id = request["request_id"].clone();
            let command = request["command"].as_array().cloned().unwrap_or_default();
            let reply = match command.first().and_then(Value::as_str) {
                Some("get_property") => {
                    let name = command[1].as_str().unwrap_or_default();
                    match properties.get(name) {
                        Some(value) => json!({"data": value, "error": "success", "request_id": id}),
                        None => json!({"error": "property unavailable", "request_id": id}),
                    }
                }
                Some(_) => json!({"error": "success", "request_id": id}),
                None => json!({"error": "invalid parameter", "request_id": id}),
            };
            // Interleave an event to check replies are still matched
            let event = json!({"event": "property-change", "name": "time-pos"});
            let out = format!("{}\n{}\n", event, reply);
            if write_half.write_all(out.as_bytes()).await.is_err() {
                break;
            }
        }
    }

    async fn connect_fake(properties: Value) -> (tempfile::TempDir, MpvIpcAdapter) {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("mpv.sock");
        let listener = UnixListener::bind(&socket).unwrap();
        tokio::spawn(serve_fake_mpv(listener, properties));
        let adapter = MpvIpcAdapter::connect(&socket).await.unwrap();
        (dir, adapter)
    }

    #[tokio::test]
    async fn test_reads_playback_state() {
        let (_dir, mpv) = connect_fake(json!({
            "path": "https://example.com/stream.m3u8",
            "media-title": "Live",
            "demuxer-via-network": true,
            "sub-delay": 1.5,
            "aid": 2,
            "sid": false,
            "vid": 1,
            "volume": 80.0,
            "mute": false,
            "track-list": [
                {"id": 1, "type": "sub", "external": true, "external-filename": "/subs/en.srt"},
                {"id": 2, "type": "sub", "external": false},
                {"id": 1, "type": "audio", "external": false}
            ]
        }))
        .await;

        let state = mpv.playback_state().await.unwrap();
        assert_eq!(state.path, "https://example.com/stream.m3u8");
        assert_eq!(state.title.as_deref(), Some("Live"));
        assert!(state.is_network);
        assert_eq!(state.sub_delay, 1.5);
        assert_eq!(state.audio_track, Some(2));
        assert_eq!(state.subtitle_track, None);
        assert_eq!(state.video_track, Some(1));
        assert_eq!(state.subtitle_file, None);
        assert_eq!(state.volume, 80.0);
    }

    #[tokio::test]
    async fn test_selected_subtitle_origin() {
        let tracks = json!([
            {"id": 1, "type": "sub", "selected": false, "external": false},
            {"id": 2, "type": "sub", "selected": true, "external": true, "external-filename": "/subs/en.srt"}
        ]);
        let (_dir, mpv) = connect_fake(json!({"path": "a.mkv", "sid": 2, "track-list": tracks})).await;
        let state = mpv.playback_state().await.unwrap();
        assert_eq!(state.subtitle_track, Some(2));
        assert_eq!(state.subtitle_file, Some(PathBuf::from("/subs/en.srt")));

        let tracks = json!([
            {"id": 1, "type": "sub", "selected": true, "external": false},
            {"id": 2, "type": "sub", "selected": false, "external": true, "external-filename": "/subs/en.srt"}
        ]);
        let (_dir, mpv) = connect_fake(json!({"path": "a.mkv", "sid": 1, "track-list": tracks})).await;
        let state = mpv.playback_state().await.unwrap();
        assert_eq!(state.subtitle_track, Some(1));
        assert_eq!(state.subtitle_file, None);
    }

    #[tokio::test]
    async fn test_missing_property_is_player_error() {
        let (_dir, mpv) = connect_fake(json!({})).await;
        let err = mpv.time_pos().await.unwrap_err();
        assert!(matches!(err, ClipError::Player(_)));
    }

    #[tokio::test]
    async fn test_seek_reports_achieved_position() {
        let (_dir, mpv) = connect_fake(json!({"seeking": false, "time-pos": 9.76})).await;
        assert_eq!(mpv.seek_keyframe(10.0).await.unwrap(), 9.76);
    }

    #[tokio::test]
    async fn test_connect_to_missing_socket_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = MpvIpcAdapter::connect(dir.path().join("absent.sock")).await;
        assert!(matches!(result, Err(ClipError::Player(_))));
    }
}
