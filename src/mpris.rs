//! MPRIS bridge: media keys and desktop widgets in, now-playing metadata out.
//!
//! The D-Bus side runs on its own thread. Handlers only forward a `ControlCmd`
//! to the control thread; the shared state they read is written by the
//! control thread through `MprisHandle`.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::block_on;
use tracing::{debug, warn};
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedValue, Value};

use crate::catalog::Track;
use crate::player::PlaybackStatus;

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.vaultplay";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
}

#[derive(Debug, Default)]
struct SharedState {
    playback: PlaybackStatus,
    track_id: Option<String>,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    /// A handle with no bus service behind it.
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        let (notify, _) = mpsc::channel();
        Self {
            state: Arc::default(),
            notify,
        }
    }

    pub fn set_playback(&self, playback: PlaybackStatus) {
        if let Ok(mut s) = self.state.lock() {
            s.playback = playback;
        }
        let _ = self.notify.send(());
    }

    /// Publish `track` as now playing, or clear the metadata.
    pub fn set_track_metadata(&self, track: Option<&Track>) {
        if let Ok(mut s) = self.state.lock() {
            match track {
                Some(t) => {
                    s.track_id = Some(format!("{OBJECT_PATH}/track/{}", t.id));
                    s.title = Some(t.title.clone());
                    s.artist = vec![t.artist.clone()];
                    s.album = t.album.clone();
                    s.url = Some(t.audio_url.clone());
                    s.art_url = t.cover_url.clone();
                    s.length_micros = parse_duration_hint(&t.duration_hint)
                        .and_then(|d| i64::try_from(d.as_micros()).ok());
                }
                None => {
                    s.track_id = None;
                    s.title = None;
                    s.artist.clear();
                    s.album = None;
                    s.url = None;
                    s.art_url = None;
                    s.length_micros = None;
                }
            }
        }
        let _ = self.notify.send(());
    }
}

/// Parse an `M:SS` (or `H:MM:SS`) display duration.
fn parse_duration_hint(hint: &str) -> Option<Duration> {
    let mut secs: u64 = 0;
    for part in hint.trim().split(':') {
        secs = secs.checked_mul(60)?.checked_add(part.parse().ok()?)?;
    }
    Some(Duration::from_secs(secs))
}

fn owned(value: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(value).ok()
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No window to raise.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "vaultplay"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            PlaybackStatus::Playing | PlaybackStatus::Loading => "Playing",
            PlaybackStatus::Paused => "Paused",
            PlaybackStatus::Idle | PlaybackStatus::Ended | PlaybackStatus::Error => "Stopped",
        }
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        if let Some(path) = s.track_id.as_deref().and_then(|p| ObjectPath::try_from(p).ok()) {
            if let Some(v) = owned(Value::from(path)) {
                map.insert("mpris:trackid".to_string(), v);
            }
        }
        let strings = [
            ("xesam:title", &s.title),
            ("xesam:album", &s.album),
            ("xesam:url", &s.url),
            ("mpris:artUrl", &s.art_url),
        ];
        for (key, value) in strings {
            if let Some(v) = value.clone().and_then(|v| owned(Value::from(v))) {
                map.insert(key.to_string(), v);
            }
        }
        if !s.artist.is_empty() {
            if let Some(v) = owned(Value::from(s.artist.clone())) {
                map.insert("xesam:artist".to_string(), v);
            }
        }
        if let Some(v) = s.length_micros.and_then(|l| owned(Value::from(l))) {
            map.insert("mpris:length".to_string(), v);
        }
        map
    }
}

pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(serve(tx, state_for_thread, notify_rx));
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}

async fn serve(tx: Sender<ControlCmd>, state: Arc<Mutex<SharedState>>, notify: Receiver<()>) {
    let connection = match Connection::session().await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "mpris: failed to connect to session bus");
            return;
        }
    };

    if let Err(e) = connection.request_name(BUS_NAME).await {
        warn!(error = %e, "mpris: failed to acquire name");
        return;
    }

    let object_server = connection.object_server();

    if let Err(e) = object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await
    {
        warn!(error = %e, "mpris: failed to register root iface");
        return;
    }

    if let Err(e) = object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await
    {
        warn!(error = %e, "mpris: failed to register player iface");
        return;
    }

    let player = match object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await
    {
        Ok(iface) => iface,
        Err(e) => {
            warn!(error = %e, "mpris: player iface not found");
            return;
        }
    };
    debug!(name = BUS_NAME, "mpris: serving");

    // The connection is driven by zbus's own executor; this thread only relays
    // change notifications until the handle is dropped.
    while notify.recv().is_ok() {
        while notify.try_recv().is_ok() {}
        let iface = player.get().await;
        let emitter = player.signal_emitter();
        if let Err(e) = iface.playback_status_changed(emitter).await {
            debug!(error = %e, "mpris: PlaybackStatus signal failed");
        }
        if let Err(e) = iface.metadata_changed(emitter).await {
            debug!(error = %e, "mpris: Metadata signal failed");
        }
    }
}
