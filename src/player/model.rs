//! Observable player state and the notifications published when it changes.

use std::fmt;
use std::time::Duration;

use crate::catalog::{PlaybackContext, Track};
use crate::error::PlayerError;
use crate::queue::RepeatMode;

/// Per-track playback status.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
    Error,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Ended => "ended",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    /// The loaded track; may come from the context queue or the user queue.
    pub current_track: Option<Track>,
    pub status: PlaybackStatus,
    pub volume: f32,
    pub current_time: Duration,
    pub total_duration: Duration,
    pub shuffled: bool,
    pub repeat_mode: RepeatMode,
    /// Display toggle for the queue panel; playback ignores it.
    pub queue_open: bool,
    /// The view new context queues are built from.
    pub context: PlaybackContext,
    pub last_error: Option<PlayerError>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            current_track: None,
            status: PlaybackStatus::Idle,
            volume: 0.5,
            current_time: Duration::ZERO,
            total_duration: Duration::ZERO,
            shuffled: false,
            repeat_mode: RepeatMode::Off,
            queue_open: false,
            context: PlaybackContext::All,
            last_error: None,
        }
    }
}

/// Change notifications, drained by the runtime after each operation.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    TrackChanged(Track),
    StatusChanged(PlaybackStatus),
    Progress(Duration),
    QueueChanged,
    ModesChanged { shuffled: bool, repeat: RepeatMode },
    VolumeChanged(f32),
    ContextChanged(PlaybackContext),
    Failed(PlayerError),
}

/// Startup options for a `Player`.
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    pub volume: f32,
    pub shuffled: bool,
    pub repeat_mode: RepeatMode,
    /// "Previous" restarts the track instead once this much has played.
    pub restart_threshold: Duration,
    pub progress_interval: Duration,
    /// Fixed shuffle seed; `None` seeds from the OS.
    pub shuffle_seed: Option<u64>,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            volume: 0.5,
            shuffled: false,
            repeat_mode: RepeatMode::Off,
            restart_threshold: Duration::from_secs(3),
            progress_interval: Duration::from_millis(250),
            shuffle_seed: None,
        }
    }
}
