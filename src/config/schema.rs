use std::path::PathBuf;

use serde::Deserialize;

use crate::queue::RepeatMode;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/vaultplay/config.toml` or `~/.config/vaultplay/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `VAULTPLAY__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playback: PlaybackSettings,
    pub progress: ProgressSettings,
    pub library: LibrarySettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Whether shuffle starts enabled.
    pub shuffle: bool,
    /// Repeat mode at startup.
    pub repeat_mode: RepeatModeSetting,
    /// Initial volume, 0.0 to 1.0.
    pub volume: f32,
    /// Seconds into a track after which "previous" restarts it instead.
    pub restart_threshold_secs: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat_mode: RepeatModeSetting::Off,
            volume: 0.5,
            restart_threshold_secs: 3.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatModeSetting {
    #[serde(alias = "none", alias = "no-loop", alias = "no_loop")]
    Off,
    #[serde(alias = "loop-all", alias = "loop_all", alias = "repeat-all")]
    All,
    #[serde(alias = "loop-one", alias = "loop_one", alias = "repeat-one")]
    One,
}

impl From<RepeatModeSetting> for RepeatMode {
    fn from(s: RepeatModeSetting) -> Self {
        match s {
            RepeatModeSetting::Off => RepeatMode::Off,
            RepeatModeSetting::All => RepeatMode::All,
            RepeatModeSetting::One => RepeatMode::One,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProgressSettings {
    /// How often the playback position is republished while playing (milliseconds).
    pub tick_ms: u64,
    /// How long the control loop waits for events when nothing is playing (milliseconds).
    pub idle_poll_ms: u64,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            tick_ms: 250,
            idle_poll_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Music root used when none is given on the command line.
    pub root: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            root: None,
            extensions: vec![
                "mp3".into(),
                "m4a".into(),
                "flac".into(),
                "wav".into(),
                "ogg".into(),
            ],
            follow_links: true,
            include_hidden: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "vaultplay=info".to_string(),
        }
    }
}
