use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::config;
use crate::player::PlayerOptions;

/// Music root: CLI argument, then `library.root`, then the working directory.
pub fn library_root(arg: Option<String>, settings: &config::Settings) -> PathBuf {
    if let Some(dir) = arg {
        return PathBuf::from(dir);
    }
    if let Some(root) = &settings.library.root {
        return root.clone();
    }
    env::current_dir().unwrap_or_else(|_| PathBuf::from("Music"))
}

pub fn player_options(settings: &config::Settings) -> PlayerOptions {
    PlayerOptions {
        volume: settings.playback.volume,
        shuffled: settings.playback.shuffle,
        repeat_mode: settings.playback.repeat_mode.into(),
        restart_threshold: Duration::try_from_secs_f64(settings.playback.restart_threshold_secs)
            .unwrap_or(Duration::from_secs(3)),
        progress_interval: Duration::from_millis(settings.progress.tick_ms),
        shuffle_seed: None,
    }
}
