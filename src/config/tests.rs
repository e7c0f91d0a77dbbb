use super::load::{default_config_path, resolve_config_path};
use super::schema::*;
use crate::queue::RepeatMode;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_vaultplay_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("VAULTPLAY_CONFIG_PATH", "/tmp/vaultplay-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/vaultplay-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("vaultplay")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("vaultplay")
            .join("config.toml")
    );
}

#[test]
fn defaults_are_valid() {
    let s = Settings::default();
    assert!(s.validate().is_ok());
    assert!(!s.playback.shuffle);
    assert_eq!(s.playback.repeat_mode, RepeatModeSetting::Off);
    assert_eq!(s.playback.volume, 0.5);
    assert_eq!(s.playback.restart_threshold_secs, 3.0);
    assert_eq!(s.progress.tick_ms, 250);
}

#[test]
fn validate_rejects_bad_values() {
    let mut s = Settings::default();
    s.progress.tick_ms = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.playback.volume = 1.5;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.playback.restart_threshold_secs = -1.0;
    assert!(s.validate().is_err());
}

#[test]
fn repeat_mode_setting_converts() {
    assert_eq!(RepeatMode::from(RepeatModeSetting::Off), RepeatMode::Off);
    assert_eq!(RepeatMode::from(RepeatModeSetting::All), RepeatMode::All);
    assert_eq!(RepeatMode::from(RepeatModeSetting::One), RepeatMode::One);
}

#[test]
fn settings_load_from_config_file_and_parse_repeat_aliases() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
shuffle = true
repeat_mode = "repeat-one"
volume = 0.8
restart_threshold_secs = 5.0

[progress]
tick_ms = 100

[library]
root = "/srv/music"
extensions = ["mp3"]
include_hidden = true
follow_links = false

[log]
filter = "vaultplay=debug"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("VAULTPLAY_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("VAULTPLAY__PLAYBACK__VOLUME");

    let s = Settings::load().unwrap();
    assert!(s.playback.shuffle);
    assert_eq!(s.playback.repeat_mode, RepeatModeSetting::One);
    assert_eq!(s.playback.volume, 0.8);
    assert_eq!(s.playback.restart_threshold_secs, 5.0);
    assert_eq!(s.progress.tick_ms, 100);
    assert_eq!(s.progress.idle_poll_ms, 50);
    assert_eq!(s.library.root, Some(std::path::PathBuf::from("/srv/music")));
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert_eq!(s.log.filter, "vaultplay=debug");
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[progress]
tick_ms = 250
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("VAULTPLAY_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("VAULTPLAY__PROGRESS__TICK_MS", "40");

    let s = Settings::load().unwrap();
    assert_eq!(s.progress.tick_ms, 40);
}
