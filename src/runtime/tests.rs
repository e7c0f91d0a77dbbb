use super::commands::{Command, parse_command};
use super::event_loop::{handle_command, handle_control_cmd, wait_timeout};
use super::mpris_sync::forward_events;
use super::startup::{library_root, player_options};
use crate::catalog::{Library, Track, TrackId, Vault};
use crate::engine::EngineEvent;
use crate::engine::testing::{Call, Script, ScriptedFactory};
use crate::mpris::{ControlCmd, MprisHandle};
use crate::player::{PlaybackStatus, Player, PlayerOptions};
use crate::queue::RepeatMode;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

fn t(id: TrackId, vault: Option<&str>) -> Track {
    Track {
        id,
        title: format!("Song {id}"),
        artist: "Band".into(),
        album: None,
        duration_hint: "2:30".into(),
        audio_url: format!("file:///music/{id}.flac"),
        cover_url: None,
        vault_id: vault.map(str::to_string),
    }
}

struct Rig {
    player: Player,
    rx: Receiver<EngineEvent>,
    script: Rc<RefCell<Script>>,
}

fn rig() -> Rig {
    let tracks = vec![t(1, Some("chill")), t(2, Some("chill")), t(3, None)];
    let vaults = vec![Vault {
        id: "chill".into(),
        name: "Chill".into(),
        cover_url: None,
    }];
    let (tx, rx) = mpsc::channel();
    let factory = ScriptedFactory::default();
    let script = factory.script.clone();
    let player = Player::new(
        Box::new(Library::new(tracks, vaults)),
        Box::new(factory),
        tx,
        PlayerOptions {
            shuffle_seed: Some(1),
            ..PlayerOptions::default()
        },
    );
    Rig { player, rx, script }
}

impl Rig {
    fn pump(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.player.handle_engine_event(event);
        }
    }

    fn run(&mut self, line: &str) -> (bool, String) {
        let cmd = parse_command(line).unwrap().unwrap();
        let mut out = Vec::new();
        let quit = handle_command(cmd, &mut self.player, &mut out).unwrap();
        self.pump();
        (quit, String::from_utf8(out).unwrap())
    }
}

#[test]
fn parses_commands_and_arguments() {
    assert_eq!(parse_command("  ").unwrap(), None);
    assert_eq!(parse_command("play 12").unwrap(), Some(Command::Play(12)));
    assert_eq!(parse_command("P").unwrap(), Some(Command::Toggle));
    assert_eq!(
        parse_command("seek 1.5").unwrap(),
        Some(Command::Seek(Duration::from_millis(1500)))
    );
    assert_eq!(parse_command("vol 0.25").unwrap(), Some(Command::Volume(0.25)));
    assert_eq!(parse_command("enqueue 3").unwrap(), Some(Command::Enqueue(3)));
    assert_eq!(
        parse_command("view Late Night").unwrap(),
        Some(Command::View(crate::catalog::PlaybackContext::Vault(
            "Late Night".into()
        )))
    );
    assert_eq!(
        parse_command("view all").unwrap(),
        Some(Command::View(crate::catalog::PlaybackContext::All))
    );
    assert_eq!(parse_command("quit").unwrap(), Some(Command::Quit));
}

#[test]
fn rejects_bad_input() {
    assert!(parse_command("play").is_err());
    assert!(parse_command("play abc").is_err());
    assert!(parse_command("seek -4").is_err());
    assert!(parse_command("vol loud").is_err());
    assert!(parse_command("dance").is_err());
}

#[test]
fn wait_timeout_caps_at_idle_poll() {
    let now = Instant::now();
    let idle = Duration::from_millis(50);
    assert_eq!(wait_timeout(None, idle, now), idle);
    assert_eq!(
        wait_timeout(Some(now + Duration::from_millis(20)), idle, now),
        Duration::from_millis(20)
    );
    assert_eq!(
        wait_timeout(Some(now + Duration::from_secs(1)), idle, now),
        idle
    );
    assert_eq!(
        wait_timeout(Some(now), idle, now + Duration::from_millis(5)),
        Duration::ZERO
    );
}

#[test]
fn list_marks_current_track_and_follows_view() {
    let mut r = rig();
    r.run("play 2");
    let (_, out) = r.run("list");
    assert_eq!(out.lines().count(), 3);
    assert!(out.lines().any(|l| l.starts_with('>') && l.contains("Song 2")));

    let (_, out) = r.run("view chill");
    assert!(out.is_empty());
    let (_, out) = r.run("list");
    assert_eq!(out.lines().count(), 2);
}

#[test]
fn view_rejects_unknown_vault() {
    let mut r = rig();
    let (_, out) = r.run("view jazz");
    assert!(out.contains("no such vault"));
    assert_eq!(
        r.player.state().context,
        crate::catalog::PlaybackContext::All
    );
}

#[test]
fn vaults_lists_track_counts() {
    let mut r = rig();
    let (_, out) = r.run("vaults");
    assert_eq!(out.trim(), "chill  Chill (2 tracks)");
}

#[test]
fn play_and_enqueue_unknown_ids_report() {
    let mut r = rig();
    let (_, out) = r.run("play 99");
    assert!(out.contains("no such track: 99"));
    let (_, out) = r.run("enqueue 99");
    assert!(out.contains("no such track: 99"));
    assert!(r.script.borrow().created.is_empty());
}

#[test]
fn play_rejects_tracks_outside_the_view() {
    let mut r = rig();
    r.run("view chill");
    let (_, out) = r.run("play 3");
    assert_eq!(out.trim(), "track 3 is not in view chill");
    assert!(r.script.borrow().created.is_empty());
    assert_eq!(r.player.state().current_track, None);

    let (_, out) = r.run("play 2");
    assert!(out.is_empty());
    assert_eq!(r.player.queue().index(), Some(1));
    assert_eq!(r.player.state().status, PlaybackStatus::Playing);
}

#[test]
fn queue_toggles_panel_and_shows_user_queue_first() {
    let mut r = rig();
    r.run("play 1");
    r.run("enqueue 3");
    let (_, out) = r.run("queue");
    assert!(r.player.state().queue_open);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "next up:");
    assert!(lines[1].contains("Song 3"));
    assert_eq!(lines[2], "then:");

    let (_, out) = r.run("queue");
    assert_eq!(out.trim(), "queue hidden");
}

#[test]
fn status_reports_modes() {
    let mut r = rig();
    r.run("play 1");
    r.run("repeat");
    r.run("shuffle");
    let (_, out) = r.run("status");
    assert!(out.starts_with("[playing] Band - Song 1"));
    assert!(out.contains("shuffle on"));
    assert!(out.contains("repeat all"));
    assert_eq!(r.player.state().repeat_mode, RepeatMode::All);
}

#[test]
fn quit_command_stops_the_loop() {
    let mut r = rig();
    assert!(r.run("quit").0);
    assert!(!r.run("help").0);
}

#[test]
fn media_keys_drive_the_transport() {
    let mut r = rig();
    assert!(!handle_control_cmd(ControlCmd::Play, &mut r.player));
    r.pump();
    assert_eq!(r.player.state().status, PlaybackStatus::Playing);
    assert_eq!(
        r.player.state().current_track.as_ref().map(|t| t.id),
        Some(1)
    );

    handle_control_cmd(ControlCmd::Play, &mut r.player);
    assert_eq!(r.player.state().status, PlaybackStatus::Playing);

    handle_control_cmd(ControlCmd::Next, &mut r.player);
    r.pump();
    assert_eq!(
        r.player.state().current_track.as_ref().map(|t| t.id),
        Some(2)
    );

    let engine = r.player.active_engine().unwrap();
    handle_control_cmd(ControlCmd::Stop, &mut r.player);
    assert_eq!(r.player.state().status, PlaybackStatus::Idle);
    assert_eq!(r.player.state().current_time, Duration::ZERO);
    assert_eq!(r.player.active_engine(), None);
    assert_eq!(
        r.script.borrow().calls_for(engine).last(),
        Some(&Call::Dispose)
    );

    handle_control_cmd(ControlCmd::Play, &mut r.player);
    r.pump();
    assert_eq!(r.player.state().status, PlaybackStatus::Playing);
    assert_eq!(
        r.player.state().current_track.as_ref().map(|t| t.id),
        Some(2)
    );
    assert_ne!(r.player.active_engine(), Some(engine));

    assert!(handle_control_cmd(ControlCmd::Quit, &mut r.player));
}

#[test]
fn forward_events_announces_track_changes() {
    let mut r = rig();
    r.run("play 3");
    r.run("vol 2");
    let mpris = MprisHandle::detached();
    let mut out = Vec::new();
    forward_events(&mut r.player, &mpris, &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("now playing: Band - Song 3"));
    assert!(out.contains("volume 100%"));
    assert!(r.player.take_events().is_empty());
}

#[test]
fn player_options_follow_settings() {
    let mut settings = crate::config::Settings::default();
    settings.playback.volume = 0.8;
    settings.playback.shuffle = true;
    settings.playback.repeat_mode = crate::config::RepeatModeSetting::One;
    settings.playback.restart_threshold_secs = 5.0;
    settings.progress.tick_ms = 100;

    let options = player_options(&settings);
    assert_eq!(options.volume, 0.8);
    assert!(options.shuffled);
    assert_eq!(options.repeat_mode, RepeatMode::One);
    assert_eq!(options.restart_threshold, Duration::from_secs(5));
    assert_eq!(options.progress_interval, Duration::from_millis(100));
}

#[test]
fn library_root_prefers_argument_then_setting() {
    let mut settings = crate::config::Settings::default();
    settings.library.root = Some(PathBuf::from("/srv/music"));
    assert_eq!(
        library_root(Some("/tmp/x".into()), &settings),
        PathBuf::from("/tmp/x")
    );
    assert_eq!(library_root(None, &settings), PathBuf::from("/srv/music"));
}
