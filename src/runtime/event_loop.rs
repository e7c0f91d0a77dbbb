use std::io::{self, Write};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::catalog::PlaybackContext;
use crate::config;
use crate::engine::EngineEvent;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::player::Player;
use crate::runtime::commands::{Command, HELP};
use crate::runtime::mpris_sync::forward_events;
use crate::runtime::render;

/// Inputs the control thread waits on.
pub struct Inputs<'a> {
    pub engine: &'a Receiver<EngineEvent>,
    pub control: &'a Receiver<ControlCmd>,
    pub commands: &'a Receiver<Command>,
}

/// Main control loop: the only place `player` is touched. Engine events,
/// MPRIS commands and stdin commands are applied one at a time, then progress
/// ticks fire and notifications are forwarded. Returns when shutdown is
/// requested.
pub fn run(
    player: &mut Player,
    mpris: &MprisHandle,
    settings: &config::Settings,
    inputs: Inputs<'_>,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let idle = Duration::from_millis(settings.progress.idle_poll_ms);

    loop {
        let timeout = wait_timeout(player.next_deadline(), idle, Instant::now());
        match inputs.engine.recv_timeout(timeout) {
            Ok(event) => player.handle_engine_event(event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        }
        while let Ok(event) = inputs.engine.try_recv() {
            player.handle_engine_event(event);
        }

        let mut quit = false;
        while let Ok(cmd) = inputs.control.try_recv() {
            if handle_control_cmd(cmd, player) {
                quit = true;
                break;
            }
        }
        while !quit {
            let Ok(cmd) = inputs.commands.try_recv() else {
                break;
            };
            quit = handle_command(cmd, player, out)?;
        }

        player.tick(Instant::now());
        forward_events(player, mpris, out)?;

        if quit {
            info!("shutting down");
            return Ok(());
        }
    }
}

/// How long to block for engine events: until the next progress tick, but
/// never longer than the idle poll so the engine keeps being polled.
pub(crate) fn wait_timeout(deadline: Option<Instant>, idle: Duration, now: Instant) -> Duration {
    match deadline {
        Some(due) => due.saturating_duration_since(now).min(idle),
        None => idle,
    }
}

/// Apply a media-key command exactly as the matching terminal command would.
/// Returns true on quit.
pub(crate) fn handle_control_cmd(cmd: ControlCmd, player: &mut Player) -> bool {
    debug!(?cmd, "control command");
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => player.play(),
        ControlCmd::Pause => player.pause(),
        ControlCmd::PlayPause => player.toggle_play_pause(),
        ControlCmd::Stop => player.stop(),
        ControlCmd::Next => player.next(),
        ControlCmd::Prev => player.previous(),
    }
    false
}

/// Apply a stdin command, printing any listing it asks for. Returns true on quit.
pub(crate) fn handle_command(
    cmd: Command,
    player: &mut Player,
    out: &mut impl Write,
) -> io::Result<bool> {
    debug!(?cmd, "command");
    match cmd {
        Command::List => {
            let context = player.state().context.clone();
            let tracks = player.catalog().list_tracks(&context);
            if tracks.is_empty() {
                writeln!(out, "no tracks in view {context}")?;
            }
            let current = player.state().current_track.as_ref().map(|t| t.id);
            for track in &tracks {
                writeln!(out, "{}", render::track_line(track, current == Some(track.id)))?;
            }
        }
        Command::Vaults => {
            let vaults = player.catalog().list_vaults();
            if vaults.is_empty() {
                writeln!(out, "no vaults")?;
            }
            for vault in vaults {
                let count = player
                    .catalog()
                    .list_tracks(&PlaybackContext::Vault(vault.id.clone()))
                    .len();
                match &vault.cover_url {
                    Some(cover) => writeln!(out, "{}  {} ({count} tracks)  {cover}", vault.id, vault.name)?,
                    None => writeln!(out, "{}  {} ({count} tracks)", vault.id, vault.name)?,
                }
            }
        }
        Command::View(context) => {
            let known = match &context {
                PlaybackContext::All => true,
                PlaybackContext::Vault(id) => player.catalog().vault(id).is_some(),
            };
            if known {
                player.switch_context(context);
            } else {
                writeln!(out, "no such vault: {context}")?;
            }
        }
        Command::Play(id) => {
            if !player.play_track_id(id) {
                if player.catalog().track(id).is_some() {
                    let context = &player.state().context;
                    writeln!(out, "track {id} is not in view {context}")?;
                } else {
                    writeln!(out, "no such track: {id}")?;
                }
            }
        }
        Command::Toggle => player.toggle_play_pause(),
        Command::Next => player.next(),
        Command::Prev => player.previous(),
        Command::Seek(position) => player.seek(position),
        Command::Volume(volume) => player.set_volume(volume),
        Command::Shuffle => player.toggle_shuffle(),
        Command::Repeat => player.cycle_repeat_mode(),
        Command::Enqueue(id) => match player.catalog().track(id) {
            Some(track) => {
                writeln!(out, "queued: {} - {}", track.artist, track.title)?;
                player.enqueue_next(track);
            }
            None => writeln!(out, "no such track: {id}")?,
        },
        Command::Queue => {
            player.toggle_queue_open();
            if player.state().queue_open {
                for line in render::queue_lines(player.queue()) {
                    writeln!(out, "{line}")?;
                }
            } else {
                writeln!(out, "queue hidden")?;
            }
        }
        Command::Status => writeln!(out, "{}", render::status_line(player.state()))?,
        Command::Rescan => {
            let added = player.catalog_mut().rescan();
            writeln!(out, "{added} new tracks")?;
        }
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Quit => return Ok(true),
    }
    Ok(false)
}
