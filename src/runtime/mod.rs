use std::env;
use std::io::{self, Write};
use std::sync::mpsc;

use tracing::{info, warn};

use crate::catalog::{Catalog, Library};
use crate::config;
use crate::engine::{EngineEvent, OutputDevice, RodioEngineFactory};
use crate::mpris::ControlCmd;
use crate::player::Player;

mod commands;
mod event_loop;
mod mpris_sync;
mod render;
mod settings;
mod startup;

pub use settings::load_settings;

pub fn run(settings: config::Settings) -> Result<(), Box<dyn std::error::Error>> {
    let root = startup::library_root(env::args().nth(1), &settings);

    let mut library = Library::open(&root, &settings.library);
    if library.is_empty() {
        warn!(root = %root.display(), "no audio files found");
    }
    let track_count = library.len();
    let vault_count = library.list_vaults().len();
    library.on_track_added(Box::new(|track| {
        info!(track = track.id, title = %track.title, "track added");
    }));

    let device = OutputDevice::open_default();
    let (engine_tx, engine_rx) = mpsc::channel::<EngineEvent>();
    let mut player = Player::new(
        Box::new(library),
        Box::new(RodioEngineFactory::new(device)),
        engine_tx,
        startup::player_options(&settings),
    );

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);
    mpris.set_playback(player.state().status);

    let (command_tx, command_rx) = mpsc::channel::<commands::Command>();
    commands::spawn_stdin(command_tx);

    let mut stdout = io::stdout();
    writeln!(
        stdout,
        "{} tracks, {} vaults in {}. Type `help` for commands.",
        track_count,
        vault_count,
        root.display()
    )?;

    let result = event_loop::run(
        &mut player,
        &mpris,
        &settings,
        event_loop::Inputs {
            engine: &engine_rx,
            control: &control_rx,
            commands: &command_rx,
        },
        &mut stdout,
    );

    player.shutdown();
    mpris.set_track_metadata(None);
    result
}

#[cfg(test)]
mod tests;
