use std::io::{self, Write};

use crate::mpris::MprisHandle;
use crate::player::{Player, PlayerEvent};
use crate::runtime::render;

/// Drain the player's notifications into MPRIS and the terminal.
pub fn forward_events(player: &mut Player, mpris: &MprisHandle, out: &mut impl Write) -> io::Result<()> {
    for event in player.take_events() {
        match event {
            PlayerEvent::TrackChanged(track) => {
                mpris.set_track_metadata(Some(&track));
                writeln!(out, "now playing: {} - {}", track.artist, track.title)?;
            }
            PlayerEvent::StatusChanged(status) => {
                mpris.set_playback(status);
            }
            PlayerEvent::Progress(_) => {}
            PlayerEvent::QueueChanged => {
                if player.state().queue_open {
                    for line in render::queue_lines(player.queue()) {
                        writeln!(out, "{line}")?;
                    }
                }
            }
            PlayerEvent::ModesChanged { shuffled, repeat } => {
                writeln!(
                    out,
                    "shuffle {}, repeat {}",
                    if shuffled { "on" } else { "off" },
                    repeat.label()
                )?;
            }
            PlayerEvent::VolumeChanged(volume) => {
                writeln!(out, "volume {:.0}%", volume * 100.0)?;
            }
            PlayerEvent::ContextChanged(context) => {
                writeln!(out, "view: {context}")?;
            }
            PlayerEvent::Failed(error) => {
                writeln!(out, "error: {error} (`p` retries)")?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
