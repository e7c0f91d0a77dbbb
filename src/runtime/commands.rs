use std::io::{BufRead, BufReader};
use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::debug;

use crate::catalog::{PlaybackContext, TrackId};

/// A line typed on stdin, parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Vaults,
    View(PlaybackContext),
    Play(TrackId),
    Toggle,
    Next,
    Prev,
    Seek(Duration),
    Volume(f32),
    Shuffle,
    Repeat,
    Enqueue(TrackId),
    /// Toggle the queue panel.
    Queue,
    Status,
    Rescan,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  list                 tracks in the current view
  vaults               list vaults
  view <all|vault>     switch the current view
  play <id>            play a track from the current view
  p | toggle           play/pause
  next | prev          skip forward / back
  seek <secs>          jump to a position
  vol <0..1>           set volume
  shuffle | repeat     toggle shuffle / cycle repeat mode
  enqueue <id>         play a track next
  queue                show/hide the queue
  status               show what is playing
  rescan               pick up new files
  quit";

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();
    let arg = rest.join(" ");

    let cmd = match head.to_ascii_lowercase().as_str() {
        "list" | "ls" => Command::List,
        "vaults" => Command::Vaults,
        "view" | "cd" => Command::View(PlaybackContext::parse(&arg)),
        "play" => Command::Play(parse_id(&arg)?),
        "p" | "toggle" => Command::Toggle,
        "next" | "n" => Command::Next,
        "prev" | "previous" | "b" => Command::Prev,
        "seek" => Command::Seek(parse_seconds(&arg)?),
        "vol" | "volume" => Command::Volume(parse_volume(&arg)?),
        "shuffle" | "s" => Command::Shuffle,
        "repeat" | "r" => Command::Repeat,
        "enqueue" | "q+" => Command::Enqueue(parse_id(&arg)?),
        "queue" => Command::Queue,
        "status" | "st" => Command::Status,
        "rescan" => Command::Rescan,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(Some(cmd))
}

fn parse_id(arg: &str) -> Result<TrackId, String> {
    arg.trim()
        .parse()
        .map_err(|_| format!("expected a track id, got `{arg}`"))
}

fn parse_seconds(arg: &str) -> Result<Duration, String> {
    let secs: f64 = arg
        .trim()
        .parse()
        .map_err(|_| format!("expected seconds, got `{arg}`"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("seek position must be >= 0, got `{arg}`"));
    }
    Ok(Duration::from_secs_f64(secs))
}

fn parse_volume(arg: &str) -> Result<f32, String> {
    let volume: f32 = arg
        .trim()
        .parse()
        .map_err(|_| format!("expected a volume between 0 and 1, got `{arg}`"))?;
    if !volume.is_finite() {
        return Err(format!("expected a volume between 0 and 1, got `{arg}`"));
    }
    Ok(volume)
}

/// Read commands from stdin on a background thread. End of input quits.
pub fn spawn_stdin(tx: Sender<Command>) {
    std::thread::spawn(move || {
        let stdin = BufReader::new(std::io::stdin());
        for line in stdin.lines() {
            let Ok(line) = line else {
                break;
            };
            match parse_command(&line) {
                Ok(Some(cmd)) => {
                    if tx.send(cmd).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(msg) => println!("{msg}"),
            }
        }
        debug!("stdin closed");
        let _ = tx.send(Command::Quit);
    });
}
