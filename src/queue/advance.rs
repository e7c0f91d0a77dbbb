//! Pure decision tables for moving through the queue.
//!
//! These take plain values and return what should happen next; applying the
//! decision is left to `QueueManager` and the transport.

use std::time::Duration;

/// How playback proceeds when the queue runs out or a track finishes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RepeatMode {
    /// Stop at the end of the context queue.
    #[default]
    Off,
    /// Wrap around to the start of the context queue.
    All,
    /// Replay the current track when it ends naturally.
    One,
}

impl RepeatMode {
    /// `Off -> All -> One -> Off`.
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::All => "all",
            Self::One => "one",
        }
    }
}

/// What caused an advance.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// The current track finished playing.
    Auto,
    /// The user asked for the next track.
    Manual,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Pop the user queue head; the context index stays put.
    UserQueue,
    /// Reload the current track from the start.
    Replay,
    /// Play the context entry at this index.
    Context(usize),
    /// Natural end with nothing left: settle to idle.
    Stop,
    /// Manual request with nothing to play at all.
    Empty,
}

/// Resolve the next selection.
///
/// Priority: user queue, then repeat-one (natural end only), then the next
/// context entry. Past the end, repeat-all and manual skips wrap to 0 while a
/// natural end with repeat off stops.
pub fn decide_advance(
    user_queue_empty: bool,
    trigger: Trigger,
    repeat: RepeatMode,
    index: Option<usize>,
    queue_len: usize,
) -> Advance {
    if !user_queue_empty {
        return Advance::UserQueue;
    }
    if trigger == Trigger::Auto && repeat == RepeatMode::One {
        return Advance::Replay;
    }
    if queue_len == 0 {
        return match trigger {
            Trigger::Auto => Advance::Stop,
            Trigger::Manual => Advance::Empty,
        };
    }

    let next = index.map_or(0, |i| i + 1);
    if next < queue_len {
        return Advance::Context(next);
    }

    match (trigger, repeat) {
        (Trigger::Manual, _) | (_, RepeatMode::All) => Advance::Context(0),
        (Trigger::Auto, _) => Advance::Stop,
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Retreat {
    /// Seek the current track back to 0.
    Restart,
    /// Play the context entry at this index.
    Context(usize),
    /// Nothing in the context queue.
    Empty,
}

/// Resolve "previous". The user queue is never consulted.
///
/// Past `threshold` into the current track this restarts it instead of moving.
/// From index 0, or with no context index at all, it wraps to the last entry.
pub fn decide_retreat(
    elapsed: Duration,
    threshold: Duration,
    index: Option<usize>,
    queue_len: usize,
) -> Retreat {
    if elapsed > threshold {
        return Retreat::Restart;
    }
    match retreat_index(index, queue_len) {
        Some(i) => Retreat::Context(i),
        None => Retreat::Empty,
    }
}

pub(crate) fn retreat_index(index: Option<usize>, queue_len: usize) -> Option<usize> {
    if queue_len == 0 {
        return None;
    }
    Some(match index {
        Some(0) | None => queue_len - 1,
        Some(i) => (i - 1).min(queue_len - 1),
    })
}
