//! Queue manager: the context queue, its unshuffled original order and the
//! ad-hoc "play next" user queue.
//!
//! The context queue and `original_order` are kept as two explicit sequences
//! sharing a single index into the context queue. `index == None` means no
//! context entry is selected; otherwise it always points inside `queue`.

mod advance;
mod shuffle;

use std::collections::VecDeque;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::catalog::Track;

pub use advance::{Advance, RepeatMode, Retreat, Trigger, decide_advance, decide_retreat};
use advance::retreat_index;
use shuffle::{shuffled, shuffled_with_head};

/// Result of `QueueManager::advance`, already applied to the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum NextSelection {
    /// Head of the user queue, now removed from it.
    User(Track),
    /// Context entry; the index has moved to it.
    Context { index: usize, track: Track },
    /// Replay whatever is currently loaded.
    Replay,
    /// Natural end of an exhausted queue.
    Exhausted,
    /// Nothing to play.
    Empty,
}

pub struct QueueManager {
    queue: Vec<Track>,
    original_order: Vec<Track>,
    index: Option<usize>,
    user_queue: VecDeque<Track>,
    rng: SmallRng,
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueManager {
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_os_rng())
    }

    /// Deterministic shuffles, for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        Self {
            queue: Vec::new(),
            original_order: Vec::new(),
            index: None,
            user_queue: VecDeque::new(),
            rng,
        }
    }

    pub fn queue(&self) -> &[Track] {
        &self.queue
    }

    #[cfg(test)]
    pub fn original_order(&self) -> &[Track] {
        &self.original_order
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn user_queue(&self) -> &VecDeque<Track> {
        &self.user_queue
    }

    /// The context entry at `index`, which may differ from what is audible
    /// while a user-queue track plays.
    #[cfg(test)]
    pub fn current(&self) -> Option<&Track> {
        self.index.and_then(|i| self.queue.get(i))
    }

    /// Context entries after the current index.
    pub fn upcoming(&self) -> &[Track] {
        match self.index {
            Some(i) if i < self.queue.len() => &self.queue[i + 1..],
            Some(_) => &[],
            None => &self.queue,
        }
    }

    /// Replace the context with `context_tracks`, positioned on `anchor`.
    ///
    /// Shuffled, the anchor goes first and the rest are shuffled behind it;
    /// otherwise the context order is kept as is. `original_order` always keeps
    /// the unshuffled list. When the anchor is not part of an unshuffled
    /// context the index is cleared.
    pub fn build_context(&mut self, context_tracks: Vec<Track>, anchor: &Track, shuffle: bool) {
        self.queue = if shuffle {
            shuffled_with_head(anchor, &context_tracks, &mut self.rng)
        } else {
            context_tracks.clone()
        };
        self.original_order = context_tracks;
        self.index = self.position_of(anchor);
    }

    /// Reorder the context queue for a shuffle toggle.
    ///
    /// Turning on keeps `current` (if any) at the head; turning off restores
    /// `original_order` verbatim and relocates `current` by id.
    pub fn toggle_shuffle(&mut self, on: bool, current: Option<&Track>) {
        if on {
            match current {
                Some(track) => {
                    self.queue = shuffled_with_head(track, &self.original_order, &mut self.rng);
                    self.index = Some(0);
                }
                None => {
                    self.queue = shuffled(&self.original_order, &mut self.rng);
                    self.index = None;
                }
            }
        } else {
            self.queue = self.original_order.clone();
            self.index = current.and_then(|t| self.position_of(t));
        }
    }

    /// Resolve and apply the next selection.
    pub fn advance(&mut self, trigger: Trigger, repeat: RepeatMode) -> NextSelection {
        let decision = decide_advance(
            self.user_queue.is_empty(),
            trigger,
            repeat,
            self.index,
            self.queue.len(),
        );
        match decision {
            Advance::UserQueue => match self.consume_user_head() {
                Some(track) => NextSelection::User(track),
                None => NextSelection::Empty,
            },
            Advance::Replay => NextSelection::Replay,
            Advance::Context(i) => self.select(i),
            Advance::Stop => NextSelection::Exhausted,
            Advance::Empty => NextSelection::Empty,
        }
    }

    /// Step one entry back in the context queue, wrapping at the start.
    pub fn retreat(&mut self) -> Option<(usize, Track)> {
        let i = retreat_index(self.index, self.queue.len())?;
        match self.select(i) {
            NextSelection::Context { index, track } => Some((index, track)),
            _ => None,
        }
    }

    pub fn enqueue_user(&mut self, track: Track) {
        self.user_queue.push_back(track);
    }

    pub fn consume_user_head(&mut self) -> Option<Track> {
        self.user_queue.pop_front()
    }

    fn select(&mut self, i: usize) -> NextSelection {
        match self.queue.get(i) {
            Some(track) => {
                self.index = Some(i);
                NextSelection::Context {
                    index: i,
                    track: track.clone(),
                }
            }
            None => NextSelection::Empty,
        }
    }

    fn position_of(&self, track: &Track) -> Option<usize> {
        self.queue.iter().position(|t| t.id == track.id)
    }
}
