//! Shuffle helpers for the context queue.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use crate::catalog::Track;

/// Fisher-Yates shuffle of a copy of `tracks`.
pub(crate) fn shuffled(tracks: &[Track], rng: &mut SmallRng) -> Vec<Track> {
    let mut out = tracks.to_vec();
    out.shuffle(rng);
    out
}

/// `head` first, followed by every other track of `tracks` in random order.
pub(crate) fn shuffled_with_head(head: &Track, tracks: &[Track], rng: &mut SmallRng) -> Vec<Track> {
    let rest: Vec<Track> = tracks.iter().filter(|t| t.id != head.id).cloned().collect();
    let mut out = Vec::with_capacity(rest.len() + 1);
    out.push(head.clone());
    out.extend(shuffled(&rest, rng));
    out
}
