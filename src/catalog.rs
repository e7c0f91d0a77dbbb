//! Track catalog: the read-only source of tracks and vaults.
//!
//! The playback core only ever reads from a `Catalog`. The directory-backed
//! `Library` treats every top-level subdirectory of the music root as a vault
//! and files sitting directly in the root as ungrouped tracks.

mod library;
mod model;
mod scan;

pub use library::Library;
pub use model::*;

/// Callback fired once per track that appears after the initial scan.
pub type TrackAddedFn = Box<dyn FnMut(&Track)>;

/// Read-only view over the track and vault records.
pub trait Catalog {
    /// Tracks visible in `context`, in catalog order.
    fn list_tracks(&self, context: &PlaybackContext) -> Vec<Track>;

    fn list_vaults(&self) -> Vec<Vault>;

    /// Register a callback for tracks added after construction.
    fn on_track_added(&mut self, callback: TrackAddedFn);

    /// Pick up records that appeared since construction. Returns how many were added.
    fn rescan(&mut self) -> usize {
        0
    }

    fn track(&self, id: TrackId) -> Option<Track> {
        self.list_tracks(&PlaybackContext::All)
            .into_iter()
            .find(|t| t.id == id)
    }

    fn vault(&self, id: &str) -> Option<Vault> {
        self.list_vaults().into_iter().find(|v| v.id == id)
    }
}
