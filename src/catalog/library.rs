use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::LibrarySettings;

use super::model::{PlaybackContext, Track, TrackId, Vault, file_url};
use super::scan::{ScannedTrack, find_cover, scan};
use super::{Catalog, TrackAddedFn};

/// In-memory catalog, optionally backed by a music directory.
pub struct Library {
    root: Option<PathBuf>,
    settings: LibrarySettings,
    tracks: Vec<Track>,
    vaults: Vec<Vault>,
    known_paths: HashSet<PathBuf>,
    next_id: TrackId,
    listeners: Vec<TrackAddedFn>,
}

impl Library {
    /// Build a library from records supplied by another collaborator.
    #[cfg(test)]
    pub fn new(tracks: Vec<Track>, vaults: Vec<Vault>) -> Self {
        let next_id = tracks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        Self {
            root: None,
            settings: LibrarySettings::default(),
            tracks,
            vaults,
            known_paths: HashSet::new(),
            next_id,
            listeners: Vec::new(),
        }
    }

    /// Scan `root` and build the catalog from what is found there.
    pub fn open(root: &Path, settings: &LibrarySettings) -> Self {
        let mut library = Self {
            root: Some(root.to_path_buf()),
            settings: settings.clone(),
            tracks: Vec::new(),
            vaults: Vec::new(),
            known_paths: HashSet::new(),
            next_id: 1,
            listeners: Vec::new(),
        };
        for scanned in scan(root, settings) {
            library.add_scanned(scanned);
        }
        info!(
            root = %root.display(),
            tracks = library.tracks.len(),
            vaults = library.vaults.len(),
            "library scanned"
        );
        library
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    fn add_scanned(&mut self, scanned: ScannedTrack) -> Track {
        if let (Some(dir), Some(root)) = (scanned.vault_dir.as_deref(), self.root.as_deref()) {
            if !self.vaults.iter().any(|v| v.id == dir) {
                let vault_path = root.join(dir);
                self.vaults.push(Vault {
                    id: dir.to_string(),
                    name: dir.to_string(),
                    cover_url: find_cover(&vault_path),
                });
                self.vaults.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
            }
        }

        let track = Track {
            id: self.next_id,
            title: scanned.title,
            artist: scanned.artist,
            album: scanned.album,
            duration_hint: scanned.duration_hint,
            audio_url: file_url(&scanned.path),
            cover_url: scanned.cover_url,
            vault_id: scanned.vault_dir,
        };
        self.next_id += 1;
        self.known_paths.insert(scanned.path);
        self.tracks.push(track.clone());
        track
    }
}

impl Catalog for Library {
    fn list_tracks(&self, context: &PlaybackContext) -> Vec<Track> {
        self.tracks
            .iter()
            .filter(|t| context.includes(t))
            .cloned()
            .collect()
    }

    fn list_vaults(&self) -> Vec<Vault> {
        self.vaults.clone()
    }

    fn on_track_added(&mut self, callback: TrackAddedFn) {
        self.listeners.push(callback);
    }

    /// Tracks already known keep their ids; new ones are appended and announced
    /// to `on_track_added` listeners.
    fn rescan(&mut self) -> usize {
        let Some(root) = self.root.clone() else {
            return 0;
        };

        let mut added = 0;
        for scanned in scan(&root, &self.settings) {
            if self.known_paths.contains(&scanned.path) {
                continue;
            }
            let track = self.add_scanned(scanned);
            for listener in self.listeners.iter_mut() {
                listener(&track);
            }
            added += 1;
        }
        debug!(added, "library rescanned");
        added
    }

    fn track(&self, id: TrackId) -> Option<Track> {
        self.tracks.iter().find(|t| t.id == id).cloned()
    }
}
