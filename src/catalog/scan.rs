use std::path::{Path, PathBuf};

use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::{format_duration_hint, file_url};

const COVER_NAMES: [&str; 4] = ["cover.jpg", "cover.png", "folder.jpg", "folder.png"];

/// A file found on disk, before the library assigns it an id.
#[derive(Debug, Clone)]
pub(super) struct ScannedTrack {
    pub path: PathBuf,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_hint: String,
    pub cover_url: Option<String>,
    /// Name of the top-level directory under the root, if any.
    pub vault_dir: Option<String>,
}

pub(super) fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Look for a conventional cover image next to the audio files in `dir`.
pub(super) fn find_cover(dir: &Path) -> Option<String> {
    COVER_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
        .map(|p| file_url(&p))
}

/// Walk `root` and return every audio file, sorted by path.
pub(super) fn scan(root: &Path, settings: &LibrarySettings) -> Vec<ScannedTrack> {
    let mut found: Vec<ScannedTrack> = Vec::new();

    let walker = WalkDir::new(root).follow_links(settings.follow_links);

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !path.is_file() || !is_audio_file(path, settings) {
            continue;
        }
        found.push(read_track(root, path));
    }

    found.sort_by(|a, b| a.path.cmp(&b.path));
    found
}

fn read_track(root: &Path, path: &Path) -> ScannedTrack {
    let mut title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let mut artist = String::from("Unknown Artist");
    let mut album: Option<String> = None;
    let mut duration_hint = String::from("0:00");

    if let Ok(tagged) = lofty::read_from_path(path) {
        duration_hint = format_duration_hint(tagged.properties().duration());

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            if let Some(v) = tag.title() {
                if !v.trim().is_empty() {
                    title = v.trim().to_string();
                }
            }
            if let Some(v) = tag.artist() {
                let v = v.trim();
                if !v.is_empty() {
                    artist = v.replace(';', ",");
                }
            }
            if let Some(v) = tag.album() {
                let v = v.trim();
                if !v.is_empty() {
                    album = Some(v.to_string());
                }
            }
        }
    }

    ScannedTrack {
        path: path.to_path_buf(),
        title,
        artist,
        album,
        duration_hint,
        cover_url: path.parent().and_then(find_cover),
        vault_dir: vault_dir_of(root, path),
    }
}

/// The first path component below `root`, when the file is not directly in it.
pub(super) fn vault_dir_of(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut components = rel.components();
    let first = components.next()?;
    // A bare file name has nothing after its first component.
    components.next()?;
    first.as_os_str().to_str().map(str::to_string)
}
