use std::fmt;
use std::path::Path;
use std::time::Duration;

pub type TrackId = u64;

/// A playable track as supplied by the catalog.
///
/// Queues hold clones of these; a later change to the catalog record does not
/// reach entries that were already queued.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// Display-only duration (`M:SS`). The engine reports the real one once loaded.
    pub duration_hint: String,
    pub audio_url: String,
    pub cover_url: Option<String>,
    /// Owning vault, or `None` for ungrouped tracks.
    pub vault_id: Option<String>,
}

/// A named grouping of tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vault {
    pub id: String,
    pub name: String,
    pub cover_url: Option<String>,
}

/// The view the user is browsing; decides which tracks seed the context queue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackContext {
    #[default]
    All,
    Vault(String),
}

impl PlaybackContext {
    /// Parse a context id as typed by the user: `all` or a vault id.
    pub fn parse(id: &str) -> Self {
        let id = id.trim();
        if id.is_empty() || id.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Vault(id.to_string())
        }
    }

    pub fn includes(&self, track: &Track) -> bool {
        match self {
            Self::All => true,
            Self::Vault(id) => track.vault_id.as_deref() == Some(id.as_str()),
        }
    }
}

impl fmt::Display for PlaybackContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Vault(id) => f.write_str(id),
        }
    }
}

/// Format a duration as `M:SS`, the catalog's display convention.
pub fn format_duration_hint(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Build the `file://` URL the audio engine loads from.
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}
