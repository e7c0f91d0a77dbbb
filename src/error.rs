//! Error taxonomy for the playback core.
//!
//! None of these escape the transport's public operations: engine failures are
//! recorded on `PlayerState` for display, and the "nothing to do" cases are
//! logged and otherwise ignored.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    /// The active view has no tracks to start playback from.
    #[error("no tracks available to play")]
    CatalogUnavailable,

    /// The media could not be opened or decoded.
    #[error("failed to load track: {0}")]
    EngineLoadFailure(String),

    /// The engine refused to start playback, even after the unlock retry.
    #[error("failed to start playback: {0}")]
    EnginePlayFailure(String),

    /// Advance was requested with nothing left to advance to.
    #[error("queue is empty")]
    EmptyQueue,
}
