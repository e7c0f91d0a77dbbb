//! Engine identifiers and the events engines send back to the transport.

use std::fmt;
use std::sync::mpsc::Sender;

/// Identifies one engine instance for the lifetime of the process.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct EngineId(pub u64);

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEventKind {
    Loaded,
    PlaybackEnded,
    LoadFailed(String),
    PlayFailed(String),
    /// Output became available after a `PlayFailed`.
    Unlocked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub engine: EngineId,
    pub kind: EngineEventKind,
}

/// Event channel handed to a single engine instance.
#[derive(Debug, Clone)]
pub struct EngineEventSender {
    id: EngineId,
    tx: Sender<EngineEvent>,
}

impl EngineEventSender {
    pub fn new(id: EngineId, tx: Sender<EngineEvent>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> EngineId {
        self.id
    }

    pub fn emit(&self, kind: EngineEventKind) {
        // The receiver only goes away on shutdown.
        let _ = self.tx.send(EngineEvent {
            engine: self.id,
            kind,
        });
    }
}
