//! Audio engine adapter.
//!
//! One engine instance wraps one track. The transport creates an instance per
//! selected track through an `EngineFactory` and drops it before creating the
//! next one. Engines report back asynchronously through an `EngineEventSender`
//! whose events carry the id of the instance that emitted them, so the
//! transport can discard anything from an instance it already let go of.

mod sink;
mod types;

use std::time::Duration;

pub use sink::{OutputDevice, RodioEngine, RodioEngineFactory};
pub use types::*;

pub trait AudioEngine {
    /// Open `url`; reports `Loaded` or `LoadFailed`.
    fn load(&mut self, url: &str);

    /// Start or resume; may report `PlayFailed` and later `Unlocked`.
    fn play(&mut self);

    fn pause(&mut self);

    fn seek(&mut self, position: Duration);

    fn set_volume(&mut self, volume: f32);

    fn current_position(&self) -> Duration;

    fn total_duration(&self) -> Option<Duration>;

    /// Give the engine a chance to notice end-of-track or a device coming back.
    fn poll(&mut self) {}

    /// Stop output and release resources. Must be safe to call more than once.
    fn dispose(&mut self);
}

pub trait EngineFactory {
    fn create(&mut self, events: EngineEventSender) -> Box<dyn AudioEngine>;
}

#[cfg(test)]
pub(crate) mod testing;
