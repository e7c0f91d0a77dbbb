//! Scripted in-memory engine for transport tests.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use super::types::{EngineEventKind, EngineEventSender, EngineId};
use super::{AudioEngine, EngineFactory};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(String),
    Play,
    Pause,
    Seek(Duration),
    Volume(f32),
    Dispose,
}

#[derive(Debug, Default)]
pub struct Script {
    pub calls: Vec<(EngineId, Call)>,
    pub created: Vec<EngineId>,
    pub live: HashSet<EngineId>,
    /// URLs whose load fails.
    pub broken_urls: HashSet<String>,
    /// How many upcoming `play()` calls report `PlayFailed`.
    pub play_failures: u32,
    pub position: Duration,
    pub duration: Option<Duration>,
}

impl Script {
    pub fn calls_for(&self, id: EngineId) -> Vec<Call> {
        self.calls
            .iter()
            .filter(|(e, _)| *e == id)
            .map(|(_, c)| c.clone())
            .collect()
    }
}

pub struct ScriptedEngine {
    events: EngineEventSender,
    script: Rc<RefCell<Script>>,
    disposed: bool,
}

impl ScriptedEngine {
    fn record(&self, call: Call) {
        self.script.borrow_mut().calls.push((self.events.id(), call));
    }
}

impl AudioEngine for ScriptedEngine {
    fn load(&mut self, url: &str) {
        self.record(Call::Load(url.to_string()));
        if self.script.borrow().broken_urls.contains(url) {
            self.events
                .emit(EngineEventKind::LoadFailed(format!("cannot open {url}")));
        } else {
            self.events.emit(EngineEventKind::Loaded);
        }
    }

    fn play(&mut self) {
        self.record(Call::Play);
        let mut script = self.script.borrow_mut();
        if script.play_failures > 0 {
            script.play_failures -= 1;
            self.events
                .emit(EngineEventKind::PlayFailed("autoplay blocked".into()));
        }
    }

    fn pause(&mut self) {
        self.record(Call::Pause);
    }

    fn seek(&mut self, position: Duration) {
        self.record(Call::Seek(position));
        self.script.borrow_mut().position = position;
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(Call::Volume(volume));
    }

    fn current_position(&self) -> Duration {
        self.script.borrow().position
    }

    fn total_duration(&self) -> Option<Duration> {
        self.script.borrow().duration
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.record(Call::Dispose);
        self.script.borrow_mut().live.remove(&self.events.id());
    }
}

impl Drop for ScriptedEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[derive(Default)]
pub struct ScriptedFactory {
    pub script: Rc<RefCell<Script>>,
}

impl EngineFactory for ScriptedFactory {
    fn create(&mut self, events: EngineEventSender) -> Box<dyn AudioEngine> {
        {
            let mut script = self.script.borrow_mut();
            script.created.push(events.id());
            script.live.insert(events.id());
            script.position = Duration::ZERO;
        }
        Box::new(ScriptedEngine {
            events,
            script: self.script.clone(),
            disposed: false,
        })
    }
}
