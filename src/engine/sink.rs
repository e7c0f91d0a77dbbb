//! `rodio`-backed engine.
//!
//! All engines share one output device. When the device cannot be opened the
//! engine still loads, reports `PlayFailed` on `play()`, and keeps retrying the
//! device from `poll()` until it can report `Unlocked`.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, warn};

use super::types::{EngineEventKind, EngineEventSender};
use super::{AudioEngine, EngineFactory};

type FileDecoder = Decoder<BufReader<File>>;

/// The default output stream, opened lazily and reopened on demand.
pub struct OutputDevice {
    stream: RefCell<Option<OutputStream>>,
    #[cfg(test)]
    detached: Option<DetachedOutput>,
}

/// In-memory stand-in for the output stream: sinks mix into queues the test
/// drains by hand, and the device only "opens" once plugged in.
#[cfg(test)]
pub(crate) struct DetachedOutput {
    plugged: std::cell::Cell<bool>,
    outputs: RefCell<Vec<rodio::queue::SourcesQueueOutput>>,
}

impl OutputDevice {
    pub fn open_default() -> Rc<Self> {
        let device = Self {
            stream: RefCell::new(None),
            #[cfg(test)]
            detached: None,
        };
        device.try_open();
        Rc::new(device)
    }

    /// A device that stays closed until `plug_in`.
    #[cfg(test)]
    pub fn unavailable() -> Rc<Self> {
        Self::detached(false)
    }

    /// An open device that plays into memory instead of the speakers.
    #[cfg(test)]
    pub fn in_memory() -> Rc<Self> {
        Self::detached(true)
    }

    #[cfg(test)]
    fn detached(plugged: bool) -> Rc<Self> {
        Rc::new(Self {
            stream: RefCell::new(None),
            detached: Some(DetachedOutput {
                plugged: std::cell::Cell::new(plugged),
                outputs: RefCell::new(Vec::new()),
            }),
        })
    }

    #[cfg(test)]
    pub fn plug_in(&self) {
        if let Some(detached) = &self.detached {
            detached.plugged.set(true);
        }
    }

    /// Pull `samples` samples through every connected sink.
    #[cfg(test)]
    pub fn drain(&self, samples: usize) {
        if let Some(detached) = &self.detached {
            for output in detached.outputs.borrow_mut().iter_mut() {
                output.by_ref().take(samples).for_each(drop);
            }
        }
    }

    pub fn is_open(&self) -> bool {
        #[cfg(test)]
        if let Some(detached) = &self.detached {
            return detached.plugged.get();
        }
        self.stream.borrow().is_some()
    }

    /// Open the default stream if it is not open yet. Returns whether it is open.
    pub fn try_open(&self) -> bool {
        if self.is_open() {
            return true;
        }
        #[cfg(test)]
        if self.detached.is_some() {
            return false;
        }
        match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                // rodio logs to stderr when the stream is dropped.
                stream.log_on_drop(false);
                *self.stream.borrow_mut() = Some(stream);
                true
            }
            Err(e) => {
                debug!(error = %e, "audio output unavailable");
                false
            }
        }
    }

    fn connect_sink(&self) -> Option<Sink> {
        #[cfg(test)]
        if let Some(detached) = &self.detached {
            if !detached.plugged.get() {
                return None;
            }
            let (sink, output) = Sink::new();
            detached.outputs.borrow_mut().push(output);
            return Some(sink);
        }
        self.stream
            .borrow()
            .as_ref()
            .map(|stream| Sink::connect_new(stream.mixer()))
    }
}

pub struct RodioEngine {
    events: EngineEventSender,
    device: Rc<OutputDevice>,
    /// Decoded source waiting for a sink (before the first successful `play`).
    pending: Option<FileDecoder>,
    sink: Option<Sink>,
    duration: Option<Duration>,
    volume: f32,
    wants_play: bool,
    awaiting_unlock: bool,
    ended: bool,
}

impl RodioEngine {
    pub fn new(device: Rc<OutputDevice>, events: EngineEventSender) -> Self {
        Self {
            events,
            device,
            pending: None,
            sink: None,
            duration: None,
            volume: 1.0,
            wants_play: false,
            awaiting_unlock: false,
            ended: false,
        }
    }

    fn open(url: &str) -> Result<FileDecoder, String> {
        let path = url
            .strip_prefix("file://")
            .map(PathBuf::from)
            .ok_or_else(|| format!("unsupported url: {url}"))?;
        let file = File::open(&path).map_err(|e| format!("{}: {e}", path.display()))?;
        Decoder::new(BufReader::new(file)).map_err(|e| format!("{}: {e}", path.display()))
    }

    /// Move the pending source onto a fresh sink. False when no device is open.
    fn attach(&mut self) -> bool {
        if self.sink.is_some() {
            return true;
        }
        let Some(source) = self.pending.take() else {
            return false;
        };
        match self.device.connect_sink() {
            Some(sink) => {
                sink.set_volume(self.volume);
                sink.append(source);
                self.sink = Some(sink);
                true
            }
            None => {
                self.pending = Some(source);
                false
            }
        }
    }
}

impl AudioEngine for RodioEngine {
    fn load(&mut self, url: &str) {
        self.dispose();
        self.ended = false;
        match Self::open(url) {
            Ok(decoder) => {
                self.duration = decoder.total_duration();
                self.pending = Some(decoder);
                self.events.emit(EngineEventKind::Loaded);
            }
            Err(reason) => self.events.emit(EngineEventKind::LoadFailed(reason)),
        }
    }

    fn play(&mut self) {
        self.wants_play = true;
        if self.sink.is_none() && self.pending.is_none() {
            // Nothing loaded; the load failure has already been reported.
            return;
        }
        if !self.attach() {
            self.awaiting_unlock = true;
            self.events
                .emit(EngineEventKind::PlayFailed("no audio output device".into()));
            return;
        }
        if let Some(sink) = self.sink.as_ref() {
            sink.play();
        }
    }

    fn pause(&mut self) {
        self.wants_play = false;
        if let Some(sink) = self.sink.as_ref() {
            sink.pause();
        }
    }

    fn seek(&mut self, position: Duration) {
        let result = match (self.sink.as_ref(), self.pending.as_mut()) {
            // Drained: nothing left to seek in, and the end stays reported.
            (Some(sink), _) if sink.empty() => return,
            (Some(sink), _) => sink.try_seek(position),
            (None, Some(source)) => source.try_seek(position),
            (None, None) => return,
        };
        if let Err(e) = result {
            warn!(engine = %self.events.id(), error = %e, "seek failed");
        }
        self.ended = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(sink) = self.sink.as_ref() {
            sink.set_volume(volume);
        }
    }

    fn current_position(&self) -> Duration {
        self.sink.as_ref().map_or(Duration::ZERO, Sink::get_pos)
    }

    fn total_duration(&self) -> Option<Duration> {
        self.duration
    }

    fn poll(&mut self) {
        if self.awaiting_unlock && self.device.try_open() {
            self.awaiting_unlock = false;
            self.events.emit(EngineEventKind::Unlocked);
        }

        if self.wants_play && !self.ended {
            if let Some(sink) = self.sink.as_ref() {
                if sink.empty() {
                    self.ended = true;
                    self.events.emit(EngineEventKind::PlaybackEnded);
                }
            }
        }
    }

    fn dispose(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.pending = None;
        self.wants_play = false;
        self.awaiting_unlock = false;
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

pub struct RodioEngineFactory {
    device: Rc<OutputDevice>,
}

impl RodioEngineFactory {
    pub fn new(device: Rc<OutputDevice>) -> Self {
        Self { device }
    }
}

impl EngineFactory for RodioEngineFactory {
    fn create(&mut self, events: EngineEventSender) -> Box<dyn AudioEngine> {
        Box::new(RodioEngine::new(self.device.clone(), events))
    }
}
