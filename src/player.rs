//! Transport state machine.
//!
//! `Player` is the one mutable cell that owns the queue, the observable state
//! and the live engine. Engine callbacks capture nothing: they come back later
//! as `EngineEvent`s tagged with the engine id, and every decision reads the
//! queue, index and repeat mode as they are when the event is handled. Events
//! from an engine that is no longer the active one are dropped.
//!
//! Status flow: `Idle -> Loading -> Playing <-> Paused`, then `Ended` (followed
//! straight away by the next `Loading`, or `Idle` when the queue is done) or
//! `Error`. Selecting a track from any status goes back to `Loading`.

mod model;
mod progress;

use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::catalog::{Catalog, PlaybackContext, Track, TrackId};
use crate::engine::{
    AudioEngine, EngineEvent, EngineEventKind, EngineEventSender, EngineFactory, EngineId,
};
use crate::error::PlayerError;
use crate::queue::{NextSelection, QueueManager, Retreat, Trigger, decide_retreat};

pub use model::*;
pub use progress::ProgressPublisher;

/// One automatic `play()` retry per load, fired by the engine's `Unlocked`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum UnlockRetry {
    Available,
    Armed,
    Spent,
}

/// The live engine instance. Dropping it disposes the engine.
struct ActiveEngine {
    id: EngineId,
    handle: Box<dyn AudioEngine>,
    loaded: bool,
    retry: UnlockRetry,
}

impl Drop for ActiveEngine {
    fn drop(&mut self) {
        self.handle.dispose();
    }
}

pub struct Player {
    catalog: Box<dyn Catalog>,
    queue: QueueManager,
    state: PlayerState,
    factory: Box<dyn EngineFactory>,
    engine: Option<ActiveEngine>,
    engine_tx: Sender<EngineEvent>,
    next_engine_id: u64,
    progress: ProgressPublisher,
    restart_threshold: Duration,
    events: Vec<PlayerEvent>,
}

impl Player {
    pub fn new(
        catalog: Box<dyn Catalog>,
        factory: Box<dyn EngineFactory>,
        engine_tx: Sender<EngineEvent>,
        options: PlayerOptions,
    ) -> Self {
        let queue = match options.shuffle_seed {
            Some(seed) => QueueManager::with_seed(seed),
            None => QueueManager::new(),
        };
        let state = PlayerState {
            volume: options.volume.clamp(0.0, 1.0),
            shuffled: options.shuffled,
            repeat_mode: options.repeat_mode,
            ..PlayerState::default()
        };

        Self {
            catalog,
            queue,
            state,
            factory,
            engine: None,
            engine_tx,
            next_engine_id: 1,
            progress: ProgressPublisher::new(options.progress_interval),
            restart_threshold: options.restart_threshold,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn queue(&self) -> &QueueManager {
        &self.queue
    }

    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    pub fn catalog_mut(&mut self) -> &mut dyn Catalog {
        self.catalog.as_mut()
    }

    /// Id of the engine whose events are currently accepted.
    #[cfg(test)]
    pub fn active_engine(&self) -> Option<EngineId> {
        self.engine.as_ref().map(|e| e.id)
    }

    #[cfg(test)]
    pub fn progress_running(&self) -> bool {
        self.progress.is_running()
    }

    /// When the next progress tick is due, if one is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.progress.next_due()
    }

    /// Notifications accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Play `track` from the current view.
    ///
    /// Picking the track that is already loaded toggles play/pause instead of
    /// reloading it.
    pub fn play_track(&mut self, track: Track) {
        let is_current = self
            .state
            .current_track
            .as_ref()
            .is_some_and(|t| t.id == track.id);
        if is_current && self.engine.is_some() {
            self.toggle_play_pause();
            return;
        }

        let context_tracks = self.catalog.list_tracks(&self.state.context);
        self.queue
            .build_context(context_tracks, &track, self.state.shuffled);
        self.events.push(PlayerEvent::QueueChanged);
        self.load(track);
    }

    /// Play track `id` if the current view lists it. False otherwise, since
    /// a track outside the view has no place in the queue built from it.
    pub fn play_track_id(&mut self, id: TrackId) -> bool {
        let found = self
            .catalog
            .list_tracks(&self.state.context)
            .into_iter()
            .find(|t| t.id == id);
        match found {
            Some(track) => {
                self.play_track(track);
                true
            }
            None => {
                warn!(track = id, context = %self.state.context, "track not in view");
                false
            }
        }
    }

    pub fn toggle_play_pause(&mut self) {
        let Some(active) = self.engine.as_mut() else {
            // No engine: either nothing was ever played or the last load failed.
            match self.state.current_track.clone() {
                Some(track) => self.load(track),
                None => self.start_context(),
            }
            return;
        };

        match self.state.status {
            PlaybackStatus::Playing => {
                active.handle.pause();
                self.progress.stop();
                self.set_status(PlaybackStatus::Paused);
            }
            PlaybackStatus::Loading => {
                active.handle.pause();
                self.set_status(PlaybackStatus::Paused);
            }
            _ => {
                active.handle.play();
                let ready = active.loaded && active.retry != UnlockRetry::Armed;
                if ready {
                    self.begin_playing();
                } else {
                    self.set_status(PlaybackStatus::Loading);
                }
            }
        }
    }

    /// Resume or start; no-op while already playing or loading.
    pub fn play(&mut self) {
        if !matches!(
            self.state.status,
            PlaybackStatus::Playing | PlaybackStatus::Loading
        ) {
            self.toggle_play_pause();
        }
    }

    /// Pause; no-op unless playing or loading.
    pub fn pause(&mut self) {
        if matches!(
            self.state.status,
            PlaybackStatus::Playing | PlaybackStatus::Loading
        ) {
            self.toggle_play_pause();
        }
    }

    /// Stop outright: release the engine and rewind. The current track stays
    /// selected and the next resume starts it over.
    pub fn stop(&mut self) {
        if self.engine.is_none() && self.state.status == PlaybackStatus::Idle {
            return;
        }
        debug!("stop requested");
        self.settle_idle();
    }

    pub fn next(&mut self) {
        self.advance(Trigger::Manual);
    }

    /// Restart the current track past the forgiveness window, otherwise step
    /// back in the context queue. The user queue is never consulted.
    pub fn previous(&mut self) {
        let elapsed = self
            .engine
            .as_ref()
            .map_or(Duration::ZERO, |e| e.handle.current_position());

        match decide_retreat(
            elapsed,
            self.restart_threshold,
            self.queue.index(),
            self.queue.queue().len(),
        ) {
            Retreat::Restart => self.seek(Duration::ZERO),
            Retreat::Context(_) => {
                if let Some((_, track)) = self.queue.retreat() {
                    self.events.push(PlayerEvent::QueueChanged);
                    self.load(track);
                }
            }
            Retreat::Empty => debug!("previous requested with an empty context queue"),
        }
    }

    pub fn seek(&mut self, position: Duration) {
        let Some(active) = self.engine.as_mut() else {
            return;
        };
        let position = if self.state.total_duration > Duration::ZERO {
            position.min(self.state.total_duration)
        } else {
            position
        };
        active.handle.seek(position);
        self.state.current_time = position;
        self.events.push(PlayerEvent::Progress(position));
    }

    pub fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            warn!(volume, "ignoring non-finite volume");
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        self.state.volume = volume;
        if let Some(active) = self.engine.as_mut() {
            active.handle.set_volume(volume);
        }
        self.events.push(PlayerEvent::VolumeChanged(volume));
    }

    /// Flip shuffle without changing what is audible.
    pub fn toggle_shuffle(&mut self) {
        self.state.shuffled = !self.state.shuffled;
        self.queue
            .toggle_shuffle(self.state.shuffled, self.state.current_track.as_ref());
        debug!(shuffled = self.state.shuffled, "shuffle toggled");
        self.push_modes();
        self.events.push(PlayerEvent::QueueChanged);
    }

    pub fn cycle_repeat_mode(&mut self) {
        self.state.repeat_mode = self.state.repeat_mode.cycle();
        debug!(repeat = self.state.repeat_mode.label(), "repeat mode changed");
        self.push_modes();
    }

    /// Append to the "play next" queue.
    pub fn enqueue_next(&mut self, track: Track) {
        debug!(track = track.id, "queued next");
        self.queue.enqueue_user(track);
        self.events.push(PlayerEvent::QueueChanged);
    }

    /// Change the browsed view. The running queue is left alone; the new view
    /// only seeds the next `play_track`.
    pub fn switch_context(&mut self, context: PlaybackContext) {
        if self.state.context == context {
            return;
        }
        self.state.context = context.clone();
        self.events.push(PlayerEvent::ContextChanged(context));
    }

    pub fn toggle_queue_open(&mut self) {
        self.state.queue_open = !self.state.queue_open;
    }

    /// React to an engine event. Events from any engine other than the active
    /// one are ignored.
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        let Some(active) = self.engine.as_mut() else {
            debug!(engine = %event.engine, kind = ?event.kind, "ignoring event with no active engine");
            return;
        };
        if active.id != event.engine {
            debug!(engine = %event.engine, active = %active.id, kind = ?event.kind, "ignoring event from stale engine");
            return;
        }

        match event.kind {
            EngineEventKind::Loaded => {
                active.loaded = true;
                let blocked = active.retry == UnlockRetry::Armed;
                self.state.total_duration = active.handle.total_duration().unwrap_or_default();
                if self.state.status == PlaybackStatus::Loading && !blocked {
                    self.begin_playing();
                }
            }
            EngineEventKind::PlaybackEnded => {
                if self.state.status != PlaybackStatus::Playing {
                    debug!(status = %self.state.status, "ignoring end of playback");
                    return;
                }
                self.progress.stop();
                self.set_status(PlaybackStatus::Ended);
                self.advance(Trigger::Auto);
            }
            EngineEventKind::LoadFailed(reason) => {
                self.fail(PlayerError::EngineLoadFailure(reason));
            }
            EngineEventKind::PlayFailed(reason) => match active.retry {
                UnlockRetry::Available => {
                    active.retry = UnlockRetry::Armed;
                    warn!(engine = %event.engine, %reason, "playback blocked, retrying once on unlock");
                    self.progress.stop();
                    if self.state.status == PlaybackStatus::Playing {
                        self.set_status(PlaybackStatus::Loading);
                    }
                }
                UnlockRetry::Armed => debug!(%reason, "still waiting for unlock"),
                UnlockRetry::Spent => self.fail(PlayerError::EnginePlayFailure(reason)),
            },
            EngineEventKind::Unlocked => {
                if active.retry != UnlockRetry::Armed {
                    return;
                }
                // Paused in the meantime: keep the retry for the next resume.
                if !matches!(
                    self.state.status,
                    PlaybackStatus::Loading | PlaybackStatus::Playing
                ) {
                    return;
                }
                active.retry = UnlockRetry::Spent;
                active.handle.play();
                if active.loaded {
                    self.begin_playing();
                }
            }
        }
    }

    /// Drive the engine and the progress tick.
    pub fn tick(&mut self, now: Instant) {
        if let Some(active) = self.engine.as_mut() {
            active.handle.poll();
        }

        if !self.progress.poll(now) {
            return;
        }
        if self.state.status != PlaybackStatus::Playing {
            self.progress.stop();
            return;
        }
        let position = self
            .engine
            .as_ref()
            .map_or(Duration::ZERO, |e| e.handle.current_position());
        self.state.current_time = position;
        self.events.push(PlayerEvent::Progress(position));
    }

    /// Release the engine and stop ticking.
    pub fn shutdown(&mut self) {
        self.progress.stop();
        self.release_engine();
    }

    fn start_context(&mut self) {
        match self.catalog.list_tracks(&self.state.context).into_iter().next() {
            Some(first) => self.play_track(first),
            None => debug!(context = %self.state.context, "{}", PlayerError::CatalogUnavailable),
        }
    }

    fn advance(&mut self, trigger: Trigger) {
        match self.queue.advance(trigger, self.state.repeat_mode) {
            NextSelection::User(track) | NextSelection::Context { track, .. } => {
                self.events.push(PlayerEvent::QueueChanged);
                self.load(track);
            }
            NextSelection::Replay => match self.state.current_track.clone() {
                Some(track) => self.load(track),
                None => self.settle_idle(),
            },
            NextSelection::Exhausted => {
                info!("end of queue");
                self.settle_idle();
            }
            NextSelection::Empty => debug!(?trigger, "{}", PlayerError::EmptyQueue),
        }
    }

    /// Enter `Loading` for `track`: drop the old engine, build a new one,
    /// load and start it.
    fn load(&mut self, track: Track) {
        self.release_engine();
        self.progress.stop();

        let id = EngineId(self.next_engine_id);
        self.next_engine_id += 1;

        let mut handle = self
            .factory
            .create(EngineEventSender::new(id, self.engine_tx.clone()));
        handle.set_volume(self.state.volume);
        handle.load(&track.audio_url);
        handle.play();
        self.engine = Some(ActiveEngine {
            id,
            handle,
            loaded: false,
            retry: UnlockRetry::Available,
        });

        info!(track = track.id, title = %track.title, engine = %id, "loading track");

        let changed = self
            .state
            .current_track
            .as_ref()
            .is_none_or(|t| t.id != track.id);
        self.state.current_track = Some(track.clone());
        self.state.current_time = Duration::ZERO;
        self.state.total_duration = Duration::ZERO;
        self.state.last_error = None;
        if changed {
            self.events.push(PlayerEvent::TrackChanged(track));
        }
        self.events.push(PlayerEvent::Progress(Duration::ZERO));
        self.set_status(PlaybackStatus::Loading);
    }

    fn release_engine(&mut self) {
        if let Some(old) = self.engine.take() {
            debug!(engine = %old.id, "disposing engine");
            drop(old);
        }
    }

    /// Drop the engine and rewind to `Idle`, keeping the last track so a
    /// resume reloads it from the start.
    fn settle_idle(&mut self) {
        self.progress.stop();
        self.release_engine();
        self.state.current_time = Duration::ZERO;
        self.events.push(PlayerEvent::Progress(Duration::ZERO));
        self.set_status(PlaybackStatus::Idle);
    }

    fn fail(&mut self, error: PlayerError) {
        warn!(
            track = ?self.state.current_track.as_ref().map(|t| t.id),
            %error,
            "playback failed"
        );
        self.release_engine();
        self.progress.stop();
        self.state.last_error = Some(error.clone());
        self.set_status(PlaybackStatus::Error);
        self.events.push(PlayerEvent::Failed(error));
    }

    fn begin_playing(&mut self) {
        self.set_status(PlaybackStatus::Playing);
        self.progress.start(Instant::now());
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.state.status == status {
            return;
        }
        debug!(from = %self.state.status, to = %status, "status");
        self.state.status = status;
        self.events.push(PlayerEvent::StatusChanged(status));
    }

    fn push_modes(&mut self) {
        self.events.push(PlayerEvent::ModesChanged {
            shuffled: self.state.shuffled,
            repeat: self.state.repeat_mode,
        });
    }
}
