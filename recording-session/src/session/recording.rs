use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::config::SessionConfig;
use crate::models::error::{LoadError, RuntimeError, SessionError};
use crate::models::settings::CaptureSettings;
use crate::models::snapshot::SessionSnapshot;
use crate::models::state::SessionState;
use crate::traits::audio_route::AudioRoute;
use crate::traits::capture_backend::{
    CaptureBackend, CaptureEvent, CaptureEventCallback, CaptureHandle,
};
use crate::traits::session_listener::SessionListener;

use super::dispatcher::{Dispatch, Dispatcher};
use super::ticker::ProgressTicker;

/// Mutable session state, protected by `parking_lot::Mutex`.
///
/// `handle.is_some()` iff `state.holds_handle()`; `ticker.is_some()` iff
/// `state == Recording`.
struct Inner<H> {
    state: SessionState,
    handle: Option<H>,
    /// Bumped before every construction attempt.
    generation: u64,
    ticker: Option<ProgressTicker>,
    /// Bumped whenever a ticker starts or is cancelled.
    epoch: u64,
    has_been_paused: bool,
    destination: Option<PathBuf>,
    loaded_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    last_error: Option<SessionError>,
}

impl<H: CaptureHandle> Inner<H> {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            handle: None,
            generation: 0,
            ticker: None,
            epoch: 0,
            has_been_paused: false,
            destination: None,
            loaded_at: None,
            started_at: None,
            last_error: None,
        }
    }

    /// Detach the handle and ticker so they can be dropped outside the lock.
    fn release(&mut self) -> (Option<H>, Option<ProgressTicker>) {
        self.epoch += 1;
        (self.handle.take(), self.ticker.take())
    }
}

/// State reachable from the dispatcher, ticker and capture callbacks.
struct Shared<H> {
    id: Uuid,
    inner: Mutex<Inner<H>>,
    listener: Mutex<Option<Weak<dyn SessionListener>>>,
    /// Held while a progress notification is checked and delivered.
    delivery: Mutex<()>,
    sender: Sender<Dispatch>,
}

impl<H: CaptureHandle> Shared<H> {
    fn listener(&self) -> Option<Arc<dyn SessionListener>> {
        self.listener.lock().as_ref().and_then(Weak::upgrade)
    }

    fn send(&self, message: Dispatch) {
        if self.sender.send(message).is_err() {
            log::warn!("[{}] notification dropped: dispatcher has exited", self.id);
        }
    }

    /// Callback handed to the handle constructed as `generation`.
    ///
    /// Forwards at most one `Finished` per handle.
    fn capture_callback(&self, generation: u64) -> CaptureEventCallback {
        let sender = self.sender.clone();
        let id = self.id;
        let finished = AtomicBool::new(false);

        Arc::new(move |event: CaptureEvent| {
            if matches!(event, CaptureEvent::Finished { .. })
                && finished.swap(true, Ordering::SeqCst)
            {
                log::warn!(
                    "[{}] duplicate completion from capture handle {} ignored",
                    id,
                    generation
                );
                return;
            }
            if sender.send(Dispatch::Capture { generation, event }).is_err() {
                log::debug!("[{}] capture event after session shutdown", id);
            }
        })
    }

    /// Ticker body: read elapsed time under the session lock and queue it.
    fn tick(&self, epoch: u64, in_flight: &Arc<AtomicBool>) -> bool {
        let time = {
            let inner = self.inner.lock();
            if inner.epoch != epoch || !inner.state.is_recording() {
                return false;
            }
            let Some(handle) = inner.handle.as_ref() else {
                return false;
            };
            if in_flight.swap(true, Ordering::AcqRel) {
                log::warn!("[{}] progress still pending, skipping tick", self.id);
                return true;
            }
            handle.elapsed()
        };

        log::trace!("[{}] tick at {:?}", self.id, time);
        self.send(Dispatch::Progress {
            epoch,
            time,
            in_flight: Arc::clone(in_flight),
        });
        true
    }

    /// Runs on the dispatcher thread.
    fn deliver(&self, message: Dispatch) {
        match message {
            Dispatch::Progress {
                epoch,
                time,
                in_flight,
            } => self.deliver_progress(epoch, time, &in_flight),
            Dispatch::Capture {
                generation,
                event: CaptureEvent::Finished { success },
            } => self.capture_finished(generation, success),
            Dispatch::Capture {
                generation,
                event: CaptureEvent::EncodeError(error),
            } => {
                log::error!("[{}] Encoding error: {}", self.id, error);
                let error = SessionError::Runtime(RuntimeError::Encoding(error));
                {
                    let mut inner = self.inner.lock();
                    if inner.generation == generation {
                        inner.last_error = Some(error.clone());
                    }
                }
                self.notify_error(&error);
            }
            Dispatch::Error(error) => self.notify_error(&error),
            Dispatch::Shutdown => {}
        }
    }

    fn deliver_progress(&self, epoch: u64, time: Duration, in_flight: &AtomicBool) {
        let _delivery = self.delivery.lock();
        let current = {
            let inner = self.inner.lock();
            inner.epoch == epoch && inner.state.is_recording()
        };

        if current {
            if let Some(listener) = self.listener() {
                listener.on_progress(time);
            }
        } else {
            log::trace!("[{}] stale progress discarded", self.id);
        }
        in_flight.store(false, Ordering::Release);
    }

    fn capture_finished(&self, generation: u64, success: bool) {
        let released = {
            let mut inner = self.inner.lock();
            let current = inner.generation == generation;
            if current && !success {
                inner.last_error = Some(RuntimeError::CompletionFailed.into());
            }
            if current && inner.state.holds_handle() {
                log::debug!(
                    "[{}] capture ended by backend while {} (success: {})",
                    self.id,
                    inner.state,
                    success
                );
                inner.state = if success {
                    SessionState::Stopped
                } else {
                    SessionState::Failed
                };
                Some(inner.release())
            } else {
                None
            }
        };

        if let Some((handle, ticker)) = released {
            drop(handle);
            if let Some(ticker) = ticker {
                ticker.cancel();
            }
        }

        if let Some(listener) = self.listener() {
            listener.on_finished(success);
        }
        if !success {
            log::error!("[{}] capture finished unsuccessfully", self.id);
            self.notify_error(&RuntimeError::CompletionFailed.into());
        }
    }

    fn notify_error(&self, error: &SessionError) {
        if let Some(listener) = self.listener() {
            listener.on_error(error);
        }
    }
}

/// Audio recording session.
///
/// Generic over the capture backend and the audio route. Every operation
/// takes `&self`, so a session can be shared behind an `Arc` and driven from
/// any thread, including from inside its own listener callbacks.
///
/// ```text
/// idle ─load→ loaded ─start→ recording ⇄ paused ─stop→ stopped ─load→ loaded
/// ```
///
/// Operations whose precondition does not hold leave the session untouched
/// and return `false` (or `LoadError::InvalidState`).
pub struct RecordingSession<B: CaptureBackend, R: AudioRoute> {
    backend: B,
    route: R,
    config: SessionConfig,
    shared: Arc<Shared<B::Handle>>,
    dispatcher: Dispatcher,
}

impl<B: CaptureBackend, R: AudioRoute> RecordingSession<B, R> {
    pub fn new(backend: B, route: R, config: SessionConfig) -> Result<Self, SessionError> {
        config.validate().map_err(SessionError::InvalidConfig)?;

        let (sender, receiver) = mpsc::channel();
        let shared = Arc::new(Shared {
            id: Uuid::new_v4(),
            inner: Mutex::new(Inner::new()),
            listener: Mutex::new(None),
            delivery: Mutex::new(()),
            sender,
        });

        let weak = Arc::downgrade(&shared);
        let dispatcher = Dispatcher::spawn(
            format!("{}-dispatch", config.thread_label),
            receiver,
            move |message| {
                if let Some(shared) = weak.upgrade() {
                    shared.deliver(message);
                }
            },
        )
        .map_err(|e| SessionError::Thread(format!("dispatcher: {}", e)))?;

        log::debug!("[{}] session created", shared.id);
        Ok(Self {
            backend,
            route,
            config,
            shared,
            dispatcher,
        })
    }

    /// Register the observer. Only a weak reference is kept.
    pub fn set_listener<L: SessionListener + 'static>(&self, listener: &Arc<L>) {
        let weak: Weak<L> = Arc::downgrade(listener);
        *self.shared.listener.lock() = Some(weak as Weak<dyn SessionListener>);
    }

    pub fn clear_listener(&self) {
        *self.shared.listener.lock() = None;
    }

    pub fn session_id(&self) -> Uuid {
        self.shared.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.shared.inner.lock().state
    }

    /// Whether the capture handle reports it is actively capturing.
    pub fn is_recording(&self) -> bool {
        self.shared
            .inner
            .lock()
            .handle
            .as_ref()
            .is_some_and(|handle| handle.is_recording())
    }

    pub fn is_loaded(&self) -> bool {
        self.shared.inner.lock().handle.is_some()
    }

    pub fn is_ticking(&self) -> bool {
        self.shared.inner.lock().ticker.is_some()
    }

    /// Set by `pause` when capture was running, cleared when it was not.
    pub fn has_been_paused(&self) -> bool {
        self.shared.inner.lock().has_been_paused
    }

    pub fn last_error(&self) -> Option<SessionError> {
        self.shared.inner.lock().last_error.clone()
    }

    /// Elapsed capture time, or `None` when no handle is loaded.
    pub fn current_time(&self) -> Option<Duration> {
        self.shared
            .inner
            .lock()
            .handle
            .as_ref()
            .map(|handle| handle.elapsed())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.shared.inner.lock();
        SessionSnapshot {
            session_id: self.shared.id,
            state: inner.state,
            destination: inner.destination.clone(),
            loaded_at: inner.loaded_at,
            started_at: inner.started_at,
            elapsed_secs: inner.handle.as_ref().map(|h| h.elapsed().as_secs_f64()),
            has_been_paused: inner.has_been_paused,
            is_ticking: inner.ticker.is_some(),
            last_error: inner.last_error.as_ref().map(|e| e.to_string()),
        }
    }

    /// Bind a new capture handle and activate the audio route.
    /// Transitions: idle/stopped/failed → loaded, or → failed on error.
    ///
    /// Failures are returned and also reported to the listener.
    pub fn load(
        &self,
        destination: impl AsRef<Path>,
        settings: &CaptureSettings,
    ) -> Result<(), LoadError> {
        let destination = destination.as_ref();
        let mut inner = self.shared.inner.lock();

        if !inner.state.can_load() {
            log::debug!("[{}] load ignored while {}", self.shared.id, inner.state);
            return Err(LoadError::InvalidState(inner.state));
        }

        inner.generation += 1;
        let generation = inner.generation;

        match self.open_handle(destination, settings, generation) {
            Ok(handle) => {
                inner.handle = Some(handle);
                inner.state = SessionState::Loaded;
                inner.has_been_paused = false;
                inner.destination = Some(destination.to_path_buf());
                inner.loaded_at = Some(Utc::now());
                inner.started_at = None;
                log::debug!(
                    "[{}] loaded capture handle {} for {}",
                    self.shared.id,
                    generation,
                    destination.display()
                );
                Ok(())
            }
            Err(error) => {
                log::error!("[{}] Error loading audio: {}", self.shared.id, error);
                inner.state = SessionState::Failed;
                inner.destination = None;
                let reported = SessionError::Load(error.clone());
                inner.last_error = Some(reported.clone());
                drop(inner);

                self.shared.send(Dispatch::Error(reported));
                Err(error)
            }
        }
    }

    /// The handle is dropped again if any later setup step fails.
    fn open_handle(
        &self,
        destination: &Path,
        settings: &CaptureSettings,
        generation: u64,
    ) -> Result<B::Handle, LoadError> {
        settings.validate().map_err(LoadError::InvalidSettings)?;

        let mut handle = self
            .backend
            .construct(destination, settings, self.shared.capture_callback(generation))
            .map_err(LoadError::Construction)?;
        handle.prepare().map_err(LoadError::Prepare)?;

        self.route.set_mode(self.config.route_mode)?;
        self.route.activate()?;
        Ok(handle)
    }

    /// Begin or resume capture and start the progress ticker.
    /// Transitions: loaded/paused → recording.
    ///
    /// Returns `true` if the session is now recording.
    pub fn start(&self) -> bool {
        let mut inner = self.shared.inner.lock();

        if !inner.state.can_start() {
            log::debug!("[{}] start ignored while {}", self.shared.id, inner.state);
            return false;
        }
        let Some(handle) = inner.handle.as_mut() else {
            return false;
        };

        if let Err(error) = handle.record() {
            log::error!("[{}] failed to start capture: {}", self.shared.id, error);
            let reported = SessionError::Runtime(RuntimeError::Record(error));
            inner.state = SessionState::Failed;
            inner.last_error = Some(reported.clone());
            let (handle, ticker) = inner.release();
            drop(inner);

            drop(handle);
            if let Some(ticker) = ticker {
                ticker.cancel();
            }
            self.shared.send(Dispatch::Error(reported));
            return false;
        }

        inner.epoch += 1;
        let epoch = inner.epoch;
        let weak = Arc::downgrade(&self.shared);
        let ticker = ProgressTicker::start(
            format!("{}-ticker", self.config.thread_label),
            self.config.progress_interval(),
            move |in_flight| match weak.upgrade() {
                Some(shared) => shared.tick(epoch, in_flight),
                None => false,
            },
        );

        match ticker {
            Ok(ticker) => inner.ticker = Some(ticker),
            Err(e) => {
                // Capture keeps running; only progress notifications are lost.
                log::error!("[{}] failed to spawn progress ticker: {}", self.shared.id, e);
                let reported = SessionError::Runtime(RuntimeError::Ticker(e.to_string()));
                inner.last_error = Some(reported.clone());
                self.shared.send(Dispatch::Error(reported));
            }
        }

        let resumed = inner.state == SessionState::Paused;
        inner.state = SessionState::Recording;
        if inner.started_at.is_none() {
            inner.started_at = Some(Utc::now());
        }
        log::debug!(
            "[{}] {} recording",
            self.shared.id,
            if resumed { "resumed" } else { "started" }
        );
        true
    }

    /// Pause capture and cancel the progress ticker.
    /// Transitions: recording → paused.
    ///
    /// If the handle was not actually capturing, the "was paused" flag is
    /// cleared instead of set. No progress notification is delivered after
    /// this returns.
    pub fn pause(&self) -> bool {
        let ticker = {
            let mut inner = self.shared.inner.lock();
            if !inner.state.can_pause() {
                log::debug!("[{}] pause ignored while {}", self.shared.id, inner.state);
                return false;
            }
            let Some(handle) = inner.handle.as_mut() else {
                return false;
            };

            let was_running = handle.is_recording();
            if was_running {
                handle.pause();
            }
            inner.has_been_paused = was_running;
            inner.state = SessionState::Paused;
            inner.epoch += 1;
            log::debug!("[{}] paused (capture was running: {})", self.shared.id, was_running);
            inner.ticker.take()
        };

        self.retire_ticker(ticker);
        true
    }

    /// Stop capture, cancel the ticker and release the handle.
    /// Transitions: recording/paused → stopped.
    ///
    /// `on_finished` follows once the handle's completion signal arrives. No
    /// progress notification is delivered after this returns.
    pub fn stop(&self) -> bool {
        let (handle, ticker) = {
            let mut inner = self.shared.inner.lock();
            if !inner.state.can_stop() {
                log::debug!("[{}] stop ignored while {}", self.shared.id, inner.state);
                return false;
            }
            if let Some(handle) = inner.handle.as_mut() {
                handle.stop();
            }
            inner.state = SessionState::Stopped;
            log::debug!("[{}] stopped", self.shared.id);
            inner.release()
        };

        drop(handle);
        self.retire_ticker(ticker);
        true
    }

    /// Cancel a detached ticker, then wait out any progress delivery that
    /// passed its epoch check before the cancellation.
    fn retire_ticker(&self, ticker: Option<ProgressTicker>) {
        if let Some(ticker) = ticker {
            ticker.cancel();
        }
        if !self.dispatcher.is_current() {
            drop(self.shared.delivery.lock());
        }
    }
}

impl<B: CaptureBackend, R: AudioRoute> Drop for RecordingSession<B, R> {
    fn drop(&mut self) {
        let (handle, ticker) = {
            let mut inner = self.shared.inner.lock();
            if inner.state.can_stop() {
                if let Some(handle) = inner.handle.as_mut() {
                    handle.stop();
                }
            }
            if inner.handle.is_some() {
                log::debug!("[{}] releasing capture handle on drop", self.shared.id);
                inner.state = SessionState::Stopped;
            }
            inner.release()
        };

        drop(handle);
        if let Some(ticker) = ticker {
            ticker.cancel();
        }
        // Queued behind any completion from the stop above, so the final
        // `on_finished` is delivered before the dispatcher exits.
        self.shared.send(Dispatch::Shutdown);
        self.dispatcher.join();
    }
}
