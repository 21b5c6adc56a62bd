//! Fake capabilities for exercising `RecordingSession` without audio hardware.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::models::config::{RouteMode, SessionConfig};
use crate::models::error::{CaptureError, RouteError, SessionError};
use crate::models::settings::CaptureSettings;
use crate::traits::audio_route::AudioRoute;
use crate::traits::capture_backend::{
    CaptureBackend, CaptureEvent, CaptureEventCallback, CaptureHandle,
};
use crate::traits::session_listener::SessionListener;

/// A ticker that never fires during a test.
pub(crate) fn idle_config() -> SessionConfig {
    SessionConfig {
        progress_interval_ms: 3_600_000,
        ..Default::default()
    }
}

pub(crate) fn invalid_settings() -> CaptureSettings {
    CaptureSettings {
        sample_rate: 0.0,
        ..Default::default()
    }
}

/// Shared knobs and counters behind a `FakeBackend` and its handles.
pub(crate) struct FakeControl {
    construct_error: Mutex<Option<CaptureError>>,
    prepare_error: Mutex<Option<CaptureError>>,
    record_error: Mutex<Option<CaptureError>>,
    finish_success: AtomicBool,
    stalled: AtomicBool,
    constructed: AtomicUsize,
    released: AtomicUsize,
    calls: Mutex<Vec<&'static str>>,
    events: Mutex<Option<CaptureEventCallback>>,
}

impl FakeControl {
    pub(crate) fn fail_construct(&self, error: CaptureError) {
        *self.construct_error.lock() = Some(error);
    }

    pub(crate) fn fail_prepare(&self, error: CaptureError) {
        *self.prepare_error.lock() = Some(error);
    }

    pub(crate) fn fail_record(&self, error: CaptureError) {
        *self.record_error.lock() = Some(error);
    }

    pub(crate) fn allow_record(&self) {
        *self.record_error.lock() = None;
    }

    /// Success flag the handle reports when stopped.
    pub(crate) fn set_finish_success(&self, success: bool) {
        self.finish_success.store(success, Ordering::SeqCst);
    }

    /// While stalled, handles report they are not capturing.
    pub(crate) fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    pub(crate) fn constructed(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }

    pub(crate) fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    /// Raise an event as the most recently constructed handle.
    /// Event callback handed to the most recently constructed handle.
    pub(crate) fn last_callback(&self) -> Option<CaptureEventCallback> {
        self.events.lock().clone()
    }

    pub(crate) fn fire(&self, event: CaptureEvent) {
        let callback = self.events.lock().clone();
        if let Some(callback) = callback {
            callback(event);
        }
    }

    fn record_call(&self, call: &'static str) {
        self.calls.lock().push(call);
    }
}

pub(crate) struct FakeBackend {
    control: Arc<FakeControl>,
}

impl FakeBackend {
    pub(crate) fn new() -> (Self, Arc<FakeControl>) {
        let control = Arc::new(FakeControl {
            construct_error: Mutex::new(None),
            prepare_error: Mutex::new(None),
            record_error: Mutex::new(None),
            finish_success: AtomicBool::new(true),
            stalled: AtomicBool::new(false),
            constructed: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            events: Mutex::new(None),
        });
        (
            Self {
                control: Arc::clone(&control),
            },
            control,
        )
    }
}

impl CaptureBackend for FakeBackend {
    type Handle = FakeHandle;

    fn construct(
        &self,
        _destination: &Path,
        _settings: &CaptureSettings,
        events: CaptureEventCallback,
    ) -> Result<FakeHandle, CaptureError> {
        if let Some(error) = self.control.construct_error.lock().clone() {
            return Err(error);
        }
        self.control.record_call("construct");
        self.control.constructed.fetch_add(1, Ordering::SeqCst);
        *self.control.events.lock() = Some(Arc::clone(&events));

        Ok(FakeHandle {
            control: Arc::clone(&self.control),
            events,
            recording: false,
            reads: AtomicU64::new(0),
        })
    }
}

/// Handle whose clock advances one second every time it is read.
pub(crate) struct FakeHandle {
    control: Arc<FakeControl>,
    events: CaptureEventCallback,
    recording: bool,
    reads: AtomicU64,
}

impl CaptureHandle for FakeHandle {
    fn prepare(&mut self) -> Result<(), CaptureError> {
        if let Some(error) = self.control.prepare_error.lock().clone() {
            return Err(error);
        }
        self.control.record_call("prepare");
        Ok(())
    }

    fn record(&mut self) -> Result<(), CaptureError> {
        if let Some(error) = self.control.record_error.lock().clone() {
            return Err(error);
        }
        self.control.record_call("record");
        self.recording = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.control.record_call("pause");
        self.recording = false;
    }

    fn stop(&mut self) {
        self.control.record_call("stop");
        self.recording = false;
        let success = self.control.finish_success.load(Ordering::SeqCst);
        (self.events)(CaptureEvent::Finished { success });
    }

    fn is_recording(&self) -> bool {
        self.recording && !self.control.stalled.load(Ordering::SeqCst)
    }

    fn elapsed(&self) -> Duration {
        Duration::from_secs(self.reads.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.control.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct FakeRoute {
    mode_error: Mutex<Option<RouteError>>,
    activate_error: Mutex<Option<RouteError>>,
    modes: Mutex<Vec<RouteMode>>,
    activations: AtomicUsize,
}

impl FakeRoute {
    pub(crate) fn fail_set_mode(&self, error: RouteError) {
        *self.mode_error.lock() = Some(error);
    }

    pub(crate) fn fail_activate(&self, error: RouteError) {
        *self.activate_error.lock() = Some(error);
    }

    pub(crate) fn modes(&self) -> Vec<RouteMode> {
        self.modes.lock().clone()
    }

    pub(crate) fn activations(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }
}

impl AudioRoute for FakeRoute {
    fn set_mode(&self, mode: RouteMode) -> Result<(), RouteError> {
        if let Some(error) = self.mode_error.lock().clone() {
            return Err(error);
        }
        self.modes.lock().push(mode);
        Ok(())
    }

    fn activate(&self) -> Result<(), RouteError> {
        if let Some(error) = self.activate_error.lock().clone() {
            return Err(error);
        }
        self.activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Notification {
    Finished(bool),
    Progress(Duration),
    Error(SessionError),
}

/// Listener that records every notification and lets tests wait on them.
#[derive(Default)]
pub(crate) struct CollectingListener {
    events: Mutex<Vec<Notification>>,
    changed: Condvar,
}

impl CollectingListener {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn events(&self) -> Vec<Notification> {
        self.events.lock().clone()
    }

    pub(crate) fn progress(&self) -> Vec<Duration> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Notification::Progress(time) => Some(*time),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn finished(&self) -> Vec<bool> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Notification::Finished(success) => Some(*success),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn errors(&self) -> Vec<SessionError> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Notification::Error(error) => Some(error.clone()),
                _ => None,
            })
            .collect()
    }

    /// Block until `done` holds for the recorded events or `timeout` passes.
    pub(crate) fn wait_for<F>(&self, done: F, timeout: Duration) -> bool
    where
        F: Fn(&[Notification]) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut events = self.events.lock();
        while !done(&events) {
            if self.changed.wait_until(&mut events, deadline).timed_out() {
                return done(&events);
            }
        }
        true
    }

    fn push(&self, notification: Notification) {
        self.events.lock().push(notification);
        self.changed.notify_all();
    }
}

impl SessionListener for CollectingListener {
    fn on_finished(&self, success: bool) {
        self.push(Notification::Finished(success));
    }

    fn on_progress(&self, time: Duration) {
        self.push(Notification::Progress(time));
    }

    fn on_error(&self, error: &SessionError) {
        self.push(Notification::Error(error.clone()));
    }
}
