use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use crate::models::error::SessionError;
use crate::traits::capture_backend::CaptureEvent;

/// Work items for a session's notification thread.
pub(super) enum Dispatch {
    /// A ticker read `time` while the session was at `epoch`.
    Progress {
        epoch: u64,
        time: Duration,
        in_flight: Arc<AtomicBool>,
    },

    /// An event raised by the capture handle loaded as `generation`.
    Capture { generation: u64, event: CaptureEvent },

    /// An error detected synchronously by a session operation.
    Error(SessionError),

    Shutdown,
}

/// The session's own execution context: one thread draining a channel in order.
pub(super) struct Dispatcher {
    handle: Option<thread::JoinHandle<()>>,
    thread_id: ThreadId,
}

impl Dispatcher {
    pub(super) fn spawn<F>(
        name: String,
        receiver: Receiver<Dispatch>,
        mut deliver: F,
    ) -> io::Result<Self>
    where
        F: FnMut(Dispatch) + Send + 'static,
    {
        let handle = thread::Builder::new().name(name).spawn(move || {
            for message in receiver {
                if matches!(message, Dispatch::Shutdown) {
                    break;
                }
                deliver(message);
            }
        })?;
        let thread_id = handle.thread().id();

        Ok(Self {
            handle: Some(handle),
            thread_id,
        })
    }

    /// Whether the caller is running inside a notification callback.
    pub(super) fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Wait for the thread to exit. A `Shutdown` must already be queued.
    pub(super) fn join(&mut self) {
        if self.is_current() {
            return;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
