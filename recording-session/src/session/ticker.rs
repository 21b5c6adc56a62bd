use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

/// Repeating timer on a dedicated thread.
///
/// Fires `on_tick` at a fixed rate until cancelled or until `on_tick`
/// returns `false`. Missed deadlines are skipped rather than replayed.
/// `on_tick` receives the ticker's in-flight flag; whoever consumes the tick
/// clears it.
pub(super) struct ProgressTicker {
    cancel: Arc<(Mutex<bool>, Condvar)>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ProgressTicker {
    pub(super) fn start<F>(name: String, interval: Duration, mut on_tick: F) -> io::Result<Self>
    where
        F: FnMut(&Arc<AtomicBool>) -> bool + Send + 'static,
    {
        let cancel = Arc::new((Mutex::new(false), Condvar::new()));
        let signal = Arc::clone(&cancel);
        let in_flight = Arc::new(AtomicBool::new(false));

        let handle = thread::Builder::new().name(name).spawn(move || {
            let (lock, cvar) = &*signal;
            let mut deadline = Instant::now() + interval;
            let mut cancelled = lock.lock();

            while !*cancelled {
                if !cvar.wait_until(&mut cancelled, deadline).timed_out() || *cancelled {
                    continue;
                }

                deadline += interval;
                let now = Instant::now();
                if deadline <= now {
                    deadline = now + interval;
                }

                // The session lock is taken inside on_tick; never hold ours across it.
                let keep_going = MutexGuard::unlocked(&mut cancelled, || on_tick(&in_flight));
                if !keep_going {
                    break;
                }
            }
        })?;

        Ok(Self {
            cancel,
            handle: Some(handle),
        })
    }

    /// Stop the timer and wait for its thread to exit.
    ///
    /// When this returns, `on_tick` is not running and will not run again.
    pub(super) fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        {
            let (lock, cvar) = &*self.cancel;
            *lock.lock() = true;
            cvar.notify_all();
        }
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
