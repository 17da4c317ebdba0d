/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

struct Canary {
    alive: AtomicBool,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Canary {
    fn new() -> Self {
        Self {
            alive: AtomicBool::new(true),
            thread: Mutex::new(None),
        }
    }
}

/// A worker thread whose closure polls `alive()` to learn when to give up,
/// either because `cancel()` was called or because the timeout elapsed.
pub struct RunLoop {
    flag: Weak<Canary>,
}

impl RunLoop {
    pub fn new<F, T>(fun: F) -> io::Result<Self>
    where
        F: FnOnce(&dyn Fn() -> bool) -> T,
        F: Send + 'static,
    {
        Self::new_with_timeout(fun, 0)
    }

    /// A `timeout_ms` of zero means no timeout.
    pub fn new_with_timeout<F, T>(fun: F, timeout_ms: u64) -> io::Result<Self>
    where
        F: FnOnce(&dyn Fn() -> bool) -> T,
        F: Send + 'static,
    {
        let flag = Arc::new(Canary::new());
        let flag_ = flag.clone();
        let timeout = Duration::from_millis(timeout_ms);

        // Spawn the run loop thread.
        let thread = thread::Builder::new().spawn(move || {
            let start = Instant::now();

            // A callback to determine whether the thread should terminate.
            let still_alive = || {
                // `flag.alive` will be false after cancel() was called.
                flag.alive.load(Ordering::Relaxed) &&
                // If a timeout was provided, we'll check that too.
                (timeout_ms == 0 || start.elapsed() < timeout)
            };

            // Ignore errors.
            let _ = fun(&still_alive);

            // The thread is done, nothing left to cancel.
            flag.alive.store(false, Ordering::Relaxed);
        })?;

        // We really should never fail to lock here.
        let mut guard = (*flag_)
            .thread
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "failed to lock"))?;

        // Store the thread handle so we can join later.
        *guard = Some(thread);

        Ok(Self {
            flag: Arc::downgrade(&flag_),
        })
    }

    // Cancels the run loop and waits for the thread to terminate.
    // This is a potentially BLOCKING operation.
    pub fn cancel(&self) {
        // If thread still exists...
        if let Some(flag) = self.flag.upgrade() {
            // ...let the run loop terminate.
            flag.alive.store(false, Ordering::Relaxed);

            // Locking should never fail here either.
            if let Ok(mut guard) = flag.thread.lock() {
                // This really can't fail.
                if let Some(handle) = (*guard).take() {
                    // This might fail, ignore.
                    let _ = handle.join();
                }
            }
        }
    }

    // Tells whether the runloop has been cancelled or has finished.
    pub fn cancelled(&self) -> bool {
        match self.flag.upgrade() {
            Some(flag) => !flag.alive.load(Ordering::Relaxed),
            _ => true,
        }
    }
}
