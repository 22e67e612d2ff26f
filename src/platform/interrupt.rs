// Colorful Logger - platform/interrupt.rs
//
// Turns Ctrl-C (SIGINT) and SIGTERM into a flag the replay loop polls, so a
// live stream ends through `SourceListener::stop` instead of killing the
// process mid-write.

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag::register;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Set once the process has been asked to stop.
#[derive(Debug, Clone)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    /// Register SIGINT and SIGTERM handlers that raise the returned flag.
    ///
    /// A handler the OS refuses is logged and skipped; the signal then keeps
    /// its default behaviour.
    pub fn register() -> Self {
        let flag = Arc::new(AtomicBool::new(false));
        for (name, signal) in [("SIGINT", SIGINT), ("SIGTERM", SIGTERM)] {
            // The handler only performs an atomic store.
            if let Err(e) = register(signal, Arc::clone(&flag)) {
                tracing::warn!(signal = name, error = %e, "Could not install signal handler");
            }
        }
        Self(flag)
    }

    /// A flag no signal is attached to.
    pub fn detached() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raise the flag by hand, as a signal would.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}
