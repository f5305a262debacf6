// crates/llmbattery-core/src/backend.rs
//
// Process-wide engine state, reference counted by live handle pairs.
// init on first retain, teardown on last release. Hosts keep one of these
// per process (the JNI layer holds it in a static registry).

use std::sync::{Mutex, MutexGuard};

use llmbattery_abi::backend::InferenceEngine;
use log::{debug, info, warn};

pub struct Backend<E: InferenceEngine> {
    engine: E,
    live: Mutex<usize>,
}

impl<E: InferenceEngine> Backend<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            live: Mutex::new(0),
        }
    }

    #[inline]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Number of handle pairs currently holding the backend.
    pub fn live_handles(&self) -> usize {
        *self.lock()
    }

    /// Take a reference; initializes the engine backend on 0 → 1.
    pub(crate) fn retain(&self) {
        let mut live = self.lock();
        if *live == 0 {
            info!("🧠 [backend] init");
            self.engine.backend_init();
        }
        *live += 1;
        debug!("[backend] retain → {} live", *live);
    }

    /// Drop a reference; tears the engine backend down on 1 → 0.
    pub(crate) fn release(&self) {
        let mut live = self.lock();
        match *live {
            0 => warn!("[backend] release with no live handles, ignored"),
            1 => {
                *live = 0;
                info!("🧹 [backend] free (last handle released)");
                self.engine.backend_free();
            }
            n => {
                *live = n - 1;
                debug!("[backend] release → {} live", *live);
            }
        }
    }

    // Counter stays consistent even if a holder panicked mid-update.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
