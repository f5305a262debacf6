// crates/llmbattery-jni/src/registry.rs
//
// Boundary bookkeeping behind the JNI exports. Callers only ever see opaque
// i64 ids; each maps to one HandlePair behind its own lock. Nothing here
// returns an error or unwinds: failures become 0 / "" and a log line.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use llmbattery_abi::backend::InferenceEngine;
use llmbattery_abi::params::{GenerationParams, SessionParams};
use llmbattery_core::{Backend, HandlePair};
use log::{debug, error, info, warn};

/// Handle value meaning "no session".
pub const NULL_HANDLE: i64 = 0;

// `None` once freed; a generate call that raced with free sees it and bails.
type Slot<E> = Arc<Mutex<Option<HandlePair<E>>>>;

pub struct HandleRegistry<E: InferenceEngine> {
    backend: Arc<Backend<E>>,
    next_id: AtomicI64,
    slots: Mutex<HashMap<i64, Slot<E>>>,
    session_defaults: SessionParams,
    generation_defaults: GenerationParams,
}

impl<E: InferenceEngine> HandleRegistry<E> {
    /// Registry with defaults read from the `LLMBATTERY_*` environment.
    pub fn new(engine: E) -> Self {
        Self::with_defaults(engine, SessionParams::from_env(), GenerationParams::from_env())
    }

    pub fn with_defaults(
        engine: E,
        session_defaults: SessionParams,
        generation_defaults: GenerationParams,
    ) -> Self {
        Self {
            backend: Arc::new(Backend::new(engine)),
            next_id: AtomicI64::new(1),
            slots: Mutex::new(HashMap::new()),
            session_defaults,
            generation_defaults,
        }
    }

    pub fn backend(&self) -> &Arc<Backend<E>> {
        &self.backend
    }

    /// Handles currently registered.
    pub fn live_handles(&self) -> usize {
        lock(&self.slots).len()
    }

    /// Load a model and open a session. Returns a fresh non-zero id, or
    /// `NULL_HANDLE` on any failure. Non-positive `n_threads` / `n_ctx`
    /// keep the configured defaults.
    pub fn init(&self, model_path: &str, n_threads: i32, n_ctx: i32) -> i64 {
        guarded("init", NULL_HANDLE, || {
            let params = self
                .session_defaults
                .clone()
                .with_overrides(n_threads, n_ctx);
            match HandlePair::acquire(&self.backend, model_path, &params) {
                Ok(pair) => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    lock(&self.slots).insert(id, Arc::new(Mutex::new(Some(pair))));
                    info!("✅ [init] handle {id} ready");
                    id
                }
                Err(e) => {
                    error!("[init] {e}");
                    NULL_HANDLE
                }
            }
        })
    }

    /// Generate a reply. Always returns a string: empty on failure before
    /// generation starts, partial text if a forward step fails midway.
    /// Calls on the same handle are serialized.
    pub fn generate(&self, handle: i64, prompt: &str, max_tokens: i32) -> String {
        guarded("generate", String::new(), || {
            let Some(slot) = self.slot(handle) else {
                warn!("[generate] unknown handle {handle}");
                return String::new();
            };
            let mut guard = lock(&slot);
            let Some(pair) = guard.as_mut() else {
                warn!("[generate] handle {handle} was freed");
                return String::new();
            };

            let params = self.generation_defaults.clone().with_max_tokens(max_tokens);
            match pair.generate(prompt, &params) {
                Ok(outcome) => {
                    debug!(
                        "[generate] handle {handle}: {} tokens, {:?}",
                        outcome.tokens_emitted, outcome.stop
                    );
                    outcome.text
                }
                Err(e) => {
                    error!("[generate] handle {handle}: {e}");
                    String::new()
                }
            }
        })
    }

    /// Release the pair behind `handle`. Unknown, zero and already-freed ids
    /// are a logged no-op. Waits for an in-flight generate on the same handle.
    pub fn free(&self, handle: i64) {
        guarded("free", (), || {
            let removed = lock(&self.slots).remove(&handle);
            let Some(slot) = removed else {
                warn!("[free] unknown handle {handle}, ignored");
                return;
            };
            let pair = lock(&slot).take();
            if let Some(pair) = pair {
                pair.release();
                info!("🧹 [free] handle {handle} released");
            }
        })
    }

    fn slot(&self, handle: i64) -> Option<Slot<E>> {
        if handle == NULL_HANDLE {
            return None;
        }
        lock(&self.slots).get(&handle).cloned()
    }
}

/// Run `f`, turning a panic into `fallback` so nothing unwinds into the caller.
pub fn guarded<T, F>(op: &str, fallback: T, f: F) -> T
where
    F: FnOnce() -> T,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(v) => v,
        Err(payload) => {
            error!("💥 [{op}] panic: {}", panic_message(payload.as_ref()));
            fallback
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

// A panic inside a guarded call can poison a lock; the data is still usable.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
