// crates/llmbattery-core/src/handle.rs
//
// Paired (model, session) ownership. A `HandlePair` only exists fully built:
// `acquire` unwinds whatever it already obtained on failure. Release order is
// session → model → backend reference, exactly once, on `release` or on drop.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use llmbattery_abi::backend::InferenceEngine;
use llmbattery_abi::batch::BatchEncoder;
use llmbattery_abi::params::SessionParams;
use log::{debug, error, info};

use crate::backend::Backend;
use crate::error::{BridgeError, Result};

/// Owned model + session over one engine. Move-only; not safe for concurrent
/// generation (callers serialize per pair).
pub struct HandlePair<E: InferenceEngine> {
    backend: Arc<Backend<E>>,
    session: Option<E::Session>,
    model: Option<E::Model>,
    encoder: BatchEncoder,
    params: SessionParams,
}

impl<E: InferenceEngine> HandlePair<E> {
    /// Load `model_path` and create a session over it. `params` are normalized
    /// first (thread count filled in, batch clamped to the context window).
    pub fn acquire<P: AsRef<Path>>(
        backend: &Arc<Backend<E>>,
        model_path: P,
        params: &SessionParams,
    ) -> Result<Self> {
        let path = model_path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(BridgeError::ModelLoad("model path is empty".into()));
        }
        info!("📦 [acquire] loading model: {}", path.display());
        let params = params.clone().normalized();

        backend.retain();
        let engine = backend.engine();
        // Undoes the retain (and frees the model, once held) on every early
        // exit, including an engine panic unwinding through here.
        let mut partial = PartialAcquire::new(backend);

        let model = match engine.load_model(path) {
            Ok(m) => partial.hold(m),
            Err(e) => {
                error!("[acquire] model load failed: {e}");
                return Err(BridgeError::ModelLoad(e));
            }
        };

        let session = match engine.create_session(model, &params) {
            Ok(s) => s,
            Err(e) => {
                error!("[acquire] session create failed: {e}; releasing model");
                return Err(BridgeError::SessionCreate(e));
            }
        };
        let model = partial.complete();

        info!(
            "✅ [acquire] session ready (n_ctx={}, n_batch={}, n_threads={})",
            params.n_ctx, params.n_batch, params.n_threads
        );
        Ok(Self {
            backend: Arc::clone(backend),
            session: Some(session),
            model,
            encoder: BatchEncoder::new(params.n_batch as usize),
            params,
        })
    }

    /// Both members present.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.model.is_some() && self.session.is_some()
    }

    #[inline]
    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    #[inline]
    pub fn encoder(&self) -> &BatchEncoder {
        &self.encoder
    }

    /// Release session, then model, then the backend reference.
    pub fn release(mut self) {
        self.release_inner();
    }

    /// Engine plus split borrows of both handles, or `InvalidHandle`.
    pub(crate) fn parts_mut(&mut self) -> Result<(&E, &E::Model, &mut E::Session)> {
        match (self.model.as_ref(), self.session.as_mut()) {
            (Some(model), Some(session)) => Ok((self.backend.engine(), model, session)),
            _ => Err(BridgeError::InvalidHandle),
        }
    }

    // Idempotent: a second call finds both slots empty and does nothing.
    // Never unwinds; engine panics during teardown are logged and swallowed.
    fn release_inner(&mut self) {
        let session = self.session.take();
        let model = self.model.take();
        if session.is_none() && model.is_none() {
            return;
        }
        let engine = self.backend.engine();

        if let Some(session) = session {
            debug!("[release] freeing session");
            if panic::catch_unwind(AssertUnwindSafe(|| engine.free_session(session))).is_err() {
                error!("[release] panic while freeing session; continuing");
            }
        }
        if let Some(model) = model {
            debug!("[release] freeing model");
            if panic::catch_unwind(AssertUnwindSafe(|| engine.free_model(model))).is_err() {
                error!("[release] panic while freeing model; continuing");
            }
        }
        if panic::catch_unwind(AssertUnwindSafe(|| self.backend.release())).is_err() {
            error!("[release] panic while releasing backend; continuing");
        }
        info!("🧹 [release] handle pair released");
    }
}

impl<E: InferenceEngine> Drop for HandlePair<E> {
    fn drop(&mut self) {
        self.release_inner();
    }
}

/// What `acquire` holds before the pair exists. Dropped without `complete`,
/// it frees the model and gives back the backend reference.
struct PartialAcquire<'a, E: InferenceEngine> {
    backend: &'a Backend<E>,
    model: Option<E::Model>,
    done: bool,
}

impl<'a, E: InferenceEngine> PartialAcquire<'a, E> {
    fn new(backend: &'a Backend<E>) -> Self {
        Self {
            backend,
            model: None,
            done: false,
        }
    }

    fn hold(&mut self, model: E::Model) -> &E::Model {
        self.model.insert(model)
    }

    fn complete(mut self) -> Option<E::Model> {
        self.done = true;
        self.model.take()
    }
}

impl<E: InferenceEngine> Drop for PartialAcquire<'_, E> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if std::thread::panicking() {
            error!("[acquire] engine panicked mid-acquire; unwinding");
        }
        if let Some(model) = self.model.take() {
            self.backend.engine().free_model(model);
        }
        self.backend.release();
    }
}
