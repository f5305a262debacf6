use std::path::Path;

use crate::batch::Batch;
use crate::params::SessionParams;
use crate::token::Token;

/// Capability set of a native inference engine, as consumed by the bridge.
///
/// Model and session handles are opaque to the bridge. The engine hands them
/// out and takes them back; the bridge owns them in between and guarantees
/// every handle is freed exactly once, sessions before their model.
///
/// Failure reporting follows the native API: loaders return `Err(String)`
/// with a human-readable cause, `decode` returns a raw status (0 = ok).
pub trait InferenceEngine: Send + Sync {
    /// Loaded weights. Immutable after load.
    type Model: Send;
    /// Inference session bound to one model; holds mutable KV state.
    type Session: Send;

    /// Process-wide backend setup. Called on first live handle pair.
    fn backend_init(&self);

    /// Process-wide backend teardown. Called when the last pair is released.
    fn backend_free(&self);

    fn load_model(&self, path: &Path) -> Result<Self::Model, String>;

    fn free_model(&self, model: Self::Model);

    fn create_session(
        &self,
        model: &Self::Model,
        params: &SessionParams,
    ) -> Result<Self::Session, String>;

    fn free_session(&self, session: Self::Session);

    fn tokenize(&self, model: &Self::Model, text: &str) -> Result<Vec<Token>, String>;

    /// Text fragment for one token, as raw bytes (may split a UTF-8 sequence).
    fn token_to_piece(&self, model: &Self::Model, token: Token) -> Result<Vec<u8>, String>;

    /// One forward step over `batch`. Non-zero return is a failure status.
    fn decode(&self, session: &mut Self::Session, batch: &Batch) -> i32;

    /// Output distribution (one score per vocabulary entry) for batch slot
    /// `index` of the last forward step. `None` if that slot kept no output.
    fn logits<'a>(&self, session: &'a Self::Session, index: usize) -> Option<&'a [f32]>;

    /// End-of-generation predicate over the model's vocabulary.
    fn is_eog(&self, model: &Self::Model, token: Token) -> bool;

    /// Context window the session was created with.
    fn n_ctx(&self, session: &Self::Session) -> usize;

    /// Drop all cached sequence state while keeping the session.
    fn clear_kv(&self, session: &mut Self::Session);
}
