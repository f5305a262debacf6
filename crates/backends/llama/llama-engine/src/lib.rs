//! llama.cpp engine for the llmbattery bridge.
//!
//! Layering: `ffi::*` holds every raw call; `model`, `context` and `batch`
//! are owned RAII wrappers; `LlamaEngine` maps them onto `InferenceEngine`.

pub mod batch;
pub mod context;
pub mod ffi;
pub mod model;

use std::path::Path;

use llmbattery_abi::backend::InferenceEngine;
use llmbattery_abi::batch::Batch;
use llmbattery_abi::params::SessionParams;
use llmbattery_abi::token::Token;

pub use crate::context::LlamaSession;
pub use crate::model::LlamaModel;

/// Stateless entry point; all state lives in the handles it hands out.
#[derive(Debug, Default, Clone, Copy)]
pub struct LlamaEngine;

impl InferenceEngine for LlamaEngine {
    type Model = LlamaModel;
    type Session = LlamaSession;

    fn backend_init(&self) {
        unsafe { ffi::init_backend() }
    }

    fn backend_free(&self) {
        unsafe { ffi::deinit_backend() }
    }

    fn load_model(&self, path: &Path) -> Result<LlamaModel, String> {
        let path_str = path
            .to_str()
            .ok_or_else(|| "model path is not valid UTF-8".to_string())?;
        LlamaModel::load_from_file(path_str)
    }

    fn free_model(&self, model: LlamaModel) {
        drop(model);
    }

    fn create_session(&self, model: &LlamaModel, params: &SessionParams) -> Result<LlamaSession, String> {
        LlamaSession::new(model, params)
    }

    fn free_session(&self, session: LlamaSession) {
        drop(session);
    }

    fn tokenize(&self, model: &LlamaModel, text: &str) -> Result<Vec<Token>, String> {
        let ids = ffi::context::tokenize(model.as_ptr(), text)?;
        Ok(ids.into_iter().map(Token).collect())
    }

    fn token_to_piece(&self, model: &LlamaModel, token: Token) -> Result<Vec<u8>, String> {
        ffi::context::token_to_piece(model.as_ptr(), token.0)
    }

    fn decode(&self, session: &mut LlamaSession, batch: &Batch) -> i32 {
        session.decode(batch)
    }

    fn logits<'a>(&self, session: &'a LlamaSession, index: usize) -> Option<&'a [f32]> {
        session.logits(index)
    }

    fn is_eog(&self, model: &LlamaModel, token: Token) -> bool {
        ffi::context::is_eog(model.as_ptr(), token.0)
    }

    fn n_ctx(&self, session: &LlamaSession) -> usize {
        session.n_ctx()
    }

    fn clear_kv(&self, session: &mut LlamaSession) {
        session.clear_kv_cache();
    }
}
