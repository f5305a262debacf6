// crates/backends/llama/llama-engine/src/model.rs
//
// Owned `llama_model*`. Freed on drop through the central FFI cleanup.

use std::ptr::NonNull;

use llama_cpp_sys_2::llama_model;

use crate::ffi;
use crate::ffi::context as cctx;

pub struct LlamaModel {
    model: NonNull<llama_model>,
}

impl LlamaModel {
    pub fn load_from_file(path: &str) -> Result<Self, String> {
        let model = unsafe { ffi::load_model(path)? };
        Ok(Self { model })
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut llama_model {
        self.model.as_ptr()
    }

    pub fn n_vocab(&self) -> usize {
        cctx::n_vocab(self.as_ptr())
    }
}

impl Drop for LlamaModel {
    fn drop(&mut self) {
        unsafe { ffi::cleanup_model(self.model.as_ptr()) };
    }
}

// SAFETY: llama.cpp models are immutable after load; we only create/destroy
// sessions from them. All mutable state lives in LlamaSession.
unsafe impl Send for LlamaModel {}
unsafe impl Sync for LlamaModel {}
