// crates/backends/llama/llama-engine/src/context.rs
//
// One llama_context plus the native batch it decodes from.
// Must be dropped before the model it was created from.

use std::ptr::NonNull;

use llama_cpp_sys_2::llama_context;
use llmbattery_abi::batch::Batch;
use llmbattery_abi::params::SessionParams;
use log::error;

use crate::batch::LlamaBatch;
use crate::ffi;
use crate::ffi::context as cffi;
use crate::model::LlamaModel;

/// Status returned by `decode` when the batch could not be copied into the
/// native buffer. llama_decode itself uses 0, 1, 2 and -1.
pub const BATCH_REJECTED: i32 = -100;

pub struct LlamaSession {
    batch: LlamaBatch,
    ctx: NonNull<llama_context>,
    n_ctx: usize,
    n_vocab: usize,
}

impl LlamaSession {
    pub fn new(model: &LlamaModel, params: &SessionParams) -> Result<Self, String> {
        let ctx = unsafe { cffi::create_context(model.as_ptr(), params)? };
        let n_ctx = cffi::n_ctx(ctx.as_ptr());
        Ok(Self {
            batch: LlamaBatch::new(params.n_batch as usize),
            ctx,
            n_ctx,
            n_vocab: model.n_vocab(),
        })
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut llama_context {
        self.ctx.as_ptr()
    }

    #[inline]
    pub fn n_ctx(&self) -> usize {
        self.n_ctx
    }

    pub fn decode(&mut self, batch: &Batch) -> i32 {
        if let Err(e) = self.batch.fill(batch) {
            error!("[llama] {e}");
            return BATCH_REJECTED;
        }
        cffi::decode_batch(self.as_ptr(), self.batch.raw())
    }

    /// Logits of slot `index` from the last decode. Borrow ends before the next decode.
    pub fn logits(&self, index: usize) -> Option<&[f32]> {
        unsafe { cffi::logits_ith(self.as_ptr(), index as i32, self.n_vocab) }
    }

    pub fn clear_kv_cache(&mut self) {
        cffi::clear_kv(self.as_ptr());
    }
}

impl Drop for LlamaSession {
    fn drop(&mut self) {
        unsafe { ffi::cleanup_context(self.ctx.as_ptr()) };
    }
}

// SAFETY: a session is only ever used by one thread at a time (callers
// serialize per handle pair); llama contexts carry no thread affinity.
unsafe impl Send for LlamaSession {}
