// crates/backends/llama/llama-engine/src/batch.rs
//
// RAII wrapper over `llama_batch`, allocated once per session at n_batch
// capacity and refilled from an abi `Batch` before every forward step.

use llmbattery_abi::batch::Batch;

use crate::ffi::batch as ffi_batch;
use crate::ffi::batch::RawBatch;

/// Single-sequence decoding: one seq-id slot per token.
pub const N_SEQ_MAX: usize = 1;

pub struct LlamaBatch {
    raw: RawBatch,
    capacity: usize,
}

impl LlamaBatch {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            raw: ffi_batch::init(capacity, N_SEQ_MAX),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy `batch` into the native buffer. Rejects anything the buffer
    /// cannot hold instead of writing a prefix.
    pub fn fill(&mut self, batch: &Batch) -> Result<(), String> {
        if batch.len() > self.capacity {
            return Err(format!(
                "batch of {} entries exceeds native capacity {}",
                batch.len(),
                self.capacity
            ));
        }
        if let Some(e) = batch
            .entries()
            .iter()
            .find(|e| e.seq_ids.is_empty() || e.seq_ids.len() > N_SEQ_MAX)
        {
            return Err(format!(
                "entry at pos {} has {} seq ids (supported: 1..={N_SEQ_MAX})",
                e.pos,
                e.seq_ids.len()
            ));
        }

        for (i, e) in batch.entries().iter().enumerate() {
            ffi_batch::set_token(&mut self.raw, i, e.token.0);
            ffi_batch::set_pos(&mut self.raw, i, e.pos);
            ffi_batch::set_seq_ids(&mut self.raw, i, &e.seq_ids);
            ffi_batch::set_logits(&mut self.raw, i, e.logits);
        }
        ffi_batch::set_n_tokens(&mut self.raw, batch.len() as i32);
        Ok(())
    }

    #[inline]
    pub(crate) fn raw(&self) -> RawBatch {
        self.raw
    }
}

impl Drop for LlamaBatch {
    fn drop(&mut self) {
        ffi_batch::free(self.raw);
    }
}
