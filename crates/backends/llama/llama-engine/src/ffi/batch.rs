// crates/backends/llama/llama-engine/src/ffi/batch.rs
//
// Safe wrappers around llama_batch fiddling.
// All raw pointer writes live here. Callers bounds-check `index` against the
// capacity the batch was initialized with.

use llama_cpp_sys_2::{llama_batch, llama_batch_free, llama_batch_init};

pub use llama_cpp_sys_2::llama_batch as RawBatch;

/// Initialize a token-mode batch with capacity `n_tokens`, embd=0.
/// llama allocates `n_seq_max` seq-id slots per token.
pub fn init(n_tokens: usize, n_seq_max: usize) -> llama_batch {
    unsafe { llama_batch_init(n_tokens as i32, 0, n_seq_max as i32) }
}

/// Free a batch previously returned by `init`.
pub fn free(batch: llama_batch) {
    unsafe { llama_batch_free(batch) }
}

#[inline]
pub fn set_n_tokens(raw: &mut llama_batch, v: i32) {
    raw.n_tokens = v;
}

pub fn set_token(raw: &mut llama_batch, index: usize, token: i32) {
    unsafe {
        *raw.token.add(index) = token;
    }
}

pub fn set_pos(raw: &mut llama_batch, index: usize, pos: i32) {
    unsafe {
        *raw.pos.add(index) = pos;
    }
}

/// Set logits flag for a slot (no-op if logits buffer is null).
pub fn set_logits(raw: &mut llama_batch, index: usize, flag: bool) {
    unsafe {
        if !raw.logits.is_null() {
            *raw.logits.add(index) = flag as i8;
        }
    }
}

/// Write seq ids into llama's own per-slot array (no-op if fields are null).
/// `ids.len()` must not exceed the `n_seq_max` used at init.
pub fn set_seq_ids(raw: &mut llama_batch, index: usize, ids: &[i32]) {
    unsafe {
        if raw.seq_id.is_null() || raw.n_seq_id.is_null() {
            return;
        }
        let slot = *raw.seq_id.add(index);
        if slot.is_null() {
            return;
        }
        for (j, id) in ids.iter().enumerate() {
            *slot.add(j) = *id;
        }
        *raw.n_seq_id.add(index) = ids.len() as i32;
    }
}
