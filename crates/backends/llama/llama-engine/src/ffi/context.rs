// crates/backends/llama/llama-engine/src/ffi/context.rs
//
// Safe-ish wrappers around llama_cpp_sys_2 for context- and vocab-adjacent ops.
// All `unsafe` stays in here; higher layers call these helpers.

use std::{ffi::CString, os::raw::c_char, ptr::NonNull, slice};

use llama_cpp_sys_2::{
    llama_batch, llama_context, llama_context_default_params, llama_context_params, llama_decode,
    llama_get_logits_ith, llama_get_memory, llama_init_from_model, llama_memory_clear,
    llama_model, llama_model_get_vocab, llama_n_ctx, llama_token_to_piece, llama_tokenize,
    llama_vocab_is_eog, llama_vocab_n_tokens,
};
use llmbattery_abi::params::SessionParams;

/// Context params from the session knobs, starting from upstream defaults so
/// new llama.h fields keep sane values.
pub fn context_params(params: &SessionParams) -> llama_context_params {
    let mut p = unsafe { llama_context_default_params() };

    p.n_ctx = params.n_ctx;
    p.n_batch = params.n_batch;
    p.n_ubatch = params.n_batch;
    p.n_seq_max = 1;

    p.n_threads = params.n_threads;
    p.n_threads_batch = params.n_threads;

    p.embeddings = false;
    p.offload_kqv = false;
    p.no_perf = true;

    p
}

pub unsafe fn create_context(
    model: *mut llama_model,
    params: &SessionParams,
) -> Result<NonNull<llama_context>, String> {
    let ptr = llama_init_from_model(model, context_params(params));
    NonNull::new(ptr).ok_or_else(|| "llama_init_from_model returned null".into())
}

#[inline]
pub fn n_ctx(ctx: *mut llama_context) -> usize {
    unsafe { llama_n_ctx(ctx) as usize }
}

/// Vocab size for this model.
#[inline]
pub fn n_vocab(model: *mut llama_model) -> usize {
    unsafe {
        let vocab = llama_model_get_vocab(model);
        llama_vocab_n_tokens(vocab).max(0) as usize
    }
}

/// Clear the KV cache, data buffers included.
#[inline]
pub fn clear_kv(ctx: *mut llama_context) {
    unsafe {
        let mem = llama_get_memory(ctx);
        llama_memory_clear(mem, true);
    }
}

#[inline]
pub fn is_eog(model: *mut llama_model, id: i32) -> bool {
    unsafe {
        let vocab = llama_model_get_vocab(model);
        llama_vocab_is_eog(vocab, id)
    }
}

/// Thin wrapper for llama_decode; returns the raw status.
#[inline]
pub fn decode_batch(ctx: *mut llama_context, batch: llama_batch) -> i32 {
    unsafe { llama_decode(ctx, batch) }
}

/// Borrowed view of the logits for batch slot `index`, or None if that slot
/// kept no output.
/// SAFETY: caller must ensure `ctx` outlives the slice and that no decode
/// runs while it is alive.
pub unsafe fn logits_ith<'a>(ctx: *mut llama_context, index: i32, n_vocab: usize) -> Option<&'a [f32]> {
    let ptr = llama_get_logits_ith(ctx, index);
    if ptr.is_null() || n_vocab == 0 {
        return None;
    }
    Some(slice::from_raw_parts(ptr, n_vocab))
}

/// Two-pass tokenize with llama's sizing semantics:
/// - Probe with an empty buffer returns -needed
/// - Fill may also return -needed (too small) → resize & retry once
pub fn tokenize(model: *mut llama_model, text: &str) -> Result<Vec<i32>, String> {
    let c_text = CString::new(text).map_err(|e| format!("CString error: {e:?}"))?;
    let len = c_text.as_bytes().len() as i32;
    let vocab = unsafe { llama_model_get_vocab(model) };

    let probe = unsafe {
        llama_tokenize(
            vocab,
            c_text.as_ptr(),
            len,
            std::ptr::null_mut(),
            0,
            /* add_special   */ true,
            /* parse_special */ true,
        )
    };
    let needed = probe.unsigned_abs() as usize;
    if needed == 0 {
        return Ok(Vec::new());
    }

    let mut buf = vec![0i32; needed];
    let mut filled =
        unsafe { llama_tokenize(vocab, c_text.as_ptr(), len, buf.as_mut_ptr(), buf.len() as i32, true, true) };
    if filled < 0 {
        buf.resize(filled.unsigned_abs() as usize, 0);
        filled = unsafe {
            llama_tokenize(vocab, c_text.as_ptr(), len, buf.as_mut_ptr(), buf.len() as i32, true, true)
        };
        if filled < 0 {
            return Err(format!("llama_tokenize failed after retry: {filled}"));
        }
    }

    buf.truncate(filled as usize);
    Ok(buf)
}

/// Render one token to raw bytes (special tokens rendered too).
/// Negative return means "buffer too small, need -n": grow once and retry.
pub fn token_to_piece(model: *mut llama_model, id: i32) -> Result<Vec<u8>, String> {
    let vocab = unsafe { llama_model_get_vocab(model) };
    let mut buf = vec![0u8; 256];

    let mut wrote = unsafe {
        llama_token_to_piece(vocab, id, buf.as_mut_ptr() as *mut c_char, buf.len() as i32, 0, true)
    };
    if wrote < 0 {
        buf.resize(wrote.unsigned_abs() as usize, 0);
        wrote = unsafe {
            llama_token_to_piece(vocab, id, buf.as_mut_ptr() as *mut c_char, buf.len() as i32, 0, true)
        };
        if wrote < 0 {
            return Err(format!("llama_token_to_piece failed for {id}: {wrote}"));
        }
    }

    buf.truncate(wrote as usize);
    Ok(buf)
}
