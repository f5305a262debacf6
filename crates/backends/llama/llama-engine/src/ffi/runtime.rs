// crates/backends/llama/llama-engine/src/ffi/runtime.rs
//
// Process-wide llama backend init/shutdown + model load/unload.
// Keep context-specific bits in ffi::context. Init/free balancing is the
// caller's job (llmbattery-core reference counts it).

use std::{ffi::CString, ptr::NonNull};

use llama_cpp_sys_2::{
    llama_backend_free, llama_backend_init, llama_context, llama_free, llama_model,
    llama_model_default_params, llama_model_free, llama_model_load_from_file, llama_model_params,
};
use log::trace;

pub unsafe fn init_backend() {
    trace!("[ffi] llama_backend_init()");
    llama_backend_init();
}

pub unsafe fn deinit_backend() {
    trace!("[ffi] llama_backend_free()");
    llama_backend_free();
}

/// Model params for phones: CPU only, mmap for fast load.
pub fn default_model_params() -> llama_model_params {
    let mut p = unsafe { llama_model_default_params() };
    p.n_gpu_layers = 0;
    p.use_mmap = true;
    p
}

/// Load a model from disk. Caller owns the returned handle.
pub unsafe fn load_model(path: &str) -> Result<NonNull<llama_model>, String> {
    trace!("[ffi] load_model: {path}");
    let c_path = CString::new(path).map_err(|_| "model path has interior NUL".to_string())?;
    let ptr = llama_model_load_from_file(c_path.as_ptr(), default_model_params());
    NonNull::new(ptr).ok_or_else(|| format!("llama_model_load_from_file returned null for {path}"))
}

pub unsafe fn cleanup_model(model: *mut llama_model) {
    trace!("[ffi] llama_model_free()");
    llama_model_free(model);
}

pub unsafe fn cleanup_context(ctx: *mut llama_context) {
    trace!("[ffi] llama_free(context)");
    llama_free(ctx);
}
