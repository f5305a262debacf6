// crates/llmbattery-jni/src/exports.rs
//
// Native methods of com.research.llmbattery.LLMService.
//
// Java side:
//   private native long   initializeNative(String modelPath, int threadCount, int contextSize);
//   private native String inferNative(long handle, String prompt, int maxTokens);
//   private native void   freeNative(long handle);

use jni::objects::{JObject, JString};
use jni::sys::{jint, jlong, jstring};
use jni::JNIEnv;
use llama_engine::LlamaEngine;
use log::info;
use once_cell::sync::Lazy;

use crate::registry::{guarded, HandleRegistry, NULL_HANDLE};
use crate::{logging, marshal};

static REGISTRY: Lazy<HandleRegistry<LlamaEngine>> = Lazy::new(|| {
    logging::init();
    HandleRegistry::new(LlamaEngine)
});

/// Returns an opaque handle, or 0 on failure.
#[no_mangle]
pub extern "system" fn Java_com_research_llmbattery_LLMService_initializeNative(
    mut env: JNIEnv,
    _this: JObject,
    model_path: JString,
    thread_count: jint,
    context_size: jint,
) -> jlong {
    guarded("initializeNative", NULL_HANDLE, || {
        let path = marshal::read_string(&mut env, &model_path);
        info!("🔥 [jni] initializeNative(threads={thread_count}, n_ctx={context_size})");
        REGISTRY.init(&path, thread_count, context_size)
    })
}

/// Returns the generated text; "" on failure.
#[no_mangle]
pub extern "system" fn Java_com_research_llmbattery_LLMService_inferNative(
    mut env: JNIEnv,
    _this: JObject,
    handle: jlong,
    prompt: JString,
    max_tokens: jint,
) -> jstring {
    let text = guarded("inferNative", String::new(), || {
        let prompt = marshal::read_string(&mut env, &prompt);
        REGISTRY.generate(handle, &prompt, max_tokens)
    });
    marshal::write_string(&mut env, &text)
}

#[no_mangle]
pub extern "system" fn Java_com_research_llmbattery_LLMService_freeNative(
    _env: JNIEnv,
    _this: JObject,
    handle: jlong,
) {
    guarded("freeNative", (), || REGISTRY.free(handle));
}
