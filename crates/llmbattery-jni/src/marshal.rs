// crates/llmbattery-jni/src/marshal.rs
//
// Java string <-> Rust string. Null or undecodable input reads as "", and a
// failed allocation on the way out yields a null jstring.

use jni::objects::JString;
use jni::sys::jstring;
use jni::JNIEnv;
use log::warn;

pub fn read_string(env: &mut JNIEnv, value: &JString) -> String {
    if value.is_null() {
        return String::new();
    }
    match env.get_string(value) {
        Ok(s) => s.into(),
        Err(e) => {
            warn!("[jni] unreadable string argument: {e}");
            String::new()
        }
    }
}

pub fn write_string(env: &mut JNIEnv, value: &str) -> jstring {
    match env.new_string(value) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            warn!("[jni] new_string failed: {e}");
            std::ptr::null_mut()
        }
    }
}
