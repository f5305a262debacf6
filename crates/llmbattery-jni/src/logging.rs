// crates/llmbattery-jni/src/logging.rs
//
// Logger install for the shared library. On Android, `log` records go to
// logcat under LOG_TAG; elsewhere the embedding host installs its own logger.

pub const LOG_TAG: &str = "llama-jni";

/// Safe to call repeatedly; only the first call installs anything.
#[cfg(target_os = "android")]
pub fn init() {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag(LOG_TAG),
    );
    log::info!("🔥 [jni] logger ready");
}

#[cfg(not(target_os = "android"))]
pub fn init() {}
