// crates/llmbattery-abi/src/params.rs
//
// Session + generation knobs. Defaults are tuned for phones: CPU only,
// 2k context, 512-slot batches, 256 generated tokens, one thread per
// physical core.

use crate::batch::DEFAULT_BATCH_CAPACITY;

pub const DEFAULT_N_CTX: u32 = 2048;
pub const DEFAULT_MAX_TOKENS: usize = 256;

pub const ENV_N_CTX: &str = "LLMBATTERY_N_CTX";
pub const ENV_N_BATCH: &str = "LLMBATTERY_N_BATCH";
pub const ENV_N_THREADS: &str = "LLMBATTERY_N_THREADS";
pub const ENV_MAX_TOKENS: &str = "LLMBATTERY_MAX_TOKENS";

/// Parameters used when creating an inference session over a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    /// Context window (tokens the KV cache can hold).
    pub n_ctx: u32,
    /// Batch capacity; also the longest prompt accepted in one forward step.
    pub n_batch: u32,
    /// Worker threads for the engine's matrix ops. `<= 0` means "pick for me".
    pub n_threads: i32,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            n_ctx: DEFAULT_N_CTX,
            n_batch: DEFAULT_BATCH_CAPACITY as u32,
            n_threads: 0,
        }
    }
}

impl SessionParams {
    /// Defaults with `LLMBATTERY_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides read through `lookup`. Unparsable values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut p = Self::default();
        if let Some(n) = lookup(ENV_N_CTX).and_then(|v| v.parse().ok()) {
            p.n_ctx = n;
        }
        if let Some(n) = lookup(ENV_N_BATCH).and_then(|v| v.parse().ok()) {
            p.n_batch = n;
        }
        if let Some(n) = lookup(ENV_N_THREADS).and_then(|v| v.parse().ok()) {
            p.n_threads = n;
        }
        p
    }

    /// Apply caller-supplied values from the boundary; non-positive values keep ours.
    pub fn with_overrides(mut self, n_threads: i32, n_ctx: i32) -> Self {
        if n_threads > 0 {
            self.n_threads = n_threads;
        }
        if n_ctx > 0 {
            self.n_ctx = n_ctx as u32;
        }
        self
    }

    /// Fill thread count if unset using physical cores (fallback to logical),
    /// and keep the batch within the context window.
    pub fn normalized(mut self) -> Self {
        if self.n_threads <= 0 {
            let physical = num_cpus::get_physical();
            let cores = if physical > 0 { physical } else { num_cpus::get() };
            self.n_threads = (cores as i32).max(1);
        }
        self.n_ctx = self.n_ctx.max(1);
        self.n_batch = self.n_batch.clamp(1, self.n_ctx);
        self
    }
}

/// Per-call generation knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationParams {
    /// Upper bound on emitted tokens.
    pub max_tokens: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl GenerationParams {
    pub fn from_env() -> Self {
        let max_tokens = std::env::var(ENV_MAX_TOKENS)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_TOKENS);
        Self { max_tokens }
    }

    /// `max_tokens <= 0` from the boundary keeps the configured budget.
    pub fn with_max_tokens(mut self, max_tokens: i32) -> Self {
        if max_tokens > 0 {
            self.max_tokens = max_tokens as usize;
        }
        self
    }
}
