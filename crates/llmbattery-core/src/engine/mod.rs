//! Greedy generation over a `HandlePair`.

use llmbattery_abi::backend::InferenceEngine;
use llmbattery_abi::params::GenerationParams;

use crate::error::Result;
use crate::handle::HandlePair;
use crate::sampling::Greedy;

// Child modules (private to this crate).
mod decode;
mod response;

pub use response::Response;

/// Status reported when a forward step left no distribution to sample from.
pub const MISSING_LOGITS_STATUS: i32 = -1;

/// Why the decode loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Sampled the end-of-generation token (not emitted).
    EndOfGeneration,
    /// The next forward step would fill the session's context window.
    ContextFull,
    /// `max_tokens` tokens were emitted.
    MaxTokens,
    /// A forward step failed with this status; text so far is kept.
    DecodeFailed(i32),
}

/// Result of one generate call. `text` is never absent, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub text: String,
    pub tokens_emitted: usize,
    pub stop: StopReason,
}

impl<E: InferenceEngine> HandlePair<E> {
    /// Greedy generation for `prompt`. See [`HandlePair::generate_with`].
    pub fn generate(
        &mut self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<GenerationOutcome> {
        self.generate_with(prompt, params, &mut Greedy)
    }
}
