use llmbattery_abi::backend::InferenceEngine;
use llmbattery_abi::params::GenerationParams;
use log::{debug, error, info, warn};

use super::{GenerationOutcome, MISSING_LOGITS_STATUS, Response, StopReason};
use crate::error::{BridgeError, Result};
use crate::handle::HandlePair;
use crate::sampling::Sampler;

impl<E: InferenceEngine> HandlePair<E> {
    /// Run the decode loop: encode → forward → sample → emit, until
    /// end-of-generation, a full context window, `max_tokens`, or a failed
    /// forward step.
    ///
    /// Fails only before the loop starts (invalid pair, empty prompt,
    /// tokenizer failure, prompt longer than the batch). Once the prompt is
    /// submitted every outcome is `Ok`, carrying whatever text was produced.
    pub fn generate_with<S: Sampler + ?Sized>(
        &mut self,
        prompt: &str,
        params: &GenerationParams,
        sampler: &mut S,
    ) -> Result<GenerationOutcome> {
        let encoder = *self.encoder();
        let (engine, model, session) = self.parts_mut()?;

        if prompt.is_empty() {
            return Err(BridgeError::EmptyInput("prompt is empty"));
        }
        debug!("[generate] prompt: {prompt}");

        let prompt_tokens = engine.tokenize(model, prompt).map_err(BridgeError::Tokenize)?;
        if prompt_tokens.is_empty() {
            return Err(BridgeError::EmptyInput("prompt produced no tokens"));
        }
        debug!("[generate] tokenized {} tokens", prompt_tokens.len());

        // Encoding (full prompt). Over-capacity is a hard stop, never a truncated batch.
        let mut batch = encoder.encode_sequence(&prompt_tokens, 0)?;

        let mut response = Response::new();
        let mut emitted = 0usize;
        let finish = |response: Response, emitted: usize, stop: StopReason| -> Result<GenerationOutcome> {
            let text = response.finish();
            info!(
                "✅ [generate] stop={stop:?} tokens={emitted} chars={}",
                text.chars().count()
            );
            Ok(GenerationOutcome {
                text,
                tokens_emitted: emitted,
                stop,
            })
        };

        if params.max_tokens == 0 {
            return finish(response, emitted, StopReason::MaxTokens);
        }
        let n_ctx = engine.n_ctx(session);
        if prompt_tokens.len() >= n_ctx {
            warn!(
                "[generate] prompt ({} tokens) fills the context window ({n_ctx})",
                prompt_tokens.len()
            );
            return finish(response, emitted, StopReason::ContextFull);
        }

        // Every call starts at position 0, so the session's cache must be empty.
        engine.clear_kv(session);

        // Forwarding (prompt).
        let rc = engine.decode(session, &batch);
        if rc != 0 {
            error!("[generate] prompt forward failed: {rc}");
            return finish(response, emitted, StopReason::DecodeFailed(rc));
        }
        let mut n_past = prompt_tokens.len() as i32;

        loop {
            // Sampling: distribution of the slot that requested output.
            let next = batch
                .output_index()
                .and_then(|idx| engine.logits(session, idx))
                .and_then(|logits| sampler.sample(logits));
            let Some(token) = next else {
                error!("[generate] no output distribution after forward step");
                return finish(response, emitted, StopReason::DecodeFailed(MISSING_LOGITS_STATUS));
            };
            debug!("[generate] step {emitted}: sampled {token:?}");

            if engine.is_eog(model, token) {
                return finish(response, emitted, StopReason::EndOfGeneration);
            }

            // Emitting.
            match engine.token_to_piece(model, token) {
                Ok(piece) => response.push_piece(&piece),
                Err(e) => warn!("[generate] no text for {token:?}: {e}"),
            }
            emitted += 1;

            if emitted >= params.max_tokens {
                return finish(response, emitted, StopReason::MaxTokens);
            }
            if n_past as usize + 1 >= n_ctx {
                debug!("[generate] context window reached at n_past={n_past}");
                return finish(response, emitted, StopReason::ContextFull);
            }

            // Encoding (single token) + Forwarding.
            batch = encoder.encode_single(token, n_past);
            let rc = engine.decode(session, &batch);
            if rc != 0 {
                error!("[generate] forward failed at n_past={n_past}: {rc}");
                return finish(response, emitted, StopReason::DecodeFailed(rc));
            }
            n_past += 1;
        }
    }
}
