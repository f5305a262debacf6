//! Next-token selection over an output distribution.

use llmbattery_abi::token::Token;

/// Picks the next token from one vocabulary-wide score vector.
/// Stochastic strategies (temperature, top-k, ...) plug in here.
pub trait Sampler {
    /// `None` if `logits` is empty.
    fn sample(&mut self, logits: &[f32]) -> Option<Token>;
}

/// Argmax. Linear scan with strict `>`, so the lowest id wins ties and the
/// result is deterministic for a fixed distribution.
#[derive(Debug, Default, Clone, Copy)]
pub struct Greedy;

impl Sampler for Greedy {
    fn sample(&mut self, logits: &[f32]) -> Option<Token> {
        let (first, rest) = logits.split_first()?;
        let mut best_id = 0usize;
        let mut best = *first;
        for (i, &score) in rest.iter().enumerate() {
            if score > best {
                best = score;
                best_id = i + 1;
            }
        }
        Some(Token(best_id as i32))
    }
}
