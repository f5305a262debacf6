//! Batch encoding as seen from the decode loop.

use llmbattery_abi::batch::{BatchEncoder, BatchOverflow, DEFAULT_SEQ_ID};
use llmbattery_abi::params::{GenerationParams, SessionParams};
use llmbattery_abi::token::Token;
use llmbattery_core::{Backend, BridgeError, HandlePair};
use std::sync::Arc;

use crate::mock_engine::{Counters, MockEngine};

#[test]
fn sequence_of_n_tokens_fills_n_slots() {
    let tokens: Vec<Token> = (10..17).map(Token).collect();
    let batch = BatchEncoder::new(8).encode_sequence(&tokens, 3).expect("fits");

    assert_eq!(batch.len(), 7);
    for (i, entry) in batch.entries().iter().enumerate() {
        assert_eq!(entry.token, tokens[i]);
        assert_eq!(entry.pos, 3 + i as i32);
        assert_eq!(entry.seq_ids, vec![DEFAULT_SEQ_ID]);
        assert_eq!(entry.logits, i == 6, "only the last slot requests output");
    }
    assert_eq!(batch.output_index(), Some(6));
}

#[test]
fn sequence_over_capacity_produces_nothing() {
    let tokens = vec![Token(1); 9];
    let err = BatchEncoder::new(8).encode_sequence(&tokens, 0).unwrap_err();
    assert_eq!(
        err,
        BatchOverflow {
            requested: 9,
            capacity: 8
        }
    );
}

#[test]
fn prompt_longer_than_batch_is_an_error_not_a_truncation() {
    let engine = MockEngine::new();
    let backend = Arc::new(Backend::new(engine.clone()));
    let params = SessionParams {
        n_batch: 4,
        ..SessionParams::default()
    };
    let mut pair = HandlePair::acquire(&backend, "model.gguf", &params).expect("acquire");
    assert_eq!(pair.encoder().capacity(), 4);

    let err = pair
        .generate("one two three four five", &GenerationParams::default())
        .unwrap_err();
    match err {
        BridgeError::BatchOverflow(o) => {
            assert_eq!(o.requested, 5);
            assert_eq!(o.capacity, 4);
        }
        other => panic!("expected overflow, got {other:?}"),
    }
    assert_eq!(Counters::get(&engine.counters().decode), 0);

    // Exactly at capacity still runs.
    let out = pair
        .generate("one two three four", &GenerationParams { max_tokens: 1 })
        .expect("fits");
    assert_eq!(out.tokens_emitted, 1);
}
