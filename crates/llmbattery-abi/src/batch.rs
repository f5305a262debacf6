// crates/llmbattery-abi/src/batch.rs
//
// Engine-agnostic batch: one unit of work for a forward step.
// Capacity is fixed at construction; overflowing it is an error, never a
// silent drop.

use thiserror::Error;

use crate::token::Token;

/// Sequence id as the engine sees it (llama.cpp: `llama_seq_id` = i32).
pub type SeqId = i32;

/// Sequence id assigned by the encoder. Single-sequence decoding only.
pub const DEFAULT_SEQ_ID: SeqId = 0;

/// Slots per batch unless configured otherwise.
pub const DEFAULT_BATCH_CAPACITY: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("batch overflow: {requested} entries requested, capacity is {capacity}")]
pub struct BatchOverflow {
    pub requested: usize,
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub token: Token,
    pub pos: i32,
    /// Never empty.
    pub seq_ids: Vec<SeqId>,
    /// Ask the engine to keep the output distribution for this slot.
    pub logits: bool,
}

/// Bounded, ordered list of entries submitted to one forward step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    entries: Vec<BatchEntry>,
    capacity: usize,
}

impl Batch {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity.min(DEFAULT_BATCH_CAPACITY)),
            capacity,
        }
    }

    /// Append one entry. Fails once the batch is full.
    pub fn push(&mut self, entry: BatchEntry) -> Result<(), BatchOverflow> {
        if self.entries.len() >= self.capacity {
            return Err(BatchOverflow {
                requested: self.entries.len() + 1,
                capacity: self.capacity,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Reset to empty, keeping capacity.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index of the last entry that requested output, i.e. where the next
    /// token's distribution is read after a forward step.
    pub fn output_index(&self) -> Option<usize> {
        self.entries.iter().rposition(|e| e.logits)
    }
}

/// Packs token sequences into batches of a fixed capacity.
#[derive(Debug, Clone, Copy)]
pub struct BatchEncoder {
    capacity: usize,
}

impl Default for BatchEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_CAPACITY)
    }
}

impl BatchEncoder {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Encode `tokens` at positions `start_pos..`, default sequence id, with
    /// output requested on the last entry only (greedy decoding never reads
    /// intermediate distributions).
    ///
    /// Over-capacity input is rejected up front; no partial batch is built.
    /// Near the top of the position range the usable capacity shrinks to the
    /// positions left before `i32::MAX`. `start_pos` must be non-negative.
    pub fn encode_sequence(&self, tokens: &[Token], start_pos: i32) -> Result<Batch, BatchOverflow> {
        let positions_left = (i32::MAX as i64 - start_pos as i64 + 1).max(0) as usize;
        let capacity = self.capacity.min(positions_left);
        if tokens.len() > capacity {
            return Err(BatchOverflow {
                requested: tokens.len(),
                capacity,
            });
        }

        let mut batch = Batch::with_capacity(self.capacity);
        let last = tokens.len().saturating_sub(1);
        for (i, token) in tokens.iter().enumerate() {
            batch.push(BatchEntry {
                token: *token,
                pos: start_pos + i as i32,
                seq_ids: vec![DEFAULT_SEQ_ID],
                logits: i == last,
            })?;
        }
        Ok(batch)
    }

    /// One-entry batch for an incremental generation step.
    pub fn encode_single(&self, token: Token, pos: i32) -> Batch {
        let mut batch = Batch::with_capacity(self.capacity);
        batch.entries.push(BatchEntry {
            token,
            pos,
            seq_ids: vec![DEFAULT_SEQ_ID],
            logits: true,
        });
        batch
    }
}
