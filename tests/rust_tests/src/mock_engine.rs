//! Mock implementation of the engine seam for testing purposes.
//!
//! Every native call is counted; failures and panics can be injected. Logits
//! follow a per-generate script: forward step `i` (counted from the last KV
//! clear) puts its peak on `script[i]`, or on `FALLBACK_TOKEN` once the script
//! runs out. Decode also checks that positions continue the cached sequence,
//! so a missing KV clear or a stuck position shows up as a failed step.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};

use llmbattery_abi::backend::InferenceEngine;
use llmbattery_abi::batch::Batch;
use llmbattery_abi::params::SessionParams;
use llmbattery_abi::token::Token;

// --- Mock vocabulary ---

pub const N_VOCAB: usize = 16;
pub const EOG_TOKEN: i32 = 15;
/// Peak once the script is exhausted. Never end-of-generation.
pub const FALLBACK_TOKEN: i32 = 5;
/// Every non-"Hello" word tokenizes to this id.
pub const WORD_TOKEN: i32 = 4;

// --- Mock status codes (mirroring llama_decode) ---

pub const STATUS_INJECTED: i32 = -3;
pub const STATUS_BAD_POSITION: i32 = -2;
pub const STATUS_NO_KV_SLOT: i32 = 1;

/// Text rendered for `id`.
pub fn piece_text(id: i32) -> String {
    match id {
        9 => "Hi there".to_string(),
        other => format!("<{other}>"),
    }
}

#[derive(Debug, Default)]
pub struct Counters {
    pub backend_init: AtomicUsize,
    pub backend_free: AtomicUsize,
    pub load: AtomicUsize,
    pub model_free: AtomicUsize,
    pub create: AtomicUsize,
    pub session_free: AtomicUsize,
    pub decode: AtomicUsize,
    pub clear_kv: AtomicUsize,
    pub tokenize: AtomicUsize,
    /// Sessions freed while a decode was running.
    pub free_during_decode: AtomicUsize,
}

impl Counters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Sum of every counter; zero means the engine was never touched.
    pub fn total(&self) -> usize {
        [
            &self.backend_init,
            &self.backend_free,
            &self.load,
            &self.model_free,
            &self.create,
            &self.session_free,
            &self.decode,
            &self.clear_kv,
            &self.tokenize,
        ]
        .iter()
        .map(|c| Self::get(c))
        .sum()
    }
}

#[derive(Debug)]
pub struct MockState {
    pub counters: Counters,
    pub fail_load: AtomicBool,
    pub fail_session: AtomicBool,
    pub panic_on_tokenize: AtomicBool,
    pub panic_on_load: AtomicBool,
    pub panic_on_session: AtomicBool,
    pub panic_on_free_session: AtomicBool,
    /// 1-based decode call (across the engine) that returns STATUS_INJECTED.
    /// 0 = never.
    pub fail_decode_on_call: AtomicUsize,
    pub n_ctx: AtomicUsize,
    script: Mutex<Vec<i32>>,
    in_decode: AtomicBool,
    // (entered, resume): the next decode waits on both before running.
    decode_hold: Mutex<Option<(Arc<Barrier>, Arc<Barrier>)>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            counters: Counters::default(),
            fail_load: AtomicBool::new(false),
            fail_session: AtomicBool::new(false),
            panic_on_tokenize: AtomicBool::new(false),
            panic_on_load: AtomicBool::new(false),
            panic_on_session: AtomicBool::new(false),
            panic_on_free_session: AtomicBool::new(false),
            fail_decode_on_call: AtomicUsize::new(0),
            n_ctx: AtomicUsize::new(64),
            script: Mutex::new(Vec::new()),
            in_decode: AtomicBool::new(false),
            decode_hold: Mutex::new(None),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    pub state: Arc<MockState>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Peaks for successive forward steps of each generate call.
    pub fn with_script(self, script: &[i32]) -> Self {
        *self.state.script.lock().unwrap() = script.to_vec();
        self
    }

    pub fn with_n_ctx(self, n_ctx: usize) -> Self {
        self.state.n_ctx.store(n_ctx, Ordering::SeqCst);
        self
    }

    /// Park the next decode call: it waits on `entered`, then on `resume`.
    pub fn hold_next_decode(&self, entered: Arc<Barrier>, resume: Arc<Barrier>) {
        *self.state.decode_hold.lock().unwrap() = Some((entered, resume));
    }

    pub fn counters(&self) -> &Counters {
        &self.state.counters
    }

    fn peak_for_step(&self, step: usize) -> i32 {
        let script = self.state.script.lock().unwrap();
        script.get(step).copied().unwrap_or(FALLBACK_TOKEN)
    }
}

#[derive(Debug)]
pub struct MockModel {
    pub path: String,
}

#[derive(Debug)]
pub struct MockSession {
    pub n_ctx: usize,
    /// Cached positions (KV length).
    pub kv_len: usize,
    /// Forward steps since the last KV clear.
    pub steps: usize,
    pub output_slot: Option<usize>,
    pub logits: Vec<f32>,
}

impl InferenceEngine for MockEngine {
    type Model = MockModel;
    type Session = MockSession;

    fn backend_init(&self) {
        self.state.counters.backend_init.fetch_add(1, Ordering::SeqCst);
    }

    fn backend_free(&self) {
        self.state.counters.backend_free.fetch_add(1, Ordering::SeqCst);
    }

    fn load_model(&self, path: &Path) -> Result<MockModel, String> {
        if self.state.panic_on_load.load(Ordering::SeqCst) {
            panic!("mock: loader blew up");
        }
        if self.state.fail_load.load(Ordering::SeqCst) {
            return Err(format!("mock: cannot load {}", path.display()));
        }
        self.state.counters.load.fetch_add(1, Ordering::SeqCst);
        Ok(MockModel {
            path: path.display().to_string(),
        })
    }

    fn free_model(&self, _model: MockModel) {
        self.state.counters.model_free.fetch_add(1, Ordering::SeqCst);
    }

    fn create_session(&self, _model: &MockModel, params: &SessionParams) -> Result<MockSession, String> {
        if self.state.panic_on_session.load(Ordering::SeqCst) {
            panic!("mock: context init blew up");
        }
        if self.state.fail_session.load(Ordering::SeqCst) {
            return Err("mock: context allocation failed".into());
        }
        self.state.counters.create.fetch_add(1, Ordering::SeqCst);
        let n_ctx = self.state.n_ctx.load(Ordering::SeqCst).min(params.n_ctx as usize);
        Ok(MockSession {
            n_ctx,
            kv_len: 0,
            steps: 0,
            output_slot: None,
            logits: Vec::new(),
        })
    }

    fn free_session(&self, _session: MockSession) {
        self.state.counters.session_free.fetch_add(1, Ordering::SeqCst);
        if self.state.in_decode.load(Ordering::SeqCst) {
            self.state.counters.free_during_decode.fetch_add(1, Ordering::SeqCst);
        }
        if self.state.panic_on_free_session.load(Ordering::SeqCst) {
            panic!("mock: context teardown blew up");
        }
    }

    fn tokenize(&self, _model: &MockModel, text: &str) -> Result<Vec<Token>, String> {
        self.state.counters.tokenize.fetch_add(1, Ordering::SeqCst);
        if self.state.panic_on_tokenize.load(Ordering::SeqCst) {
            panic!("mock: tokenizer blew up");
        }
        if text == "Hello" {
            return Ok(vec![Token(1), Token(2), Token(3)]);
        }
        Ok(text.split_whitespace().map(|_| Token(WORD_TOKEN)).collect())
    }

    fn token_to_piece(&self, _model: &MockModel, token: Token) -> Result<Vec<u8>, String> {
        Ok(piece_text(token.0).into_bytes())
    }

    fn decode(&self, session: &mut MockSession, batch: &Batch) -> i32 {
        self.state.in_decode.store(true, Ordering::SeqCst);
        let hold = self.state.decode_hold.lock().unwrap().take();
        if let Some((entered, resume)) = hold {
            entered.wait();
            resume.wait();
        }
        let status = self.decode_step(session, batch);
        self.state.in_decode.store(false, Ordering::SeqCst);
        status
    }

    fn logits<'a>(&self, session: &'a MockSession, index: usize) -> Option<&'a [f32]> {
        (session.output_slot == Some(index)).then_some(session.logits.as_slice())
    }

    fn is_eog(&self, _model: &MockModel, token: Token) -> bool {
        token.0 == EOG_TOKEN
    }

    fn n_ctx(&self, session: &MockSession) -> usize {
        session.n_ctx
    }

    fn clear_kv(&self, session: &mut MockSession) {
        self.state.counters.clear_kv.fetch_add(1, Ordering::SeqCst);
        session.kv_len = 0;
        session.steps = 0;
        session.output_slot = None;
    }
}

impl MockEngine {
    fn decode_step(&self, session: &mut MockSession, batch: &Batch) -> i32 {
        let call = self.state.counters.decode.fetch_add(1, Ordering::SeqCst) + 1;
        if self.state.fail_decode_on_call.load(Ordering::SeqCst) == call {
            return STATUS_INJECTED;
        }
        for (i, entry) in batch.entries().iter().enumerate() {
            if entry.pos as usize != session.kv_len + i {
                return STATUS_BAD_POSITION;
            }
        }
        if session.kv_len + batch.len() > session.n_ctx {
            return STATUS_NO_KV_SLOT;
        }

        session.kv_len += batch.len();
        session.output_slot = batch.output_index();
        let mut logits = vec![0.0f32; N_VOCAB];
        logits[self.peak_for_step(session.steps) as usize] = 1.0;
        session.logits = logits;
        session.steps += 1;
        0
    }
}
