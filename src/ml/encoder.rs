// ============================================================
// Layer 5 — Encoder with Retained Feedback
// ============================================================
// Maps input tokens to latent semantics. The distinguishing
// mechanism is *retained feedback*: each transformer block keeps
// a detached copy of its previous output, and on the next pass
// that copy is blended into the block's input:
//
//   x = (1 - feedback) * x + feedback * retained[i]
//
// This gives every block an exponential-smoothing recurrence over
// its own history, a cheap stand-in for working-memory persistence
// across processing steps. Stored values are detached, so no
// gradient flows backward through a retained copy into later
// steps (truncated backpropagation through time).
//
// The retained slots live in a RetainedState cell owned by the
// caller, not on the module: burn modules are immutable during
// forward, and keeping the cell external makes ownership and
// reset discipline explicit.

use burn::{
    nn::{Embedding, EmbeddingConfig},
    prelude::*,
};

use crate::error::AgentError;
use crate::ml::block::{TransformerBlock, TransformerBlockConfig};
use crate::ml::positional::{PositionalEncoding, PositionalEncodingConfig};

// ─── RetainedState ────────────────────────────────────────────────────────────
/// Per-block retained outputs. Exactly one slot per transformer
/// block at all times; a `None` slot is the empty sentinel and the
/// blend is skipped for it (input passes through unchanged).
///
/// Must be reset at the start of every new sample. Skipping the
/// reset silently couples unrelated samples' hidden state.
pub struct RetainedState<B: Backend> {
    slots: Vec<Option<Tensor<B, 3>>>,
}

impl<B: Backend> RetainedState<B> {
    /// One empty slot per block.
    pub fn new(num_blocks: usize) -> Self {
        Self { slots: vec![None; num_blocks] }
    }

    /// All slots back to the empty sentinel.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    /// Number of slots; equal to the block count by construction.
    pub fn num_blocks(&self) -> usize {
        self.slots.len()
    }

    /// True when every slot is the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// The last block's retained output, if any pass has run.
    pub fn last(&self) -> Option<Tensor<B, 3>> {
        self.slots.last().and_then(Clone::clone)
    }

    fn get(&self, block: usize) -> Option<&Tensor<B, 3>> {
        self.slots[block].as_ref()
    }

    fn store(&mut self, block: usize, latent: Tensor<B, 3>) {
        self.slots[block] = Some(latent);
    }
}

// ─── WorkingMemory ────────────────────────────────────────────────────────────
/// The encoder's final latent sequence, held for the duration of
/// one decoding pass. Read-only for the decoder.
pub struct WorkingMemory<B: Backend> {
    latent: Tensor<B, 3>,
}

impl<B: Backend> WorkingMemory<B> {
    pub fn new(latent: Tensor<B, 3>) -> Self {
        Self { latent }
    }

    /// Sequence length of the memory.
    pub fn len(&self) -> usize {
        self.latent.dims()[1]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A handle to the latent for the decoder stack.
    pub fn latent(&self) -> Tensor<B, 3> {
        self.latent.clone()
    }
}

// ─── Encoder ──────────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct EncoderConfig {
    pub vocab_size: usize,
    pub seq_len:    usize,
    pub d_model:    usize,
    pub num_heads:  usize,
    pub num_blocks: usize,
    pub d_hidden:   usize,
    pub dropout:    f64,
    pub feedback:   f64,
}

impl EncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Encoder<B> {
        let embedding  = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let positional = PositionalEncodingConfig::new(self.d_model, self.seq_len).init(device);
        let blocks: Vec<TransformerBlock<B>> = (0..self.num_blocks)
            .map(|_| {
                TransformerBlockConfig::new(
                    self.d_model, self.num_heads, self.d_hidden, self.dropout,
                ).init(device)
            })
            .collect();
        Encoder { embedding, positional, blocks, feedback: self.feedback }
    }
}

#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    embedding:  Embedding<B>,
    positional: PositionalEncoding<B>,
    blocks:     Vec<TransformerBlock<B>>,
    feedback:   f64,
}

impl<B: Backend> Encoder<B> {
    /// One encoding pass. tokens: [1, seq_len]. Returns the final
    /// latent, which also lands (detached) in the last retained slot.
    ///
    /// Blocks run in strict index order: the blend at block i only
    /// depends on slot i from the prior call, never on outputs of
    /// other blocks in the same call.
    pub fn forward(
        &self,
        tokens:   Tensor<B, 2, Int>,
        retained: &mut RetainedState<B>,
    ) -> Result<Tensor<B, 3>, AgentError> {
        debug_assert_eq!(retained.num_blocks(), self.blocks.len());

        let x = self.embedding.forward(tokens);
        let mut x = self.positional.forward(x)?;

        for (i, block) in self.blocks.iter().enumerate() {
            if let Some(prev) = retained.get(i) {
                debug_assert_eq!(prev.dims(), x.dims());
                x = x.mul_scalar(1.0 - self.feedback)
                    + prev.clone().mul_scalar(self.feedback);
            }
            // Full bidirectional attention on the encoder path
            x = block.forward(x, None);
            retained.store(i, x.clone().detach());
        }

        Ok(x)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn encoder(num_blocks: usize, feedback: f64) -> Encoder<TestBackend> {
        let device = Default::default();
        EncoderConfig::new(10, 6, 8, 2, num_blocks, 16, 0.1, feedback).init(&device)
    }

    fn tokens(ids: [i32; 6]) -> Tensor<TestBackend, 2, Int> {
        let device = Default::default();
        Tensor::<TestBackend, 1, Int>::from_ints(ids.as_slice(), &device).reshape([1, 6])
    }

    fn to_vec(t: Tensor<TestBackend, 3>) -> Vec<f32> {
        t.into_data().to_vec().unwrap()
    }

    #[test]
    fn test_retained_has_one_slot_per_block() {
        let enc = encoder(3, 0.5);
        let mut retained = RetainedState::new(3);
        assert_eq!(retained.num_blocks(), 3);
        assert!(retained.is_empty());

        for _ in 0..4 {
            enc.forward(tokens([1, 2, 3, 1, 2, 3]), &mut retained).unwrap();
            assert_eq!(retained.num_blocks(), 3);
        }
        assert!(!retained.is_empty());
    }

    #[test]
    fn test_reset_gives_independence_from_prior_samples() {
        let enc = encoder(2, 0.5);
        let sample_a = [1, 2, 3, 4, 5, 6];
        let sample_b = [6, 5, 4, 3, 2, 1];

        // Run A, reset, then B
        let mut retained = RetainedState::new(2);
        enc.forward(tokens(sample_a), &mut retained).unwrap();
        retained.reset();
        assert!(retained.is_empty());
        let after_reset = to_vec(enc.forward(tokens(sample_b), &mut retained).unwrap());

        // Run B on a fresh cell
        let mut fresh = RetainedState::new(2);
        let from_fresh = to_vec(enc.forward(tokens(sample_b), &mut fresh).unwrap());

        assert_eq!(after_reset, from_fresh);
    }

    #[test]
    fn test_retention_changes_repeated_encoding() {
        let enc = encoder(2, 0.5);
        let mut retained = RetainedState::new(2);

        let first  = to_vec(enc.forward(tokens([1, 2, 3, 1, 2, 3]), &mut retained).unwrap());
        let second = to_vec(enc.forward(tokens([1, 2, 3, 1, 2, 3]), &mut retained).unwrap());

        // Same tokens, but the blended history shifts the output
        assert_ne!(first, second);
    }

    #[test]
    fn test_final_latent_matches_last_retained_slot() {
        let enc = encoder(2, 0.5);
        let mut retained = RetainedState::new(2);
        let out = to_vec(enc.forward(tokens([1, 2, 3, 4, 5, 6]), &mut retained).unwrap());
        let last = to_vec(retained.last().unwrap());
        assert_eq!(out, last);
    }

    #[test]
    fn test_overlong_sequence_is_an_error() {
        let device = Default::default();
        // seq_len capped at 4 but 6 tokens arrive
        let enc: Encoder<TestBackend> =
            EncoderConfig::new(10, 4, 8, 2, 2, 16, 0.1, 0.0).init(&device);
        let mut retained = RetainedState::new(2);
        let err = enc.forward(tokens([1, 2, 3, 4, 5, 6]), &mut retained).unwrap_err();
        assert_eq!(err, AgentError::SequenceLength { actual: 6, max: 4 });
    }
}
