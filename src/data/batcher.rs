// ============================================================
// Layer 4 — Sample Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<TokenizedSample>
// into model-ready Int tensors.
//
// All sequences are already padded to the same length, so
// batching is flatten-then-reshape:
//   [s1_t1 .. s1_tL, s2_t1 .. sN_tL]  →  [N, L]
//
// The training loop drives the DataLoader with a batch size of
// one: the encoder's retained state is per-sample state, and
// samples must be processed strictly one at a time.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TokenizedSample;

// ─── SampleBatch ──────────────────────────────────────────────────────────────
/// A batch of samples ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct SampleBatch<B: Backend> {
    /// Token id sequences — shape: [batch_size, seq_len]
    pub tokens: Tensor<B, 2, Int>,

    /// Next-token targets — shape: [batch_size, seq_len]
    pub targets: Tensor<B, 2, Int>,
}

// ─── SampleBatcher ────────────────────────────────────────────────────────────
/// Holds the target device so tensors land where the model lives.
#[derive(Clone, Debug)]
pub struct SampleBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SampleBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<TokenizedSample, SampleBatch<B>> for SampleBatcher<B> {
    fn batch(&self, items: Vec<TokenizedSample>) -> SampleBatch<B> {
        let batch_size = items.len();
        // All sequences have the same length (pre-padded)
        let seq_len = items[0].input_ids.len();

        // Burn uses i32 for Int tensor construction
        let token_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i32))
            .collect();

        let target_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.targets.iter().map(|&x| x as i32))
            .collect();

        let tokens = Tensor::<B, 1, Int>::from_ints(
            token_flat.as_slice(), &self.device,
        ).reshape([batch_size, seq_len]);

        let targets = Tensor::<B, 1, Int>::from_ints(
            target_flat.as_slice(), &self.device,
        ).reshape([batch_size, seq_len]);

        SampleBatch { tokens, targets }
    }
}
