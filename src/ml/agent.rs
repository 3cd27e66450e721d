// ============================================================
// Layer 5 — Cognitive Agent
// ============================================================
// The agent owns one Encoder and one Decoder and wires them into
// a learning signal: encode a sample (mutating the retained state
// cell), treat the final latent as working memory, and score the
// decoder's next-token predictions with cross-entropy.
//
// Two encode policies are supported because the observed variants
// of this system disagree on them:
//   Full      - the whole padded sample in one encoder pass
//   Windowed  - a fixed-size window slid over the sample with
//               stride one, retained state persisting across
//               window positions within the sample; the loss is
//               computed on the final window's positions
//
// Hyperparameters arrive in an immutable AgentConfig passed to
// the constructor; there is no module-level mutable state, so
// several differently-configured agents can coexist.

use burn::{
    nn::loss::CrossEntropyLossConfig,
    prelude::*,
};

use crate::data::batcher::SampleBatch;
use crate::error::AgentError;
use crate::ml::decoder::{Decoder, DecoderConfig};
use crate::ml::encoder::{Encoder, EncoderConfig, RetainedState, WorkingMemory};

// ─── Encode policy ────────────────────────────────────────────────────────────
/// How a sample reaches the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodePolicy {
    /// One pass over the whole padded sample.
    Full,
    /// Fixed-size window re-fed position by position (stride one).
    Windowed { window: usize },
}

// ─── Agent config ─────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct AgentConfig {
    pub vocab_size: usize,
    pub seq_len:    usize,
    pub d_model:    usize,
    pub num_heads:  usize,
    pub num_blocks: usize,
    pub d_hidden:   usize,
    pub dropout:    f64,
    pub feedback:   f64,
}

impl AgentConfig {
    /// Fail-fast hyperparameter check. Call before init; a config
    /// that fails here must never reach a constructor.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.num_heads == 0 || self.d_model % self.num_heads != 0 {
            return Err(AgentError::Configuration(format!(
                "d_model ({}) must be divisible by num_heads ({})",
                self.d_model, self.num_heads,
            )));
        }
        if !(0.0..1.0).contains(&self.feedback) {
            return Err(AgentError::Configuration(format!(
                "feedback coefficient ({}) must lie in [0, 1)",
                self.feedback,
            )));
        }
        if self.num_blocks == 0 {
            return Err(AgentError::Configuration(
                "num_blocks must be at least 1".to_string(),
            ));
        }
        if self.seq_len == 0 {
            return Err(AgentError::Configuration(
                "seq_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Agent<B> {
        let encoder = EncoderConfig::new(
            self.vocab_size, self.seq_len, self.d_model, self.num_heads,
            self.num_blocks, self.d_hidden, self.dropout, self.feedback,
        ).init(device);
        let decoder = DecoderConfig::new(
            self.vocab_size, self.d_model, self.num_heads,
            self.num_blocks, self.d_hidden, self.dropout,
        ).init(device);
        Agent { encoder, decoder }
    }
}

// ─── Agent ────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Agent<B: Backend> {
    pub encoder: Encoder<B>,
    pub decoder: Decoder<B>,
}

impl<B: Backend> Agent<B> {
    /// Encode one sample under the given policy. Returns the
    /// working memory plus the sample position its first latent
    /// entry corresponds to (zero for Full, seq_len - window for
    /// the final window of Windowed).
    fn encode(
        &self,
        tokens:   &Tensor<B, 2, Int>,
        retained: &mut RetainedState<B>,
        policy:   EncodePolicy,
    ) -> Result<(WorkingMemory<B>, usize), AgentError> {
        let [batch, seq_len] = tokens.dims();

        match policy {
            EncodePolicy::Full => {
                let latent = self.encoder.forward(tokens.clone(), retained)?;
                Ok((WorkingMemory::new(latent), 0))
            }
            EncodePolicy::Windowed { window } => {
                if window == 0 || window > seq_len {
                    return Err(AgentError::Configuration(format!(
                        "window ({}) must lie in 1..={}",
                        window, seq_len,
                    )));
                }
                // Slide the window with stride one; retained state is
                // NOT reset between positions, that persistence is the
                // whole point of the mechanism.
                let mut latent = None;
                for start in 0..=(seq_len - window) {
                    let slice = tokens.clone().slice([0..batch, start..start + window]);
                    latent = Some(self.encoder.forward(slice, retained)?);
                }
                let latent = latent.expect("window loop runs at least once");
                Ok((WorkingMemory::new(latent), seq_len - window))
            }
        }
    }

    /// One learning signal for one sample: encode, decode under the
    /// causal mask, and return the next-token cross-entropy loss.
    ///
    /// The caller resets `retained` between samples; this method
    /// only mutates it through the encoder passes of this sample.
    pub fn forward_loss(
        &self,
        batch:    &SampleBatch<B>,
        retained: &mut RetainedState<B>,
        policy:   EncodePolicy,
    ) -> Result<Tensor<B, 1>, AgentError> {
        let [batch_size, seq_len] = batch.tokens.dims();
        // Retained state is per-sample state; the trainer feeds
        // exactly one sample at a time.
        debug_assert_eq!(batch_size, 1);

        let (memory, start) = self.encode(&batch.tokens, retained, policy)?;

        let logits = self.decoder.forward_training(&memory);
        let [_, len, vocab] = logits.dims();
        let logits = logits.reshape([len, vocab]);

        let targets = batch.targets.clone()
            .slice([0..batch_size, start..seq_len])
            .reshape([len]);

        let ce = CrossEntropyLossConfig::new().init(&logits.device());
        Ok(ce.forward(logits, targets))
    }

    /// Generate a continuation of a prompt: fresh retained state,
    /// one encode pass, then cursor-driven sampling in the decoder.
    pub fn generate(
        &self,
        tokens:   Tensor<B, 2, Int>,
        retained: &mut RetainedState<B>,
        policy:   EncodePolicy,
        budget:   usize,
    ) -> Result<Vec<u32>, AgentError> {
        retained.reset();
        let (memory, _) = self.encode(&tokens, retained, policy)?;
        self.decoder.generate(memory, budget)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_must_divide_by_heads() {
        let cfg = AgentConfig::new(10, 8, 10, 3, 2, 16, 0.1, 0.0);
        assert!(matches!(
            cfg.validate().unwrap_err(),
            AgentError::Configuration(_),
        ));
    }

    #[test]
    fn test_feedback_must_be_below_one() {
        let cfg = AgentConfig::new(10, 8, 8, 2, 2, 16, 0.1, 1.0);
        assert!(cfg.validate().is_err());

        let cfg = AgentConfig::new(10, 8, 8, 2, 2, 16, 0.1, -0.1);
        assert!(cfg.validate().is_err());

        let cfg = AgentConfig::new(10, 8, 8, 2, 2, 16, 0.1, 0.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_blocks_rejected() {
        let cfg = AgentConfig::new(10, 8, 8, 2, 0, 16, 0.1, 0.5);
        assert!(cfg.validate().is_err());
    }
}
