// ============================================================
// Layer 5 — Generator
// ============================================================
// Loads a trained agent from a checkpoint and produces
// continuations for user prompts. Dropout is built at 0.0 for
// inference; the architecture is rebuilt from the persisted
// training config plus the loaded vocabulary size.

use anyhow::{anyhow, Result};
use burn::prelude::*;

use crate::data::dataset::prepare_sample;
use crate::data::tokenizer::tokenize;
use crate::data::vocab::Vocabulary;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::agent::{Agent, AgentConfig, EncodePolicy};
use crate::ml::encoder::RetainedState;

type InferBackend = burn::backend::Wgpu;

pub struct Generator {
    agent:      Agent<InferBackend>,
    vocab:      Vocabulary,
    seq_len:    usize,
    num_blocks: usize,
    policy:     EncodePolicy,
    device:     burn::backend::wgpu::WgpuDevice,
}

impl Generator {
    pub fn from_checkpoint(
        ckpt_manager: &CheckpointManager,
        vocab:        Vocabulary,
    ) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        let cfg    = ckpt_manager.load_config()?;

        let model_cfg = AgentConfig::new(
            vocab.size(), cfg.seq_len, cfg.d_model, cfg.num_heads,
            cfg.num_blocks, cfg.d_hidden, 0.0, cfg.feedback,
        );
        model_cfg.validate()?;
        let model: Agent<InferBackend> = model_cfg.init(&device);
        let agent = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Agent loaded from checkpoint");

        Ok(Self {
            agent,
            vocab,
            seq_len:    cfg.seq_len,
            num_blocks: cfg.num_blocks,
            policy:     cfg.encode_policy(),
            device,
        })
    }

    /// Encode the prompt with a fresh retained cell, sample a
    /// continuation, and render it as text.
    pub fn generate(&self, prompt: &str, max_new_tokens: usize) -> Result<String> {
        let tokens = tokenize(prompt);
        let sample = prepare_sample(&tokens, &self.vocab, self.seq_len)
            .ok_or_else(|| anyhow!("prompt '{prompt}' contains no usable tokens"))?;

        let flat: Vec<i32> = sample.input_ids.iter().map(|&x| x as i32).collect();
        let tensor = Tensor::<InferBackend, 1, Int>::from_ints(
            flat.as_slice(), &self.device,
        ).reshape([1, self.seq_len]);

        let mut retained = RetainedState::new(self.num_blocks);
        let mut ids = self
            .agent
            .generate(tensor, &mut retained, self.policy, max_new_tokens)?;

        // Trim trailing end-of-sequence padding for display
        while ids.last() == Some(&self.vocab.eos_id()) {
            ids.pop();
        }

        tracing::debug!("Generated {} tokens for prompt '{}'", ids.len(), prompt);
        Ok(self.vocab.decode(&ids))
    }
}
