// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the corpus file      (Layer 4 - data)
//   Step 2: Tokenize each line        (Layer 4 - data)
//   Step 3: Build / load vocabulary   (Layer 6 - infra)
//   Step 4: Prepare padded samples    (Layer 4 - data)
//   Step 5: Split train/validation    (Layer 4 - data)
//   Step 6: Build datasets            (Layer 4 - data)
//   Step 7: Save config               (Layer 6 - infra)
//   Step 8: Run training loop         (Layer 5 - ml)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{prepare_sample, UtteranceDataset},
    loader::TextLoader,
    splitter::split_train_val,
    tokenizer::tokenize,
};
use crate::domain::traits::UtteranceSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    vocab_store::VocabStore,
};
use crate::ml::agent::EncodePolicy;
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Serialisable so it can
// be saved next to the checkpoints and reloaded for generation.
// The vocabulary size is not part of this struct: it is only
// known once the corpus has been read, and generation recovers it
// from the persisted vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_path:      String,
    pub checkpoint_dir: String,
    pub seq_len:        usize,
    pub d_model:        usize,
    pub num_heads:      usize,
    pub num_blocks:     usize,
    pub d_hidden:       usize,
    pub dropout:        f64,
    pub feedback:       f64,
    pub lr:             f64,
    pub epochs:         usize,
    pub gen_interval:   usize,
    pub eval_interval:  usize,
    pub max_new_tokens: usize,
    pub train_fraction: f64,
    pub window:         Option<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:      "data/corpus.txt".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            seq_len:        64,
            d_model:        512,
            num_heads:      4,
            num_blocks:     2,
            d_hidden:       2048,
            dropout:        0.1,
            feedback:       0.5,
            lr:             1e-3,
            epochs:         50,
            gen_interval:   5,
            eval_interval:  10,
            max_new_tokens: 32,
            train_fraction: 0.9,
            window:         None,
        }
    }
}

impl TrainConfig {
    /// The encode policy implied by the window flag.
    pub fn encode_policy(&self) -> EncodePolicy {
        match self.window {
            Some(window) => EncodePolicy::Windowed { window },
            None         => EncodePolicy::Full,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load the corpus ───────────────────────────────────────────
        tracing::info!("Loading corpus from '{}'", cfg.data_path);
        let loader     = TextLoader::new(&cfg.data_path);
        let utterances = loader.load_all()?;

        // ── Step 2: Tokenize every line ───────────────────────────────────────
        // Lines that tokenize to nothing (punctuation-only) are dropped
        // here so they can never produce an empty sample downstream.
        let tokenized: Vec<Vec<String>> = utterances
            .iter()
            .map(|u| tokenize(&u.text))
            .filter(|tokens| !tokens.is_empty())
            .collect();
        tracing::info!("{} tokenized samples", tokenized.len());

        if tokenized.is_empty() {
            anyhow::bail!(
                "corpus '{}' produced no usable samples",
                cfg.data_path,
            );
        }

        // ── Step 3: Build / load the vocabulary ───────────────────────────────
        // Built once from the full corpus, then frozen.
        let vocab_store = VocabStore::new(&cfg.checkpoint_dir);
        let vocab       = vocab_store.load_or_build(&tokenized)?;
        tracing::info!("Vocabulary size: {}", vocab.size());

        // ── Step 4: Prepare padded samples ────────────────────────────────────
        let samples: Vec<_> = tokenized
            .iter()
            .filter_map(|tokens| prepare_sample(tokens, &vocab, cfg.seq_len))
            .collect();
        tracing::info!("Prepared {} training samples", samples.len());

        // ── Step 5: Train / validation split ──────────────────────────────────
        let (train_samples, val_samples) =
            split_train_val(samples, cfg.train_fraction);
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len(),
        );

        // ── Step 6: Build Burn datasets ───────────────────────────────────────
        let train_dataset = UtteranceDataset::new(train_samples);
        let val_dataset   = UtteranceDataset::new(val_samples);

        // ── Step 7: Save config for generation ────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;

        // ── Step 8: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, train_dataset, val_dataset, &vocab, ckpt_manager)?;

        Ok(())
    }
}
