// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores agent weights using Burn's CompactRecorder.
//
// What gets saved per checkpoint:
//   1. Agent weights (.mpk.gz)  — embedding + both block stacks
//   2. latest_epoch.json        — which epoch was last saved
//   3. train_config.json        — architecture + run settings
//
// The config is saved separately because inference must rebuild
// the exact architecture (d_model, num_blocks, seq_len, feedback)
// before the weights can be loaded into it. That config is also
// the only place retained-state shape metadata is persisted; the
// transient retained values themselves are never serialized.
//
// File naming convention:
//   checkpoints/
//     model_epoch_1.mpk.gz
//     model_epoch_2.mpk.gz
//     ...
//     latest_epoch.json
//     train_config.json
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::agent::Agent;

/// Manages saving and loading of model checkpoints.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory if
    /// it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Save agent weights for a given epoch and update the latest
    /// epoch pointer.
    pub fn save_model<B: AutodiffBackend>(
        &self,
        model: &Agent<B>,
        epoch: usize,
    ) -> Result<()> {
        // File path without extension, the recorder adds it
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load agent weights from the latest saved checkpoint into a
    /// freshly built model of the matching architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  Agent<B>,
        device: &B::Device,
    ) -> Result<Agent<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the agent first?",
                    path.display(),
                )
            })?;

        Ok(model.load_record(record))
    }

    /// Save the training configuration to JSON. Must run before
    /// training so inference can rebuild the architecture.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration back from JSON.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'generate'.",
                    path.display(),
                )
            })?;

        Ok(serde_json::from_str(&json)?)
    }

    /// Read latest_epoch.json and return the epoch number.
    fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");

        let s = fs::read_to_string(&path)
            .with_context(|| {
                "Cannot find 'latest_epoch.json'. Have you run 'train' first?"
            })?;

        Ok(serde_json::from_str::<usize>(&s)?)
    }
}
