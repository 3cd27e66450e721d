// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Per-sample training with Burn's DataLoader and Adam.
//
// Backend split:
//   - Training uses MyBackend (Autodiff<Wgpu>) for gradients
//   - model.valid() returns the model on MyInnerBackend (Wgpu)
//     for validation loss and generation previews, with dropout
//     inert and no autodiff overhead
//
// The loader runs with batch_size 1 on purpose: the encoder's
// retained state is per-sample state, and every sample must be
// fully processed (encode, decode, loss, update) before the next
// one begins. The cell is reset at the top of every step so no
// hidden state leaks across samples or epochs.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    data::dataset::Dataset,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{SampleBatch, SampleBatcher},
    dataset::{TokenizedSample, UtteranceDataset},
    vocab::Vocabulary,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::agent::{Agent, AgentConfig, EncodePolicy};
use crate::ml::encoder::RetainedState;

type MyBackend      = burn::backend::Autodiff<burn::backend::Wgpu>;
type MyInnerBackend = burn::backend::Wgpu;

pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: UtteranceDataset,
    val_dataset:   UtteranceDataset,
    vocab:         &Vocabulary,
    ckpt_manager:  CheckpointManager,
) -> Result<()> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop(cfg, train_dataset, val_dataset, vocab, ckpt_manager, device)
}

/// One optimizer update for one sample: reset the retained cell,
/// compute the loss, backward, Adam step. Returns the updated
/// model and the scalar loss.
pub fn learn_step<B, O>(
    mut model: Agent<B>,
    optim:     &mut O,
    lr:        f64,
    batch:     &SampleBatch<B>,
    retained:  &mut RetainedState<B>,
    policy:    EncodePolicy,
) -> Result<(Agent<B>, f64)>
where
    B: AutodiffBackend,
    O: Optimizer<Agent<B>, B>,
{
    // Fresh sample: no coupling with the previous one
    retained.reset();

    let loss = model.forward_loss(batch, retained, policy)?;
    let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

    let grads = loss.backward();
    let grads = GradientsParams::from_grads(grads, &model);
    model = optim.step(lr, model, grads);

    Ok((model, loss_val))
}

fn train_loop(
    cfg:           &TrainConfig,
    train_dataset: UtteranceDataset,
    val_dataset:   UtteranceDataset,
    vocab:         &Vocabulary,
    ckpt_manager:  CheckpointManager,
    device:        burn::backend::wgpu::WgpuDevice,
) -> Result<()> {

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = AgentConfig::new(
        vocab.size(), cfg.seq_len, cfg.d_model, cfg.num_heads,
        cfg.num_blocks, cfg.d_hidden, cfg.dropout, cfg.feedback,
    );
    model_cfg.validate()?;
    let mut model: Agent<MyBackend> = model_cfg.init(&device);
    tracing::info!(
        "Agent ready: {} blocks, d_model={}, feedback={}, vocab={}",
        cfg.num_blocks, cfg.d_model, cfg.feedback, vocab.size(),
    );

    let policy = cfg.encode_policy();

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let optim_cfg = AdamConfig::new().with_epsilon(1e-8);
    let mut optim = optim_cfg.init();

    // First training sample doubles as the generation-preview prompt
    let preview: Option<TokenizedSample> = train_dataset.get(0);
    tracing::info!(
        "Training on {} samples, validating on {}",
        train_dataset.sample_count(),
        val_dataset.sample_count(),
    );

    // ── Data loaders (batch_size 1, see module header) ────────────────────────
    let train_batcher = SampleBatcher::<MyBackend>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(1)
        .shuffle(42)
        .num_workers(1)
        .build(train_dataset);

    let val_batcher = SampleBatcher::<MyInnerBackend>::new(device.clone());
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(1)
        .num_workers(1)
        .build(val_dataset);

    // ── Persistent pieces of the loop ─────────────────────────────────────────
    let mut retained = RetainedState::<MyBackend>::new(cfg.num_blocks);
    let metrics      = MetricsLogger::new(&cfg.checkpoint_dir)?;
    let mut best_loss = f64::INFINITY;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_samples  = 0usize;

        for batch in train_loader.iter() {
            let (updated, loss_val) =
                learn_step(model, &mut optim, cfg.lr, &batch, &mut retained, policy)?;
            model = updated;

            train_loss_sum += loss_val;
            train_samples  += 1;
            if loss_val < best_loss {
                best_loss = loss_val;
            }
        }

        let avg_train_loss = if train_samples > 0 {
            train_loss_sum / train_samples as f64
        } else { f64::NAN };

        // ── Validation phase (every eval_interval epochs) ─────────────────────
        let mut val_loss = f64::NAN;
        if cfg.eval_interval > 0 && epoch % cfg.eval_interval == 0 {
            let model_valid = model.valid();
            let mut retained_val = RetainedState::<MyInnerBackend>::new(cfg.num_blocks);

            let mut val_loss_sum = 0.0f64;
            let mut val_samples  = 0usize;

            for batch in val_loader.iter() {
                retained_val.reset();
                let loss = model_valid.forward_loss(&batch, &mut retained_val, policy)?;
                val_loss_sum += loss.into_scalar().elem::<f64>();
                val_samples  += 1;
            }

            if val_samples > 0 {
                val_loss = val_loss_sum / val_samples as f64;
            }
        }

        // ── Generation preview (every gen_interval epochs) ────────────────────
        if cfg.gen_interval > 0 && epoch % cfg.gen_interval == 0 {
            if let Some(sample) = &preview {
                let model_valid = model.valid();
                let mut retained_gen =
                    RetainedState::<MyInnerBackend>::new(cfg.num_blocks);

                let flat: Vec<i32> =
                    sample.input_ids.iter().map(|&x| x as i32).collect();
                let tokens = Tensor::<MyInnerBackend, 1, Int>::from_ints(
                    flat.as_slice(), &device,
                ).reshape([1, sample.input_ids.len()]);

                match model_valid.generate(
                    tokens, &mut retained_gen, policy, cfg.max_new_tokens,
                ) {
                    Ok(ids) => tracing::info!(
                        "epoch {} sample generation: \"{}\"",
                        epoch, vocab.decode(&ids),
                    ),
                    Err(e) => tracing::warn!("generation preview failed: {e}"),
                }
            }
        }

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | best_loss={:.4} | val_loss={:.4}",
            epoch, cfg.epochs, avg_train_loss, best_loss, val_loss,
        );

        metrics.log(&EpochMetrics::new(epoch, avg_train_loss, best_loss, val_loss))?;
        ckpt_manager.save_model(&model, epoch)?;
        tracing::debug!("Checkpoint saved for epoch {}", epoch);
    }

    tracing::info!("Training complete!");
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
// End-to-end learning on the CPU autodiff backend: a real vocab,
// a real sample, one full optimizer update.
#[cfg(test)]
mod tests {
    use super::*;
    use burn::data::dataloader::batcher::Batcher;

    use crate::data::dataset::prepare_sample;
    use crate::data::tokenizer::tokenize;
    use crate::infra::vocab_store::VocabStore;

    type TestBackend = burn::backend::Autodiff<burn::backend::NdArray>;

    const SEQ_LEN: usize = 8;

    fn cat_vocab(dir: &tempfile::TempDir) -> Vocabulary {
        let store  = VocabStore::new(dir.path().to_str().unwrap());
        let corpus = vec![tokenize("the cat sat")];
        store.load_or_build(&corpus).unwrap()
    }

    fn cat_batch(vocab: &Vocabulary) -> SampleBatch<TestBackend> {
        let tokens = tokenize("the cat sat");
        let sample = prepare_sample(&tokens, vocab, SEQ_LEN).unwrap();
        let device = Default::default();
        SampleBatcher::<TestBackend>::new(device).batch(vec![sample])
    }

    fn learn_once(policy: EncodePolicy) -> (f64, RetainedState<TestBackend>) {
        let dir   = tempfile::tempdir().unwrap();
        let vocab = cat_vocab(&dir);
        // 3 words + <unk> + <eos>
        assert_eq!(vocab.size(), 5);

        let device = Default::default();
        let cfg = AgentConfig::new(vocab.size(), SEQ_LEN, 16, 2, 2, 32, 0.0, 0.5);
        cfg.validate().unwrap();
        let model: Agent<TestBackend> = cfg.init(&device);

        let mut optim    = AdamConfig::new().init();
        let mut retained = RetainedState::new(2);
        let batch = cat_batch(&vocab);

        let (_, loss) =
            learn_step(model, &mut optim, 1e-3, &batch, &mut retained, policy).unwrap();
        (loss, retained)
    }

    #[test]
    fn test_learn_step_returns_finite_loss() {
        let (loss, mut retained) = learn_once(EncodePolicy::Full);
        assert!(loss.is_finite());
        assert!(loss >= 0.0);

        // The cell was used during the step and resets back to baseline
        assert!(!retained.is_empty());
        retained.reset();
        assert!(retained.is_empty());
    }

    #[test]
    fn test_learn_step_with_sliding_window() {
        let (loss, _) = learn_once(EncodePolicy::Windowed { window: 4 });
        assert!(loss.is_finite());
        assert!(loss >= 0.0);
    }

    #[test]
    fn test_window_larger_than_sample_is_a_configuration_error() {
        let dir    = tempfile::tempdir().unwrap();
        let vocab  = cat_vocab(&dir);
        let device = Default::default();
        let cfg = AgentConfig::new(vocab.size(), SEQ_LEN, 16, 2, 2, 32, 0.0, 0.5);
        let model: Agent<TestBackend> = cfg.init(&device);

        let mut retained = RetainedState::new(2);
        let batch = cat_batch(&vocab);
        let err = model
            .forward_loss(&batch, &mut retained, EncodePolicy::Windowed { window: SEQ_LEN + 1 })
            .unwrap_err();
        assert!(matches!(err, crate::error::AgentError::Configuration(_)));
    }
}
