// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `generate`, and all
// their configurable flags. clap's derive macros generate help
// text, missing-argument errors, and type conversion.

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the agent on a plain-text corpus (one sample per line)
    Train(TrainArgs),

    /// Generate a continuation for a prompt using a trained checkpoint
    Generate(GenerateArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Path to the training corpus, one sample per line
    #[arg(long, default_value = "data/corpus.txt")]
    pub data_path: String,

    /// Directory to save checkpoints, vocabulary, and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Maximum sentence length in tokens; shorter samples are
    /// <eos>-padded, longer ones truncated
    #[arg(long, default_value_t = 64)]
    pub seq_len: usize,

    /// Model vector dimension (d_model); must be divisible by num_heads
    #[arg(long, default_value_t = 512)]
    pub d_model: usize,

    /// Number of attention heads in multi-head attention
    #[arg(long, default_value_t = 4)]
    pub num_heads: usize,

    /// Number of transformer blocks in each of the two stacks
    #[arg(long, default_value_t = 2)]
    pub num_blocks: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 2048)]
    pub d_hidden: usize,

    /// Dropout probability during training
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Retained feedback blend factor in [0, 1): how strongly each
    /// block's previous output is pulled into its next input
    #[arg(long, default_value_t = 0.5)]
    pub feedback: f64,

    /// Initial learning rate for Adam
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    /// Epochs per generated example (0 disables previews)
    #[arg(long, default_value_t = 5)]
    pub gen_interval: usize,

    /// Epochs per validation loss (0 disables validation)
    #[arg(long, default_value_t = 10)]
    pub eval_interval: usize,

    /// Token budget for generation previews
    #[arg(long, default_value_t = 32)]
    pub max_new_tokens: usize,

    /// Fraction of samples kept for training (rest is validation)
    #[arg(long, default_value_t = 0.9)]
    pub train_fraction: f64,

    /// Encode with a sliding window of this many tokens instead of
    /// the whole sample at once
    #[arg(long)]
    pub window: Option<usize>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2; the
/// application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:      a.data_path,
            checkpoint_dir: a.checkpoint_dir,
            seq_len:        a.seq_len,
            d_model:        a.d_model,
            num_heads:      a.num_heads,
            num_blocks:     a.num_blocks,
            d_hidden:       a.d_hidden,
            dropout:        a.dropout,
            feedback:       a.feedback,
            lr:             a.lr,
            epochs:         a.epochs,
            gen_interval:   a.gen_interval,
            eval_interval:  a.eval_interval,
            max_new_tokens: a.max_new_tokens,
            train_fraction: a.train_fraction,
            window:         a.window,
        }
    }
}

/// All arguments for the `generate` command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// The prompt line to continue
    #[arg(long)]
    pub prompt: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Maximum number of tokens to generate
    #[arg(long, default_value_t = 32)]
    pub max_new_tokens: usize,
}
