// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// The entry point for all user interaction, parsed with clap.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — trains the agent on a plain-text corpus
//   2. `generate` — loads a checkpoint and continues a prompt

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, GenerateArgs, TrainArgs};

/// The main CLI struct; clap reads the fields and generates
/// argument parsing via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "cogent",
    version = "0.1.0",
    about = "Train a cognitive language agent with retained working memory, then generate from it."
)]
pub struct Cli {
    /// The subcommand to run (train or generate)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// The CLI layer only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => Self::run_train(args),
            Commands::Generate(args) => Self::run_generate(args),
        }
    }

    /// Handles the `train` subcommand.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on corpus: {}", args.data_path);

        // Convert CLI args → application config
        let use_case = TrainUseCase::new(args.into());
        use_case.execute()?;

        println!("Training complete. Checkpoint saved.");
        Ok(())
    }

    /// Handles the `generate` subcommand.
    fn run_generate(args: GenerateArgs) -> Result<()> {
        use crate::application::generate_use_case::GenerateUseCase;
        use crate::domain::traits::UtteranceGenerator;

        let use_case = GenerateUseCase::new(
            args.checkpoint_dir.clone(),
            args.max_new_tokens,
        )?;

        let continuation = use_case.generate(&args.prompt)?;
        println!("\n{}", continuation);
        Ok(())
    }
}
