// ============================================================
// Error Taxonomy
// ============================================================
// Typed errors for the model layer. The application and CLI
// layers stay on anyhow::Result; AgentError implements
// std::error::Error so it converts into anyhow with `?`.
//
// Vocabulary misses are deliberately absent from this enum:
// an unknown token resolves to the <unk> index locally and
// never becomes an error value.

use thiserror::Error;

/// Errors raised by the model layer.
#[derive(Debug, Error, PartialEq)]
pub enum AgentError {
    /// Invalid hyperparameters. Raised at construction time, fatal.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A sequence reached the model that is longer than the configured
    /// maximum. The data pipeline truncates consistently, so this only
    /// fires on programmer misuse.
    #[error("sequence of {actual} positions exceeds the configured maximum of {max}")]
    SequenceLength { actual: usize, max: usize },

    /// A decoder cursor operation was invoked outside its valid states.
    #[error("decoder {operation} called in {state} state")]
    StateSequencing {
        operation: &'static str,
        state:     &'static str,
    },

    /// The distribution handed to the categorical sampler was degenerate
    /// (all-zero or non-finite probabilities).
    #[error("sampling failed: {0}")]
    Sampling(String),
}
