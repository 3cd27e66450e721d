// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams of the system. By programming against these traits
// the application layer never needs to know whether samples come
// from a plain-text file or somewhere else, nor which model
// backs generation.

use anyhow::Result;
use crate::domain::utterance::Utterance;

// ─── UtteranceSource ──────────────────────────────────────────────────────────
/// Any component that can load training utterances.
///
/// Implementations:
///   - TextLoader → one utterance per non-blank line of a UTF-8 file
pub trait UtteranceSource {
    /// Load all available utterances from this source.
    fn load_all(&self) -> Result<Vec<Utterance>>;
}

// ─── UtteranceGenerator ───────────────────────────────────────────────────────
/// Any component that can continue a prompt with generated text.
///
/// Implementations:
///   - GenerateUseCase → encodes the prompt and samples from the decoder
pub trait UtteranceGenerator {
    /// Given a prompt line, return a generated continuation.
    fn generate(&self, prompt: &str) -> Result<String>;
}
