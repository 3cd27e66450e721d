// ============================================================
// Layer 3 — Utterance Domain Type
// ============================================================
// One sample of training text: a single non-blank line from the
// corpus file. Plain data, no behaviour beyond construction.

use serde::{Deserialize, Serialize};

/// One line of the training corpus.
/// By the time an Utterance exists the text has been read from
/// disk but not yet normalized or tokenized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    /// Where the line came from, as "file:line" - kept for
    /// traceability in diagnostics
    pub source: String,

    /// The raw line content
    pub text: String,
}

impl Utterance {
    /// Create a new Utterance. Takes impl Into<String> so callers
    /// can pass &str or String.
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text:   text.into(),
        }
    }
}
