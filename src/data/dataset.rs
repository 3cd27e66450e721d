// ============================================================
// Layer 4 — Tokenized Samples and Dataset
// ============================================================
// Converts word tokens into fixed-length id sequences and
// exposes them through Burn's Dataset trait.
//
// Sequence layout for seq_len = 8 and tokens "the cat sat":
//   input_ids: the cat sat <eos> <eos> <eos> <eos> <eos>
//   targets:   cat sat <eos> <eos> <eos> <eos> <eos> <eos>
//
// The targets are the true next tokens (shifted left by one,
// <eos>-terminated). Over-long samples are truncated to seq_len;
// samples that tokenize to nothing are rejected before they can
// produce an empty slice.

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::vocab::Vocabulary;

/// One fully tokenized and padded training sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizedSample {
    /// Token ids, exactly seq_len entries
    pub input_ids: Vec<u32>,

    /// Next-token ids, exactly seq_len entries
    pub targets: Vec<u32>,
}

/// Convert word tokens into a padded sample, or None when the
/// token list is empty (nothing to learn from).
pub fn prepare_sample(
    tokens:  &[String],
    vocab:   &Vocabulary,
    seq_len: usize,
) -> Option<TokenizedSample> {
    if tokens.is_empty() || seq_len == 0 {
        return None;
    }

    // Token strings to ids, unknown words falling back to <unk>
    let mut ids: Vec<u32> = tokens.iter().map(|t| vocab.index_of(t)).collect();

    // Single consistent over-length policy: truncate to seq_len
    ids.truncate(seq_len);

    // Terminate and pad with <eos> up to the fixed length
    while ids.len() < seq_len {
        ids.push(vocab.eos_id());
    }

    // Targets are the ids shifted left by one, <eos> appended
    let mut targets: Vec<u32> = ids[1..].to_vec();
    targets.push(vocab.eos_id());

    Some(TokenizedSample { input_ids: ids, targets })
}

/// The corpus as Burn sees it: indexable, cloneable samples.
pub struct UtteranceDataset {
    samples: Vec<TokenizedSample>,
}

impl UtteranceDataset {
    pub fn new(samples: Vec<TokenizedSample>) -> Self {
        Self { samples }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl Dataset<TokenizedSample> for UtteranceDataset {
    fn get(&self, index: usize) -> Option<TokenizedSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
