// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Thin facade over the persisted word-level tokenizer. The
// vocabulary is built once from the full training corpus (see
// infra::vocab_store), then frozen: lookups never insert.
//
// Reserved specials:
//   <unk> — any token not seen during construction
//   <eos> — end of sequence, also used to pad short samples

use anyhow::{anyhow, Result};
use tokenizers::Tokenizer;

/// The unknown-token string.
pub const UNK_TOKEN: &str = "<unk>";
/// The end-of-sequence string.
pub const EOS_TOKEN: &str = "<eos>";

/// A frozen token-to-index mapping with reserved special ids.
pub struct Vocabulary {
    tokenizer: Tokenizer,
    unk_id:    u32,
    eos_id:    u32,
}

impl Vocabulary {
    /// Wrap a loaded tokenizer, resolving the special ids up front
    /// so later lookups are infallible.
    pub fn from_tokenizer(tokenizer: Tokenizer) -> Result<Self> {
        let unk_id = tokenizer
            .token_to_id(UNK_TOKEN)
            .ok_or_else(|| anyhow!("vocabulary is missing the {UNK_TOKEN} token"))?;
        let eos_id = tokenizer
            .token_to_id(EOS_TOKEN)
            .ok_or_else(|| anyhow!("vocabulary is missing the {EOS_TOKEN} token"))?;
        Ok(Self { tokenizer, unk_id, eos_id })
    }

    /// Look up a token's index. Unknown tokens resolve to the <unk>
    /// index deterministically; a miss is never an error.
    pub fn index_of(&self, token: &str) -> u32 {
        self.tokenizer.token_to_id(token).unwrap_or(self.unk_id)
    }

    /// Reverse lookup for decoding generated ids.
    pub fn token_of(&self, id: u32) -> Option<String> {
        self.tokenizer.id_to_token(id)
    }

    /// Total number of entries, specials included.
    pub fn size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    pub fn unk_id(&self) -> u32 {
        self.unk_id
    }

    pub fn eos_id(&self) -> u32 {
        self.eos_id
    }

    /// Render a generated id sequence as text. Ids without a token
    /// (out of range) are skipped rather than invented.
    pub fn decode(&self, ids: &[u32]) -> String {
        ids.iter()
            .filter_map(|&id| self.token_of(id))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
