// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Builds the word-level vocabulary from the tokenized corpus and
// persists it as a HuggingFace-format tokenizer.json, so the same
// mapping is guaranteed for training and generation.
//
// The JSON is written by hand rather than through the trainer
// machinery: the corpus is already tokenized upstream (including
// the digit splitting), so all the tokenizers crate needs to hold
// is a frozen WordLevel table with our two specials.
//
// Id assignment: <unk> = 0, <eos> = 1, then corpus tokens in
// first-occurrence order. Built once from the full corpus before
// any training step, then frozen.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokenizers::Tokenizer;

use crate::data::vocab::{Vocabulary, EOS_TOKEN, UNK_TOKEN};

pub struct VocabStore {
    dir: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    /// Load an existing vocabulary or build one from the corpus.
    pub fn load_or_build(&self, samples: &[Vec<String>]) -> Result<Vocabulary> {
        let tok_path = self.dir.join("tokenizer.json");
        if tok_path.exists() {
            tracing::info!("Loading existing vocabulary from disk");
            self.load()
        } else {
            tracing::info!("Building vocabulary from {} samples", samples.len());
            self.build_and_save(samples)
        }
    }

    /// Load a previously saved vocabulary.
    pub fn load(&self) -> Result<Vocabulary> {
        let path = self.dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load vocabulary from '{}': {}", path.display(), e,
            ))?;
        Vocabulary::from_tokenizer(tokenizer)
    }

    fn build_and_save(&self, samples: &[Vec<String>]) -> Result<Vocabulary> {
        std::fs::create_dir_all(&self.dir).ok();

        // ── Step 1: assign ids in first-occurrence order ──────────────────────
        let mut vocab = serde_json::json!({});
        vocab[UNK_TOKEN] = serde_json::json!(0);
        vocab[EOS_TOKEN] = serde_json::json!(1);

        let mut next_id = 2usize;
        for sample in samples {
            for token in sample {
                if vocab.get(token).is_none() {
                    vocab[token] = serde_json::json!(next_id);
                    next_id += 1;
                }
            }
        }

        // ── Step 2: write tokenizer JSON in HuggingFace format ────────────────
        // This shape is what Tokenizer::from_file() expects
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": 0, "content": UNK_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 1, "content": EOS_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": null,
            "pre_tokenizer": {
                "type": "Whitespace"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let tok_path = self.dir.join("tokenizer.json");
        std::fs::write(
            &tok_path,
            serde_json::to_string_pretty(&tokenizer_json)?,
        ).with_context(|| "Cannot write tokenizer JSON")?;

        tracing::info!(
            "Vocabulary built with {} entries, saved to '{}'",
            next_id,
            tok_path.display(),
        );

        // Load back as a proper Tokenizer instance
        let tokenizer = Tokenizer::from_file(&tok_path)
            .map_err(|e| anyhow::anyhow!("Cannot reload vocabulary: {e}"))?;
        Vocabulary::from_tokenizer(tokenizer)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tokenizer::tokenize;

    fn build(corpus: &[&str]) -> (tempfile::TempDir, Vocabulary) {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path().to_str().unwrap());
        let samples: Vec<Vec<String>> =
            corpus.iter().map(|line| tokenize(line)).collect();
        let vocab = store.load_or_build(&samples).unwrap();
        (dir, vocab)
    }

    #[test]
    fn test_three_words_give_five_entries() {
        let (_dir, vocab) = build(&["the cat sat"]);
        // 3 words + <unk> + <eos>
        assert_eq!(vocab.size(), 5);
    }

    #[test]
    fn test_every_corpus_token_has_a_unique_index() {
        let (_dir, vocab) = build(&["the cat sat", "the dog ran"]);

        let words = ["the", "cat", "sat", "dog", "ran"];
        let mut seen = std::collections::HashSet::new();
        for w in words {
            let id = vocab.index_of(w);
            assert_ne!(id, vocab.unk_id(), "'{w}' resolved to <unk>");
            assert!(seen.insert(id), "duplicate id {id} for '{w}'");
        }
    }

    #[test]
    fn test_out_of_corpus_token_resolves_to_unk() {
        let (_dir, vocab) = build(&["the cat sat"]);
        assert_eq!(vocab.index_of("out"), vocab.unk_id());
        assert_eq!(vocab.index_of("of"),  vocab.unk_id());
        assert_eq!(vocab.index_of("vocabulary"), vocab.unk_id());
    }

    #[test]
    fn test_token_of_round_trips() {
        let (_dir, vocab) = build(&["the cat sat"]);
        let id = vocab.index_of("cat");
        assert_eq!(vocab.token_of(id).as_deref(), Some("cat"));
        assert_eq!(vocab.token_of(vocab.eos_id()).as_deref(), Some(EOS_TOKEN));
    }

    #[test]
    fn test_load_or_build_reuses_existing_file() {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path().to_str().unwrap());

        let first  = store.load_or_build(&[tokenize("the cat sat")]).unwrap();
        // A second call with a different corpus must load the frozen
        // vocabulary, not rebuild it
        let second = store.load_or_build(&[tokenize("completely different words")]).unwrap();

        assert_eq!(first.size(), second.size());
        assert_eq!(second.index_of("cat"), first.index_of("cat"));
        assert_eq!(second.index_of("completely"), second.unk_id());
    }
}
