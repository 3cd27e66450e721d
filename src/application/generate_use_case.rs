// ============================================================
// Layer 2 — Generate Use Case
// ============================================================
// Loads the frozen vocabulary and the latest checkpoint, then
// continues a prompt through the agent's encoder and decoder.

use anyhow::Result;

use crate::domain::traits::UtteranceGenerator;
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::generator::Generator;

pub struct GenerateUseCase {
    generator:      Generator,
    max_new_tokens: usize,
}

impl GenerateUseCase {
    pub fn new(checkpoint_dir: String, max_new_tokens: usize) -> Result<Self> {
        let vocab_store = VocabStore::new(&checkpoint_dir);
        let vocab       = vocab_store.load()?;
        let ckpt        = CheckpointManager::new(&checkpoint_dir);
        let generator   = Generator::from_checkpoint(&ckpt, vocab)?;
        Ok(Self { generator, max_new_tokens })
    }
}

impl UtteranceGenerator for GenerateUseCase {
    fn generate(&self, prompt: &str) -> Result<String> {
        self.generator.generate(prompt, self.max_new_tokens)
    }
}
