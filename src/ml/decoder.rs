// ============================================================
// Layer 5 — Decoder with Position Cursor
// ============================================================
// Generates utterances from the current state of working memory.
// The block stack always runs under a strict causal mask, so
// position i never attends past itself; the output projection
// maps the latent back to vocabulary logits.
//
// Incremental generation is driven by an explicit finite-state
// machine (DecodeSession) instead of informal flags:
//
//   Idle ──first_position──▶ Positioned ──next_position──▶ Advancing
//                                │                             │
//                                └──────── cursor past end ────┴──▶ Done
//
// forward() is valid only while Positioned or Advancing; any
// cursor operation outside its valid states is a StateSequencing
// error that fails loudly.

use burn::{
    nn::{attention::generate_autoregressive_mask, Linear, LinearConfig},
    prelude::*,
    tensor::activation::log_softmax,
};
use rand::distributions::{Distribution, WeightedIndex};

use crate::error::AgentError;
use crate::ml::block::{TransformerBlock, TransformerBlockConfig};
use crate::ml::encoder::WorkingMemory;

// ─── Decoder module ───────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct DecoderConfig {
    pub vocab_size: usize,
    pub d_model:    usize,
    pub num_heads:  usize,
    pub num_blocks: usize,
    pub d_hidden:   usize,
    pub dropout:    f64,
}

impl DecoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Decoder<B> {
        let blocks: Vec<TransformerBlock<B>> = (0..self.num_blocks)
            .map(|_| {
                TransformerBlockConfig::new(
                    self.d_model, self.num_heads, self.d_hidden, self.dropout,
                ).init(device)
            })
            .collect();
        let output = LinearConfig::new(self.d_model, self.vocab_size).init(device);
        Decoder { blocks, output }
    }
}

#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    blocks: Vec<TransformerBlock<B>>,
    output: Linear<B>,
}

impl<B: Backend> Decoder<B> {
    /// Run the block stack and output projection over a latent
    /// prefix under a causal mask. Returns logits [1, len, vocab].
    fn stack(&self, latent: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, len, _] = latent.dims();
        let mask = generate_autoregressive_mask::<B>(batch, len, &latent.device());

        let mut x = latent;
        for block in &self.blocks {
            x = block.forward(x, Some(mask.clone()));
        }
        self.output.forward(x)
    }

    /// Training path: logits at every position of the full memory,
    /// for the next-token cross-entropy loss.
    pub fn forward_training(&self, memory: &WorkingMemory<B>) -> Tensor<B, 3> {
        self.stack(memory.latent())
    }

    /// Autoregressive generation: bind the memory, then sample one
    /// token per cursor position by categorical draw from the
    /// softmax distribution at the final position. Stops at the
    /// token budget or when the cursor runs past the memory,
    /// whichever comes first.
    pub fn generate(
        &self,
        memory: WorkingMemory<B>,
        budget: usize,
    ) -> Result<Vec<u32>, AgentError> {
        let mut session = DecodeSession::new();
        session.first_position(memory)?;

        let mut rng = rand::thread_rng();
        let mut generated: Vec<u32> = Vec::new();

        while generated.len() < budget {
            let log_probs = session.forward(self)?;
            let probs: Vec<f32> = log_probs
                .exp()
                .into_data()
                .to_vec::<f32>()
                .map_err(|e| AgentError::Sampling(format!("{e:?}")))?;

            // Multinomial draw, not arg-max: keeps generation diverse
            let dist = WeightedIndex::new(&probs)
                .map_err(|e| AgentError::Sampling(e.to_string()))?;
            generated.push(dist.sample(&mut rng) as u32);

            if !session.next_position()? {
                break;
            }
        }

        Ok(generated)
    }
}

// ─── Cursor state machine ─────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Idle,
    Positioned,
    Advancing,
    Done,
}

impl CursorState {
    fn name(self) -> &'static str {
        match self {
            CursorState::Idle       => "idle",
            CursorState::Positioned => "positioned",
            CursorState::Advancing  => "advancing",
            CursorState::Done       => "done",
        }
    }
}

/// One decoding pass over one working memory. Non-restartable:
/// once Done, only reset() returns the session to Idle.
pub struct DecodeSession<B: Backend> {
    memory: Option<WorkingMemory<B>>,
    cursor: usize,
    state:  CursorState,
}

impl<B: Backend> Default for DecodeSession<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> DecodeSession<B> {
    pub fn new() -> Self {
        Self { memory: None, cursor: 0, state: CursorState::Idle }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bind working memory and set the cursor to position zero.
    /// Only valid from Idle; re-binding requires a reset first.
    pub fn first_position(&mut self, memory: WorkingMemory<B>) -> Result<(), AgentError> {
        if self.state != CursorState::Idle {
            return Err(AgentError::StateSequencing {
                operation: "first_position",
                state:     self.state.name(),
            });
        }
        debug_assert!(!memory.is_empty());
        self.memory = Some(memory);
        self.cursor = 0;
        self.state  = CursorState::Positioned;
        Ok(())
    }

    /// Log-probabilities over the vocabulary for the cursor position.
    /// Runs the stack on the memory prefix up to the cursor.
    pub fn forward(&self, decoder: &Decoder<B>) -> Result<Tensor<B, 1>, AgentError> {
        match self.state {
            CursorState::Positioned | CursorState::Advancing => {}
            _ => {
                return Err(AgentError::StateSequencing {
                    operation: "forward",
                    state:     self.state.name(),
                });
            }
        }
        let memory = self.memory.as_ref().expect("memory bound while positioned");

        let prefix = memory.latent().slice([0..1, 0..self.cursor + 1]);
        let logits = decoder.stack(prefix);
        let log_probs = log_softmax(logits, 2);

        let [_, len, vocab] = log_probs.dims();
        Ok(log_probs
            .slice([0..1, len - 1..len, 0..vocab])
            .reshape([vocab]))
    }

    /// Advance the cursor by one. Returns whether a valid next
    /// position exists; transitions to Done when the cursor would
    /// pass the end of the memory.
    pub fn next_position(&mut self) -> Result<bool, AgentError> {
        match self.state {
            CursorState::Positioned | CursorState::Advancing => {}
            _ => {
                return Err(AgentError::StateSequencing {
                    operation: "next_position",
                    state:     self.state.name(),
                });
            }
        }
        let len = self.memory.as_ref().expect("memory bound while positioned").len();

        self.cursor += 1;
        if self.cursor >= len {
            self.state = CursorState::Done;
            Ok(false)
        } else {
            self.state = CursorState::Advancing;
            Ok(true)
        }
    }

    /// Back to Idle, dropping the bound memory.
    pub fn reset(&mut self) {
        self.memory = None;
        self.cursor = 0;
        self.state  = CursorState::Idle;
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    const VOCAB: usize = 7;

    fn decoder() -> Decoder<TestBackend> {
        let device = Default::default();
        DecoderConfig::new(VOCAB, 8, 2, 2, 16, 0.1).init(&device)
    }

    fn memory(len: usize) -> WorkingMemory<TestBackend> {
        let device = Default::default();
        WorkingMemory::new(Tensor::ones([1, len, 8], &device))
    }

    #[test]
    fn test_cursor_walks_to_done_in_len_steps() {
        let mut session = DecodeSession::<TestBackend>::new();
        session.first_position(memory(4)).unwrap();
        assert_eq!(session.state(), CursorState::Positioned);
        assert_eq!(session.cursor(), 0);

        // L = 4: three advances succeed, the fourth exhausts the memory
        assert!(session.next_position().unwrap());
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.state(), CursorState::Advancing);
        assert!(session.next_position().unwrap());
        assert!(session.next_position().unwrap());
        assert!(!session.next_position().unwrap());
        assert_eq!(session.state(), CursorState::Done);
    }

    #[test]
    fn test_forward_after_done_is_a_sequencing_error() {
        let dec = decoder();
        let mut session = DecodeSession::new();
        session.first_position(memory(2)).unwrap();
        session.next_position().unwrap();
        session.next_position().unwrap();
        assert_eq!(session.state(), CursorState::Done);

        let err = session.forward(&dec).unwrap_err();
        assert_eq!(
            err,
            AgentError::StateSequencing { operation: "forward", state: "done" },
        );
        // Advancing past Done fails the same way
        assert!(session.next_position().is_err());
    }

    #[test]
    fn test_forward_before_positioning_is_a_sequencing_error() {
        let dec = decoder();
        let session = DecodeSession::<TestBackend>::new();
        assert_eq!(
            session.forward(&dec).unwrap_err(),
            AgentError::StateSequencing { operation: "forward", state: "idle" },
        );
    }

    #[test]
    fn test_rebinding_without_reset_is_a_sequencing_error() {
        let mut session = DecodeSession::<TestBackend>::new();
        session.first_position(memory(3)).unwrap();
        assert!(session.first_position(memory(3)).is_err());

        session.reset();
        assert_eq!(session.state(), CursorState::Idle);
        assert!(session.first_position(memory(3)).is_ok());
    }

    #[test]
    fn test_forward_returns_a_distribution() {
        let dec = decoder();
        let mut session = DecodeSession::new();
        session.first_position(memory(3)).unwrap();

        let log_probs = session.forward(&dec).unwrap();
        assert_eq!(log_probs.dims(), [VOCAB]);
        let probs: Vec<f32> = log_probs.exp().into_data().to_vec().unwrap();
        let total: f32 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_generate_respects_token_budget() {
        let dec = decoder();
        let ids = dec.generate(memory(12), 10).unwrap();
        assert_eq!(ids.len(), 10);
        assert!(ids.iter().all(|&id| (id as usize) < VOCAB));
    }

    #[test]
    fn test_generate_stops_at_end_of_memory() {
        let dec = decoder();
        let ids = dec.generate(memory(3), 10).unwrap();
        assert_eq!(ids.len(), 3);
    }
}
