// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model code lives here (plus the tensor-facing bits of
// data::batcher and infra::checkpoint). If Burn's API changes,
// this layer absorbs it.
//
// What's in this layer:
//
//   positional.rs — fixed sinusoidal positional encoding with a
//                   hard maximum length
//
//   block.rs      — one attention + feed-forward sublayer, shared
//                   by both stacks, optional causal mask
//
//   encoder.rs    — the retained-feedback encoder and its
//                   RetainedState cell: each block's input is
//                   blended with that block's previous (detached)
//                   output at a fixed feedback coefficient
//
//   decoder.rs    — causal decoder stack, vocabulary projection,
//                   cursor state machine, categorical sampling
//
//   agent.rs      — Encoder + Decoder wired into a learning
//                   signal, with the Full / Windowed encode policy
//
//   trainer.rs    — per-sample training loop: reset retained
//                   state, loss, backward, Adam step, plus epoch
//                   validation, generation previews, metrics, and
//                   checkpoints
//
//   generator.rs  — checkpoint loading and prompt continuation
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Sinusoidal positional encoding
pub mod positional;

/// Shared transformer sublayer
pub mod block;

/// Retained-feedback encoder
pub mod encoder;

/// Causal decoder with generation cursor
pub mod decoder;

/// Encoder + decoder agent and encode policies
pub mod agent;

/// Training loop
pub mod trainer;

/// Checkpoint-backed generation
pub mod generator;
