// ============================================================
// Layer 5 — Sinusoidal Positional Encoding
// ============================================================
// Self-attention is permutation-invariant, so position must be
// injected explicitly. This module adds a fixed, non-learned
// signal that depends only on position and channel:
//
//   even channel 2i:   sin(position / 10000^(2i / d_model))
//   odd channel 2i+1:  cos(position / 10000^(2i / d_model))
//
// The table is precomputed up to a configured maximum length and
// stored as a constant (non-parameter) tensor on the module.
// Asking for a longer sequence is a SequenceLength error, never
// a silent slice.
//
// Reference: Vaswani et al. (2017) Attention Is All You Need §3.5

use burn::prelude::*;

use crate::error::AgentError;

#[derive(Config, Debug)]
pub struct PositionalEncodingConfig {
    pub d_model: usize,
    pub max_len: usize,
}

impl PositionalEncodingConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PositionalEncoding<B> {
        let mut table = vec![0.0f32; self.max_len * self.d_model];

        for pos in 0..self.max_len {
            for ch in 0..self.d_model {
                // Both channels of a sin/cos pair share the frequency of
                // the even channel
                let base  = (ch - ch % 2) as f64;
                let angle = pos as f64 / 10_000f64.powf(base / self.d_model as f64);
                table[pos * self.d_model + ch] = if ch % 2 == 0 {
                    angle.sin() as f32
                } else {
                    angle.cos() as f32
                };
            }
        }

        let pe = Tensor::<B, 1>::from_floats(table.as_slice(), device)
            .reshape([self.max_len, self.d_model]);

        PositionalEncoding { pe, max_len: self.max_len }
    }
}

/// Fixed positional signal, added to an embedded sequence.
#[derive(Module, Debug)]
pub struct PositionalEncoding<B: Backend> {
    /// Precomputed table — shape: [max_len, d_model]
    pe: Tensor<B, 2>,
    max_len: usize,
}

impl<B: Backend> PositionalEncoding<B> {
    /// Add the positional signal to `x` ([batch, seq_len, d_model]).
    pub fn forward(&self, x: Tensor<B, 3>) -> Result<Tensor<B, 3>, AgentError> {
        let [_, seq_len, _] = x.dims();
        if seq_len > self.max_len {
            return Err(AgentError::SequenceLength {
                actual: seq_len,
                max:    self.max_len,
            });
        }
        let pe = self.pe.clone().slice([0..seq_len]).unsqueeze::<3>();
        Ok(x + pe)
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    type TestBackend = burn::backend::NdArray;

    fn encoding(d_model: usize, max_len: usize) -> PositionalEncoding<TestBackend> {
        let device = Default::default();
        PositionalEncodingConfig::new(d_model, max_len).init(&device)
    }

    #[test]
    fn test_position_zero_is_sin0_cos0() {
        let pe = encoding(4, 8);
        assert_eq!(pe.max_len(), 8);
        let device = Default::default();
        let x = Tensor::<TestBackend, 3>::zeros([1, 1, 4], &device);
        let out: Vec<f32> = pe.forward(x).unwrap().into_data().to_vec().unwrap();
        // sin(0) = 0 on even channels, cos(0) = 1 on odd channels
        assert_relative_eq!(out[0], 0.0);
        assert_relative_eq!(out[1], 1.0);
        assert_relative_eq!(out[2], 0.0);
        assert_relative_eq!(out[3], 1.0);
    }

    #[test]
    fn test_deterministic_and_content_independent() {
        let pe = encoding(8, 16);
        let device = Default::default();
        let zeros = Tensor::<TestBackend, 3>::zeros([1, 5, 8], &device);
        let ones  = Tensor::<TestBackend, 3>::ones([1, 5, 8], &device);

        let from_zeros: Vec<f32> =
            pe.forward(zeros).unwrap().into_data().to_vec().unwrap();
        let from_ones: Vec<f32> =
            pe.forward(ones).unwrap().into_data().to_vec().unwrap();

        // The added signal is identical regardless of content
        for (a, b) in from_zeros.iter().zip(from_ones.iter()) {
            assert_relative_eq!(b - a, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_sequence_past_maximum_is_an_error() {
        let pe = encoding(4, 3);
        let device = Default::default();
        let x = Tensor::<TestBackend, 3>::zeros([1, 4, 4], &device);
        assert_eq!(
            pe.forward(x).unwrap_err(),
            AgentError::SequenceLength { actual: 4, max: 3 },
        );
    }
}
