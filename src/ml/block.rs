// ============================================================
// Layer 5 — Transformer Block
// ============================================================
// One self-attention + feed-forward sublayer, used identically
// inside the Encoder and Decoder stacks:
//
//   attention(q=k=v=x, mask) → residual + dropout + norm
//   → linear → gelu → linear → residual + dropout + norm
//
// The mask is optional: the encoder path runs full bidirectional
// attention (None), the decoder path passes a strict causal mask
// (true = position blocked).
//
// Reference: Vaswani et al. (2017) Attention Is All You Need

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

#[derive(Config, Debug)]
pub struct TransformerBlockConfig {
    pub d_model:   usize,
    pub num_heads: usize,
    pub d_hidden:  usize,
    pub dropout:   f64,
}

impl TransformerBlockConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TransformerBlock<B> {
        let self_attn = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_hidden).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_hidden, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        TransformerBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct TransformerBlock<B: Backend> {
    self_attn:   MultiHeadAttention<B>,
    ffn_linear1: Linear<B>,
    ffn_linear2: Linear<B>,
    norm1:       LayerNorm<B>,
    norm2:       LayerNorm<B>,
    dropout:     Dropout,
}

impl<B: Backend> TransformerBlock<B> {
    /// x: [batch, seq_len, d_model] → same shape.
    /// mask: [batch, seq_len, seq_len] Bool, true = blocked.
    pub fn forward(
        &self,
        x:    Tensor<B, 3>,
        mask: Option<Tensor<B, 3, Bool>>,
    ) -> Tensor<B, 3> {
        let input = MhaInput::self_attn(x.clone());
        let input = match mask {
            Some(mask) => input.mask_attn(mask),
            None       => input,
        };
        let attn_output = self.self_attn.forward(input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::nn::attention::generate_autoregressive_mask;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_preserves_shape() {
        let device = Default::default();
        let block = TransformerBlockConfig::new(8, 2, 16, 0.1).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 3>::ones([1, 4, 8], &device);
        assert_eq!(block.forward(x, None).dims(), [1, 4, 8]);
    }

    #[test]
    fn test_preserves_shape_under_causal_mask() {
        let device = Default::default();
        let block = TransformerBlockConfig::new(8, 2, 16, 0.1).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 3>::ones([1, 4, 8], &device);
        let mask = generate_autoregressive_mask::<TestBackend>(1, 4, &device);
        assert_eq!(block.forward(x, Some(mask)).dims(), [1, 4, 8]);
    }
}
