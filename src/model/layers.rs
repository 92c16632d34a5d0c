//! Convolution layer

use super::VariableScope;
use crate::autograd::{bias_add, conv2d, Tensor};
use rand::Rng;

/// Stride-1, SAME-padded 2-D convolution with bias
#[derive(Debug, Clone)]
pub struct Conv2d {
    kernel: Tensor,
    bias: Tensor,
}

impl Conv2d {
    /// Register `<name>/kernel` and `<name>/bias` in `scope`
    ///
    /// The kernel is Glorot-uniform initialized, the bias starts at zero.
    pub fn new<R: Rng>(
        scope: &mut VariableScope,
        name: &str,
        kernel_size: usize,
        in_channels: usize,
        out_channels: usize,
        rng: &mut R,
    ) -> Self {
        let shape = [kernel_size, kernel_size, in_channels, out_channels];
        let receptive = kernel_size * kernel_size;
        let limit = (6.0 / (receptive * (in_channels + out_channels)) as f32).sqrt();
        let init = (0..shape.iter().product::<usize>())
            .map(|_| rng.random_range(-limit..=limit))
            .collect();

        let kernel = scope.create_variable(&format!("{name}/kernel"), &shape, init);
        let zeros = vec![0.0; out_channels];
        let bias = scope.create_variable(&format!("{name}/bias"), &[out_channels], zeros);
        Self { kernel, bias }
    }

    pub fn forward(&self, x: &Tensor) -> Tensor {
        bias_add(&conv2d(x, &self.kernel), &self.bias)
    }

    pub fn kernel(&self) -> &Tensor {
        &self.kernel
    }

    pub fn out_channels(&self) -> usize {
        self.bias.len()
    }
}
