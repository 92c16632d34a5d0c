//! Batch data structure

use crate::autograd::Tensor;
use crate::data::Example;
use crate::{Error, Result};

/// A training batch of NHWC image tensors `[n, height, width, 1]`
#[derive(Clone)]
pub struct Batch {
    /// MR slices
    pub inputs: Tensor,
    /// CT slices
    pub targets: Tensor,
}

impl Batch {
    /// Create a new batch
    pub fn new(inputs: Tensor, targets: Tensor) -> Self {
        Self { inputs, targets }
    }

    /// Stack examples into a batch
    ///
    /// Every slice of the group must have the shape of the first input.
    pub fn from_examples(examples: &[Example]) -> Result<Self> {
        let first = examples
            .first()
            .ok_or_else(|| Error::Config("cannot build a batch from zero examples".into()))?;
        let (h, w) = first.shape();
        let n = examples.len();

        let mut inputs = Vec::with_capacity(n * h * w);
        let mut targets = Vec::with_capacity(n * h * w);
        for example in examples {
            for slice in [&example.input, &example.target] {
                if slice.dim() != (h, w) {
                    return Err(Error::ShapeMismatch {
                        context: "batch slice".into(),
                        expected: vec![h, w],
                        actual: slice.shape().to_vec(),
                    });
                }
            }
            inputs.extend(example.input.iter());
            targets.extend(example.target.iter());
        }

        let shape = [n, h, w, 1];
        Ok(Self::new(
            Tensor::from_shape_vec(&shape, inputs, false),
            Tensor::from_shape_vec(&shape, targets, false),
        ))
    }

    /// Get batch size (number of examples)
    pub fn size(&self) -> usize {
        self.inputs.shape().first().copied().unwrap_or(0)
    }
}
