//! Paired slice example

use ndarray::Array2;

/// One (input, target) slice pair taken from the same index of a subject
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    /// MR slice
    pub input: Array2<f32>,
    /// CT slice
    pub target: Array2<f32>,
}

impl Example {
    pub fn new(input: Array2<f32>, target: Array2<f32>) -> Self {
        Self { input, target }
    }

    /// Placeholder for the side of a pair whose modality ran out
    pub fn missing() -> Array2<f32> {
        Array2::zeros((0, 0))
    }

    /// Shape of the input slice as `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.input.dim()
    }
}
