//! Tape-based autograd engine
//!
//! Provides reverse-mode automatic differentiation over shaped `f32` tensors.
//! Every differentiable operation records a [`BackwardOp`] edge to its inputs;
//! [`backward`] walks those edges from a loss and returns a [`Gradients`] map.
//!
//! ```
//! use mrtoct::autograd::{backward, mean, square, Tensor};
//!
//! let w = Tensor::from_vec(vec![1.0, -2.0], true);
//! let loss = mean(&square(&w));
//! let grads = backward(&loss);
//! assert_eq!(grads.get(&w).unwrap().to_vec(), vec![1.0, -2.0]);
//! ```

mod backward;
mod ops;
mod tensor;

#[cfg(test)]
mod tests;

pub use backward::{backward, backward_with, BackwardOp, Gradients};
pub use ops::*;
pub use tensor::{Tensor, TensorId};
