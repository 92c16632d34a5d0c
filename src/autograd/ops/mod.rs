//! Autograd operations with backward passes
//!
//! This module provides differentiable operations for automatic differentiation.

mod activations;
mod basic;
mod conv;
mod spatial;

use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::rc::Rc;

// Re-export all public operations
pub use activations::{leaky_relu, relu, sigmoid, softplus};
pub use basic::{abs, add, mean, mul, scale, square, sub, sum};
pub use conv::{bias_add, conv2d};
pub use spatial::{concat_channels, global_avg_pool, spatial_diff, SpatialAxis};

/// Wrap an op result, attaching the backward edge only when an input needs it
fn result_of<F>(data: Array1<f32>, shape: Vec<usize>, inputs: &[&Tensor], make_op: F) -> Tensor
where
    F: FnOnce() -> Rc<dyn BackwardOp>,
{
    if inputs.iter().any(|t| t.requires_grad()) {
        Tensor::from_op(data, shape, make_op())
    } else {
        Tensor::constant(data, shape)
    }
}

/// Split an NHWC shape, panicking on other ranks
fn nhwc(t: &Tensor, op: &str) -> (usize, usize, usize, usize) {
    match *t.shape() {
        [n, h, w, c] => (n, h, w, c),
        ref other => panic!("{op} expects an NHWC tensor, got shape {other:?}"),
    }
}
