//! Reverse-mode gradient computation

use super::tensor::TensorId;
use super::Tensor;
use ndarray::Array1;
use std::collections::{HashMap, HashSet};

/// Backward edge of a differentiable operation
pub trait BackwardOp {
    /// Tensors the operation consumed, in a fixed order
    fn inputs(&self) -> Vec<Tensor>;

    /// Map the gradient of the output to gradients of each input
    ///
    /// The returned vector is aligned with [`BackwardOp::inputs`]; `None`
    /// marks an input that receives no gradient.
    fn backward(&self, grad: &Array1<f32>) -> Vec<Option<Array1<f32>>>;
}

/// Gradients produced by one backward pass, keyed by tensor identity
///
/// Gradients are returned rather than accumulated into parameters, so two
/// losses built over one forward graph can be differentiated independently.
#[derive(Debug, Default, Clone)]
pub struct Gradients {
    grads: HashMap<TensorId, Array1<f32>>,
}

impl Gradients {
    /// Gradient for a tensor, if it was reached
    pub fn get(&self, tensor: &Tensor) -> Option<&Array1<f32>> {
        self.grads.get(&tensor.id())
    }

    /// Number of tensors with a gradient
    pub fn len(&self) -> usize {
        self.grads.len()
    }

    /// True when no tensor was reached
    pub fn is_empty(&self) -> bool {
        self.grads.is_empty()
    }

    /// Global L2 norm of the gradients of `tensors`
    ///
    /// Tensors without a gradient contribute zero.
    pub fn global_norm<'a>(&self, tensors: impl IntoIterator<Item = &'a Tensor>) -> f32 {
        tensors
            .into_iter()
            .filter_map(|t| self.get(t))
            .map(|g| g.iter().map(|&v| v * v).sum::<f32>())
            .sum::<f32>()
            .sqrt()
    }

    fn accumulate(&mut self, id: TensorId, grad: Array1<f32>) {
        match self.grads.get_mut(&id) {
            Some(existing) => *existing += &grad,
            None => {
                self.grads.insert(id, grad);
            }
        }
    }
}

/// Differentiate a scalar (or any) tensor, seeding with ones
pub fn backward(root: &Tensor) -> Gradients {
    backward_with(root, Array1::ones(root.len()))
}

/// Differentiate `root` given the gradient of some objective with respect to it
///
/// # Panics
///
/// Panics if `grad_output` does not match the number of elements of `root`.
pub fn backward_with(root: &Tensor, grad_output: Array1<f32>) -> Gradients {
    assert_eq!(grad_output.len(), root.len(), "seed gradient length mismatch");

    let mut grads = Gradients::default();
    if !root.requires_grad() {
        return grads;
    }
    grads.accumulate(root.id(), grad_output);

    for node in topological_order(root).into_iter().rev() {
        let Some(op) = node.backward_op() else {
            continue;
        };
        let Some(grad) = grads.grads.get(&node.id()).cloned() else {
            continue;
        };
        let inputs = op.inputs();
        for (input, input_grad) in inputs.iter().zip(op.backward(&grad)) {
            if let Some(g) = input_grad {
                if input.requires_grad() {
                    debug_assert_eq!(g.len(), input.len());
                    grads.accumulate(input.id(), g);
                }
            }
        }
    }

    grads
}

/// Post-order over the differentiable part of the graph below `root`
fn topological_order(root: &Tensor) -> Vec<Tensor> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![(root.clone(), false)];

    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            order.push(node);
            continue;
        }
        if !visited.insert(node.id()) {
            continue;
        }
        stack.push((node.clone(), true));
        if let Some(op) = node.backward_op() {
            for input in op.inputs() {
                if input.requires_grad() && !visited.contains(&input.id()) {
                    stack.push((input, false));
                }
            }
        }
    }

    order
}
