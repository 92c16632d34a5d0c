//! Basic autograd operations: add, sub, mul, scale, abs, square, sum, mean

use super::result_of;
use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::rc::Rc;

fn assert_same_shape(a: &Tensor, b: &Tensor, op: &str) {
    assert_eq!(a.shape(), b.shape(), "{op}: operands must have the same shape");
}

/// Add two tensors
pub fn add(a: &Tensor, b: &Tensor) -> Tensor {
    assert_same_shape(a, b, "add");
    let data = &*a.data() + &*b.data();
    result_of(data, a.shape().to_vec(), &[a, b], || {
        Rc::new(AddBackward { a: a.clone(), b: b.clone(), sign: 1.0 })
    })
}

/// Subtract `b` from `a`
pub fn sub(a: &Tensor, b: &Tensor) -> Tensor {
    assert_same_shape(a, b, "sub");
    let data = &*a.data() - &*b.data();
    result_of(data, a.shape().to_vec(), &[a, b], || {
        Rc::new(AddBackward { a: a.clone(), b: b.clone(), sign: -1.0 })
    })
}

struct AddBackward {
    a: Tensor,
    b: Tensor,
    sign: f32,
}

impl BackwardOp for AddBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) -> Vec<Option<Array1<f32>>> {
        // ∂(a ± b)/∂a = 1, ∂(a ± b)/∂b = ±1
        vec![Some(grad.clone()), Some(grad * self.sign)]
    }
}

/// Multiply two tensors element-wise
pub fn mul(a: &Tensor, b: &Tensor) -> Tensor {
    assert_same_shape(a, b, "mul");
    let a_data = a.data().clone();
    let b_data = b.data().clone();
    let data = &a_data * &b_data;
    result_of(data, a.shape().to_vec(), &[a, b], || {
        Rc::new(MulBackward { a: a.clone(), b: b.clone(), a_data, b_data })
    })
}

struct MulBackward {
    a: Tensor,
    b: Tensor,
    a_data: Array1<f32>,
    b_data: Array1<f32>,
}

impl BackwardOp for MulBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) -> Vec<Option<Array1<f32>>> {
        // ∂L/∂a = ∂L/∂out * b, ∂L/∂b = ∂L/∂out * a
        vec![Some(grad * &self.b_data), Some(grad * &self.a_data)]
    }
}

/// Scale tensor by a scalar
pub fn scale(a: &Tensor, factor: f32) -> Tensor {
    let data = &*a.data() * factor;
    result_of(data, a.shape().to_vec(), &[a], || {
        Rc::new(ScaleBackward { a: a.clone(), factor })
    })
}

struct ScaleBackward {
    a: Tensor,
    factor: f32,
}

impl BackwardOp for ScaleBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) -> Vec<Option<Array1<f32>>> {
        vec![Some(grad * self.factor)]
    }
}

/// Element-wise absolute value
///
/// The subgradient at zero is zero.
pub fn abs(a: &Tensor) -> Tensor {
    let sign = a.data().mapv(|v| if v > 0.0 { 1.0 } else if v < 0.0 { -1.0 } else { 0.0 });
    let data = a.data().mapv(f32::abs);
    result_of(data, a.shape().to_vec(), &[a], || {
        Rc::new(ElementwiseBackward { a: a.clone(), local_grad: sign })
    })
}

/// Element-wise square
pub fn square(a: &Tensor) -> Tensor {
    let local_grad = &*a.data() * 2.0;
    let data = a.data().mapv(|v| v * v);
    result_of(data, a.shape().to_vec(), &[a], || {
        Rc::new(ElementwiseBackward { a: a.clone(), local_grad })
    })
}

/// Backward of a unary element-wise op with a precomputed local derivative
pub(super) struct ElementwiseBackward {
    pub(super) a: Tensor,
    pub(super) local_grad: Array1<f32>,
}

impl BackwardOp for ElementwiseBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) -> Vec<Option<Array1<f32>>> {
        vec![Some(grad * &self.local_grad)]
    }
}

/// Sum all elements
pub fn sum(a: &Tensor) -> Tensor {
    let data = Array1::from(vec![a.data().sum()]);
    result_of(data, vec![1], &[a], || Rc::new(ReduceBackward { a: a.clone(), factor: 1.0 }))
}

/// Mean of all elements
///
/// The mean of an empty tensor is zero.
pub fn mean(a: &Tensor) -> Tensor {
    let n = a.len();
    let factor = if n == 0 { 0.0 } else { 1.0 / n as f32 };
    let data = Array1::from(vec![a.data().sum() * factor]);
    result_of(data, vec![1], &[a], || Rc::new(ReduceBackward { a: a.clone(), factor }))
}

struct ReduceBackward {
    a: Tensor,
    factor: f32,
}

impl BackwardOp for ReduceBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) -> Vec<Option<Array1<f32>>> {
        // ∂L/∂a_i = ∂L/∂out * factor (broadcast)
        vec![Some(Array1::from_elem(self.a.len(), grad[0] * self.factor))]
    }
}
