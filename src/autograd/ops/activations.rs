//! Activation functions: ReLU, leaky ReLU, sigmoid, softplus

use super::basic::ElementwiseBackward;
use super::result_of;
use crate::autograd::Tensor;
use std::rc::Rc;

/// ReLU activation: max(0, x)
pub fn relu(a: &Tensor) -> Tensor {
    leaky_relu(a, 0.0)
}

/// Leaky ReLU: x for x > 0, `slope * x` otherwise
pub fn leaky_relu(a: &Tensor, slope: f32) -> Tensor {
    let data = a.data().mapv(|x| if x > 0.0 { x } else { slope * x });
    let local_grad = a.data().mapv(|x| if x > 0.0 { 1.0 } else { slope });
    result_of(data, a.shape().to_vec(), &[a], || {
        Rc::new(ElementwiseBackward { a: a.clone(), local_grad })
    })
}

/// Logistic sigmoid: 1 / (1 + e^-x)
pub fn sigmoid(a: &Tensor) -> Tensor {
    let data = a.data().mapv(stable_sigmoid);
    let local_grad = data.mapv(|s| s * (1.0 - s));
    result_of(data, a.shape().to_vec(), &[a], || {
        Rc::new(ElementwiseBackward { a: a.clone(), local_grad })
    })
}

/// Softplus: ln(1 + e^x), computed without overflow
///
/// The derivative is sigmoid(x).
pub fn softplus(a: &Tensor) -> Tensor {
    let data = a.data().mapv(|x| x.max(0.0) + (-x.abs()).exp().ln_1p());
    let local_grad = a.data().mapv(stable_sigmoid);
    result_of(data, a.shape().to_vec(), &[a], || {
        Rc::new(ElementwiseBackward { a: a.clone(), local_grad })
    })
}

fn stable_sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
