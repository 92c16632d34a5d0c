//! Unit tests for autograd operations (forward and backward)

use crate::autograd::{
    abs, add, backward, backward_with, bias_add, concat_channels, conv2d, global_avg_pool,
    leaky_relu, mean, mul, relu, scale, sigmoid, softplus, spatial_diff, square, sub, sum,
    SpatialAxis, Tensor,
};
use approx::assert_abs_diff_eq;

#[test]
fn test_tensor_creation() {
    let t = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
    assert_eq!(t.len(), 3);
    assert!(t.requires_grad());
    assert!(t.backward_op().is_none());
}

#[test]
fn test_add_forward_backward() {
    let a = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
    let b = Tensor::from_vec(vec![4.0, 5.0, 6.0], true);
    let c = add(&a, &b);

    assert_eq!(c.to_vec(), vec![5.0, 7.0, 9.0]);

    let grads = backward(&c);
    assert_eq!(grads.get(&a).expect("gradient should be available").to_vec(), vec![1.0; 3]);
    assert_eq!(grads.get(&b).expect("gradient should be available").to_vec(), vec![1.0; 3]);
}

#[test]
fn test_sub_backward_negates_rhs() {
    let a = Tensor::from_vec(vec![1.0, 2.0], true);
    let b = Tensor::from_vec(vec![4.0, 5.0], true);
    let c = sub(&a, &b);

    assert_eq!(c.to_vec(), vec![-3.0, -3.0]);
    let grads = backward(&c);
    assert_eq!(grads.get(&b).expect("gradient should be available").to_vec(), vec![-1.0, -1.0]);
}

#[test]
fn test_mul_backward() {
    let a = Tensor::from_vec(vec![2.0, 3.0], true);
    let b = Tensor::from_vec(vec![5.0, 7.0], true);
    let c = mul(&a, &b);

    let grads = backward(&c);

    // d(a*b)/da = b
    assert_eq!(grads.get(&a).expect("gradient should be available").to_vec(), vec![5.0, 7.0]);
    // d(a*b)/db = a
    assert_eq!(grads.get(&b).expect("gradient should be available").to_vec(), vec![2.0, 3.0]);
}

#[test]
fn test_constant_inputs_have_no_backward() {
    let a = Tensor::from_vec(vec![1.0], false);
    let b = Tensor::from_vec(vec![2.0], false);
    let c = add(&a, &b);
    assert!(!c.requires_grad());
    assert!(backward(&c).is_empty());
}

#[test]
fn test_scale_and_sum() {
    let a = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
    let s = sum(&scale(&a, 2.0));
    assert_abs_diff_eq!(s.item(), 12.0);

    let grads = backward(&s);
    assert_eq!(grads.get(&a).expect("gradient should be available").to_vec(), vec![2.0; 3]);
}

#[test]
fn test_mean_of_empty_is_zero() {
    let a = Tensor::zeros(&[0], true);
    let m = mean(&a);
    assert_eq!(m.item(), 0.0);
    let grads = backward(&m);
    assert!(grads.get(&a).expect("gradient should be available").is_empty());
}

#[test]
fn test_abs_subgradient_at_zero() {
    let a = Tensor::from_vec(vec![-2.0, 0.0, 3.0], true);
    let y = abs(&a);
    assert_eq!(y.to_vec(), vec![2.0, 0.0, 3.0]);
    let grads = backward(&y);
    assert_eq!(grads.get(&a).expect("gradient should be available").to_vec(), vec![-1.0, 0.0, 1.0]);
}

#[test]
fn test_square_backward() {
    let a = Tensor::from_vec(vec![-2.0, 3.0], true);
    let grads = backward(&square(&a));
    assert_eq!(grads.get(&a).expect("gradient should be available").to_vec(), vec![-4.0, 6.0]);
}

#[test]
fn test_relu_and_leaky_relu() {
    let a = Tensor::from_vec(vec![-1.0, 2.0], true);
    assert_eq!(relu(&a).to_vec(), vec![0.0, 2.0]);

    let y = leaky_relu(&a, 0.2);
    assert_abs_diff_eq!(y.to_vec()[0], -0.2);
    let grads = backward(&y);
    let g = grads.get(&a).expect("gradient should be available");
    assert_abs_diff_eq!(g[0], 0.2);
    assert_abs_diff_eq!(g[1], 1.0);
}

#[test]
fn test_softplus_is_stable_and_differentiable() {
    let a = Tensor::from_vec(vec![-100.0, 0.0, 100.0], true);
    let y = softplus(&a);
    let v = y.to_vec();
    assert_abs_diff_eq!(v[0], 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(v[1], std::f32::consts::LN_2, epsilon = 1e-6);
    assert_abs_diff_eq!(v[2], 100.0, epsilon = 1e-4);

    let grads = backward(&y);
    let g = grads.get(&a).expect("gradient should be available");
    assert_abs_diff_eq!(g[1], 0.5, epsilon = 1e-6);
    assert!(g.iter().all(|v| v.is_finite()));
}

#[test]
fn test_sigmoid_midpoint() {
    let a = Tensor::from_vec(vec![0.0], true);
    let y = sigmoid(&a);
    assert_abs_diff_eq!(y.item(), 0.5);
    let grads = backward(&y);
    assert_abs_diff_eq!(grads.get(&a).expect("gradient should be available")[0], 0.25);
}

#[test]
fn test_shared_node_gradients_accumulate_once() {
    // y = (a + a) * a  =>  dy/da = 4a
    let a = Tensor::from_vec(vec![3.0], true);
    let two_a = add(&a, &a);
    let y = mul(&two_a, &a);
    let grads = backward(&y);
    assert_abs_diff_eq!(grads.get(&a).expect("gradient should be available")[0], 12.0);
}

#[test]
fn test_backward_with_seed() {
    let a = Tensor::from_vec(vec![1.0, 1.0], true);
    let y = scale(&a, 3.0);
    let grads = backward_with(&y, ndarray::arr1(&[1.0, 2.0]));
    assert_eq!(grads.get(&a).expect("gradient should be available").to_vec(), vec![3.0, 6.0]);
}

#[test]
fn test_global_norm() {
    let a = Tensor::from_vec(vec![3.0], true);
    let b = Tensor::from_vec(vec![4.0], true);
    let loss = add(&scale(&a, 3.0), &scale(&b, 4.0));
    let grads = backward(&loss);
    assert_abs_diff_eq!(grads.global_norm([&a, &b]), 5.0);
}

#[test]
fn test_conv2d_identity_kernel() {
    let x = Tensor::from_shape_vec(&[1, 2, 2, 1], vec![1.0, 2.0, 3.0, 4.0], false);
    let mut k = vec![0.0; 9];
    k[4] = 1.0; // centre tap
    let kernel = Tensor::from_shape_vec(&[3, 3, 1, 1], k, true);
    let y = conv2d(&x, &kernel);
    assert_eq!(y.shape(), &[1, 2, 2, 1]);
    assert_eq!(y.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_conv2d_same_padding_sums_neighbourhood() {
    let x = Tensor::from_shape_vec(&[1, 3, 3, 1], vec![1.0; 9], false);
    let kernel = Tensor::from_shape_vec(&[3, 3, 1, 2], vec![1.0; 18], false);
    let y = conv2d(&x, &kernel);
    assert_eq!(y.shape(), &[1, 3, 3, 2]);
    let v = y.to_vec();
    // Corner sees 4 pixels, edge 6, centre 9; both output channels agree.
    assert_eq!(v[0], 4.0);
    assert_eq!(v[1], 4.0);
    assert_eq!(v[2], 6.0);
    assert_eq!(v[8], 9.0);
}

#[test]
fn test_bias_add_backward_sums_per_channel() {
    let x = Tensor::from_shape_vec(&[1, 1, 2, 2], vec![0.0; 4], true);
    let b = Tensor::from_vec(vec![1.0, -1.0], true);
    let y = bias_add(&x, &b);
    assert_eq!(y.to_vec(), vec![1.0, -1.0, 1.0, -1.0]);
    let grads = backward(&y);
    assert_eq!(grads.get(&b).expect("gradient should be available").to_vec(), vec![2.0, 2.0]);
}

#[test]
fn test_spatial_diff_shapes_and_values() {
    let x = Tensor::from_shape_vec(&[1, 2, 3, 1], vec![1.0, 2.0, 4.0, 7.0, 11.0, 16.0], false);
    let dy = spatial_diff(&x, SpatialAxis::Height);
    assert_eq!(dy.shape(), &[1, 1, 3, 1]);
    assert_eq!(dy.to_vec(), vec![6.0, 9.0, 12.0]);

    let dx = spatial_diff(&x, SpatialAxis::Width);
    assert_eq!(dx.shape(), &[1, 2, 2, 1]);
    assert_eq!(dx.to_vec(), vec![1.0, 2.0, 4.0, 5.0]);
}

#[test]
fn test_spatial_diff_degenerate_axis_is_empty() {
    let x = Tensor::from_shape_vec(&[1, 1, 3, 1], vec![1.0, 2.0, 3.0], false);
    let dy = spatial_diff(&x, SpatialAxis::Height);
    assert_eq!(dy.shape(), &[1, 0, 3, 1]);
    assert!(dy.is_empty());
}

#[test]
fn test_concat_channels_interleaves() {
    let a = Tensor::from_shape_vec(&[1, 1, 2, 1], vec![1.0, 2.0], true);
    let b = Tensor::from_shape_vec(&[1, 1, 2, 2], vec![10.0, 11.0, 20.0, 21.0], true);
    let c = concat_channels(&a, &b);
    assert_eq!(c.shape(), &[1, 1, 2, 3]);
    assert_eq!(c.to_vec(), vec![1.0, 10.0, 11.0, 2.0, 20.0, 21.0]);

    let grads = backward_with(&c, ndarray::arr1(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
    assert_eq!(grads.get(&a).expect("gradient should be available").to_vec(), vec![1.0, 4.0]);
    assert_eq!(
        grads.get(&b).expect("gradient should be available").to_vec(),
        vec![2.0, 3.0, 5.0, 6.0]
    );
}

#[test]
fn test_global_avg_pool() {
    let x = Tensor::from_shape_vec(&[2, 1, 2, 1], vec![1.0, 3.0, 5.0, 7.0], true);
    let y = global_avg_pool(&x);
    assert_eq!(y.shape(), &[2, 1, 1, 1]);
    assert_eq!(y.to_vec(), vec![2.0, 6.0]);
    let grads = backward(&y);
    assert_eq!(grads.get(&x).expect("gradient should be available").to_vec(), vec![0.5; 4]);
}
