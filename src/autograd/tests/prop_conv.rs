//! Finite-difference checks for convolution and spatial differences

use super::test_utils::{finite_difference, pattern};
use crate::autograd::{
    backward, conv2d, mul, spatial_diff, sum, SpatialAxis, Tensor,
};
use proptest::prelude::*;

/// Scalar objective sum(conv2d(x, k) * weights) for fixed weights
fn conv_objective(x: &Tensor, k: &Tensor, weights: &Tensor) -> Tensor {
    sum(&mul(&conv2d(x, k), weights))
}

#[test]
fn test_conv2d_kernel_gradient_matches_finite_difference() {
    let x = pattern(&[2, 4, 3, 2], 0.0);
    let k_init: Vec<f32> = pattern(&[3, 3, 2, 3], 5.0).to_vec();
    let weights = pattern(&[2, 4, 3, 3], 11.0);

    let k = Tensor::from_shape_vec(&[3, 3, 2, 3], k_init.clone(), true);
    let grads = backward(&conv_objective(&x, &k, &weights));
    let analytical = grads.get(&k).expect("gradient should be available");

    let numerical = finite_difference(
        |kv| {
            let kt = Tensor::from_shape_vec(&[3, 3, 2, 3], kv.to_vec(), false);
            conv_objective(&x, &kt, &weights).item()
        },
        &k_init,
        1e-2,
    );

    for (a, n) in analytical.iter().zip(&numerical) {
        assert!((a - n).abs() < 2e-2, "analytical={a}, numerical={n}");
    }
}

#[test]
fn test_conv2d_input_gradient_matches_finite_difference() {
    let x_init: Vec<f32> = pattern(&[1, 3, 4, 2], 1.0).to_vec();
    let k = pattern(&[3, 3, 2, 2], 7.0);
    let weights = pattern(&[1, 3, 4, 2], 13.0);

    let x = Tensor::from_shape_vec(&[1, 3, 4, 2], x_init.clone(), true);
    let grads = backward(&conv_objective(&x, &k, &weights));
    let analytical = grads.get(&x).expect("gradient should be available");

    let numerical = finite_difference(
        |xv| {
            let xt = Tensor::from_shape_vec(&[1, 3, 4, 2], xv.to_vec(), false);
            conv_objective(&xt, &k, &weights).item()
        },
        &x_init,
        1e-2,
    );

    for (a, n) in analytical.iter().zip(&numerical) {
        assert!((a - n).abs() < 2e-2, "analytical={a}, numerical={n}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_spatial_diff_of_constant_is_zero(
        h in 1usize..6, w in 1usize..6, value in -10.0f32..10.0
    ) {
        let x = Tensor::from_shape_vec(&[1, h, w, 1], vec![value; h * w], false);
        for axis in [SpatialAxis::Height, SpatialAxis::Width] {
            let d = spatial_diff(&x, axis);
            prop_assert!(d.data().iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn prop_spatial_diff_gradient_sums_to_zero(h in 2usize..6, w in 2usize..6) {
        // Every difference adds +g to one pixel and -g to another.
        let x = Tensor::from_shape_vec(&[1, h, w, 1], vec![0.0; h * w], true);
        let grads = backward(&sum(&spatial_diff(&x, SpatialAxis::Width)));
        let g = grads.get(&x).expect("gradient should be available");
        prop_assert!(g.sum().abs() < 1e-6);
    }
}
