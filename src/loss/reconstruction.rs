//! Reconstruction losses between a target slice batch and a generated one

use crate::autograd::{abs, add, mean, spatial_diff, square, sub, SpatialAxis, Tensor};

fn check_shapes(target: &Tensor, output: &Tensor, name: &str) {
    assert_eq!(
        target.shape(),
        output.shape(),
        "{name}: target and output must have the same shape"
    );
}

/// Mean absolute error
///
/// L = mean(|target - output|)
///
/// # Example
///
/// ```
/// use mrtoct::loss::mae;
/// use mrtoct::Tensor;
///
/// let target = Tensor::from_vec(vec![1.0, 2.0], false);
/// let output = Tensor::from_vec(vec![2.0, 0.0], true);
/// assert_eq!(mae(&target, &output).item(), 1.5);
/// ```
pub fn mae(target: &Tensor, output: &Tensor) -> Tensor {
    check_shapes(target, output, "mae");
    mean(&abs(&sub(target, output)))
}

/// Mean squared error
///
/// L = mean((target - output)²)
pub fn mse(target: &Tensor, output: &Tensor) -> Tensor {
    check_shapes(target, output, "mse");
    mean(&square(&sub(target, output)))
}

/// Gradient-difference loss over NHWC slices
///
/// Mean squared difference between the vertical finite-difference gradients of
/// target and output, plus the same for the horizontal gradients. Penalising
/// mismatched intensity gradients keeps generated edges sharp. An axis with a
/// single pixel contributes zero.
pub fn gdl(target: &Tensor, output: &Tensor) -> Tensor {
    check_shapes(target, output, "gdl");

    let term = |axis| {
        let dt = spatial_diff(target, axis);
        let dout = spatial_diff(output, axis);
        mean(&square(&sub(&dt, &dout)))
    };

    add(&term(SpatialAxis::Height), &term(SpatialAxis::Width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::backward;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn image(h: usize, w: usize, data: Vec<f32>, requires_grad: bool) -> Tensor {
        Tensor::from_shape_vec(&[1, h, w, 1], data, requires_grad)
    }

    #[test]
    fn test_mae_value() {
        let t = image(1, 3, vec![0.0, 1.0, 2.0], false);
        let o = image(1, 3, vec![1.0, 1.0, 5.0], true);
        assert_abs_diff_eq!(mae(&t, &o).item(), 4.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mse_value_and_gradient() {
        let t = image(1, 2, vec![0.0, 0.0], false);
        let o = image(1, 2, vec![1.0, 3.0], true);
        let loss = mse(&t, &o);
        assert_abs_diff_eq!(loss.item(), 5.0);

        // d/do mean((t - o)^2) = 2 (o - t) / n
        let grads = backward(&loss);
        let g = grads.get(&o).expect("gradient should be available");
        assert_abs_diff_eq!(g[0], 1.0);
        assert_abs_diff_eq!(g[1], 3.0);
    }

    #[test]
    fn test_gdl_ignores_constant_offset() {
        let t = image(2, 2, vec![1.0, 2.0, 3.0, 4.0], false);
        let o = image(2, 2, vec![11.0, 12.0, 13.0, 14.0], false);
        assert_abs_diff_eq!(gdl(&t, &o).item(), 0.0);
    }

    #[test]
    fn test_gdl_penalises_flattened_edges() {
        // A step edge in the target, a flat output.
        let t = image(2, 2, vec![0.0, 1.0, 0.0, 1.0], false);
        let o = image(2, 2, vec![0.5, 0.5, 0.5, 0.5], false);
        // Horizontal gradients differ by 1 on both rows, vertical ones agree.
        assert_abs_diff_eq!(gdl(&t, &o).item(), 1.0);
    }

    #[test]
    fn test_gdl_single_pixel_is_zero() {
        let t = image(1, 1, vec![3.0], false);
        let o = image(1, 1, vec![-3.0], false);
        assert_eq!(gdl(&t, &o).item(), 0.0);
    }

    #[test]
    #[should_panic(expected = "same shape")]
    fn test_shape_mismatch_panics() {
        let t = image(1, 2, vec![0.0, 0.0], false);
        let o = image(2, 1, vec![0.0, 0.0], false);
        let _ = mae(&t, &o);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_losses_vanish_on_identical_inputs(
            h in 1usize..6,
            w in 1usize..6,
            seed in prop::collection::vec(-1000.0f32..1000.0, 36)
        ) {
            let data: Vec<f32> = seed.into_iter().take(h * w).collect();
            let a = image(h, w, data.clone(), false);
            let b = image(h, w, data, true);
            prop_assert_eq!(mae(&a, &b).item(), 0.0);
            prop_assert_eq!(mse(&a, &b).item(), 0.0);
            prop_assert_eq!(gdl(&a, &b).item(), 0.0);
        }

        #[test]
        fn prop_losses_are_non_negative(
            pairs in prop::collection::vec((-10.0f32..10.0, -10.0f32..10.0), 4)
        ) {
            let (x, y): (Vec<f32>, Vec<f32>) = pairs.into_iter().unzip();
            let a = image(2, 2, x, false);
            let b = image(2, 2, y, false);
            prop_assert!(mae(&a, &b).item() >= 0.0);
            prop_assert!(mse(&a, &b).item() >= 0.0);
            prop_assert!(gdl(&a, &b).item() >= 0.0);
        }
    }
}
