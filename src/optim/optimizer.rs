//! Optimizer trait

use crate::autograd::Gradients;
use crate::model::VariableScope;

/// Trait for optimization algorithms
///
/// An optimizer only touches the variables of the scope it is handed, so
/// disjoint networks can be updated from one set of gradients each.
pub trait Optimizer {
    /// Apply one update to every variable of `scope` that has a gradient
    fn step(&mut self, scope: &VariableScope, grads: &Gradients);

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{backward, mean, square};
    use ndarray::Array1;

    /// Plain gradient descent, for exercising the trait
    struct TestOptimizer {
        learning_rate: f32,
    }

    impl Optimizer for TestOptimizer {
        fn step(&mut self, scope: &VariableScope, grads: &Gradients) {
            for param in scope.tensors() {
                if let Some(grad) = grads.get(param) {
                    let updated: Array1<f32> = &*param.data() - &(grad * self.learning_rate);
                    param.set_data(updated);
                }
            }
        }

        fn lr(&self) -> f32 {
            self.learning_rate
        }

        fn set_lr(&mut self, lr: f32) {
            self.learning_rate = lr;
        }
    }

    #[test]
    fn test_step_only_touches_scope() {
        let mut scope = VariableScope::new("a");
        let w = scope.create_variable("w", &[2], vec![1.0, -1.0]);
        let mut other = VariableScope::new("b");
        let u = other.create_variable("u", &[1], vec![3.0]);

        let loss = crate::autograd::add(&mean(&square(&w)), &mean(&square(&u)));
        let grads = backward(&loss);

        let mut opt = TestOptimizer { learning_rate: 0.5 };
        opt.step(&scope, &grads);

        assert_eq!(w.to_vec(), vec![0.5, -0.5]);
        assert_eq!(u.to_vec(), vec![3.0]);
    }

    #[test]
    fn test_set_lr() {
        let mut opt = TestOptimizer { learning_rate: 0.1 };
        opt.set_lr(0.01);
        assert_eq!(opt.lr(), 0.01);
    }
}
