//! Spec builders
//!
//! Each builder runs the forward pass for one batch and attaches the parts
//! its [`Mode`](super::Mode) asks for. The attached parts live in a closed
//! stage enum, so a `Predict` spec cannot carry a loss and a `Train` spec
//! always carries both a loss and an update op.

mod discriminator;
mod gan;
mod generator;

pub use discriminator::{create_discriminator, DiscriminatorSpec, DiscriminatorStage};
pub use gan::{create_generative_adversarial_network, GanObjective, GanSpec, GanStage};
pub use generator::{
    create_generator, evaluate_generator, GeneratorSpec, GeneratorStage, Objective,
};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::autograd::Tensor;
    use crate::config::HParams;

    pub fn small_hparams() -> HParams {
        HParams::parse("num_filters=3").unwrap()
    }

    /// A batch of two 4x4 single-channel slices
    pub fn batch() -> (Tensor, Tensor) {
        let inputs = (0..32).map(|i| (i % 7) as f32 / 7.0).collect();
        let targets = (0..32).map(|i| (i % 5) as f32 / 5.0 - 0.5).collect();
        (
            Tensor::from_shape_vec(&[2, 4, 4, 1], inputs, false),
            Tensor::from_shape_vec(&[2, 4, 4, 1], targets, false),
        )
    }
}
