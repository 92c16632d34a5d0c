//! Adversarial losses over discriminator logits
//!
//! Standard minimax GAN objective with sigmoid cross-entropy, in the
//! non-saturating form for the generator.

use crate::autograd::{add, mean, scale, softplus, Tensor};

/// Generator adversarial loss
///
/// Pushes the discriminator's score for generated samples toward "real":
/// L = mean(-log σ(fake)) = mean(softplus(-fake))
pub fn adv_g(fake_score: &Tensor) -> Tensor {
    mean(&softplus(&scale(fake_score, -1.0)))
}

/// Discriminator adversarial loss
///
/// Pushes real scores up and fake scores down:
/// L = mean(-log σ(real)) + mean(-log(1 - σ(fake)))
///   = mean(softplus(-real)) + mean(softplus(fake))
pub fn adv_d(fake_score: &Tensor, real_score: &Tensor) -> Tensor {
    let real_term = mean(&softplus(&scale(real_score, -1.0)));
    let fake_term = mean(&softplus(fake_score));
    add(&real_term, &fake_term)
}
