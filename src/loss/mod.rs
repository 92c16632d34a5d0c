//! Loss library
//!
//! Pure functions over equal-shaped tensors returning differentiable scalars:
//! - reconstruction terms: mean absolute error, mean squared error and
//!   gradient-difference loss
//! - adversarial terms for the generator and the discriminator, over
//!   discriminator logits
//!
//! Shape mismatches are contract violations and panic.

mod adversarial;
mod reconstruction;

pub use adversarial::{adv_d, adv_g};
pub use reconstruction::{gdl, mae, mse};
