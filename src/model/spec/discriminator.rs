//! Discriminator spec

use crate::autograd::Tensor;
use crate::model::{Discriminator, Mode, Network, Summary, VariableScope};

/// Mode-dependent part of a [`DiscriminatorSpec`]
///
/// The discriminator has no objective of its own; its loss is defined by the
/// adversarial composition, so `Train` only differs from `Evaluate` in intent.
#[derive(Debug, Clone)]
pub enum DiscriminatorStage {
    Predict,
    Evaluate(Summary),
    Train(Summary),
}

/// Scores of real and generated samples
#[derive(Debug, Clone)]
pub struct DiscriminatorSpec<'a> {
    pub real_score: Tensor,
    pub fake_score: Tensor,
    pub scope: &'a VariableScope,
    pub stage: DiscriminatorStage,
}

impl DiscriminatorSpec<'_> {
    pub fn mode(&self) -> Mode {
        match self.stage {
            DiscriminatorStage::Predict => Mode::Predict,
            DiscriminatorStage::Evaluate(_) => Mode::Evaluate,
            DiscriminatorStage::Train(_) => Mode::Train,
        }
    }

    pub fn summary_op(&self) -> Option<&Summary> {
        match &self.stage {
            DiscriminatorStage::Predict => None,
            DiscriminatorStage::Evaluate(s) | DiscriminatorStage::Train(s) => Some(s),
        }
    }
}

/// Score targets as real and generator outputs as fake
///
/// An unconditioned critic sees the slices alone. A conditional critic sees
/// each slice concatenated with the MR input on the channel axis.
pub fn create_discriminator<'a>(
    inputs: &Tensor,
    targets: &Tensor,
    outputs: &Tensor,
    mode: Mode,
    discriminator: &'a Discriminator,
) -> DiscriminatorSpec<'a> {
    let real_score = discriminator.score(targets, inputs);
    let fake_score = discriminator.score(outputs, inputs);

    let summarize = || {
        let mut summary = Summary::new();
        summary.histogram("discriminator/real_score", &real_score);
        summary.histogram("discriminator/fake_score", &fake_score);
        summary
    };
    let stage = match mode {
        Mode::Predict => DiscriminatorStage::Predict,
        Mode::Evaluate => DiscriminatorStage::Evaluate(summarize()),
        Mode::Train => DiscriminatorStage::Train(summarize()),
    };

    DiscriminatorSpec { real_score, fake_score, scope: discriminator.scope(), stage }
}
