//! Generative adversarial composition

use super::{create_discriminator, create_generator, evaluate_generator};
use crate::autograd::{add, scale, Tensor};
use crate::config::HParams;
use crate::loss::{adv_d, adv_g};
use crate::model::{Mode, Network, Networks, Summary, TrainOp};

/// Losses of both players and the merged summaries
#[derive(Debug, Clone)]
pub struct GanObjective {
    /// `adv_weight·adv_g + reconstruction loss`
    pub gloss: Tensor,
    /// `adv_d(fake, real)`
    pub dloss: Tensor,
    pub summary: Summary,
}

/// Mode-dependent part of a [`GanSpec`]
#[derive(Debug, Clone)]
pub enum GanStage<'a> {
    Predict,
    Evaluate(GanObjective),
    Train(GanObjective, TrainOp<'a>),
}

/// Generator and discriminator composed into one spec
#[derive(Debug, Clone)]
pub struct GanSpec<'a> {
    pub inputs: Tensor,
    pub targets: Tensor,
    pub outputs: Tensor,
    pub stage: GanStage<'a>,
}

impl<'a> GanSpec<'a> {
    pub fn mode(&self) -> Mode {
        match self.stage {
            GanStage::Predict => Mode::Predict,
            GanStage::Evaluate(_) => Mode::Evaluate,
            GanStage::Train(..) => Mode::Train,
        }
    }

    pub fn objective(&self) -> Option<&GanObjective> {
        match &self.stage {
            GanStage::Predict => None,
            GanStage::Evaluate(o) | GanStage::Train(o, _) => Some(o),
        }
    }

    /// The generator's combined loss
    pub fn loss_op(&self) -> Option<&Tensor> {
        self.objective().map(|o| &o.gloss)
    }

    pub fn summary_op(&self) -> Option<&Summary> {
        self.objective().map(|o| &o.summary)
    }

    pub fn train_op(&self) -> Option<&TrainOp<'a>> {
        match &self.stage {
            GanStage::Train(_, op) => Some(op),
            _ => None,
        }
    }
}

/// Build the adversarial spec for one batch
///
/// The generator is evaluated first; its output is the discriminator's fake
/// branch and the paired target its real branch. In `Train` mode one Adam
/// update per network is grouped into a single step, so both networks move
/// simultaneously from the same parameter values.
pub fn create_generative_adversarial_network<'a>(
    inputs: &Tensor,
    targets: &Tensor,
    mode: Mode,
    hparams: &HParams,
    networks: &'a Networks,
) -> GanSpec<'a> {
    if mode == Mode::Predict {
        let gspec = create_generator(inputs, targets, Mode::Predict, hparams, &networks.generator);
        return GanSpec {
            inputs: inputs.clone(),
            targets: targets.clone(),
            outputs: gspec.outputs,
            stage: GanStage::Predict,
        };
    }

    let (outputs, base) = evaluate_generator(inputs, targets, hparams, &networks.generator);
    let dspec =
        create_discriminator(inputs, targets, &outputs, Mode::Evaluate, &networks.discriminator);

    let gadv = adv_g(&dspec.fake_score);
    let gloss = add(&scale(&gadv, hparams.adv_weight), &base.loss);
    let dadv = adv_d(&dspec.fake_score, &dspec.real_score);
    let dloss = dadv.clone();

    let mut adversarial = Summary::new();
    adversarial.scalar("generative_adversarial/loss/gadv", gadv.item());
    adversarial.scalar("generative_adversarial/loss/gloss", gloss.item());
    adversarial.scalar("generative_adversarial/loss/dadv", dadv.item());
    adversarial.scalar("generative_adversarial/loss/dloss", dloss.item());
    let critic = dspec.summary_op().cloned().unwrap_or_default();
    let summary = Summary::merge([base.summary, critic, adversarial]);

    let objective = GanObjective { gloss, dloss, summary };
    let stage = match mode {
        Mode::Train => {
            let config = hparams.adam();
            let op = TrainOp::group([
                TrainOp::minimize(&objective.dloss, dspec.scope, config),
                TrainOp::minimize(&objective.gloss, networks.generator.scope(), config),
            ]);
            GanStage::Train(objective, op)
        }
        _ => GanStage::Evaluate(objective),
    };

    GanSpec { inputs: inputs.clone(), targets: targets.clone(), outputs, stage }
}
