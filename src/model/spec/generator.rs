//! Generator spec

use crate::autograd::{add, backward, scale, sub, Tensor};
use crate::config::HParams;
use crate::loss::{gdl, mae, mse};
use crate::model::{Generator, Mode, Network, Summary, TrainOp, VariableScope};

/// Loss of a spec together with the summaries built for it
#[derive(Debug, Clone)]
pub struct Objective {
    pub loss: Tensor,
    pub summary: Summary,
}

/// Mode-dependent part of a [`GeneratorSpec`]
#[derive(Debug, Clone)]
pub enum GeneratorStage<'a> {
    Predict,
    Evaluate(Objective),
    Train(Objective, TrainOp<'a>),
}

/// Generator forward pass with whatever its mode attached
#[derive(Debug, Clone)]
pub struct GeneratorSpec<'a> {
    pub inputs: Tensor,
    pub targets: Tensor,
    pub outputs: Tensor,
    pub scope: &'a VariableScope,
    pub stage: GeneratorStage<'a>,
}

impl<'a> GeneratorSpec<'a> {
    pub fn mode(&self) -> Mode {
        match self.stage {
            GeneratorStage::Predict => Mode::Predict,
            GeneratorStage::Evaluate(_) => Mode::Evaluate,
            GeneratorStage::Train(..) => Mode::Train,
        }
    }

    fn objective(&self) -> Option<&Objective> {
        match &self.stage {
            GeneratorStage::Predict => None,
            GeneratorStage::Evaluate(o) | GeneratorStage::Train(o, _) => Some(o),
        }
    }

    pub fn loss_op(&self) -> Option<&Tensor> {
        self.objective().map(|o| &o.loss)
    }

    pub fn summary_op(&self) -> Option<&Summary> {
        self.objective().map(|o| &o.summary)
    }

    pub fn train_op(&self) -> Option<&TrainOp<'a>> {
        match &self.stage {
            GeneratorStage::Train(_, op) => Some(op),
            _ => None,
        }
    }
}

/// Forward pass plus the weighted reconstruction loss
///
/// `loss = mae_weight·MAE + mse_weight·MSE + gdl_weight·GDL`, with every term
/// and the total recorded under `generator/`. The first slice of the inputs,
/// outputs, targets and residue (`targets - outputs`) is kept as an image.
pub fn evaluate_generator(
    inputs: &Tensor,
    targets: &Tensor,
    hparams: &HParams,
    generator: &Generator,
) -> (Tensor, Objective) {
    let outputs = generator.forward(inputs);
    let terms = [
        ("mean_absolute_error", mae(targets, &outputs), hparams.mae_weight),
        ("mean_squared_error", mse(targets, &outputs), hparams.mse_weight),
        ("gradient_difference_loss", gdl(targets, &outputs), hparams.gdl_weight),
    ];

    let mut summary = Summary::new();
    let residue = sub(targets, &outputs.detach());
    for (name, image) in
        [("inputs", inputs), ("outputs", &outputs), ("targets", targets), ("residue", &residue)]
    {
        summary.image(format!("generator/images/{name}"), image);
    }
    for (name, term, _) in &terms {
        summary.scalar(format!("generator/metrics/{name}"), term.item());
    }
    if hparams.log_gradient_norms {
        for (name, term, _) in &terms {
            let norm = backward(term).global_norm(generator.scope().tensors());
            summary.scalar(format!("generator/metrics/{name}_gradient"), norm);
        }
    }

    let loss = terms
        .iter()
        .map(|(_, term, weight)| scale(term, *weight))
        .reduce(|acc, t| add(&acc, &t))
        .unwrap_or_else(|| Tensor::scalar(0.0));
    summary.scalar("generator/loss/total", loss.item());

    (outputs, Objective { loss, summary })
}

/// Build a generator spec for one batch
pub fn create_generator<'a>(
    inputs: &Tensor,
    targets: &Tensor,
    mode: Mode,
    hparams: &HParams,
    generator: &'a Generator,
) -> GeneratorSpec<'a> {
    let scope = generator.scope();
    let (outputs, stage) = match mode {
        Mode::Predict => (generator.forward(inputs), GeneratorStage::Predict),
        Mode::Evaluate => {
            let (outputs, objective) = evaluate_generator(inputs, targets, hparams, generator);
            (outputs, GeneratorStage::Evaluate(objective))
        }
        Mode::Train => {
            let (outputs, objective) = evaluate_generator(inputs, targets, hparams, generator);
            let op = TrainOp::minimize(&objective.loss, scope, hparams.adam());
            (outputs, GeneratorStage::Train(objective, op))
        }
    };

    GeneratorSpec { inputs: inputs.clone(), targets: targets.clone(), outputs, scope, stage }
}
