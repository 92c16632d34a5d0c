//! Adam optimizer

use super::Optimizer;
use crate::autograd::Gradients;
use crate::io::Checkpoint;
use crate::model::VariableScope;
use crate::Result;
use ndarray::Array1;
use std::collections::BTreeMap;

/// Adam hyperparameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamConfig {
    pub lr: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
}

impl AdamConfig {
    /// Learning rate and β1 from the caller, library defaults otherwise
    pub fn new(lr: f32, beta1: f32) -> Self {
        Self { lr, beta1, beta2: 0.999, epsilon: 1e-8 }
    }
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self::new(1e-3, 0.9)
    }
}

#[derive(Debug, Clone)]
struct Moments {
    m: Array1<f32>,
    v: Array1<f32>,
}

/// Adam with bias correction
///
/// Moment buffers are keyed by variable name so they survive checkpointing:
///
/// m_t = β1·m + (1-β1)·g
/// v_t = β2·v + (1-β2)·g²
/// θ_t = θ - lr·√(1-β2^t)/(1-β1^t) · m_t / (√v_t + ε)
#[derive(Debug, Clone)]
pub struct Adam {
    name: String,
    config: AdamConfig,
    t: u64,
    moments: BTreeMap<String, Moments>,
}

impl Adam {
    pub fn new(name: impl Into<String>, config: AdamConfig) -> Self {
        Self { name: name.into(), config, t: 0, moments: BTreeMap::new() }
    }

    /// Optimizer name, prefix of its checkpoint entries
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &AdamConfig {
        &self.config
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.t
    }

    pub fn set_step_count(&mut self, t: u64) {
        self.t = t;
    }

    /// First and second moment of a variable, once it has been updated
    pub fn moments(&self, variable: &str) -> Option<(&Array1<f32>, &Array1<f32>)> {
        self.moments.get(variable).map(|mo| (&mo.m, &mo.v))
    }

    fn step_key(&self) -> String {
        format!("{}/step", self.name)
    }

    /// Store the step count and moments of the variables of `scope`
    pub fn save_into(&self, scope: &VariableScope, checkpoint: &mut Checkpoint) {
        checkpoint.metadata.insert(self.step_key(), self.t.to_string());
        for var in scope.variables() {
            if let Some(mo) = self.moments.get(var.name()) {
                let shape = var.tensor().shape();
                checkpoint.insert(format!("{}/{}/m", self.name, var.name()), shape, mo.m.to_vec());
                checkpoint.insert(format!("{}/{}/v", self.name, var.name()), shape, mo.v.to_vec());
            }
        }
    }

    /// Restore state written by [`Adam::save_into`]
    pub fn restore_from(&mut self, scope: &VariableScope, checkpoint: &Checkpoint) -> Result<()> {
        if let Some(t) = checkpoint.metadata.get(&self.step_key()) {
            self.t = t.parse().map_err(|e| {
                crate::Error::Serialization(format!("invalid step count for {}: {e}", self.name))
            })?;
        }
        for var in scope.variables() {
            let shape = var.tensor().shape();
            let m = checkpoint.tensor(&format!("{}/{}/m", self.name, var.name()), shape)?;
            let v = checkpoint.tensor(&format!("{}/{}/v", self.name, var.name()), shape)?;
            if let (Some(m), Some(v)) = (m, v) {
                self.moments.insert(
                    var.name().to_string(),
                    Moments { m: Array1::from(m.data.clone()), v: Array1::from(v.data.clone()) },
                );
            }
        }
        Ok(())
    }
}

impl Optimizer for Adam {
    fn step(&mut self, scope: &VariableScope, grads: &Gradients) {
        self.t += 1;
        let AdamConfig { lr, beta1, beta2, epsilon } = self.config;
        // Past i32::MAX both corrections are exactly 1 anyway.
        let t = i32::try_from(self.t).unwrap_or(i32::MAX);
        let lr_t = lr * ((1.0 - beta2.powi(t)).sqrt() / (1.0 - beta1.powi(t)));

        for var in scope.variables() {
            let param = var.tensor();
            let Some(grad) = grads.get(param) else {
                continue;
            };
            let mo = self.moments.entry(var.name().to_string()).or_insert_with(|| Moments {
                m: Array1::zeros(grad.len()),
                v: Array1::zeros(grad.len()),
            });

            mo.m = &mo.m * beta1 + grad * (1.0 - beta1);
            mo.v = &mo.v * beta2 + &(grad * grad) * (1.0 - beta2);
            let update = &mo.m / &(mo.v.mapv(f32::sqrt) + epsilon) * lr_t;
            let updated = &*param.data() - &update;
            param.set_data(updated);
        }
    }

    fn lr(&self) -> f32 {
        self.config.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.config.lr = lr;
    }
}
