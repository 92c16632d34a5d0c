//! Deferred optimizer updates

use super::VariableScope;
use crate::autograd::{backward, Gradients, Tensor};
use crate::optim::{AdamConfig, Optimizer};
use crate::train::Session;
use crate::Result;

/// One loss minimized over one scope
#[derive(Clone)]
struct Update<'a> {
    loss: Tensor,
    scope: &'a VariableScope,
    config: AdamConfig,
}

/// Update operation attached to a `Train` spec
///
/// Running the op differentiates every grouped loss against the current
/// parameter values before any of them is changed, then applies one Adam
/// update per scope and advances the session's global step once.
#[derive(Clone)]
pub struct TrainOp<'a> {
    updates: Vec<Update<'a>>,
}

impl<'a> TrainOp<'a> {
    /// Minimize `loss` over the variables of `scope` with Adam
    pub fn minimize(loss: &Tensor, scope: &'a VariableScope, config: AdamConfig) -> Self {
        Self { updates: vec![Update { loss: loss.clone(), scope, config }] }
    }

    /// Run several ops as a single step
    pub fn group(ops: impl IntoIterator<Item = TrainOp<'a>>) -> Self {
        Self { updates: ops.into_iter().flat_map(|op| op.updates).collect() }
    }

    /// Names of the scopes this op updates
    pub fn scopes(&self) -> Vec<&str> {
        self.updates.iter().map(|u| u.scope.name()).collect()
    }

    /// Apply the update and return the new global step
    pub fn run(&self, session: &mut Session) -> Result<u64> {
        let grads: Vec<Gradients> = self.updates.iter().map(|u| backward(&u.loss)).collect();
        for (update, grads) in self.updates.iter().zip(&grads) {
            session.optimizer(update.scope, update.config)?.step(update.scope, grads);
        }
        Ok(session.advance_step())
    }
}

impl std::fmt::Debug for TrainOp<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainOp").field("scopes", &self.scopes()).finish()
    }
}
