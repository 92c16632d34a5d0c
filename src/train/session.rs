//! Training session: global step, optimizer state and checkpoints

use crate::io::{latest_checkpoint, write_checkpoint, Checkpoint};
use crate::model::VariableScope;
use crate::optim::{Adam, AdamConfig};
use crate::Result;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// When a session writes checkpoints
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckpointPolicy {
    /// Save once this many seconds passed since the last save
    pub every_secs: Option<u64>,
    /// Save once this many steps passed since the last save
    pub every_steps: Option<u64>,
    /// Number of checkpoint files kept on disk
    pub keep: usize,
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self { every_secs: Some(600), every_steps: None, keep: 5 }
    }
}

impl CheckpointPolicy {
    /// Only the final checkpoint written by [`Session::close`]
    pub fn never() -> Self {
        Self { every_secs: None, every_steps: None, keep: 5 }
    }

    /// Configure to save every N steps
    pub fn every_steps(mut self, steps: u64) -> Self {
        self.every_steps = Some(steps);
        self
    }

    /// Configure to save every N seconds
    pub fn every_secs(mut self, secs: u64) -> Self {
        self.every_secs = Some(secs);
        self
    }

    /// Configure how many checkpoint files to keep
    pub fn keep(mut self, keep: usize) -> Self {
        self.keep = keep.max(1);
        self
    }
}

struct OptimizerSlot {
    scope: VariableScope,
    adam: Adam,
}

/// Mutable training state shared by every step
///
/// Owns the global step counter and the Adam state of each scope, restores
/// both (and the variables) from the newest checkpoint in the result
/// directory, and writes checkpoints according to its [`CheckpointPolicy`].
pub struct Session {
    result_path: PathBuf,
    policy: CheckpointPolicy,
    max_steps: Option<u64>,
    global_step: u64,
    scopes: Vec<VariableScope>,
    optimizers: BTreeMap<String, OptimizerSlot>,
    restored: Option<Checkpoint>,
    stop_requested: bool,
    last_save: Instant,
    last_save_step: u64,
}

impl Session {
    /// Open a session over `scopes`, restoring the latest checkpoint if any
    pub fn open(
        result_path: impl AsRef<Path>,
        policy: CheckpointPolicy,
        max_steps: Option<u64>,
        scopes: &[&VariableScope],
    ) -> Result<Self> {
        let result_path = result_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&result_path)?;

        let restored = latest_checkpoint(&result_path)?;
        let global_step = match &restored {
            Some(ckpt) => {
                for scope in scopes {
                    let found = scope.restore_from(ckpt)?;
                    if found < scope.variables().len() {
                        warn!(
                            scope = scope.name(),
                            found,
                            expected = scope.variables().len(),
                            "checkpoint is missing variables, keeping their initial values"
                        );
                    }
                }
                info!(step = ckpt.global_step, dir = %result_path.display(), "restored checkpoint");
                ckpt.global_step
            }
            None => 0,
        };

        Ok(Self {
            result_path,
            policy,
            max_steps,
            global_step,
            scopes: scopes.iter().map(|s| (*s).clone()).collect(),
            optimizers: BTreeMap::new(),
            restored,
            stop_requested: false,
            last_save: Instant::now(),
            last_save_step: global_step,
        })
    }

    pub fn result_path(&self) -> &Path {
        &self.result_path
    }

    pub fn global_step(&self) -> u64 {
        self.global_step
    }

    /// Increment the global step, returning the new value
    pub fn advance_step(&mut self) -> u64 {
        self.global_step += 1;
        self.global_step
    }

    /// Adam optimizer of `scope`, created on first use
    ///
    /// A new optimizer picks up its moments from the restored checkpoint.
    pub fn optimizer(&mut self, scope: &VariableScope, config: AdamConfig) -> Result<&mut Adam> {
        let name = format!("{}/adam", scope.name());
        let slot = match self.optimizers.entry(name) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let mut adam = Adam::new(e.key().clone(), config);
                if let Some(ckpt) = &self.restored {
                    adam.restore_from(scope, ckpt)?;
                }
                e.insert(OptimizerSlot { scope: scope.clone(), adam })
            }
        };
        Ok(&mut slot.adam)
    }

    /// Ask the session to stop at the next check
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    /// Stop requested, or the step limit reached
    pub fn should_stop(&self) -> bool {
        self.stop_requested || self.max_steps.is_some_and(|max| self.global_step >= max)
    }

    /// Write a checkpoint if the policy says one is due
    pub fn maybe_save(&mut self) -> Result<Option<PathBuf>> {
        if self.global_step == self.last_save_step {
            return Ok(None);
        }
        let by_time = self
            .policy
            .every_secs
            .is_some_and(|s| self.last_save.elapsed() >= Duration::from_secs(s));
        let by_steps =
            self.policy.every_steps.is_some_and(|n| self.global_step - self.last_save_step >= n);
        if by_time || by_steps {
            self.save().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Write a checkpoint of variables, optimizer state and the global step
    pub fn save(&mut self) -> Result<PathBuf> {
        let mut ckpt = Checkpoint::new(self.global_step);
        for scope in &self.scopes {
            scope.save_into(&mut ckpt);
        }
        for slot in self.optimizers.values() {
            slot.adam.save_into(&slot.scope, &mut ckpt);
        }

        let path = write_checkpoint(&self.result_path, &ckpt, self.policy.keep)?;
        info!(step = self.global_step, path = %path.display(), "saved checkpoint");
        self.last_save = Instant::now();
        self.last_save_step = self.global_step;
        Ok(path)
    }

    /// Write a final checkpoint if any step ran since the last one
    pub fn close(mut self) -> Result<()> {
        if self.global_step != self.last_save_step {
            self.save()?;
        }
        Ok(())
    }
}
