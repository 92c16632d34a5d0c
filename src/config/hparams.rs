//! Hyperparameter set
//!
//! Built once at startup from defaults plus a `key=value,key=value` override
//! string, then only read.

use crate::model::{DiscriminatorArch, GeneratorArch};
use crate::optim::AdamConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

/// Training hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HParams {
    /// Adam learning rate
    pub learn_rate: f32,
    /// Adam first-moment decay
    pub beta1_rate: f32,
    /// Weight of the mean absolute error term
    pub mae_weight: f32,
    /// Weight of the mean squared error term
    pub mse_weight: f32,
    /// Weight of the gradient difference term
    pub gdl_weight: f32,
    /// Weight of the generator's adversarial term
    pub adv_weight: f32,
    /// Channels of the hidden convolutions
    pub num_filters: usize,
    pub generator: GeneratorArch,
    pub discriminator: DiscriminatorArch,
    /// Feed the MR input to the discriminator alongside each sample
    pub conditional: bool,
    /// Log the gradient norm of each reconstruction term
    pub log_gradient_norms: bool,
}

impl Default for HParams {
    fn default() -> Self {
        Self {
            learn_rate: 2e-4,
            beta1_rate: 0.5,
            mae_weight: 1.0,
            mse_weight: 0.0,
            gdl_weight: 1.0,
            adv_weight: 0.01,
            num_filters: 64,
            generator: GeneratorArch::Plain,
            discriminator: DiscriminatorArch::Patch,
            conditional: false,
            log_gradient_norms: false,
        }
    }
}

fn value<T: FromStr>(entry: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| Error::HParam {
        entry: entry.to_string(),
        message: format!("invalid value '{raw}': {e}"),
    })
}

impl HParams {
    /// Names accepted in an override string
    pub const KEYS: &'static [&'static str] = &[
        "learn_rate",
        "beta1_rate",
        "mae_weight",
        "mse_weight",
        "gdl_weight",
        "adv_weight",
        "num_filters",
        "generator",
        "discriminator",
        "conditional",
        "log_gradient_norms",
    ];

    /// Defaults overridden by `"key=value,key=value"`
    ///
    /// The empty string yields the defaults. Unknown keys, entries without
    /// `=`, unparsable values and repeated keys are errors.
    pub fn parse(overrides: &str) -> Result<Self> {
        let mut hparams = Self::default();
        let mut seen = HashSet::new();

        for entry in overrides.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (key, raw) = entry.split_once('=').ok_or_else(|| Error::HParam {
                entry: entry.to_string(),
                message: "expected key=value".into(),
            })?;
            let (key, raw) = (key.trim(), raw.trim());
            if !seen.insert(key.to_string()) && Self::KEYS.contains(&key) {
                return Err(Error::HParam {
                    entry: entry.to_string(),
                    message: format!("'{key}' is set more than once"),
                });
            }
            hparams.set(entry, key, raw)?;
        }

        hparams.validate()?;
        Ok(hparams)
    }

    fn set(&mut self, entry: &str, key: &str, raw: &str) -> Result<()> {
        match key {
            "learn_rate" => self.learn_rate = value(entry, raw)?,
            "beta1_rate" => self.beta1_rate = value(entry, raw)?,
            "mae_weight" => self.mae_weight = value(entry, raw)?,
            "mse_weight" => self.mse_weight = value(entry, raw)?,
            "gdl_weight" => self.gdl_weight = value(entry, raw)?,
            "adv_weight" => self.adv_weight = value(entry, raw)?,
            "num_filters" => self.num_filters = value(entry, raw)?,
            "generator" => self.generator = value(entry, raw)?,
            "discriminator" => self.discriminator = value(entry, raw)?,
            "conditional" => self.conditional = value(entry, raw)?,
            "log_gradient_norms" => self.log_gradient_norms = value(entry, raw)?,
            other => return Err(Error::UnknownHParam(other.to_string())),
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(self.learn_rate.is_finite() && self.learn_rate > 0.0) {
            let lr = self.learn_rate;
            return Err(Error::Config(format!("learn_rate must be positive, got {lr}")));
        }
        if !(0.0..1.0).contains(&self.beta1_rate) {
            let beta1 = self.beta1_rate;
            return Err(Error::Config(format!("beta1_rate must be in [0, 1), got {beta1}")));
        }
        if self.num_filters == 0 {
            return Err(Error::Config("num_filters must be at least 1".into()));
        }
        let weights = [self.mae_weight, self.mse_weight, self.gdl_weight, self.adv_weight];
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::Config("loss weights must be finite".into()));
        }
        Ok(())
    }

    /// Adam settings shared by both networks
    pub fn adam(&self) -> AdamConfig {
        AdamConfig::new(self.learn_rate, self.beta1_rate)
    }

    /// Write the resolved set as pretty JSON
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
