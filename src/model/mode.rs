//! Build mode of a spec

use std::fmt;
use std::str::FromStr;

/// Which parts of a spec a builder attaches
///
/// - `Predict`: forward pass only
/// - `Evaluate`: forward pass, losses and summaries
/// - `Train`: everything `Evaluate` builds plus an update op
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Train,
    Evaluate,
    Predict,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Train => "train",
            Self::Evaluate => "evaluate",
            Self::Predict => "predict",
        })
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "train" => Ok(Self::Train),
            "evaluate" | "eval" => Ok(Self::Evaluate),
            "predict" | "infer" => Ok(Self::Predict),
            other => Err(format!("unknown mode '{other}'")),
        }
    }
}
