//! Generator and discriminator architectures

use super::{Conv2d, VariableScope};
use crate::autograd::{add, concat_channels, global_avg_pool, leaky_relu, relu, Tensor};
use crate::config::HParams;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const KERNEL_SIZE: usize = 3;
const LEAKY_SLOPE: f32 = 0.2;

/// A network owning its parameters in one [`VariableScope`]
pub trait Network {
    /// Map an NHWC batch to an NHWC batch
    fn forward(&self, x: &Tensor) -> Tensor;

    /// Trainable parameters of this network
    fn scope(&self) -> &VariableScope;
}

/// Generator architecture, selected by the `generator` hyperparameter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorArch {
    /// conv → relu → conv → relu → conv
    #[default]
    Plain,
    /// plain stack plus an identity skip from the input
    Residual,
}

/// Discriminator architecture, selected by the `discriminator` hyperparameter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscriminatorArch {
    /// Per-pixel logits
    #[default]
    Patch,
    /// One logit per example
    Global,
}

macro_rules! arch_names {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const NAMES: &'static [&'static str] = &[$($name),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($name => Ok(Self::$variant),)+
                    other => Err(format!(
                        "unknown architecture '{other}', expected one of: {}",
                        Self::NAMES.join(", ")
                    )),
                }
            }
        }
    };
}

arch_names!(GeneratorArch { Plain => "plain", Residual => "residual" });
arch_names!(DiscriminatorArch { Patch => "patch", Global => "global" });

/// Image-to-image generator
#[derive(Debug, Clone)]
pub struct Generator {
    arch: GeneratorArch,
    layers: Vec<Conv2d>,
    scope: VariableScope,
}

impl Generator {
    pub fn new(arch: GeneratorArch, num_filters: usize, rng: &mut StdRng) -> Self {
        let mut scope = VariableScope::new("generator");
        let widths = [(1, num_filters), (num_filters, num_filters), (num_filters, 1)];
        let layers = widths
            .iter()
            .enumerate()
            .map(|(i, &(cin, cout))| {
                Conv2d::new(&mut scope, &format!("conv_{i}"), KERNEL_SIZE, cin, cout, rng)
            })
            .collect();
        Self { arch, layers, scope }
    }

    pub fn arch(&self) -> GeneratorArch {
        self.arch
    }
}

impl Network for Generator {
    fn forward(&self, x: &Tensor) -> Tensor {
        let last = self.layers.len() - 1;
        let mut h = x.clone();
        for (i, layer) in self.layers.iter().enumerate() {
            h = layer.forward(&h);
            if i < last {
                h = relu(&h);
            }
        }
        match self.arch {
            GeneratorArch::Plain => h,
            GeneratorArch::Residual => add(&h, x),
        }
    }

    fn scope(&self) -> &VariableScope {
        &self.scope
    }
}

/// Real/fake critic producing logits
#[derive(Debug, Clone)]
pub struct Discriminator {
    arch: DiscriminatorArch,
    conditional: bool,
    hidden: Conv2d,
    output: Conv2d,
    scope: VariableScope,
}

impl Discriminator {
    pub fn new(
        arch: DiscriminatorArch,
        num_filters: usize,
        conditional: bool,
        rng: &mut StdRng,
    ) -> Self {
        let mut scope = VariableScope::new("discriminator");
        let in_channels = if conditional { 2 } else { 1 };
        let hidden = Conv2d::new(&mut scope, "conv_0", KERNEL_SIZE, in_channels, num_filters, rng);
        let output = Conv2d::new(&mut scope, "conv_1", KERNEL_SIZE, num_filters, 1, rng);
        Self { arch, conditional, hidden, output, scope }
    }

    pub fn arch(&self) -> DiscriminatorArch {
        self.arch
    }

    /// Whether the critic expects the MR input concatenated to its sample
    pub fn is_conditional(&self) -> bool {
        self.conditional
    }

    /// Score `sample`, concatenating `condition` on the channel axis when the
    /// critic is conditional
    pub fn score(&self, sample: &Tensor, condition: &Tensor) -> Tensor {
        if self.conditional {
            self.forward(&concat_channels(sample, condition))
        } else {
            self.forward(sample)
        }
    }
}

impl Network for Discriminator {
    fn forward(&self, x: &Tensor) -> Tensor {
        let h = leaky_relu(&self.hidden.forward(x), LEAKY_SLOPE);
        let logits = self.output.forward(&h);
        match self.arch {
            DiscriminatorArch::Patch => logits,
            DiscriminatorArch::Global => global_avg_pool(&logits),
        }
    }

    fn scope(&self) -> &VariableScope {
        &self.scope
    }
}

/// The generator and discriminator of one training session
#[derive(Debug, Clone)]
pub struct Networks {
    pub generator: Generator,
    pub discriminator: Discriminator,
}

impl Networks {
    /// Instantiate both networks from the hyperparameters
    pub fn build(hparams: &HParams, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let generator = Generator::new(hparams.generator, hparams.num_filters, &mut rng);
        let discriminator = Discriminator::new(
            hparams.discriminator,
            hparams.num_filters,
            hparams.conditional,
            &mut rng,
        );
        Self { generator, discriminator }
    }

    pub fn scopes(&self) -> [&VariableScope; 2] {
        [self.generator.scope(), self.discriminator.scope()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hparams(overrides: &str) -> HParams {
        HParams::parse(&format!("num_filters=4{overrides}")).unwrap()
    }

    #[test]
    fn test_generator_preserves_shape() {
        for arch in ["plain", "residual"] {
            let nets = Networks::build(&hparams(&format!(",generator={arch}")), 1);
            let x = Tensor::zeros(&[2, 6, 5, 1], false);
            assert_eq!(nets.generator.forward(&x).shape(), &[2, 6, 5, 1]);
            assert_eq!(nets.generator.scope().variables().len(), 6);
        }
    }

    #[test]
    fn test_discriminator_output_shapes() {
        let x = Tensor::zeros(&[3, 4, 4, 1], false);
        let patch = Networks::build(&hparams(""), 1);
        assert_eq!(patch.discriminator.forward(&x).shape(), &[3, 4, 4, 1]);

        let global = Networks::build(&hparams(",discriminator=global"), 1);
        assert_eq!(global.discriminator.forward(&x).shape(), &[3, 1, 1, 1]);
    }

    #[test]
    fn test_conditional_discriminator_takes_two_channels() {
        let nets = Networks::build(&hparams(",conditional=true"), 1);
        assert!(nets.discriminator.is_conditional());
        let sample = Tensor::zeros(&[1, 4, 4, 1], false);
        let condition = Tensor::zeros(&[1, 4, 4, 1], false);
        assert_eq!(nets.discriminator.score(&sample, &condition).shape(), &[1, 4, 4, 1]);
    }

    #[test]
    fn test_residual_with_zero_weights_is_identity() {
        let nets = Networks::build(&hparams(",generator=residual"), 1);
        for t in nets.generator.scope().tensors() {
            t.set_data(ndarray::Array1::zeros(t.len()));
        }
        let x = Tensor::from_shape_vec(&[1, 2, 2, 1], vec![1.0, 2.0, 3.0, 4.0], false);
        assert_eq!(nets.generator.forward(&x).to_vec(), x.to_vec());
    }

    #[test]
    fn test_scopes_are_disjoint() {
        let nets = Networks::build(&hparams(""), 1);
        let [g, d] = nets.scopes();
        assert!(g.variables().iter().all(|v| v.name().starts_with("generator/")));
        assert!(d.variables().iter().all(|v| v.name().starts_with("discriminator/")));
    }

    #[test]
    fn test_arch_names() {
        assert_eq!("Residual".parse::<GeneratorArch>().unwrap(), GeneratorArch::Residual);
        assert_eq!(DiscriminatorArch::Global.to_string(), "global");
        assert!("unet".parse::<GeneratorArch>().is_err());
    }
}
