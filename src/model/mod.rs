//! Networks, parameter scopes, summaries and spec builders
//!
//! Networks own their parameters in a [`VariableScope`]. Spec builders run
//! the forward pass for one batch and, depending on the [`Mode`], attach a
//! loss, a [`Summary`] and a [`TrainOp`] updating only the relevant scopes.

mod layers;
mod mode;
mod networks;
mod scope;
pub mod spec;
mod summary;
mod train_op;

pub use layers::Conv2d;
pub use mode::Mode;
pub use networks::{
    Discriminator, DiscriminatorArch, Generator, GeneratorArch, Network, Networks,
};
pub use scope::{Variable, VariableScope};
pub use spec::{
    create_discriminator, create_generative_adversarial_network, create_generator, GanSpec,
    GanStage, GeneratorSpec,
};
pub use summary::{Histogram, Image, Summary, SummaryValue};
pub use train_op::TrainOp;
