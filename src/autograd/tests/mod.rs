//! Autograd tests: unit checks and finite-difference property checks

mod prop_conv;
mod unit_ops;
