//! Named parameter groups

use crate::autograd::Tensor;
use crate::io::Checkpoint;
use crate::Result;
use ndarray::Array1;

/// A trainable parameter with its fully qualified name
#[derive(Clone, Debug)]
pub struct Variable {
    name: String,
    tensor: Tensor,
}

impl Variable {
    /// Fully qualified name, `<scope>/<layer>/<var>`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tensor(&self) -> &Tensor {
        &self.tensor
    }
}

/// Ordered set of variables owned by one network
///
/// Optimizer updates receive the scope explicitly, so a network's parameters
/// can only be changed by an update scoped to it.
#[derive(Clone, Debug)]
pub struct VariableScope {
    name: String,
    variables: Vec<Variable>,
}

impl VariableScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), variables: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a new trainable variable under `local_name`
    ///
    /// # Panics
    ///
    /// Panics if the name is already taken in this scope.
    pub fn create_variable(&mut self, local_name: &str, shape: &[usize], init: Vec<f32>) -> Tensor {
        let name = format!("{}/{local_name}", self.name);
        assert!(self.get(&name).is_none(), "variable '{name}' already exists");
        let tensor = Tensor::from_shape_vec(shape, init, true);
        self.variables.push(Variable { name, tensor: tensor.clone() });
        tensor
    }

    /// Look up a variable by its fully qualified name
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.variables.iter().find(|v| v.name == name).map(|v| &v.tensor)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn tensors(&self) -> impl Iterator<Item = &Tensor> {
        self.variables.iter().map(|v| &v.tensor)
    }

    /// Total number of scalar parameters
    pub fn num_parameters(&self) -> usize {
        self.variables.iter().map(|v| v.tensor.len()).sum()
    }

    /// Copy of every variable's values, in registration order
    pub fn snapshot(&self) -> Vec<Vec<f32>> {
        self.tensors().map(Tensor::to_vec).collect()
    }

    /// Store all variables into a checkpoint
    pub fn save_into(&self, checkpoint: &mut Checkpoint) {
        for v in &self.variables {
            checkpoint.insert(v.name.clone(), v.tensor.shape(), v.tensor.to_vec());
        }
    }

    /// Load variables present in a checkpoint, returning how many were found
    pub fn restore_from(&self, checkpoint: &Checkpoint) -> Result<usize> {
        let mut restored = 0;
        for v in &self.variables {
            if let Some(saved) = checkpoint.tensor(&v.name, v.tensor.shape())? {
                v.tensor.set_data(Array1::from(saved.data.clone()));
                restored += 1;
            }
        }
        Ok(restored)
    }
}
