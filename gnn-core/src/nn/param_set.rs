use std::collections::HashMap;

use crate::device::{ensure_device, StorageDevice};
use crate::error::GnnError;
use crate::nn::parameter::Parameter;
use crate::tensor::DenseTensor;
use crate::utils::fresh_identity;

/// Handle on a parameter registered in a [`ParamSet`].
///
/// Graph nodes hold this handle instead of the tensor; the set stays the single
/// owner of values and accumulators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    set_id: u64,
    index: usize,
    name: String,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_id(&self) -> u64 {
        self.set_id
    }
}

/// Named collection of trainable parameters living on one device.
///
/// Names are unique. Values are written by initialization code and optimizers;
/// accumulators only grow through [`ParamSet::accumulate_gradient`] until
/// [`ParamSet::zero_gradients`] resets them.
#[derive(Debug)]
pub struct ParamSet {
    id: u64,
    device: StorageDevice,
    params: Vec<Parameter>,
    by_name: HashMap<String, usize>,
}

impl ParamSet {
    pub fn new(device: StorageDevice) -> Self {
        ParamSet {
            id: fresh_identity(),
            device,
            params: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn device(&self) -> StorageDevice {
        self.device
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Registers a zero-initialized parameter of `shape` under `name`.
    ///
    /// # Errors
    /// Returns `GnnError::DuplicateName` if `name` is already registered.
    pub fn add(&mut self, name: &str, shape: &[usize]) -> Result<Variable, GnnError> {
        if self.by_name.contains_key(name) {
            return Err(GnnError::DuplicateName {
                name: name.to_string(),
            });
        }
        let index = self.params.len();
        self.params.push(Parameter::zeros(name, shape, self.device));
        self.by_name.insert(name.to_string(), index);
        log::debug!("ParamSet: registered '{}' with shape {:?}", name, shape);
        Ok(Variable {
            set_id: self.id,
            index,
            name: name.to_string(),
        })
    }

    /// Looks up the handle of a registered parameter.
    pub fn variable(&self, name: &str) -> Option<Variable> {
        self.by_name.get(name).map(|&index| Variable {
            set_id: self.id,
            index,
            name: name.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.by_name.get(name).map(|&i| &self.params[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        match self.by_name.get(name) {
            Some(&i) => Some(&mut self.params[i]),
            None => None,
        }
    }

    /// The parameter behind `variable`.
    ///
    /// # Errors
    /// Returns `GnnError::Dependency` if the handle was minted by another set.
    pub fn param(&self, variable: &Variable) -> Result<&Parameter, GnnError> {
        let index = self.resolve(variable)?;
        Ok(&self.params[index])
    }

    /// The current value behind `variable`.
    ///
    /// # Errors
    /// Same conditions as [`ParamSet::param`].
    pub fn value(&self, variable: &Variable) -> Result<&DenseTensor<f32>, GnnError> {
        Ok(self.param(variable)?.value())
    }

    /// Mutable value access, used for initialization.
    ///
    /// # Errors
    /// Same conditions as [`ParamSet::param`].
    pub fn value_mut(&mut self, variable: &Variable) -> Result<&mut DenseTensor<f32>, GnnError> {
        let index = self.resolve(variable)?;
        Ok(self.params[index].value_mut())
    }

    /// The gradient accumulator behind `variable`.
    ///
    /// # Errors
    /// Same conditions as [`ParamSet::param`].
    pub fn gradient(&self, variable: &Variable) -> Result<&DenseTensor<f32>, GnnError> {
        Ok(self.param(variable)?.grad())
    }

    /// Adds `delta` into the accumulator of `name`.
    ///
    /// # Errors
    /// - `GnnError::UnknownPlaceholder` if no parameter is called `name`.
    /// - `GnnError::Shape` if `delta` does not have the parameter's shape.
    /// - `GnnError::DeviceMismatch` if `delta` lives on another device.
    pub fn accumulate_gradient(&mut self, name: &str, delta: &DenseTensor<f32>) -> Result<(), GnnError> {
        let index = *self.by_name.get(name).ok_or_else(|| GnnError::UnknownPlaceholder {
            name: name.to_string(),
        })?;
        self.accumulate_at(index, delta)
    }

    pub(crate) fn accumulate_at(&mut self, index: usize, delta: &DenseTensor<f32>) -> Result<(), GnnError> {
        let device = self.device;
        let param = &mut self.params[index];
        if delta.shape() != param.shape() {
            return Err(GnnError::shape(param.shape(), delta.shape(), "accumulate_gradient"));
        }
        ensure_device(device, delta.device(), "accumulate_gradient")?;
        device
            .backend()
            .axpy(1.0, delta.storage(), param.grad_mut().storage_mut());
        Ok(())
    }

    /// Resets every accumulator to zero.
    pub fn zero_gradients(&mut self) {
        for param in &mut self.params {
            param.grad_mut().zero();
        }
    }

    /// Sum of the element counts of all parameters.
    pub fn total_elements(&self) -> usize {
        self.params.iter().map(|p| p.value().numel()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Parameter> {
        self.params.iter_mut()
    }

    pub(crate) fn index_of(&self, variable: &Variable) -> Result<usize, GnnError> {
        self.resolve(variable)
    }

    pub(crate) fn value_at(&self, index: usize) -> &DenseTensor<f32> {
        self.params[index].value()
    }

    fn resolve(&self, variable: &Variable) -> Result<usize, GnnError> {
        if variable.set_id != self.id || variable.index >= self.params.len() {
            return Err(GnnError::Dependency {
                operator: "ParamSet".to_string(),
                node: variable.name.clone(),
            });
        }
        Ok(variable.index)
    }
}

#[cfg(test)]
#[path = "param_set_test.rs"]
mod tests;
