use std::collections::HashMap;

use crate::device::StorageDevice;
use crate::tensor::DenseTensor;

/// Auxiliary per-parameter buffers of an optimizer (SGD velocity, Adam
/// moments), keyed by parameter name.
///
/// Buffers are created zero-filled on a parameter's first update and
/// recreated if the parameter's shape changes.
#[derive(Debug, Clone, Default)]
pub struct OptimizerState {
    slots: HashMap<String, Vec<DenseTensor<f32>>>,
}

impl OptimizerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of parameters with state.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The buffers held for `name`, if it was ever updated.
    pub fn get(&self, name: &str) -> Option<&[DenseTensor<f32>]> {
        self.slots.get(name).map(Vec::as_slice)
    }

    /// Drops all buffers.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub(crate) fn slots_for(
        &mut self,
        name: &str,
        count: usize,
        shape: &[usize],
        device: StorageDevice,
    ) -> &mut [DenseTensor<f32>] {
        let slots = self.slots.entry(name.to_string()).or_default();
        let stale = slots.len() != count
            || slots
                .iter()
                .any(|s| s.shape() != shape || s.device() != device);
        if stale {
            log::trace!("OptimizerState: new state for '{}' {:?}", name, shape);
            *slots = (0..count).map(|_| DenseTensor::zeros(shape, device)).collect();
        }
        slots
    }
}
