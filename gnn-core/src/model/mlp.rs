use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::autograd::{FactorGraph, NodeId};
use crate::error::GnnError;
use crate::nn::{ParamSet, Variable};
use crate::ops::ShapeHint;
use crate::types::ValueKind;

/// Name of the dense feature placeholder, `[batch, input_dim]`.
pub const FEATURES: &str = "x";
/// Name of the sparse one-hot label placeholder, `[batch, classes]`.
pub const LABELS: &str = "y";

/// Topology and initialization of a fully connected ReLU classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct MlpConfig {
    pub input_dim: usize,
    pub hidden_dims: Vec<usize>,
    pub classes: usize,
    /// Standard deviation of the zero-mean normal weight initialization.
    pub init_std: f32,
    /// Seed of the initialization; drawn from entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for MlpConfig {
    fn default() -> Self {
        MlpConfig {
            input_dim: 784,
            hidden_dims: vec![1024, 1024],
            classes: 10,
            init_std: 0.01,
            seed: None,
        }
    }
}

impl MlpConfig {
    /// # Errors
    /// Returns `GnnError::ConfigurationError` for a zero dimension or a
    /// negative or non-finite `init_std`.
    pub fn validate(&self) -> Result<(), GnnError> {
        if self.input_dim == 0 || self.classes == 0 || self.hidden_dims.contains(&0) {
            return Err(GnnError::ConfigurationError(format!(
                "MLP dimensions must be positive: {} -> {:?} -> {}",
                self.input_dim, self.hidden_dims, self.classes
            )));
        }
        if !(self.init_std >= 0.0 && self.init_std.is_finite()) {
            return Err(GnnError::ConfigurationError(format!(
                "init_std must be non-negative, got {}",
                self.init_std
            )));
        }
        Ok(())
    }
}

/// Handles of a classifier built by [`Mlp::build`].
#[derive(Debug, Clone)]
pub struct Mlp {
    /// Mean softmax cross-entropy over the batch, `[1]`.
    pub loss: NodeId,
    /// Fraction of rows whose label is the top-1 prediction, `[1]`.
    pub accuracy: NodeId,
    /// Unnormalized class scores, `[batch, classes]`.
    pub logits: NodeId,
    /// Weight matrices from input to output (`w1`, `w2`, ..., `wo`).
    pub weights: Vec<Variable>,
}

impl Mlp {
    /// Registers the weights in `params` and appends the network to `graph`.
    ///
    /// Each hidden layer is `relu(h @ w)` without bias; the output layer is a
    /// plain `h @ wo`. The graph expects the placeholders [`FEATURES`] (dense)
    /// and [`LABELS`] (sparse one-hot) at every `feed_forward`.
    ///
    /// # Errors
    /// - `GnnError::ConfigurationError` for an invalid configuration.
    /// - `GnnError::DuplicateName` if a weight or placeholder name is taken.
    /// - `GnnError::DeviceMismatch` if `params` and `graph` live on different devices.
    pub fn build(config: &MlpConfig, params: &mut ParamSet, graph: &mut FactorGraph) -> Result<Mlp, GnnError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut dims = Vec::with_capacity(config.hidden_dims.len() + 2);
        dims.push(config.input_dim);
        dims.extend_from_slice(&config.hidden_dims);
        dims.push(config.classes);

        let layers = dims.len() - 1;
        let mut weights = Vec::with_capacity(layers);
        for (layer, pair) in dims.windows(2).enumerate() {
            let name = if layer + 1 == layers {
                "wo".to_string()
            } else {
                format!("w{}", layer + 1)
            };
            let var = params.add(&name, pair)?;
            params.value_mut(&var)?.fill_random_normal(0.0, config.init_std, &mut rng)?;
            weights.push(var);
        }

        let x = graph.add_constant_with_shape(
            FEATURES,
            ValueKind::Dense,
            ShapeHint::Dims(vec![None, Some(config.input_dim)]),
            true,
        )?;
        let y = graph.add_constant_with_shape(
            LABELS,
            ValueKind::Sparse,
            ShapeHint::Dims(vec![None, Some(config.classes)]),
            true,
        )?;

        let mut h = x;
        for (layer, var) in weights.iter().enumerate() {
            let w = graph.add_param(params, var)?;
            h = graph.matmul(h, w)?;
            if layer + 1 < layers {
                h = graph.relu(h)?;
            }
        }
        let logits = h;

        let ce = graph.cross_entropy(logits, y)?;
        let loss = graph.reduce_mean(ce)?;

        let label = graph.arg_max(y)?;
        let hits = graph.in_top_k(logits, label, 1)?;
        let hits = graph.type_cast(hits)?;
        let accuracy = graph.reduce_mean(hits)?;

        log::debug!(
            "Mlp: {:?}, {} parameters in {} nodes",
            dims,
            params.total_elements(),
            graph.len()
        );
        Ok(Mlp {
            loss,
            accuracy,
            logits,
            weights,
        })
    }
}

#[cfg(test)]
#[path = "mlp_test.rs"]
mod tests;
