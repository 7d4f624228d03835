use thiserror::Error;

use crate::autograd::{FactorGraph, NodeId};
use crate::device::StorageDevice;
use crate::error::GnnError;
use crate::nn::ParamSet;
use crate::ops::ValueRef;

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient check failed for variable '{variable}', element {element_index}: analytical {analytical_grad:?} != numerical {numerical_grad:?} (difference {difference:?})")]
    GradientMismatch {
        variable: String,
        element_index: usize,
        analytical_grad: f64,
        numerical_grad: f64,
        difference: f64,
    },
    #[error("Numerical gradient is NaN or infinite for variable '{variable}', element {element_index} (loss+ {loss_plus:?}, loss- {loss_minus:?})")]
    NumericalGradNaNOrInfinite {
        variable: String,
        element_index: usize,
        loss_plus: f64,
        loss_minus: f64,
    },
    #[error("Analytical gradient is NaN or infinite for variable '{variable}', element {element_index}: {value:?}")]
    AnalyticalGradNaNOrInfinite {
        variable: String,
        element_index: usize,
        value: f64,
    },
    #[error("Gradient checking only supported on host graphs, got {0:?}")]
    NonHostGraph(StorageDevice),
    #[error("Graph error during gradient check: {0}")]
    GraphError(#[from] GnnError),
}

/// Compares the gradients computed by `back_propagate` for every variable of
/// `params` against central finite differences of the scalar node `loss`.
///
/// Each variable element is perturbed by `±epsilon` and the graph re-evaluated
/// with the same `bindings`. An element fails when both the absolute
/// difference and the difference relative to `|analytical| + epsilon` exceed
/// `tolerance`.
///
/// Gradients in `params` are zeroed before and after the check; values are
/// restored to their original contents.
pub fn check_gradients(
    graph: &mut FactorGraph,
    params: &mut ParamSet,
    loss: NodeId,
    bindings: &[(&str, ValueRef<'_>)],
    epsilon: f64,
    tolerance: f64,
) -> Result<(), GradCheckError> {
    if graph.device() != StorageDevice::Host || params.device() != StorageDevice::Host {
        return Err(GradCheckError::NonHostGraph(graph.device()));
    }

    params.zero_gradients();
    graph.feed_forward(params, &[loss], bindings)?;
    graph.back_propagate(params, &[loss])?;

    let names: Vec<String> = params.iter().map(|p| p.name().to_string()).collect();
    for name in &names {
        let (analytical, original) = match params.get(name) {
            Some(p) => (p.grad().to_vec(), p.value().to_vec()),
            None => continue,
        };
        log::debug!("check_gradients: '{}' ({} elements)", name, original.len());

        for (elem_idx, &analytical_grad) in analytical.iter().enumerate() {
            let analytical_grad = analytical_grad as f64;
            let loss_plus = perturbed_loss(graph, params, loss, bindings, name, elem_idx, original[elem_idx] as f64 + epsilon)?;
            let loss_minus = perturbed_loss(graph, params, loss, bindings, name, elem_idx, original[elem_idx] as f64 - epsilon)?;
            set_element(params, name, elem_idx, original[elem_idx])?;

            let numerical_grad = (loss_plus - loss_minus) / (2.0 * epsilon);
            if !numerical_grad.is_finite() {
                return Err(GradCheckError::NumericalGradNaNOrInfinite {
                    variable: name.clone(),
                    element_index: elem_idx,
                    loss_plus,
                    loss_minus,
                });
            }
            if !analytical_grad.is_finite() {
                return Err(GradCheckError::AnalyticalGradNaNOrInfinite {
                    variable: name.clone(),
                    element_index: elem_idx,
                    value: analytical_grad,
                });
            }

            let difference = (analytical_grad - numerical_grad).abs();
            if difference > tolerance && difference / (analytical_grad.abs() + epsilon) > tolerance {
                return Err(GradCheckError::GradientMismatch {
                    variable: name.clone(),
                    element_index: elem_idx,
                    analytical_grad,
                    numerical_grad,
                    difference,
                });
            }
        }
    }

    params.zero_gradients();
    Ok(())
}

fn perturbed_loss(
    graph: &mut FactorGraph,
    params: &mut ParamSet,
    loss: NodeId,
    bindings: &[(&str, ValueRef<'_>)],
    name: &str,
    elem_idx: usize,
    value: f64,
) -> Result<f64, GradCheckError> {
    set_element(params, name, elem_idx, value as f32)?;
    graph.feed_forward(params, &[loss], bindings)?;
    Ok(graph.as_scalar(loss)? as f64)
}

fn set_element(params: &mut ParamSet, name: &str, elem_idx: usize, value: f32) -> Result<(), GnnError> {
    let param = params.get_mut(name).ok_or_else(|| GnnError::UnknownPlaceholder {
        name: name.to_string(),
    })?;
    param.value_mut().set(elem_idx, value)
}

#[cfg(test)]
#[path = "grad_check_test.rs"]
mod tests;
