use std::collections::HashMap;

use crate::autograd::node::{Node, NodeId, NodeKind, NodeState};
use crate::device::{ensure_device, StorageDevice};
use crate::error::GnnError;
use crate::nn::{ParamSet, Variable};
use crate::ops::{GradSink, NodeValue, Operator, ShapeHint, TensorSpec, ValueRef};
use crate::tensor::DenseTensor;
use crate::types::ValueKind;
use crate::utils::fresh_identity;

/// A fixed DAG of constants, variables and operator instances.
///
/// Nodes are kept in insertion order, which is a valid topological order:
/// [`FactorGraph::add_operator`] only accepts inputs that already exist in this
/// graph. Constants and variables are registered by unique name.
///
/// The graph owns one output buffer and one gradient buffer per node, reused
/// (and overwritten in place) across evaluations. Variable values are not
/// stored here: variable nodes hold a handle into the [`ParamSet`] passed to
/// [`FactorGraph::feed_forward`] and [`FactorGraph::back_propagate`], which
/// must be the set the variables were registered from.
///
/// # Example
///
/// ```
/// use gnn_core::{FactorGraph, ParamSet, StorageDevice, ValueKind};
/// use gnn_core::ops::ValueRef;
/// use gnn_core::tensor::DenseTensor;
///
/// let mut params = ParamSet::new(StorageDevice::Host);
/// let w = params.add("w", &[2, 1]).unwrap();
/// params.value_mut(&w).unwrap().fill(1.0);
///
/// let mut graph = FactorGraph::new(StorageDevice::Host);
/// let x = graph.add_constant("x", ValueKind::Dense, true).unwrap();
/// let w = graph.add_param(&params, &w).unwrap();
/// let y = graph.matmul(x, w).unwrap();
/// let loss = graph.reduce_mean(y).unwrap();
///
/// let batch = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2], StorageDevice::Host).unwrap();
/// graph.feed_forward(&params, &[loss], &[("x", ValueRef::Dense(&batch))]).unwrap();
/// assert_eq!(graph.as_scalar(loss).unwrap(), 5.0);
///
/// graph.back_propagate(&mut params, &[loss]).unwrap();
/// assert_eq!(params.get("w").unwrap().grad().to_vec(), vec![2.0, 3.0]);
/// ```
#[derive(Debug)]
pub struct FactorGraph {
    id: u64,
    device: StorageDevice,
    /// Identity of the parameter set the variable nodes point into.
    param_set: Option<u64>,
    nodes: Vec<Node>,
    values: Vec<NodeValue>,
    grads: Vec<DenseTensor<f32>>,
    /// Whether `grads[i]` holds a gradient from the current pass.
    has_grad: Vec<bool>,
    names: HashMap<String, usize>,
}

impl FactorGraph {
    /// Creates an empty graph evaluating on `device`.
    pub fn new(device: StorageDevice) -> Self {
        FactorGraph {
            id: fresh_identity(),
            device,
            param_set: None,
            nodes: Vec::new(),
            values: Vec::new(),
            grads: Vec::new(),
            has_grad: Vec::new(),
            names: HashMap::new(),
        }
    }

    pub fn device(&self) -> StorageDevice {
        self.device
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // --- Construction ---

    /// Registers a constant of `kind` whose shape is only known once bound.
    ///
    /// `is_input = true` marks a placeholder rebound on every step; otherwise
    /// the constant accepts a single binding.
    ///
    /// # Errors
    /// Returns `GnnError::DuplicateName` if `name` is taken.
    pub fn add_constant(&mut self, name: &str, kind: ValueKind, is_input: bool) -> Result<NodeId, GnnError> {
        self.add_constant_with_shape(name, kind, ShapeHint::Unknown, is_input)
    }

    /// Registers a constant with a declared (possibly partial) shape, checked on
    /// every binding.
    ///
    /// # Errors
    /// Returns `GnnError::DuplicateName` if `name` is taken.
    pub fn add_constant_with_shape(
        &mut self,
        name: &str,
        kind: ValueKind,
        shape: ShapeHint,
        is_input: bool,
    ) -> Result<NodeId, GnnError> {
        self.check_name(name)?;
        log::debug!(
            "FactorGraph: constant '{}' ({:?}, {:?}, input: {})",
            name,
            kind,
            shape,
            is_input
        );
        let node = Node {
            name: name.to_string(),
            kind: NodeKind::Constant {
                is_input,
                bound: false,
            },
            spec: TensorSpec::new(kind, shape),
            requires_grad: false,
            state: NodeState::Unevaluated,
        };
        let id = self.push(node);
        self.names.insert(name.to_string(), id.index);
        Ok(id)
    }

    /// Registers a variable node for `variable` of `params`.
    ///
    /// All variables of one graph must come from the same parameter set, which
    /// must live on the graph's device.
    ///
    /// # Errors
    /// - `GnnError::DuplicateName` if the variable's name is taken.
    /// - `GnnError::DeviceMismatch` if `params` lives on another device.
    /// - `GnnError::Dependency` if `variable` does not belong to `params`, or
    ///   `params` is not the set of the variables registered before.
    pub fn add_param(&mut self, params: &ParamSet, variable: &Variable) -> Result<NodeId, GnnError> {
        let param = params.index_of(variable)?;
        ensure_device(self.device, params.device(), "add_param")?;
        if self.param_set.map_or(false, |id| id != params.id()) {
            return Err(GnnError::Dependency {
                operator: "add_param".to_string(),
                node: variable.name().to_string(),
            });
        }
        self.check_name(variable.name())?;
        self.param_set = Some(params.id());

        let shape = params.value(variable)?.shape().to_vec();
        log::debug!("FactorGraph: variable '{}' {:?}", variable.name(), shape);
        let node = Node {
            name: variable.name().to_string(),
            kind: NodeKind::Param {
                variable: variable.clone(),
                param,
            },
            spec: TensorSpec::new(ValueKind::Dense, ShapeHint::known(&shape)),
            requires_grad: true,
            state: NodeState::Unevaluated,
        };
        let id = self.push(node);
        self.names.insert(variable.name().to_string(), id.index);
        Ok(id)
    }

    /// Appends an operator instance consuming `inputs`.
    ///
    /// # Errors
    /// - `GnnError::Dependency` if an input does not belong to this graph.
    /// - Any error of the operator's [`Operator::infer`] (shape or value kind).
    pub fn add_operator<O: Operator + 'static>(&mut self, op: O, inputs: &[NodeId]) -> Result<NodeId, GnnError> {
        self.add_boxed_operator(Box::new(op), inputs)
    }

    /// Same as [`FactorGraph::add_operator`] for an already boxed operator.
    pub fn add_boxed_operator(&mut self, op: Box<dyn Operator>, inputs: &[NodeId]) -> Result<NodeId, GnnError> {
        let inputs = inputs
            .iter()
            .map(|&node| self.resolve(node, op.name()))
            .collect::<Result<Vec<_>, _>>()?;
        let specs: Vec<TensorSpec> = inputs.iter().map(|&i| self.nodes[i].spec.clone()).collect();
        let spec = op.infer(&specs)?;
        let requires_grad = op.is_differentiable()
            && spec.kind == ValueKind::Dense
            && inputs.iter().any(|&i| self.nodes[i].requires_grad);
        let name = format!("{}_{}", op.name(), self.nodes.len());
        log::debug!(
            "FactorGraph: operator '{}' inputs {:?} -> {:?} (requires grad: {})",
            name,
            inputs,
            spec,
            requires_grad
        );
        Ok(self.push(Node {
            name,
            kind: NodeKind::Operator { op, inputs },
            spec,
            requires_grad,
            state: NodeState::Unevaluated,
        }))
    }

    // --- Execution ---

    /// Binds `bindings`, then evaluates the transitive dependencies of
    /// `targets` in insertion order.
    ///
    /// All node states are reset to `Unevaluated` first, so a failed call
    /// leaves nothing evaluated. Every binding is then checked against its
    /// constant's declared kind and shape (sparse tensors are also validated)
    /// before any of them is copied into the graph-owned buffer on the graph's
    /// device. Nodes the targets do not depend on stay `Unevaluated`.
    ///
    /// # Errors
    /// - `GnnError::UnknownPlaceholder` for a binding name that is not a constant.
    /// - `GnnError::ImmutableConstant` when rebinding a non-input constant.
    /// - `GnnError::DataTypeMismatch` / `GnnError::Shape` / `GnnError::InvalidSparse`
    ///   for a binding that does not fit its constant.
    /// - `GnnError::UnboundPlaceholder` if a needed constant was never bound.
    /// - `GnnError::Dependency` for foreign targets or a foreign parameter set.
    /// - Any error raised by an operator's forward rule.
    pub fn feed_forward(
        &mut self,
        params: &ParamSet,
        targets: &[NodeId],
        bindings: &[(&str, ValueRef<'_>)],
    ) -> Result<(), GnnError> {
        for node in &mut self.nodes {
            node.state = NodeState::Unevaluated;
        }
        self.has_grad.iter_mut().for_each(|h| *h = false);

        self.check_param_set(params)?;
        let targets = self.resolve_all(targets, "feed_forward")?;
        let mut slots: Vec<usize> = Vec::with_capacity(bindings.len());
        for &(name, value) in bindings {
            let index = self.check_binding(name, value)?;
            if slots.contains(&index) && !self.is_input(index) {
                return Err(GnnError::ImmutableConstant {
                    name: name.to_string(),
                });
            }
            slots.push(index);
        }
        for (&(name, value), index) in bindings.iter().zip(slots) {
            self.bind(index, name, value)?;
        }

        let needed = self.reachable(&targets, false);
        for index in 0..self.nodes.len() {
            if needed[index] {
                self.evaluate(index, params)?;
            }
        }
        Ok(())
    }

    /// Propagates gradients from `targets` back to every variable they depend on.
    ///
    /// Each target's gradient is seeded with ones; operators are then visited in
    /// reverse insertion order and add their contributions into their inputs'
    /// gradients. Finally each reached variable's gradient is added into the
    /// parameter set's accumulator. Targets that carry no gradient (outputs of
    /// non-differentiable operators, constants) contribute nothing.
    ///
    /// # Errors
    /// - `GnnError::NotEvaluated` if a target was not evaluated by the last
    ///   `feed_forward`.
    /// - `GnnError::Dependency` for foreign targets or a foreign parameter set.
    /// - Any error raised by an operator's backward rule.
    pub fn back_propagate(&mut self, params: &mut ParamSet, targets: &[NodeId]) -> Result<(), GnnError> {
        self.check_param_set(params)?;
        let targets = self.resolve_all(targets, "back_propagate")?;
        for &t in &targets {
            if self.nodes[t].state == NodeState::Unevaluated {
                return Err(GnnError::NotEvaluated {
                    node: self.nodes[t].name.clone(),
                    reason: "back_propagate needs the target evaluated by feed_forward".to_string(),
                });
            }
        }

        self.has_grad.iter_mut().for_each(|h| *h = false);
        let seeds: Vec<usize> = targets
            .into_iter()
            .filter(|&t| self.nodes[t].requires_grad)
            .collect();
        if seeds.is_empty() {
            log::debug!("FactorGraph: no differentiable target, nothing to propagate");
            return Ok(());
        }

        let backend = self.device.backend();
        for &t in &seeds {
            if self.has_grad[t] {
                continue;
            }
            let shape = value_ref(&self.nodes, &self.values, params, t).shape();
            backend.fill(1.0, self.grads[t].prepare_output(&shape));
            self.has_grad[t] = true;
            self.nodes[t].state = NodeState::GradientSeeded;
        }

        let reachable = self.reachable(&seeds, true);
        for index in (0..self.nodes.len()).rev() {
            if reachable[index] && self.has_grad[index] {
                self.propagate(index, params)?;
            }
        }
        Ok(())
    }

    /// Checks `value` against the constant `name` without touching any state
    /// and returns the constant's index.
    fn check_binding(&self, name: &str, value: ValueRef<'_>) -> Result<usize, GnnError> {
        let unknown = || GnnError::UnknownPlaceholder {
            name: name.to_string(),
        };
        let index = *self.names.get(name).ok_or_else(unknown)?;
        let node = &self.nodes[index];
        let &NodeKind::Constant { is_input, bound } = &node.kind else {
            return Err(unknown());
        };
        if !is_input && bound {
            return Err(GnnError::ImmutableConstant {
                name: name.to_string(),
            });
        }
        if value.kind() != node.spec.kind {
            return Err(GnnError::DataTypeMismatch {
                expected: node.spec.kind,
                actual: value.kind(),
                operation: format!("bind '{}'", name),
            });
        }
        let shape = value.shape();
        if !node.spec.shape.matches(&shape) {
            return Err(GnnError::Shape {
                expected: node.spec.shape.display_dims(),
                actual: shape,
                operation: format!("bind '{}'", name),
            });
        }
        if let ValueRef::Sparse(sparse) = value {
            sparse.validate()?;
        }
        Ok(index)
    }

    fn is_input(&self, index: usize) -> bool {
        matches!(self.nodes[index].kind, NodeKind::Constant { is_input: true, .. })
    }

    /// Copies an already checked binding into the constant at `index`.
    fn bind(&mut self, index: usize, name: &str, value: ValueRef<'_>) -> Result<(), GnnError> {
        self.values[index].copy_from(value)?;
        if let NodeKind::Constant { bound, .. } = &mut self.nodes[index].kind {
            *bound = true;
        }
        log::debug!(
            "FactorGraph: bound '{}' {:?} {:?} ({:?} -> {:?})",
            name,
            value.kind(),
            value.shape(),
            value.device(),
            self.device
        );
        Ok(())
    }

    fn evaluate(&mut self, index: usize, params: &ParamSet) -> Result<(), GnnError> {
        let (earlier, current) = self.nodes.split_at_mut(index);
        let node = &mut current[0];
        match &node.kind {
            NodeKind::Constant { bound, .. } => {
                if !bound {
                    return Err(GnnError::UnboundPlaceholder {
                        name: node.name.clone(),
                    });
                }
            }
            NodeKind::Param { .. } => {}
            NodeKind::Operator { op, inputs } => {
                let (before, rest) = self.values.split_at_mut(index);
                let refs = input_refs(earlier, before, params, inputs);
                log::trace!("FactorGraph: forward '{}'", node.name);
                op.forward(&refs, &mut rest[0], self.device)?;
            }
        }
        node.state = NodeState::Forwarded;
        Ok(())
    }

    fn propagate(&mut self, index: usize, params: &mut ParamSet) -> Result<(), GnnError> {
        let (earlier, current) = self.nodes.split_at_mut(index);
        let node = &mut current[0];
        match &node.kind {
            NodeKind::Operator { op, inputs } => {
                let refs = input_refs(earlier, &self.values[..index], params, inputs);
                let wants = inputs.iter().map(|&i| earlier[i].requires_grad).collect();
                let shapes = refs.iter().map(|r| r.shape()).collect();
                let (grads_before, grads_rest) = self.grads.split_at_mut(index);
                let mut sink = GradSink::new(
                    self.device,
                    grads_before,
                    &mut self.has_grad[..index],
                    inputs,
                    wants,
                    shapes,
                );
                log::trace!("FactorGraph: backward '{}'", node.name);
                op.backward(&refs, &self.values[index], &grads_rest[0], &mut sink)?;
            }
            NodeKind::Param { param, .. } => {
                params.accumulate_at(*param, &self.grads[index])?;
            }
            NodeKind::Constant { .. } => {}
        }
        node.state = NodeState::Backpropagated;
        Ok(())
    }

    // --- Inspection ---

    /// Looks up a constant or variable by name.
    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).map(|&index| self.handle(index))
    }

    /// # Errors
    /// Returns `GnnError::Dependency` for a foreign handle.
    pub fn name(&self, node: NodeId) -> Result<&str, GnnError> {
        let index = self.resolve(node, "name")?;
        Ok(&self.nodes[index].name)
    }

    /// # Errors
    /// Returns `GnnError::Dependency` for a foreign handle.
    pub fn state(&self, node: NodeId) -> Result<NodeState, GnnError> {
        let index = self.resolve(node, "state")?;
        Ok(self.nodes[index].state)
    }

    /// The static spec computed when the node was added.
    ///
    /// # Errors
    /// Returns `GnnError::Dependency` for a foreign handle.
    pub fn spec(&self, node: NodeId) -> Result<&TensorSpec, GnnError> {
        let index = self.resolve(node, "spec")?;
        Ok(&self.nodes[index].spec)
    }

    /// Whether gradients flow into this node.
    ///
    /// # Errors
    /// Returns `GnnError::Dependency` for a foreign handle.
    pub fn requires_grad(&self, node: NodeId) -> Result<bool, GnnError> {
        let index = self.resolve(node, "requires_grad")?;
        Ok(self.nodes[index].requires_grad)
    }

    /// The value computed (or bound) by the last `feed_forward`.
    ///
    /// # Errors
    /// - `GnnError::NotEvaluated` if the node was not evaluated, or is a
    ///   variable (whose value is read from the [`ParamSet`]).
    /// - `GnnError::Dependency` for a foreign handle.
    pub fn value(&self, node: NodeId) -> Result<ValueRef<'_>, GnnError> {
        let index = self.resolve(node, "value")?;
        let node = &self.nodes[index];
        if node.state == NodeState::Unevaluated {
            return Err(GnnError::NotEvaluated {
                node: node.name.clone(),
                reason: "not evaluated by the last feed_forward".to_string(),
            });
        }
        if let NodeKind::Param { variable, .. } = &node.kind {
            return Err(GnnError::NotEvaluated {
                node: node.name.clone(),
                reason: format!("variable '{}' is read through its ParamSet", variable.name()),
            });
        }
        Ok(self.values[index].as_ref())
    }

    /// The single element of a one-element node value, as `f32`.
    ///
    /// # Errors
    /// - `GnnError::Shape` unless the value has exactly one element.
    /// - `GnnError::DataTypeMismatch` for sparse values.
    /// - Same conditions as [`FactorGraph::value`].
    pub fn as_scalar(&self, node: NodeId) -> Result<f32, GnnError> {
        match self.value(node)? {
            ValueRef::Dense(t) => t.as_scalar(),
            ValueRef::Int(t) => Ok(t.as_scalar()? as f32),
            ValueRef::Sparse(_) => Err(GnnError::DataTypeMismatch {
                expected: ValueKind::Dense,
                actual: ValueKind::Sparse,
                operation: "as_scalar".to_string(),
            }),
        }
    }

    /// The gradient reaching `node` in the last `back_propagate`.
    ///
    /// # Errors
    /// - `GnnError::NotEvaluated` if no gradient reached the node.
    /// - `GnnError::Dependency` for a foreign handle.
    pub fn gradient(&self, node: NodeId) -> Result<&DenseTensor<f32>, GnnError> {
        let index = self.resolve(node, "gradient")?;
        if !self.has_grad[index] {
            return Err(GnnError::NotEvaluated {
                node: self.nodes[index].name.clone(),
                reason: "no gradient reached this node in the last back_propagate".to_string(),
            });
        }
        Ok(&self.grads[index])
    }

    // --- Internals ---

    fn push(&mut self, node: Node) -> NodeId {
        let index = self.nodes.len();
        self.values.push(NodeValue::empty(node.spec.kind, self.device));
        self.grads.push(DenseTensor::new(self.device));
        self.has_grad.push(false);
        self.nodes.push(node);
        self.handle(index)
    }

    fn handle(&self, index: usize) -> NodeId {
        NodeId {
            graph: self.id,
            index,
        }
    }

    fn check_name(&self, name: &str) -> Result<(), GnnError> {
        if self.names.contains_key(name) {
            return Err(GnnError::DuplicateName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn resolve(&self, node: NodeId, operator: &str) -> Result<usize, GnnError> {
        if node.graph != self.id || node.index >= self.nodes.len() {
            return Err(GnnError::Dependency {
                operator: operator.to_string(),
                node: node.to_string(),
            });
        }
        Ok(node.index)
    }

    fn resolve_all(&self, nodes: &[NodeId], operator: &str) -> Result<Vec<usize>, GnnError> {
        nodes.iter().map(|&n| self.resolve(n, operator)).collect()
    }

    fn check_param_set(&self, params: &ParamSet) -> Result<(), GnnError> {
        match self.param_set {
            Some(id) if id != params.id() => Err(GnnError::Dependency {
                operator: "ParamSet".to_string(),
                node: "parameter set is not the one this graph's variables belong to".to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Marks `targets` and their transitive inputs. With `grad_only`, the walk
    /// only follows nodes that carry a gradient.
    fn reachable(&self, targets: &[usize], grad_only: bool) -> Vec<bool> {
        let mut marked = vec![false; self.nodes.len()];
        let mut stack: Vec<usize> = targets.to_vec();
        while let Some(index) = stack.pop() {
            if marked[index] || (grad_only && !self.nodes[index].requires_grad) {
                continue;
            }
            marked[index] = true;
            stack.extend(self.nodes[index].inputs().iter().copied());
        }
        marked
    }
}

/// Operator inputs, resolving variable nodes through the parameter set.
fn input_refs<'a>(nodes: &'a [Node], values: &'a [NodeValue], params: &'a ParamSet, inputs: &[usize]) -> Vec<ValueRef<'a>> {
    inputs
        .iter()
        .map(|&i| value_ref(nodes, values, params, i))
        .collect()
}

fn value_ref<'a>(nodes: &'a [Node], values: &'a [NodeValue], params: &'a ParamSet, index: usize) -> ValueRef<'a> {
    match &nodes[index].kind {
        NodeKind::Param { param, .. } => ValueRef::Dense(params.value_at(*param)),
        _ => values[index].as_ref(),
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
