use std::{fmt, fs::File, io::{BufReader, BufWriter}, path::Path};

use log::trace;
use rand::{seq::index::sample, Rng};
use serde::{Deserialize, Serialize};

use super::{
    activation_functions::ActivationFunction,
    errors::NetError,
    nodes::{NetId, Neuron, NeuronIndex},
};



/// A feed-forward network stored as an arena of neurons.  Edges are kept on the receiving
/// neuron as a list of source indices, so a deep copy is a plain clone of the arena.
///
/// Layout of the arena: indices `0..inputs` are the input neurons, index `inputs` is the
/// output neuron, and every neuron added by mutation is appended after it.
#[derive(Debug, Serialize, Deserialize)]
#[serde(try_from = "StoredNetwork")]
pub struct Network {
    #[serde(skip)]
    id: NetId,
    nodes: Vec<Neuron>,
    inputs: usize,
    output_node: NeuronIndex,
    /// The shared weight, applied to every edge during `evaluate()`.
    weight: f64,
}

impl Network {
    /// Creates `input_count` input neurons and one output neuron, then wires a random subset of
    /// the inputs (`connection_ratio` of them, but at least one) directly into the output.
    pub fn new(input_count: usize, connection_ratio: f64, rng: &mut impl Rng) -> Self {
        let id = NetId::new_unique();
        let mut nodes = Vec::<Neuron>::with_capacity(input_count + 1);
        for index in 0..input_count {
            nodes.push(Neuron::new(id, index, ActivationFunction::Linear));
        }
        nodes.push(Neuron::new(id, input_count, ActivationFunction::choose_random(rng)));

        let mut net = Self {
            id,
            nodes,
            inputs: input_count,
            output_node: input_count,
            weight: 1.0,
        };

        if input_count > 0 {
            let edge_count = ((input_count as f64 * connection_ratio).round() as usize).clamp(1, input_count);
            for input_index in sample(rng, input_count, edge_count) {
                net.nodes[net.output_node].input_neurons.push(input_index);
            }
        }
        net.check_input_neurons();
        net
    }

    pub fn id(&self) -> NetId { self.id }
    pub fn inputs(&self) -> usize { self.inputs }
    pub fn output_node(&self) -> NeuronIndex { self.output_node }
    pub fn len(&self) -> usize { self.nodes.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }
    pub fn nodes(&self) -> &[Neuron] { &self.nodes }
    pub fn weight(&self) -> f64 { self.weight }

    pub fn neuron(&self, index: NeuronIndex) -> Option<&Neuron> {
        self.nodes.get(index)
    }

    /// Sets the shared weight used by every edge for subsequent `evaluate()` calls.
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub fn has_edge(&self, from: NeuronIndex, to: NeuronIndex) -> bool {
        self.nodes.get(to).is_some_and(|n| n.has_input(from))
    }

    pub fn connection_count(&self) -> usize {
        self.nodes.iter().map(|n| n.input_neurons.len()).sum()
    }

    /// Neuron count plus edge count.  Never zero, since the output neuron always exists.
    pub fn complexity(&self) -> f64 {
        (self.nodes.len() + self.connection_count()) as f64
    }

    pub fn get_random_node(&self, rng: &mut impl Rng) -> NeuronIndex {
        rng.gen_range(0..self.nodes.len())
    }

    /// Panics if the network has no input neurons.
    pub fn get_random_input_node(&self, rng: &mut impl Rng) -> NeuronIndex {
        rng.gen_range(0..self.inputs)
    }

    /// Appends an unconnected neuron with a random activation function.  Wiring it in is up to
    /// the caller.
    pub fn new_neuron(&mut self, rng: &mut impl Rng) -> NeuronIndex {
        let index = self.nodes.len();
        self.nodes.push(Neuron::new(self.id, index, ActivationFunction::choose_random(rng)));
        index
    }

    fn check_index(&self, index: NeuronIndex) -> Result<(), NetError> {
        if index < self.nodes.len() {
            Ok(())
        } else {
            Err(NetError::NodeOutOfRange { index, len: self.nodes.len() })
        }
    }

    fn is_fresh(&self, index: NeuronIndex) -> bool {
        index >= self.inputs
            && index != self.output_node
            && self.nodes[index].input_neurons.is_empty()
            && !self.nodes.iter().any(|n| n.has_input(index))
    }

    /// Splits the existing edge `a -> b` into `a -> new_index -> b`.  The new neuron takes the
    /// old edge's place in `b`'s input list, so summation order is kept.
    pub fn insert_node(&mut self, a: NeuronIndex, b: NeuronIndex, new_index: NeuronIndex) -> Result<(), NetError> {
        self.check_index(a)?;
        self.check_index(b)?;
        self.check_index(new_index)?;
        if new_index == a || new_index == b || !self.is_fresh(new_index) {
            return Err(NetError::NotFresh(new_index));
        }
        let position = self.nodes[b].input_neurons.iter()
            .position(|&i| i == a)
            .ok_or(NetError::EdgeNotFound { from: a, to: b })?;

        self.nodes[b].input_neurons[position] = new_index;
        self.nodes[new_index].input_neurons.push(a);
        Ok(())
    }

    /// Adds the edge `a -> b`.  Leaves the network untouched on error.
    pub fn add_connection(&mut self, a: NeuronIndex, b: NeuronIndex) -> Result<(), NetError> {
        self.check_index(a)?;
        self.check_index(b)?;
        if a == b {
            return Err(NetError::SelfConnection(a));
        }
        if b < self.inputs {
            return Err(NetError::TargetIsInput(b));
        }
        if self.has_edge(a, b) {
            return Err(NetError::ConnectionExists { from: a, to: b });
        }
        if self.depends_on(a, b) {
            return Err(NetError::WouldCreateCycle { from: a, to: b });
        }
        self.nodes[b].input_neurons.push(a);
        Ok(())
    }

    /// True when `ancestor` feeds into `node` through one or more edges, i.e. there is a path
    /// `ancestor -> ... -> node`.
    pub fn depends_on(&self, node: NeuronIndex, ancestor: NeuronIndex) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current == ancestor { return true; }
            if visited[current] { continue; }
            visited[current] = true;
            stack.extend(self.nodes[current].input_neurons.iter().filter(|&&i| !visited[i]));
        }
        false
    }

    pub fn randomize_activation_function_for_random_neuron(&mut self, rng: &mut impl Rng) -> Result<NeuronIndex, NetError> {
        if self.nodes.len() <= self.inputs {
            return Err(NetError::NoEligibleNeuron);
        }
        let index = rng.gen_range(self.inputs..self.nodes.len());
        let neuron = &mut self.nodes[index];
        neuron.activation_function = ActivationFunction::choose_random(rng);
        trace!("neuron {index} now uses {:?}", neuron.activation_function);
        Ok(index)
    }

    // We figure out the order to compute the output node by recursively seeking the values of
    // all its required inputs.  Neurons that don't (eventually) connect to the output are
    // skipped entirely.
    pub fn evaluation_order(&self) -> Vec<NeuronIndex> {
        let mut node_has_been_ordered = vec![false; self.nodes.len()];
        let mut node_order_list = Vec::<NeuronIndex>::with_capacity(self.nodes.len());
        self.evaluation_order_recurse(&mut node_order_list, &mut node_has_been_ordered, self.output_node);
        node_order_list
    }

    fn evaluation_order_recurse(&self, node_order_list: &mut Vec<NeuronIndex>, node_has_been_ordered: &mut [bool], index: NeuronIndex) {
        if node_has_been_ordered[index] { return; }
        for &input_index in self.nodes[index].input_neurons.iter() {
            self.evaluation_order_recurse(node_order_list, node_has_been_ordered, input_index);
        }
        node_order_list.push(index);
        node_has_been_ordered[index] = true;
    }

    /// Feeds `input` through the network with the current shared weight and returns the value
    /// of the output neuron.
    pub fn evaluate(&self, input: &[f64]) -> Result<f64, NetError> {
        if input.len() != self.inputs {
            return Err(NetError::InputLengthMismatch { expected: self.inputs, found: input.len() });
        }
        Ok(self.forward(&self.evaluation_order(), input))
    }

    /// `evaluate()` without the length check, replaying an `order` taken from
    /// `evaluation_order()` since the last structural change.  Callers guarantee
    /// `input.len() == self.inputs`.
    pub(crate) fn forward(&self, order: &[NeuronIndex], input: &[f64]) -> f64 {
        let mut values = vec![0.0_f64; self.nodes.len()];
        values[..self.inputs].copy_from_slice(input);

        // Every neuron's inputs come before it in the order, so one linear pass is enough.
        for &index in order {
            if index < self.inputs { continue; }
            let neuron = &self.nodes[index];
            let mut inputs_sum = 0.0_f64;
            for &input_index in neuron.input_neurons.iter() {
                inputs_sum += values[input_index] * self.weight;
            }
            values[index] = neuron.apply_activation_function(inputs_sum);
        }
        values[self.output_node]
    }

    /// Longest chain of edges ending in the output neuron.
    pub fn depth(&self) -> usize {
        let mut depths = vec![0_usize; self.nodes.len()];
        for index in self.evaluation_order() {
            depths[index] = self.nodes[index].input_neurons.iter()
                .map(|&i| depths[i] + 1)
                .max()
                .unwrap_or(0);
        }
        depths[self.output_node]
    }

    /// Panics when any neuron refers to an index outside the arena, sits at the wrong
    /// position, or belongs to another network.  This is an internal consistency check: a
    /// failure means one of the edit primitives broke the graph.
    pub fn check_input_neurons(&self) {
        for (position, neuron) in self.nodes.iter().enumerate() {
            assert_eq!(position, neuron.index,
                "implementation error: neuron stored at {position} claims index {}", neuron.index);
            neuron.check_input_neurons(self.id, self.nodes.len());
        }
    }

    fn restamp(&mut self) {
        let id = self.id;
        for neuron in self.nodes.iter_mut() {
            neuron.net = id;
        }
    }

    /// Full structural validation, used when a network comes from outside (e.g. a JSON file).
    fn validate(&self) -> Result<(), NetError> {
        let invalid = |msg: String| Err(NetError::InvalidGraph(msg));
        let len = self.nodes.len();
        if self.output_node != self.inputs || self.output_node >= len {
            return invalid(format!("output neuron {} must directly follow the {} inputs", self.output_node, self.inputs));
        }
        for (position, neuron) in self.nodes.iter().enumerate() {
            if neuron.index != position {
                return invalid(format!("neuron stored at {position} claims index {}", neuron.index));
            }
            if position < self.inputs && !neuron.input_neurons.is_empty() {
                return invalid(format!("input neuron {position} has incoming edges"));
            }
            for (i, &source) in neuron.input_neurons.iter().enumerate() {
                if source >= len {
                    return invalid(format!("neuron {position} has input index {source} out of bounds"));
                }
                if source == position || neuron.input_neurons[..i].contains(&source) {
                    return invalid(format!("neuron {position} has a self or duplicate edge from {source}"));
                }
            }
        }

        // Kahn's algorithm: every neuron must be removable in some order.
        let mut outgoing = vec![Vec::<NeuronIndex>::new(); len];
        let mut pending: Vec<usize> = self.nodes.iter().map(|n| n.input_neurons.len()).collect();
        for neuron in self.nodes.iter() {
            for &source in neuron.input_neurons.iter() {
                outgoing[source].push(neuron.index);
            }
        }
        let mut ready: Vec<NeuronIndex> = (0..len).filter(|&i| pending[i] == 0).collect();
        let mut removed = 0;
        while let Some(index) = ready.pop() {
            removed += 1;
            for &target in outgoing[index].iter() {
                pending[target] -= 1;
                if pending[target] == 0 { ready.push(target); }
            }
        }
        if removed != len {
            return invalid("graph contains a cycle".to_string());
        }
        Ok(())
    }

    /// Serializes the network to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), NetError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes and validates a network from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Network, NetError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl Clone for Network {
    /// Deep copy with a fresh NetId; the copy shares no storage with the original.
    fn clone(&self) -> Self {
        let mut copy = Self {
            id: NetId::new_unique(),
            nodes: self.nodes.clone(),
            inputs: self.inputs,
            output_node: self.output_node,
            weight: self.weight,
        };
        copy.restamp();
        copy
    }
}

impl PartialEq for Network {
    /// Structural equality; the NetId is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.inputs == other.inputs
            && self.output_node == other.output_node
            && self.weight == other.weight
            && self.nodes == other.nodes
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Network {} ({} inputs, output n{}, weight {})", self.id, self.inputs, self.output_node, self.weight)?;
        for neuron in self.nodes.iter().skip(self.inputs) {
            let sources: Vec<String> = neuron.input_neurons.iter().map(|i| format!("n{i}")).collect();
            writeln!(f, "  n{} {:?} <- [{}]", neuron.index, neuron.activation_function, sources.join(", "))?;
        }
        Ok(())
    }
}


#[derive(Deserialize)]
struct StoredNetwork {
    nodes: Vec<Neuron>,
    inputs: usize,
    output_node: NeuronIndex,
    weight: f64,
}

impl TryFrom<StoredNetwork> for Network {
    type Error = NetError;

    fn try_from(stored: StoredNetwork) -> Result<Self, Self::Error> {
        let mut net = Network {
            id: NetId::new_unique(),
            nodes: stored.nodes,
            inputs: stored.inputs,
            output_node: stored.output_node,
            weight: stored.weight,
        };
        net.validate()?;
        net.restamp();
        Ok(net)
    }
}
