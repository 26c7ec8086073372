use std::{fmt, sync::atomic::{AtomicUsize, Ordering}};

use serde::{Deserialize, Serialize};

use super::activation_functions::ActivationFunction;



static NET_ID_NEXT: AtomicUsize = AtomicUsize::new(1);

/// The NetId uniquely identifies an instance of a Network.  Every Neuron is stamped with the
/// NetId of the Network that owns it, so a neuron that leaked from another network (or a copy
/// that was not re-stamped) is caught by `Network::check_input_neurons()`.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct NetId(usize);

impl NetId {
    pub fn new_unique() -> NetId {
        NetId(NET_ID_NEXT.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for NetId {
    fn default() -> Self { Self::new_unique() }
}

impl fmt::Display for NetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NetId({})", self.0)
    }
}
impl fmt::Debug for NetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NetId({})", self.0)
    }
}


/// Position of a neuron inside its owning network's node store.
pub type NeuronIndex = usize;


#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Neuron {
    pub index: NeuronIndex,
    pub activation_function: ActivationFunction,
    /// Edges pointing into this neuron, by source index.  Order only affects summation order.
    pub(super) input_neurons: Vec<NeuronIndex>,
    #[serde(skip)]
    pub(super) net: NetId,
}

impl Neuron {
    pub(super) fn new(net: NetId, index: NeuronIndex, activation_function: ActivationFunction) -> Self {
        Self {
            index,
            activation_function,
            input_neurons: Vec::new(),
            net,
        }
    }

    pub fn input_neurons(&self) -> &[NeuronIndex] {
        &self.input_neurons
    }

    pub fn has_input(&self, index: NeuronIndex) -> bool {
        self.input_neurons.contains(&index)
    }

    pub fn apply_activation_function(&self, input_sum: f64) -> f64 {
        self.activation_function.apply(input_sum)
    }

    /// Panics if any input index points outside a network of `node_count` neurons, or if the
    /// neuron is not stamped with `owner`.  Either means an edit primitive broke an invariant.
    pub(super) fn check_input_neurons(&self, owner: NetId, node_count: usize) {
        assert_eq!(self.net, owner,
            "implementation error: neuron {} belongs to {} but is stored in {}", self.index, self.net, owner);
        for &input_index in self.input_neurons.iter() {
            assert!(input_index < node_count,
                "implementation error: input neuron index is pointing out of bounds: at {} which has input index {}",
                self.index, input_index);
        }
    }
}

impl PartialEq for Neuron {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.activation_function == other.activation_function
            && self.input_neurons == other.input_neurons
    }
}
