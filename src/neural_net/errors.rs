use thiserror::Error;

use super::nodes::NeuronIndex;


/// Structural and evaluation errors raised by a single [`Network`](super::nets::Network).
///
/// Most of these are expected while mutating: random node pairs are usually
/// not a valid edit, and the mutation engine retries until one is.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("neuron index {index} is out of range (network has {len} neurons)")]
    NodeOutOfRange { index: NeuronIndex, len: usize },

    #[error("no edge {from} -> {to} to insert a neuron into")]
    EdgeNotFound { from: NeuronIndex, to: NeuronIndex },

    #[error("cannot connect neuron {0} to itself")]
    SelfConnection(NeuronIndex),

    #[error("edge {from} -> {to} already exists")]
    ConnectionExists { from: NeuronIndex, to: NeuronIndex },

    #[error("edge {from} -> {to} would create a cycle")]
    WouldCreateCycle { from: NeuronIndex, to: NeuronIndex },

    #[error("neuron {0} is an input neuron and accepts no incoming edges")]
    TargetIsInput(NeuronIndex),

    #[error("neuron {0} is already wired into the network")]
    NotFresh(NeuronIndex),

    #[error("network has no neuron whose activation function can change")]
    NoEligibleNeuron,

    #[error("expected {expected} input values, got {found}")]
    InputLengthMismatch { expected: usize, found: usize },

    #[error("loaded network is invalid: {0}")]
    InvalidGraph(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors reported by [`Config::evolve`](super::populations::Config::evolve)
/// before any population work begins.
#[derive(Debug, Error)]
pub enum EvolveError {
    #[error("no input data")]
    EmptyTrainingData,

    #[error("pattern {name:?} has no values")]
    EmptyPattern { name: String },

    #[error("pattern {name:?} has {found} values, expected {expected}")]
    RaggedPattern { name: String, expected: usize, found: usize },

    #[error("the length of the input data ({patterns}) and the slice of output multipliers ({multipliers}) differs")]
    MultiplierMismatch { patterns: usize, multipliers: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
