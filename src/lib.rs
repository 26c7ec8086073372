//! Weight-agnostic neuroevolution: evolves the topology of small feed-forward networks, scoring
//! every network under one shared weight per generation and penalising size.

pub mod cmdline;
pub mod neural_net;
pub mod shapes;

pub use neural_net::{
    activation_functions::ActivationFunction,
    errors::{EvolveError, NetError},
    mutations::{Mutation, MutationOutcome, RetryBudget},
    nets::Network,
    nodes::{NetId, Neuron, NeuronIndex},
    populations::{Config, Evolution, GenerationStats, Population},
    scoring::{Pattern, TrainingSet},
};
