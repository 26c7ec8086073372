use log::{trace, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{errors::NetError, nets::Network, nodes::NeuronIndex};


/// Hard stop for `RetryBudget::Unlimited`, so a saturated network can never hang the search.
pub const UNLIMITED_RETRY_CEILING: usize = 1_000_000;

/// How many random node pairs a structural mutation may try before giving up.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum RetryBudget {
    /// At most this many attempts; `Limited(0)` goes straight to the fallback.
    Limited(usize),
    /// Keep trying, up to `UNLIMITED_RETRY_CEILING` attempts.
    Unlimited,
}

impl RetryBudget {
    pub fn attempts(self) -> usize {
        match self {
            RetryBudget::Limited(n) => n,
            RetryBudget::Unlimited  => UNLIMITED_RETRY_CEILING,
        }
    }
}

impl Default for RetryBudget {
    fn default() -> Self { RetryBudget::Limited(100) }
}


#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Mutation {
    InsertNode,
    AddConnection,
    MutateActivation,
}

/// What a call to `Network::modify` actually did.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MutationOutcome {
    /// A neuron was spliced into the edge `from -> to`.
    InsertedNode { from: NeuronIndex, to: NeuronIndex, node: NeuronIndex, fallback: bool },
    AddedConnection { from: NeuronIndex, to: NeuronIndex },
    /// Every attempt was rejected; the network is unchanged.
    ConnectionsSaturated,
    ChangedActivation { node: NeuronIndex },
    /// Nothing to change: the network has no non-input neuron.
    Unchanged,
}

impl Mutation {
    pub const ALL: [Mutation; 3] = [Mutation::InsertNode, Mutation::AddConnection, Mutation::MutateActivation];

    pub fn choose_random(rng: &mut impl Rng) -> Self {
        match rng.gen_range(0..3) {
            0 => Mutation::InsertNode,
            1 => Mutation::AddConnection,
            2 => Mutation::MutateActivation,
            method => panic!("implementation error: invalid method number: {method}"),
        }
    }
}


impl Network {
    /// Applies exactly one structural mutation, chosen uniformly at random.
    pub fn modify(&mut self, budget: RetryBudget, rng: &mut impl Rng) -> MutationOutcome {
        let mutation = Mutation::choose_random(rng);
        let outcome = self.apply_mutation(mutation, budget, rng);
        self.check_input_neurons();
        outcome
    }

    pub fn apply_mutation(&mut self, mutation: Mutation, budget: RetryBudget, rng: &mut impl Rng) -> MutationOutcome {
        match mutation {
            Mutation::InsertNode       => self.mutate_insert_node(budget, rng),
            Mutation::AddConnection    => self.mutate_add_connection(budget, rng),
            Mutation::MutateActivation => match self.randomize_activation_function_for_random_neuron(rng) {
                Ok(node) => MutationOutcome::ChangedActivation { node },
                Err(_)   => MutationOutcome::Unchanged,
            },
        }
    }

    fn mutate_insert_node(&mut self, budget: RetryBudget, rng: &mut impl Rng) -> MutationOutcome {
        // Pick the pair before allocating, so the new neuron is never one of its own endpoints.
        let (mut node_a, mut node_b) = (self.get_random_node(rng), self.get_random_node(rng));
        let new_node = self.new_neuron(rng);

        for attempt in 0..budget.attempts() {
            match self.insert_node(node_a, node_b, new_node) {
                Ok(()) => return MutationOutcome::InsertedNode { from: node_a, to: node_b, node: new_node, fallback: false },
                Err(e) => trace!("insert node attempt {attempt}: {e}"),
            }
            node_a = rng.gen_range(0..new_node);
            node_b = rng.gen_range(0..new_node);
        }
        if budget == RetryBudget::Unlimited {
            warn!("insert node gave up after {UNLIMITED_RETRY_CEILING} attempts");
        }

        let (from, to) = self.insert_node_fallback(new_node, rng)
            .unwrap_or_else(|e| panic!("implementation error: could not insert a new neuron between an input and the output: {e}"));
        MutationOutcome::InsertedNode { from, to, node: new_node, fallback: true }
    }

    /// Splits the edge from a random input neuron to the output neuron, creating that edge
    /// first if the input isn't wired to the output directly.
    fn insert_node_fallback(&mut self, new_node: NeuronIndex, rng: &mut impl Rng) -> Result<(NeuronIndex, NeuronIndex), NetError> {
        let input = self.get_random_input_node(rng);
        let output = self.output_node();
        if !self.has_edge(input, output) {
            self.add_connection(input, output)?;
        }
        self.insert_node(input, output, new_node)?;
        trace!("inserted neuron {new_node} between input {input} and the output");
        Ok((input, output))
    }

    fn mutate_add_connection(&mut self, budget: RetryBudget, rng: &mut impl Rng) -> MutationOutcome {
        for attempt in 0..budget.attempts() {
            let (node_a, node_b) = (self.get_random_node(rng), self.get_random_node(rng));
            match self.add_connection(node_a, node_b) {
                Ok(()) => return MutationOutcome::AddedConnection { from: node_a, to: node_b },
                Err(e) => trace!("add connection attempt {attempt}: {e}"),
            }
        }
        // The possibilities for connections might be saturated.
        MutationOutcome::ConnectionsSaturated
    }
}



#[cfg(test)]
mod tests {
    use rand::{rngs::mock::StepRng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_budget_attempts() {
        assert_eq!(RetryBudget::Limited(0).attempts(), 0);
        assert_eq!(RetryBudget::Limited(100).attempts(), 100);
        assert_eq!(RetryBudget::Unlimited.attempts(), UNLIMITED_RETRY_CEILING);
        assert_eq!(RetryBudget::default(), RetryBudget::Limited(100));
    }

    #[test]
    fn test_choose_covers_all_mutations() {
        let mut rng = test_rng();
        let mut found = [false; 3];
        for _ in 0..300 {
            let chosen = Mutation::choose_random(&mut rng);
            let i = Mutation::ALL.iter().position(|&m| m == chosen).unwrap();
            found[i] = true;
        }
        assert!(found.iter().all(|&b| b));
    }

    #[test]
    fn test_insert_node_adds_exactly_one_neuron() {
        let mut rng = test_rng();
        let mut net = Network::new(4, 0.5, &mut rng);
        for _ in 0..30 {
            let len = net.len();
            let outcome = net.apply_mutation(Mutation::InsertNode, RetryBudget::Limited(100), &mut rng);
            assert_eq!(net.len(), len + 1);
            match outcome {
                MutationOutcome::InsertedNode { from, to, node, .. } => {
                    assert!(net.has_edge(from, node));
                    assert!(net.has_edge(node, to));
                    assert!(!net.has_edge(from, to));
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }
    }

    #[test]
    fn test_insert_node_fallback_with_zero_budget() {
        let mut rng = test_rng();
        let mut net = Network::new(3, 0.0, &mut rng);
        // Only one input is wired to the output, so the fallback may have to add the edge first.
        for _ in 0..10 {
            let outcome = net.apply_mutation(Mutation::InsertNode, RetryBudget::Limited(0), &mut rng);
            assert!(matches!(outcome, MutationOutcome::InsertedNode { fallback: true, to: 3, .. }));
            net.check_input_neurons();
        }
        assert_eq!(net.len(), 14);
    }

    #[test]
    fn test_add_connection_saturates_without_change() {
        let mut rng = test_rng();
        // Every input already feeds the output and there are no hidden neurons.
        let mut net = Network::new(3, 1.0, &mut rng);
        let snapshot = net.clone();
        let outcome = net.apply_mutation(Mutation::AddConnection, RetryBudget::Limited(50), &mut rng);
        assert_eq!(outcome, MutationOutcome::ConnectionsSaturated);
        assert_eq!(net, snapshot);
    }

    #[test]
    fn test_add_connection_finds_a_valid_pair() {
        let mut rng = test_rng();
        let mut net = Network::new(3, 0.0, &mut rng);
        let edges = net.connection_count();
        let outcome = net.apply_mutation(Mutation::AddConnection, RetryBudget::Unlimited, &mut rng);
        assert!(matches!(outcome, MutationOutcome::AddedConnection { to: 3, .. }));
        assert_eq!(net.connection_count(), edges + 1);
    }

    #[test]
    fn test_mutate_activation_only_touches_non_inputs() {
        let mut rng = test_rng();
        let mut net = Network::new(3, 1.0, &mut rng);
        let outcome = net.apply_mutation(Mutation::MutateActivation, RetryBudget::default(), &mut rng);
        assert_eq!(outcome, MutationOutcome::ChangedActivation { node: 3 });
    }

    #[test]
    fn test_modify_keeps_graph_valid() {
        let mut rng = test_rng();
        let mut net = Network::new(6, 0.05, &mut rng);
        for _ in 0..300 {
            let complexity = net.complexity();
            net.modify(RetryBudget::Limited(100), &mut rng);
            assert!(net.complexity() >= complexity);
            net.set_weight(0.5);
            assert!(net.evaluate(&[1.0; 6]).is_ok());
        }
        net.check_input_neurons();
    }

    #[test]
    fn test_scripted_rng_picks_insert_node() {
        // A zero step mock always draws the lowest value: method 0 and node 0 everywhere.
        let mut rng = StepRng::new(0, 0);
        let mut net = Network::new(2, 1.0, &mut test_rng());
        let outcome = net.modify(RetryBudget::Limited(3), &mut rng);
        assert!(matches!(outcome, MutationOutcome::InsertedNode { from: 0, to: 2, fallback: true, .. }));
    }
}
