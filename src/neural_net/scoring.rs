use std::cmp::Ordering;

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{errors::EvolveError, nets::Network};


/// One named input pattern, e.g. a flattened 2x3 pixel grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub name: String,
    pub values: Vec<f64>,
}

impl Pattern {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self { name: name.into(), values }
    }
}


/// Validated training data: a rectangular set of patterns plus one signed multiplier per
/// pattern (positive for patterns to recognise, negative for patterns to reject).
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingSet {
    patterns: Vec<Pattern>,
    multipliers: Vec<f64>,
}

impl TrainingSet {
    /// A single multiplier for several patterns means "the first pattern is the one to
    /// recognise"; every other pattern then gets a multiplier of -1.  Otherwise there must be
    /// exactly one multiplier per pattern.
    pub fn new(patterns: Vec<Pattern>, mut multipliers: Vec<f64>) -> Result<Self, EvolveError> {
        let first = patterns.first().ok_or(EvolveError::EmptyTrainingData)?;
        let width = first.values.len();
        if width == 0 {
            return Err(EvolveError::EmptyPattern { name: first.name.clone() });
        }
        if let Some(ragged) = patterns.iter().find(|p| p.values.len() != width) {
            return Err(EvolveError::RaggedPattern { name: ragged.name.clone(), expected: width, found: ragged.values.len() });
        }

        if multipliers.len() == 1 && patterns.len() != 1 {
            multipliers.resize(patterns.len(), -1.0);
        } else if multipliers.len() != patterns.len() {
            return Err(EvolveError::MultiplierMismatch { patterns: patterns.len(), multipliers: multipliers.len() });
        }
        Ok(Self { patterns, multipliers })
    }

    pub fn patterns(&self) -> &[Pattern] { &self.patterns }
    pub fn multipliers(&self) -> &[f64] { &self.multipliers }

    /// Length of every pattern, and so the input count of every network trained on this set.
    pub fn input_count(&self) -> usize {
        self.patterns[0].values.len()
    }

    /// Sum over patterns of output times multiplier, divided by the network's complexity.
    /// A NaN result (e.g. from `inf - inf`) scores as negative infinity so ranking stays total.
    pub fn score(&self, net: &Network) -> f64 {
        let order = net.evaluation_order();
        let result: f64 = self.patterns.iter().zip(self.multipliers.iter())
            .map(|(pattern, multiplier)| net.forward(&order, &pattern.values) * multiplier)
            .sum();
        let score = result / net.complexity();
        if score.is_nan() { f64::NEG_INFINITY } else { score }
    }
}


/// Scores for one generation, indexed by population position.
#[derive(Clone, Debug, PartialEq)]
pub struct Scores {
    pub shared_weight: f64,
    pub by_index: Vec<f64>,
}

impl Scores {
    pub fn sum(&self) -> f64 {
        self.by_index.iter().sum()
    }

    /// Population positions sorted by descending score.  The sort is stable, so ties keep
    /// population order.
    pub fn ranking(&self) -> Vec<usize> {
        let mut ranking: Vec<usize> = (0..self.by_index.len()).collect();
        ranking.sort_by(|&a, &b| Ordering::reverse(self.by_index[a].total_cmp(&self.by_index[b])));
        ranking
    }
}


/// Draws one shared weight from `weight_range`, sets it on every network and scores them all
/// against `training`.  The weight is drawn before the parallel section, so the result does not
/// depend on how rayon schedules the work.
pub fn score_population(
    population: &mut [Network],
    training: &TrainingSet,
    weight_range: std::ops::Range<f64>,
    rng: &mut impl Rng,
) -> Scores {
    let shared_weight = rng.gen_range(weight_range);
    let by_index = population.par_iter_mut()
        .map(|net| {
            net.check_input_neurons();
            net.set_weight(shared_weight);
            training.score(net)
        })
        .collect();
    Scores { shared_weight, by_index }
}
