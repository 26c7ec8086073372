use chrono::Utc;
use log::{debug, info, trace};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::{
    errors::EvolveError,
    mutations::RetryBudget,
    nets::Network,
    scoring::{score_population, Pattern, Scores, TrainingSet},
};


/// Parameters for one evolution run.  The input count is not configurable: it comes from the
/// shape of the training patterns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub population_size: usize,
    pub generations: usize,
    /// Fraction of input neurons wired to the output in a fresh network.
    pub initial_connection_ratio: f64,
    /// Log per-generation statistics at info level instead of debug.
    pub verbose: bool,
    /// Retry budget handed to `Network::modify` when breeding replacements.
    pub mutation_retries: RetryBudget,
    /// The shared weight is drawn uniformly from `[min, max)`.
    pub shared_weight_range: (f64, f64),
    /// Seed for the run's random number generator; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 1000,
            initial_connection_ratio: 0.05,
            verbose: false,
            mutation_retries: RetryBudget::default(),
            shared_weight_range: (0.0, 1.0),
            seed: None,
        }
    }
}


/// Best/average/worst score of one generation, plus how many generations in a row each has
/// failed to improve.  The counters are informational; they never stop the run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// 0-based generation number.
    pub generation: usize,
    pub shared_weight: f64,
    pub best_score: f64,
    pub average_score: f64,
    pub worst_score: f64,
    pub best_stagnation: usize,
    pub average_stagnation: usize,
    pub worst_stagnation: usize,
    /// Wall-clock time spent on this generation, in milliseconds.
    pub elapsed_ms: u64,
}

impl GenerationStats {
    fn from_scores(generation: usize, scores: &Scores, ranking: &[usize], previous: Option<&GenerationStats>) -> Self {
        let best_score  = scores.by_index[ranking[0]];
        let worst_score = scores.by_index[ranking[ranking.len() - 1]];
        let average_score = scores.sum() / scores.by_index.len() as f64;

        let stagnation = |current: f64, last: Option<(f64, usize)>| match last {
            Some((last, count)) if current <= last => count + 1,
            _ => 0,
        };
        Self {
            generation,
            shared_weight: scores.shared_weight,
            best_score,
            average_score,
            worst_score,
            best_stagnation:    stagnation(best_score,    previous.map(|p| (p.best_score,    p.best_stagnation))),
            average_stagnation: stagnation(average_score, previous.map(|p| (p.average_score, p.average_stagnation))),
            worst_stagnation:   stagnation(worst_score,   previous.map(|p| (p.worst_score,   p.worst_stagnation))),
            elapsed_ms: 0,
        }
    }
}


pub struct Population {
    pub nets: Vec<Network>,
    config: Config,
    training: TrainingSet,
    rng: ChaCha8Rng,
    generation: usize,
    last_stats: Option<GenerationStats>,
}

impl Population {
    /// Validates the configuration and builds `config.population_size` fresh networks sized to
    /// the training patterns.
    pub fn new(config: Config, training: TrainingSet) -> Result<Self, EvolveError> {
        validate_config(&config)?;
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None       => ChaCha8Rng::from_entropy(),
        };
        let inputs = training.input_count();
        let nets = (0..config.population_size)
            .map(|_| Network::new(inputs, config.initial_connection_ratio, &mut rng))
            .collect();
        Ok(Self {
            nets,
            config,
            training,
            rng,
            generation: 0,
            last_stats: None,
        })
    }

    pub fn generation(&self) -> usize { self.generation }
    /// Fixed once `new()` has validated it.
    pub fn config(&self) -> &Config { &self.config }
    pub fn training(&self) -> &TrainingSet { &self.training }

    /// Scores every network under one shared weight, then replaces the bottom two thirds of
    /// the ranking with mutated copies of the top third.  Returns the generation's statistics
    /// and a copy of its best network, taken before any replacement.
    pub fn run_one_generation(&mut self) -> (GenerationStats, Network) {
        assert!(!self.nets.is_empty(), "implementation error: empty population");
        let started = Utc::now();

        let (min, max) = self.config.shared_weight_range;
        let scores = score_population(&mut self.nets, &self.training, min..max, &mut self.rng);
        let ranking = scores.ranking();
        let best_network = ranking.first()
            .map(|&i| self.nets[i].clone())
            .unwrap_or_else(|| panic!("implementation error: no best network"));

        let mut stats = GenerationStats::from_scores(self.generation, &scores, &ranking, self.last_stats.as_ref());
        self.create_next_generation(&ranking);
        stats.elapsed_ms = (Utc::now() - started).num_milliseconds().max(0) as u64;

        if self.config.verbose {
            info!("------ generation {}, population size {}", self.generation, self.nets.len());
            info!("Best, average and worst score: {} {} {}", stats.best_score, stats.average_score, stats.worst_score);
            info!("Best, average and worst improvement counters: {} {} {}",
                stats.best_stagnation, stats.average_stagnation, stats.worst_stagnation);
        } else {
            debug!("generation {}: weight={:.4} best={} average={} worst={}",
                self.generation, stats.shared_weight, stats.best_score, stats.average_score, stats.worst_score);
        }

        self.generation += 1;
        self.last_stats = Some(stats.clone());
        (stats, best_network)
    }

    /// Number of ranked networks that survive unchanged: a third of the population, but never
    /// zero.
    pub fn elite_count(&self) -> usize {
        (self.nets.len() / 3).max(1)
    }

    fn create_next_generation(&mut self, ranking: &[usize]) {
        let (elite, rest) = ranking.split_at(self.elite_count().min(ranking.len()));
        for &position in rest {
            let parent = elite[self.rng.gen_range(0..elite.len())];
            let mut child = self.nets[parent].clone();
            let outcome = child.modify(self.config.mutation_retries, &mut self.rng);
            trace!("slot {position}: copy of {parent}, {outcome:?}");
            self.nets[position] = child;
        }
    }
}

fn validate_config(config: &Config) -> Result<(), EvolveError> {
    if config.population_size == 0 {
        return Err(EvolveError::InvalidConfig("population size must be at least 1".to_string()));
    }
    if !(0.0..=1.0).contains(&config.initial_connection_ratio) {
        return Err(EvolveError::InvalidConfig(format!(
            "initial connection ratio {} is outside [0, 1]", config.initial_connection_ratio)));
    }
    let (min, max) = config.shared_weight_range;
    if !(min.is_finite() && max.is_finite() && min < max) {
        return Err(EvolveError::InvalidConfig(format!("shared weight range [{min}, {max}) is empty")));
    }
    Ok(())
}


/// The trained network plus the statistics of every generation that produced it.
#[derive(Clone, Debug)]
pub struct Evolution {
    pub network: Network,
    pub history: Vec<GenerationStats>,
}

impl Config {
    /// Evolves a network that scores `patterns` according to `multipliers`.  See
    /// `TrainingSet::new` for how multipliers are matched to patterns.
    pub fn evolve(&self, patterns: Vec<Pattern>, multipliers: Vec<f64>) -> Result<Network, EvolveError> {
        Ok(self.evolve_with_history(patterns, multipliers)?.network)
    }

    /// Like `evolve`, but also returns per-generation statistics.  The returned network is the
    /// best of the final generation, with that generation's shared weight set.  With zero
    /// generations it is the first network of the initial population.
    pub fn evolve_with_history(&self, patterns: Vec<Pattern>, multipliers: Vec<f64>) -> Result<Evolution, EvolveError> {
        let training = TrainingSet::new(patterns, multipliers)?;
        let mut population = Population::new(self.clone(), training)?;

        let mut history = Vec::with_capacity(self.generations);
        let mut best_network = None;
        for _ in 0..self.generations {
            let (stats, best) = population.run_one_generation();
            history.push(stats);
            best_network = Some(best);
        }
        let network = best_network.unwrap_or_else(|| population.nets[0].clone());
        Ok(Evolution { network, history })
    }
}



#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;

    fn config(seed: u64) -> Config {
        Config {
            population_size: 20,
            generations: 50,
            seed: Some(seed),
            ..Config::default()
        }
    }

    #[test]
    fn test_empty_patterns_fail_before_population_work() {
        let result = config(1).evolve(vec![], vec![1.0]);
        assert!(matches!(result, Err(EvolveError::EmptyTrainingData)));
    }

    #[test]
    fn test_single_pattern_single_multiplier() {
        let patterns = vec![Pattern::new("only", vec![0.5, 1.0])];
        let net = Config { generations: 5, ..config(2) }.evolve(patterns, vec![1.0]).unwrap();
        assert_eq!(net.inputs(), 2);
        assert!(net.evaluate(&[0.5, 1.0]).is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let patterns = shapes::up_down_left_right();
        for bad in [
            Config { population_size: 0, ..config(3) },
            Config { initial_connection_ratio: 1.5, ..config(3) },
            Config { shared_weight_range: (1.0, 1.0), ..config(3) },
        ] {
            assert!(matches!(bad.evolve(patterns.clone(), vec![1.0]), Err(EvolveError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let a = config(11).evolve_with_history(shapes::up_down_left_right(), vec![1.0]).unwrap();
        let b = config(11).evolve_with_history(shapes::up_down_left_right(), vec![1.0]).unwrap();
        assert_eq!(a.network, b.network);
        let scores = |e: &Evolution| e.history.iter().map(|s| s.best_score).collect::<Vec<_>>();
        assert_eq!(scores(&a), scores(&b));
    }

    #[test]
    fn test_history_and_stats() {
        let evolution = config(5).evolve_with_history(shapes::up_down_left_right(), vec![1.0]).unwrap();
        assert_eq!(evolution.history.len(), 50);
        for (i, stats) in evolution.history.iter().enumerate() {
            assert_eq!(stats.generation, i);
            assert!(stats.best_score >= stats.average_score);
            assert!(stats.average_score >= stats.worst_score);
        }
        let last = evolution.history.last().unwrap();
        assert_eq!(evolution.network.weight(), last.shared_weight);
    }

    #[test]
    fn test_config_is_read_only_after_validation() {
        let training = TrainingSet::new(shapes::up_down_left_right(), vec![1.0]).unwrap();
        let custom = Config { shared_weight_range: (0.25, 0.75), ..config(6) };
        let mut population = Population::new(custom.clone(), training).unwrap();
        for _ in 0..3 {
            let (stats, _) = population.run_one_generation();
            assert!((0.25..0.75).contains(&stats.shared_weight));
        }
        assert_eq!(population.config(), &custom);
    }

    #[test]
    fn test_elites_survive_unchanged() {
        let training = TrainingSet::new(shapes::up_down_left_right(), vec![1.0]).unwrap();
        let mut population = Population::new(config(8), training).unwrap();
        for _ in 0..5 { population.run_one_generation(); }

        let (min, max) = population.config().shared_weight_range;
        let mut rescored: Vec<Network> = population.nets.clone();
        let mut rng = population.rng.clone();
        let ranking = score_population(&mut rescored, &population.training, min..max, &mut rng).ranking();

        population.run_one_generation();
        let elite = population.elite_count();
        assert_eq!(elite, 6);
        for &position in &ranking[..elite] {
            assert_eq!(population.nets[position], rescored[position]);
        }
        assert_eq!(population.nets.len(), 20);
    }

    #[test]
    fn test_tiny_populations() {
        let patterns = shapes::up_down_left_right();
        let one = Config { population_size: 1, ..config(4) }.evolve(patterns.clone(), vec![1.0]).unwrap();
        assert_eq!(one.inputs(), 6);
        let two = Config { population_size: 2, ..config(4) }.evolve(patterns, vec![1.0]).unwrap();
        assert!(two.complexity() > 0.0);
    }

    #[test]
    fn test_stagnation_counters() {
        let scores = Scores { shared_weight: 0.5, by_index: vec![3.0, 1.0, 2.0] };
        let ranking = scores.ranking();
        let first = GenerationStats::from_scores(0, &scores, &ranking, None);
        assert_eq!((first.best_stagnation, first.average_stagnation, first.worst_stagnation), (0, 0, 0));
        assert_eq!((first.best_score, first.average_score, first.worst_score), (3.0, 2.0, 1.0));

        let same = GenerationStats::from_scores(1, &scores, &ranking, Some(&first));
        let again = GenerationStats::from_scores(2, &scores, &ranking, Some(&same));
        assert_eq!(again.best_stagnation, 2);

        let better = Scores { shared_weight: 0.5, by_index: vec![4.0, 1.0, 2.0] };
        let improved = GenerationStats::from_scores(3, &better, &better.ranking(), Some(&again));
        assert_eq!(improved.best_stagnation, 0);
        assert_eq!(improved.worst_stagnation, 3);
    }

    #[test]
    fn test_recognises_up_in_most_runs() {
        let patterns = shapes::up_down_left_right();
        let mut successes = 0;
        let runs = 9;
        for seed in 0..runs {
            let net = config(100 + seed).evolve(patterns.clone(), vec![1.0, -1.0, -1.0, -1.0]).unwrap();
            let scores: Vec<f64> = patterns.iter().map(|p| net.evaluate(&p.values).unwrap()).collect();
            if scores[1..].iter().all(|&s| scores[0] > s) { successes += 1; }
        }
        assert!(successes * 2 > runs, "only {successes} of {runs} runs recognised up");
    }
}
