use std::path::PathBuf;

use clap::Parser;

use crate::neural_net::{mutations::RetryBudget, populations::Config};


/// Evolve a weight-agnostic network and print it as a Rust function.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Number of networks in the population
    #[arg(short, long, default_value_t = 100)]
    pub population_size: usize,

    /// Number of generations to run
    #[arg(short, long, default_value_t = 4000)]
    pub generations: usize,

    /// Fraction of inputs wired to the output in a fresh network
    #[arg(short = 'c', long, default_value_t = 0.05)]
    pub connection_ratio: f64,

    /// Attempts per structural mutation; 0 means no limit
    #[arg(long, default_value_t = 100)]
    pub mutation_retries: usize,

    /// Seed for reproducible runs
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Log per-generation statistics
    #[arg(short, long)]
    pub verbose: bool,

    /// JSON file with named patterns and multipliers (defaults to the up/down/left/right shapes)
    #[arg(long)]
    pub patterns: Option<PathBuf>,

    /// Write the trained network to this JSON file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Write per-generation statistics to this JSON file
    #[arg(long)]
    pub stats: Option<PathBuf>,

    /// Name of the rendered function
    #[arg(long, default_value = "recognize")]
    pub name: String,
}

impl Args {
    pub fn config(&self) -> Config {
        Config {
            population_size: self.population_size,
            generations: self.generations,
            initial_connection_ratio: self.connection_ratio,
            verbose: self.verbose,
            mutation_retries: match self.mutation_retries {
                0 => RetryBudget::Unlimited,
                n => RetryBudget::Limited(n),
            },
            seed: self.seed,
            ..Config::default()
        }
    }
}
