use std::{fs::File, io::BufWriter, process::ExitCode};

use clap::Parser;
use log::info;
use wann::{cmdline::Args, shapes::{self, TrainingFile}, Evolution};


fn main() -> ExitCode {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match run(&args) {
        Ok(source) => {
            println!("{source}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<String, Box<dyn std::error::Error>> {
    let training = match &args.patterns {
        Some(path) => TrainingFile::load_json(path)?,
        None => TrainingFile::default(),
    };
    let patterns = training.patterns.clone();

    let Evolution { network, history } = args.config().evolve_with_history(training.patterns, training.multipliers)?;

    // Report how the trained network scores every pattern under its final shared weight.
    let mut best_pattern = None;
    for pattern in patterns.iter() {
        let score = network.evaluate(&pattern.values)?;
        info!("{} scores {score}\n{}", pattern.name, shapes::render_grid(&pattern.values, shapes::GRID_WIDTH));
        if best_pattern.map_or(true, |(_, best)| score > best) {
            best_pattern = Some((&pattern.name, score));
        }
    }
    if let Some((name, _)) = best_pattern {
        info!("Network training complete, highest scoring pattern is {name:?}.");
    }

    if let Some(path) = &args.save {
        network.save_json(path)?;
    }
    if let Some(path) = &args.stats {
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), &history)?;
    }
    Ok(network.rust_function(&args.name))
}
