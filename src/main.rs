//! neurogrid - headless CLI entry point
//!
//! Runs the simulation without a UI, writes default configs and inspects save files.

use clap::{Parser, Subcommand};
use neurogrid::checkpoint::Checkpoint;
use neurogrid::stats::StatsHistory;
use neurogrid::{benchmark, Config, Simulation};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "neurogrid")]
#[command(version)]
#[command(about = "Tick-driven ecosystem simulator with neural-controlled creatures")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation for a fixed number of ticks
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "10000")]
        steps: u64,

        /// State file to resume from and save to (overrides the config)
        #[arg(long)]
        state: Option<PathBuf>,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Write sampled stats as JSON
        #[arg(long)]
        history: Option<PathBuf>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of ticks
        #[arg(short, long, default_value = "1000")]
        steps: u64,

        /// Population size
        #[arg(short, long, default_value = "200")]
        population: usize,

        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Summarize a saved state file
    Analyze {
        /// State file
        state: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            steps,
            state,
            seed,
            history,
            quiet,
        } => {
            let config = load_config(&config)?;
            init_logging(&config.logging.log_level);
            run_simulation(config, steps, state, seed, history, quiet)
        }
        Commands::Benchmark {
            steps,
            population,
            seed,
        } => {
            init_logging("info");
            run_benchmark(steps, population, seed)
        }
        Commands::Init { output } => generate_config(output),
        Commands::Analyze { state } => {
            init_logging("warn");
            analyze_state(state)
        }
    }
}

fn init_logging(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        println!("Loading config from: {:?}", path);
        Ok(Config::from_file(path)?)
    } else {
        println!("Using default configuration");
        Ok(Config::default())
    }
}

fn run_simulation(
    mut config: Config,
    steps: u64,
    state: Option<PathBuf>,
    seed: Option<u64>,
    history_path: Option<PathBuf>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = state {
        config.persistence.state_path = path;
    }
    if let Some(s) = seed {
        println!("Using seed: {}", s);
        config.simulation.seed = Some(s);
    }
    if quiet {
        config.logging.stats_interval = 0;
    }

    let mut sim = Simulation::init("cli", config.clone());
    let mut history = StatsHistory::new(config.logging.stats_interval.max(1));

    println!("Starting simulation");
    println!("  Population: {}", sim.world().population());
    println!("  Grid size: {}x{}", config.world.grid_size, config.world.grid_size);
    println!("  Starting tick: {}", sim.world().time());
    println!("  Steps: {}", steps);
    println!();

    let start = Instant::now();
    let target = sim.world().time() + steps;

    while sim.world().time() < target {
        // Failed ticks are logged by the simulation; only a stop ends the run
        if sim.tick().is_ok() {
            history.maybe_record(&sim.world().stats);
        } else if sim.is_stopped() {
            eprintln!("Simulation stopped after repeated tick failures");
            break;
        }
    }

    let elapsed = start.elapsed();
    let done = steps.min(sim.world().time());
    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Tick: {}", sim.world().time());
    println!("Speed: {:.1} ticks/s", done as f64 / elapsed.as_secs_f64().max(f64::EPSILON));
    println!("{}", sim.world().stats.summary());

    if sim.save() {
        println!("State saved: {:?}", config.persistence.state_path);
    }
    if let Some(path) = history_path {
        history.save(&path)?;
        println!("Stats history: {:?}", path);
    }

    Ok(())
}

fn run_benchmark(steps: u64, population: usize, seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== neurogrid Benchmark ===");
    println!("Steps: {}", steps);
    println!("Population: {}", population);
    println!();

    let result = benchmark(steps, population, seed)?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn analyze_state(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== State Analysis ===");
    println!("File: {:?}", path);
    println!();

    let checkpoint = Checkpoint::load(&path)?;
    match checkpoint.validate() {
        Ok(()) => println!("Validation: ok"),
        Err(e) => println!("Validation: FAILED ({})", e),
    }

    println!("Tick: {}", checkpoint.time);
    println!("Seed: {}", checkpoint.seed);
    println!("Restarts: {}", checkpoint.stats.restarts);
    println!("Population: {}", checkpoint.creatures.len());
    println!("Food: {}", checkpoint.food.len());

    let creatures = &checkpoint.creatures;
    if !creatures.is_empty() {
        let max_gen = creatures.iter().map(|c| c.generation).max().unwrap_or(0);
        let avg_energy = creatures.iter().map(|c| c.energy).sum::<f32>() / creatures.len() as f32;
        let best = creatures.iter().map(|c| c.score()).fold(0.0f32, f32::max);

        println!("Max generation: {}", max_gen);
        println!("Average energy: {:.1}", avg_energy);
        println!("Best live score: {}", best);
    }

    println!();
    println!(
        "Archive: {}/{} entries",
        checkpoint.archive.len(),
        checkpoint.archive.capacity()
    );
    for (rank, entry) in checkpoint.archive.entries().iter().take(5).enumerate() {
        println!(
            "  #{} creature {} gen {} score {:.1}",
            rank + 1,
            entry.creature_id,
            entry.generation,
            entry.score
        );
    }

    println!();
    println!("State size: {:.2} KB", checkpoint.size_bytes() as f64 / 1_000.0);

    Ok(())
}
