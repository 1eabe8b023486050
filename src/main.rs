//! Pareto Swarm CLI - Run benchmark optimizations from JSON configuration.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use pareto_swarm::{
    compute::{LoadOutcome, MopsoEngine},
    schema::RunConfig,
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <run.json> [iterations]", args[0]);
        eprintln!();
        eprintln!("Optimize a benchmark problem from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  run.json     Path to run configuration file");
        eprintln!("  iterations   Number of iterations (default: from config)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);

    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let mut run: RunConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    let iterations: usize = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(run.iterations);

    if let Err(e) = run.resolve_bounds() {
        eprintln!("Invalid bounds: {}", e);
        std::process::exit(1);
    }

    let objective = run.problem.objective().unwrap_or_else(|e| {
        eprintln!("Error building objective: {}", e);
        std::process::exit(1);
    });

    let checkpoint = run.swarm.persistence.checkpoint_path();
    let swarm = run.swarm.clone();

    let mut engine = MopsoEngine::new(swarm, objective).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    println!("Pareto Swarm Optimization");
    println!("=========================");
    println!("Problem: {:?}", run.problem);
    println!("Dimensions: {}", engine.space().dimensions());
    println!("Particles: {}", run.swarm.num_particles);
    println!("Topology: {:?}", run.swarm.topology.kind);
    println!("Seed: {}", engine.seed());
    println!("Iterations: {}", iterations);
    println!();

    if let Some(path) = checkpoint.as_deref()
        && path.exists()
        && let LoadOutcome::Resumed { iteration } = engine.load(path)
    {
        println!("Resumed from {} at iteration {}", path.display(), iteration);
        println!();
    }

    println!("Running optimization...");
    let start = Instant::now();

    let report_every = (iterations / 10).max(1);
    while engine.iteration() < iterations {
        let next = (engine.iteration() + report_every).min(iterations);
        if let Err(e) = engine.optimize(next) {
            eprintln!("Optimization failed: {}", e);
            std::process::exit(1);
        }

        let elapsed = start.elapsed().as_secs_f32();
        println!(
            "  Iteration {}/{}: archive={}, {:.1} it/s",
            engine.iteration(),
            iterations,
            engine.archive().len(),
            engine.iteration() as f32 / elapsed.max(f32::EPSILON)
        );
    }

    let elapsed = start.elapsed();
    let reference_point = run.problem.reference_point();
    let samples = 500;

    println!();
    println!("Final Pareto front:");
    println!("  Solutions: {}", engine.archive().len());
    if let Some(gd) = engine.generational_distance(samples) {
        println!("  Generational distance: {:.6}", gd);
    }
    if let Some(igd) = engine.inverted_generational_distance(samples) {
        println!("  Inverted generational distance: {:.6}", igd);
    }
    println!(
        "  Hypervolume (ref {:?}): {:.6}",
        reference_point,
        engine.hypervolume(&reference_point)
    );
    println!();
    println!("Time: {:.2}s", elapsed.as_secs_f32());
}

fn print_example_config() {
    let run = RunConfig::default();
    let json = serde_json::to_string_pretty(&run).unwrap_or_else(|e| {
        eprintln!("Error serializing example: {}", e);
        std::process::exit(1);
    });
    println!("{}", json);
}
