use std::time::Instant;

use better_idle_solver::registries::{Action, ActionRegistry, ItemRegistry, Recipe, Registries, ShopRegistry};
use better_idle_solver::{solve, Goal, GameState, SolverConfig, SolverOutcome};
use better_idle_solver::types::{ActionId, ItemId, Skill};

use clap::Parser;

#[derive(Debug, Parser, Clone)]
#[command(name = "better-idle-solver-profile-solve")]
#[command(about = "Profile the planner against a synthetic single-skill registry")]
struct Args {
    #[arg(long, default_value = "10")]
    target_level: u32,

    #[arg(long, default_value = "20")]
    num_runs: u32,

    #[arg(long, default_value = "200000")]
    max_expanded_nodes: usize,
}

fn synthetic_registries() -> Registries {
    let action = Action {
        id: ActionId::new(0, 1),
        skill: Skill::Woodcutting,
        unlock_level: 1,
        mean_duration_ticks: 5.0,
        xp: 10.0,
        mastery_xp: 1.0,
        outputs: vec![(ItemId::new(1, 1), 1)],
        recipes: vec![Recipe { id: 0, inputs: vec![] }],
        is_skill_action: true,
        thieving: None,
    };
    Registries::new(
        ActionRegistry::build(vec![action]),
        ItemRegistry::build(vec![]),
        ShopRegistry::build(vec![]),
    )
}

fn profile_solves(args: &Args) {
    let registries = synthetic_registries();
    let config = SolverConfig {
        max_expanded_nodes: args.max_expanded_nodes,
        ..SolverConfig::default()
    };

    let mut durations = Vec::new();
    for _ in 0..args.num_runs {
        let goal = Goal::reach_skill_level(Skill::Woodcutting, args.target_level);
        let start = Instant::now();
        let outcome = solve(GameState::new(28, 10), goal, &registries, &config);
        durations.push(start.elapsed());
        match outcome {
            SolverOutcome::Success { profile, .. } => println!("  {}", profile.summary()),
            SolverOutcome::Failure { failure, profile } => {
                eprintln!("solve failed: {} ({})", failure.reason, profile.summary());
            }
        }
    }

    let total: u128 = durations.iter().map(|d| d.as_nanos()).sum();
    let avg_nanos = total / durations.len().max(1) as u128;
    let avg = std::time::Duration::from_nanos(avg_nanos as u64);
    let min = durations.iter().min().unwrap();
    let max = durations.iter().max().unwrap();

    println!("solve() timing statistics:");
    println!("  Runs: {}", durations.len());
    println!("  Average: {avg:?}");
    println!("  Min: {min:?}");
    println!("  Max: {max:?}");
}

fn main() {
    let args = Args::parse();
    profile_solves(&args);
}
