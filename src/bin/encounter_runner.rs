//! Headless Encounter Runner
//!
//! Runs AI vs AI encounters and outputs JSON results for balance tuning.

use clap::Parser;
use serde::Serialize;

use emberfall::battle::{
    ActionCatalog, BattleConfig, BattleState, Combatant, InputPause,
};
use emberfall::core::types::{Controller, Team};

/// Headless Encounter Runner - AI vs AI battles for balance tuning
#[derive(Parser, Debug)]
#[command(name = "encounter_runner")]
#[command(about = "Run AI vs AI encounters and output scores for balance tuning")]
struct Args {
    /// Maximum ticks before giving up on the encounter
    #[arg(long, default_value_t = 2000)]
    max_ticks: u64,

    /// Simulation step size in seconds
    #[arg(long, default_value_t = 1.0)]
    step: f32,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Enable verbose event logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct EncounterResult {
    outcome: String,
    ticks: u64,
    survivors: Vec<Survivor>,
    events: usize,
    seed: u64,
}

#[derive(Serialize)]
struct Survivor {
    name: String,
    team: String,
    hp: u32,
    max_hp: u32,
}

fn main() {
    let args = Args::parse();

    let filter = if args.verbose {
        "emberfall=debug"
    } else {
        "emberfall=warn"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let seed = args.seed.unwrap_or_else(rand::random);
    let catalog = ActionCatalog::with_defaults();

    let config = BattleConfig {
        input_pause: InputPause::Global,
        ..BattleConfig::default()
    };
    let mut state = BattleState::with_config(config, seed);

    // Standard test party vs a bandit pair; every seat is AI for headless runs
    state.add_combatant(
        Combatant::new("Hero", Team::Ally, Controller::Ai, 120, 40, 8.0, 12.0),
        catalog
            .instantiate(&["Strike", "Reckless Swing", "Potion"])
            .expect("default catalog actions"),
    );
    state.add_combatant(
        Combatant::new("Sage", Team::Ally, Controller::Ai, 80, 60, 4.0, 10.0),
        catalog
            .instantiate(&["Fireball", "Mend", "War Cry", "Ether"])
            .expect("default catalog actions"),
    );
    state.add_combatant(
        Combatant::new("Brute", Team::Enemy, Controller::Ai, 140, 20, 6.0, 9.0),
        catalog
            .instantiate(&["Strike", "Cripple"])
            .expect("default catalog actions"),
    );
    state.add_combatant(
        Combatant::new("Stalker", Team::Enemy, Controller::Ai, 90, 30, 4.0, 13.0),
        catalog
            .instantiate(&["Venom Blade", "Expose"])
            .expect("default catalog actions"),
    );

    state.begin();

    // Run the encounter loop
    while !state.is_finished() && state.tick < args.max_ticks {
        let events = state.run_tick(args.step);
        if args.verbose {
            for event in &events.events {
                eprintln!("  [{}] {:?}: {}", event.tick, event.event_type, event.description);
            }
        }
    }

    let survivors: Vec<Survivor> = state
        .roster
        .iter()
        .filter(|c| c.alive)
        .map(|c| Survivor {
            name: c.name.clone(),
            team: format!("{:?}", c.team),
            hp: c.hp,
            max_hp: c.max_hp,
        })
        .collect();

    let result = EncounterResult {
        outcome: format!("{:?}", state.outcome),
        ticks: state.tick,
        survivors,
        events: state.battle_log.len(),
        seed,
    };

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result).unwrap());
        }
        "text" => {
            println!("Encounter Result");
            println!("================");
            println!("Outcome: {}", result.outcome);
            println!("Ticks: {}", result.ticks);
            println!("Events: {}", result.events);
            for survivor in &result.survivors {
                println!(
                    "  {} ({}): {}/{} HP",
                    survivor.name, survivor.team, survivor.hp, survivor.max_hp
                );
            }
            println!();
            println!("Seed: {}", result.seed);
        }
        _ => {
            eprintln!("Unknown format '{}', defaulting to json", args.format);
            println!("{}", serde_json::to_string_pretty(&result).unwrap());
        }
    }
}
