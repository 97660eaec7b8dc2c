//! Headless skirmish runner.
//!
//! Spawns a player, a ring of enemies and a couple of walls, runs the fixed
//! timestep for a number of ticks and prints a summary plus the final state
//! hash. Two runs with the same arguments print the same hash.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use glam::Vec2;
use serde::Serialize;
use skirmish_engine::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "skirmish-headless")]
#[command(about = "Run a scripted skirmish without rendering and print a summary")]
struct Args {
    /// JSON config file; missing sections keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Number of enemies, spread on a spiral around the player
    #[arg(long, default_value_t = 4)]
    enemies: u32,

    /// Seconds between paced enemy attacks (overrides the config file)
    #[arg(long)]
    attack_interval: Option<f32>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Serialize)]
struct RunSummary {
    ticks: u64,
    sim_time: f64,
    events: usize,
    attacks: usize,
    deaths: usize,
    player_health: Option<u32>,
    player_alive: bool,
    effects: Vec<(String, u32)>,
    state_hash: String,
}

// ---------------------------------------------------------------------------
// Scene setup
// ---------------------------------------------------------------------------

/// Pickups collected at fixed ticks.
const PICKUPS: &[(u64, &str, u32)] = &[
    (30, SPEED_BOOST, 3),
    (60, SPEED_BOOST, 3),
    (90, HEALTH_INCREASE, 2),
    (120, "shield", 1),
];

fn build_scene(sim: &mut Simulation, enemies: u32) -> (EntityHandle, Vec<EntityHandle>) {
    let player = sim.spawn_player(Vec2::ZERO);
    for i in 0..enemies {
        let angle = i as f32 * std::f32::consts::FRAC_PI_2 * 0.9;
        let radius = 60.0 + 45.0 * i as f32;
        sim.spawn_enemy(Vec2::from_angle(angle) * radius);
    }
    let walls = vec![
        sim.spawn_prop(EntityKind::Wall, Vec2::new(120.0, 0.0)),
        sim.spawn_prop(EntityKind::Obstacle, Vec2::new(-80.0, 40.0)),
    ];
    (player, walls)
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SimConfig::default(),
    };
    if args.attack_interval.is_some() {
        config.combat.attack_interval = args.attack_interval;
    }

    let mut sim = Simulation::new(config).context("invalid simulation config")?;
    let (player, walls) = build_scene(&mut sim, args.enemies);
    sim.steer_player(player, Vec2::X)?;

    let mut events = 0;
    let mut attacks = 0;
    let mut deaths = 0;
    for tick in 0..args.ticks {
        for (at, kind, max_stacks) in PICKUPS {
            if *at == tick && sim.world().is_alive(player) {
                sim.add_effect(player, Powerup::new(*kind, *max_stacks))?;
            }
        }

        let player_pos = sim.world().get(player).map(|e| e.actor().position());
        if let Some(pos) = player_pos {
            for &wall in &walls {
                let touching = sim
                    .world()
                    .get(wall)
                    .is_some_and(|w| w.actor().distance_to(pos) <= 4.0);
                if touching {
                    sim.report_collision(player, wall)?;
                    sim.steer_player(player, -Vec2::X)?;
                }
            }
        }

        let mut frame = sim.drain_events();
        frame.extend(sim.tick());
        events += frame.len();
        for event in &frame {
            match event {
                SimEvent::Attacked { .. } => attacks += 1,
                SimEvent::Died { entity } => {
                    deaths += 1;
                    tracing::info!(tick, entity = %entity, "entity died");
                }
                _ => {}
            }
        }
    }

    let player_entity = sim.world().get(player);
    let effects: Vec<(String, u32)> = sim
        .effects(player)
        .map(|m| {
            m.active_kinds()
                .into_iter()
                .map(|kind| (kind.to_owned(), m.stacks(kind).unwrap_or(0)))
                .collect()
        })
        .unwrap_or_default();

    let summary = RunSummary {
        ticks: sim.tick_count(),
        sim_time: sim.sim_time(),
        events,
        attacks,
        deaths,
        player_health: player_entity.map(|e| e.actor().health()),
        player_alive: player_entity.is_some_and(|e| !e.actor().is_dead()),
        effects,
        state_hash: sim.state_hash()?,
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("ticks:      {} ({:.2}s)", summary.ticks, summary.sim_time);
        println!("events:     {}", summary.events);
        println!("attacks:    {}", summary.attacks);
        println!("deaths:     {}", summary.deaths);
        match summary.player_health {
            Some(hp) => println!("player:     {hp} hp, alive = {}", summary.player_alive),
            None => println!("player:     despawned"),
        }
        for (kind, stacks) in &summary.effects {
            println!("effect:     {kind} x{stacks}");
        }
        println!("state hash: {}", summary.state_hash);
    }
    Ok(())
}
