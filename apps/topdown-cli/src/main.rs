use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec2;
use topdown_collide::{CollisionMode, Mover, intercept_by_angle, intercept_point};
use topdown_common::WorldConfig;
use topdown_kernel::{EntityKind, Simulation, TickClock};
use topdown_tools::{SimulationInspector, TickProfile};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "topdown-cli", about = "Headless driver for the top-down world")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Rectangles,
    Circles,
    Triangles,
}

impl From<Mode> for CollisionMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Rectangles => CollisionMode::Rectangles,
            Mode::Circles => CollisionMode::Circles,
            Mode::Triangles => CollisionMode::Triangles,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run a headless simulation and report grid and collision statistics
    Run {
        /// Settings file (.json or .yaml); defaults to a 5000x5000 world
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of entities to spawn
        #[arg(short, long, default_value = "50")]
        entities: usize,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "300")]
        ticks: u64,
        /// RNG seed for placement
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Entity speed
        #[arg(long, default_value = "50")]
        speed: f32,
        /// Narrow-phase shape
        #[arg(long, value_enum, default_value = "rectangles")]
        mode: Mode,
        /// Drive ticks from simulated frames of this many milliseconds
        #[arg(long)]
        frame_ms: Option<u64>,
    },
    /// Check that incremental grid updates match a full rebuild every tick
    Verify {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long, default_value = "200")]
        entities: usize,
        #[arg(short, long, default_value = "500")]
        ticks: u64,
        #[arg(short, long, default_value = "7")]
        seed: u64,
    },
    /// Solve an interception with both solvers
    Intercept {
        /// Predator position x,y
        #[arg(long, num_args = 2, default_values_t = [0.0, 0.0])]
        predator: Vec<f32>,
        /// Predator speed
        #[arg(long, default_value = "10")]
        speed: f32,
        /// Prey position x,y
        #[arg(long, num_args = 2, default_values_t = [100.0, 0.0])]
        prey: Vec<f32>,
        /// Prey velocity x,y
        #[arg(long, num_args = 2, default_values_t = [0.0, 0.0])]
        velocity: Vec<f32>,
    },
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<WorldConfig> {
    Ok(match path {
        Some(p) => WorldConfig::load(&p)?,
        None => WorldConfig::default(),
    })
}

fn build_simulation(
    config: WorldConfig,
    entities: usize,
    seed: u64,
    speed: f32,
) -> anyhow::Result<Simulation> {
    let mut sim = Simulation::with_seed(config, seed)?;
    sim.spawn_scattered(entities, EntityKind::Car, (32, 32), speed)?;
    Ok(sim)
}

fn vec2(v: &[f32]) -> Vec2 {
    Vec2::new(v.first().copied().unwrap_or(0.0), v.get(1).copied().unwrap_or(0.0))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("topdown-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("partition: {}", topdown_partition::crate_info());
            println!("tools: {}", topdown_tools::crate_info());
            let c = WorldConfig::default();
            println!(
                "default world: size={} cell={} grid={}x{}",
                c.world_size,
                c.cell_size,
                c.grid_dimension(),
                c.grid_dimension()
            );
        }
        Commands::Run {
            config,
            entities,
            ticks,
            seed,
            speed,
            mode,
            frame_ms,
        } => {
            if frame_ms == Some(0) {
                anyhow::bail!("--frame-ms must be positive");
            }
            let config = load_config(config)?;
            let mut clock = TickClock::new(config.ticks_per_second);
            let dt = clock.tick_seconds() as f32;
            let mut sim = build_simulation(config, entities, seed, speed)?;
            let mode = CollisionMode::from(mode);
            println!("Run: entities={entities} ticks={ticks} seed={seed} mode={mode:?}");

            let mut profile = TickProfile::new(120);
            let mut collisions = 0usize;
            let mut frames = 0u64;
            while sim.tick() < ticks {
                if let Some(ms) = frame_ms {
                    frames += 1;
                    if !clock.advance(Duration::from_millis(ms)) {
                        continue;
                    }
                }
                let start = Instant::now();
                let stats = sim.step(dt);
                collisions += sim.find_collisions(mode).len();
                profile.record(sim.tick(), start.elapsed(), stats);
                sim.drain_events();
            }

            if frames > 0 {
                tracing::info!(frames, ticks = clock.ticks(), "frame-driven run finished");
            }
            println!("{}", SimulationInspector::summary(&sim));
            println!("{}", profile.report());
            println!("collisions={collisions}");
            println!("{}", SimulationInspector::audit_grid(&sim));
            println!("state hash: {:#018x}", sim.state_hash());
        }
        Commands::Verify {
            config,
            entities,
            ticks,
            seed,
        } => {
            let config = load_config(config)?;
            let dt = 1.0 / config.ticks_per_second;
            let mut sim = build_simulation(config, entities, seed, 120.0)?;
            println!("Verify: entities={entities} ticks={ticks} seed={seed}");

            for _ in 0..ticks {
                sim.step(dt);
                sim.drain_events();
                let audit = SimulationInspector::audit_grid(&sim);
                if !audit.is_consistent() {
                    anyhow::bail!("tick {}: {audit}", sim.tick());
                }
            }
            println!("{}", SimulationInspector::summary(&sim));
            println!("Match: OK");
        }
        Commands::Intercept {
            predator,
            speed,
            prey,
            velocity,
        } => {
            let predator = Mover::new(vec2(&predator), Vec2::ZERO, speed);
            let velocity = vec2(&velocity);
            let prey = Mover::new(vec2(&prey), velocity, velocity.length());

            match intercept_point(&predator, &prey) {
                Some(hit) => println!(
                    "quadratic: aim=({:.3}, {:.3}) t={:.3}",
                    hit.aim_point.x, hit.aim_point.y, hit.time_to_impact
                ),
                None => println!("quadratic: no interception"),
            }
            match intercept_by_angle(prey.position, velocity, predator.position, speed) {
                Some(hit) => println!(
                    "law of sines: aim=({:.3}, {:.3}) t={:.3}",
                    hit.aim_point.x, hit.aim_point.y, hit.time_to_impact
                ),
                None => println!("law of sines: no interception"),
            }
        }
    }

    Ok(())
}
