use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use turfwar::{
    AdversaryKind, AdversarySpec, Campaign, DeathCause, Direction, Game, GameConfig, GameState,
    Input, InputSource, Level, SimConfig, Status, TileGrid, TileId, TileState,
};

/// Runs a campaign headlessly with a random pilot and prints what happened.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Campaign file; a built-in demo level is used when absent
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Stop after this many ticks even if the game is still running
    #[arg(long, default_value_t = 3600)]
    ticks: u64,
    /// Average ticks between two direction changes of the pilot
    #[arg(long, default_value_t = 30)]
    turn_every: u32,
}

#[derive(Debug, Serialize)]
struct Summary {
    seed: u64,
    ticks: u64,
    captures: usize,
    captured_tiles: usize,
    deaths: Vec<DeathCause>,
    reflections: usize,
    status: Status,
}

/// Presses a random direction now and then.
struct RandomPilot {
    rng: StdRng,
    turn_every: u32,
}

impl InputSource for RandomPilot {
    fn poll_input(&mut self, _game: &Game) -> Option<Input> {
        if !self.rng.gen_ratio(1, self.turn_every.max(1)) {
            return None;
        }
        let direction = Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())];
        Some(Input::Press(direction))
    }
}

fn demo_campaign() -> Campaign {
    let mut grid = TileGrid::bordered(24, 32);
    // A concrete pillar in the middle gives the adversaries something to bounce off
    for row in 10..14 {
        for col in 14..18 {
            grid.set_state(TileId::new(row, col), TileState::Concrete);
        }
    }
    let level = Level::new(grid.to_layout(), 0.75)
        .with_adversary(AdversarySpec::new(AdversaryKind::Plain, "random"))
        .with_adversary(AdversarySpec::new(AdversaryKind::Destructive, "random"));
    Campaign {
        lives: 3,
        levels: vec![level],
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("turfwar=info".parse()?))
        .init();

    let cli = Cli::parse();
    let (campaign, sim) = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => (demo_campaign(), SimConfig::default()),
    };
    info!(levels = campaign.levels.len(), seed = cli.seed, "starting simulation");

    let mut game = Game::with_seed(campaign, sim, cli.seed)?;
    let mut pilot = RandomPilot {
        rng: StdRng::seed_from_u64(cli.seed.wrapping_add(1)),
        turn_every: cli.turn_every,
    };

    let mut captures = 0;
    let mut captured_tiles = 0;
    let mut deaths = Vec::new();
    let mut reflections = 0;
    while game.current_tick() < cli.ticks && game.session.state == GameState::Playing {
        if let Some(input) = pilot.poll_input(&game) {
            game.handle_input(input);
        }
        let report = game.tick();
        if let Some(capture) = report.capture {
            captures += 1;
            captured_tiles += capture.captured_tiles();
        }
        deaths.extend(report.death);
        reflections += report.reflections;
    }

    let summary = Summary {
        seed: cli.seed,
        ticks: game.current_tick(),
        captures,
        captured_tiles,
        deaths,
        reflections,
        status: game.status(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
