use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::SimConfig;
use crate::entity::{Actor, Adversary, AdversaryKind};
use crate::error::SpawnInvalid;
use crate::grid::{TileGrid, TileId, TileState};
use crate::powerup::{PowerupEffectManager, PowerupSelector};

/// Adversaries never spawn closer than this to the outer edge.
pub const SPAWN_MARGIN: usize = 2;

fn random_spawn() -> String {
    "random".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdversarySpec {
    pub kind: AdversaryKind,
    /// `"random"` or `"row,col"`
    #[serde(default = "random_spawn")]
    pub spawn: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnPoint {
    Random,
    Fixed(TileId),
}

impl AdversarySpec {
    pub fn new(kind: AdversaryKind, spawn: &str) -> Self {
        Self {
            kind,
            spawn: spawn.to_string(),
        }
    }

    pub fn spawn_point(&self) -> Result<SpawnPoint, SpawnInvalid> {
        let text = self.spawn.trim();
        if text.eq_ignore_ascii_case("random") {
            return Ok(SpawnPoint::Random);
        }
        let malformed = || SpawnInvalid::Malformed(self.spawn.clone());
        let (row, col) = text.split_once(',').ok_or_else(malformed)?;
        let row = row.trim().parse().map_err(|_| malformed())?;
        let col = col.trim().parse().map_err(|_| malformed())?;
        Ok(SpawnPoint::Fixed(TileId::new(row, col)))
    }
}

/// One level, already read from wherever it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub map: String,
    /// Fraction of the playable area to capture, 0.0 to 1.0
    pub goal: f64,
    pub powerup: PowerupSelector,
    pub adversaries: Vec<AdversarySpec>,
    pub start: TileId,
}

impl Level {
    pub fn new(map: impl Into<String>, goal: f64) -> Self {
        Self {
            map: map.into(),
            goal,
            powerup: PowerupSelector::Random,
            adversaries: Vec::new(),
            start: TileId::new(0, 0),
        }
    }

    pub fn with_adversary(mut self, spec: AdversarySpec) -> Self {
        self.adversaries.push(spec);
        self
    }

    pub fn with_powerup(mut self, powerup: PowerupSelector) -> Self {
        self.powerup = powerup;
        self
    }

    pub fn with_start(mut self, start: TileId) -> Self {
        self.start = start;
        self
    }

    /// Goal as a whole percentage a score has to reach.
    pub fn goal_percent(&self) -> u32 {
        // Tolerate float noise such as 0.29 * 100 = 28.999999999999996
        (self.goal * 100.0 - 1e-9).ceil().max(0.0) as u32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Campaign {
    pub lives: i32,
    pub levels: Vec<Level>,
}

/// Everything that lives on one level: the grid and the agents on it.
#[derive(Debug, Clone)]
pub struct World {
    pub grid: TileGrid,
    pub actor: Actor,
    pub adversaries: Vec<Adversary>,
    pub powerup: PowerupEffectManager,
    pub start: TileId,
    pub skipped_spawns: Vec<SpawnInvalid>,
}

impl World {
    /// Builds a level from an already validated grid. Spawns that can't be
    /// honoured are skipped and recorded.
    pub fn build<R: Rng + ?Sized>(
        level: &Level,
        grid: TileGrid,
        sim: &SimConfig,
        rng: &mut R,
    ) -> Self {
        let mut adversaries = Vec::with_capacity(level.adversaries.len());
        let mut skipped_spawns = Vec::new();
        for spec in &level.adversaries {
            match spawn_adversary(spec, &grid, sim.tile_size, rng) {
                Ok(adversary) => adversaries.push(adversary),
                Err(err) => {
                    warn!(kind = ?spec.kind, spawn = %spec.spawn, "skipping adversary: {err}");
                    skipped_spawns.push(err);
                }
            }
        }
        info!(
            rows = grid.rows(),
            cols = grid.cols(),
            adversaries = adversaries.len(),
            "level loaded"
        );

        let mut actor = Actor::spawn(level.start, sim.tile_size);
        actor.update_in_open(&grid);
        Self {
            actor,
            adversaries,
            powerup: PowerupEffectManager::new(sim, rng),
            start: level.start,
            skipped_spawns,
            grid,
        }
    }

    pub fn respawn_actor(&mut self, tile_size: i32) {
        self.actor = Actor::spawn(self.start, tile_size);
        self.actor.update_in_open(&self.grid);
    }

    pub fn adversary_tiles(&self, tile_size: i32) -> Vec<TileId> {
        self.adversaries.iter().map(|a| a.tile(tile_size)).collect()
    }
}

/// A random soil tile at least `margin` tiles away from the outer edge.
pub fn random_soil_tile<R: Rng + ?Sized>(
    grid: &TileGrid,
    margin: usize,
    rng: &mut R,
) -> Option<TileId> {
    let candidates: Vec<TileId> = grid
        .tiles_in(TileState::Soil)
        .filter(|tile| within_margin(grid, *tile, margin))
        .collect();
    candidates.choose(rng).copied()
}

fn within_margin(grid: &TileGrid, tile: TileId, margin: usize) -> bool {
    tile.row >= margin
        && tile.col >= margin
        && tile.row + margin < grid.rows()
        && tile.col + margin < grid.cols()
}

fn spawn_adversary<R: Rng + ?Sized>(
    spec: &AdversarySpec,
    grid: &TileGrid,
    tile_size: i32,
    rng: &mut R,
) -> Result<Adversary, SpawnInvalid> {
    let tile = match spec.spawn_point()? {
        SpawnPoint::Random => {
            random_soil_tile(grid, SPAWN_MARGIN, rng).ok_or(SpawnInvalid::NoSoil)?
        }
        SpawnPoint::Fixed(tile) => {
            if !within_margin(grid, tile, SPAWN_MARGIN) {
                return Err(SpawnInvalid::TooCloseToBorder {
                    row: tile.row,
                    col: tile.col,
                });
            }
            tile
        }
    };
    Ok(Adversary::spawn_in(spec.kind, tile, tile_size, rng))
}
