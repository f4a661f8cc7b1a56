use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use crate::collision::{self, DeathCause};
use crate::config::SimConfig;
use crate::error::LoadError;
use crate::fill::CaptureReport;
use crate::grid::{TileGrid, TileState};
use crate::input::Input;
use crate::level::{random_soil_tile, Campaign, Level, World};
use crate::powerup::{EffectKind, PowerItem, PowerupEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub lives: i32,
    /// Captured share of the current level in whole percent
    pub score: u32,
    /// Index of the current level
    pub level: usize,
    pub state: GameState,
}

/// What a HUD would show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    /// 1-based level number
    pub level: usize,
    pub score: u32,
    pub goal: u32,
    pub lives: i32,
    pub effect: Option<EffectKind>,
    pub effect_seconds: u32,
    pub state: GameState,
}

/// Everything that happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub capture: Option<CaptureReport>,
    pub death: Option<DeathCause>,
    pub reflections: usize,
    pub relocations: usize,
    pub reverted: usize,
    pub propagation_started: bool,
    pub powerup: Vec<PowerupEvent>,
    pub level_advanced: bool,
}

pub struct Game {
    pub world: World,
    pub session: Session,
    sim: SimConfig,
    levels: Vec<Level>,
    /// Parsed maps, one per level, cloned on every level load
    templates: Vec<TileGrid>,
    rng: StdRng,
    tick: u64,
}

impl Game {
    /// Validates every level map up front so later level changes can't fail.
    pub fn new(campaign: Campaign, sim: SimConfig, mut rng: StdRng) -> Result<Self, LoadError> {
        sim.validate()?;
        if campaign.levels.is_empty() {
            return Err(LoadError::NoLevels);
        }
        let mut templates = Vec::with_capacity(campaign.levels.len());
        for level in &campaign.levels {
            let grid = TileGrid::from_layout(&level.map)?;
            if !grid.contains(level.start) {
                return Err(LoadError::StartOutOfBounds {
                    row: level.start.row,
                    col: level.start.col,
                });
            }
            if grid.state(level.start) != TileState::Concrete {
                return Err(LoadError::StartNotSafe {
                    row: level.start.row,
                    col: level.start.col,
                });
            }
            templates.push(grid);
        }

        let world = World::build(&campaign.levels[0], templates[0].clone(), &sim, &mut rng);
        let score = world.grid.score();
        Ok(Self {
            world,
            session: Session {
                lives: campaign.lives,
                score,
                level: 0,
                state: GameState::Playing,
            },
            sim,
            levels: campaign.levels,
            templates,
            rng,
            tick: 0,
        })
    }

    pub fn with_seed(campaign: Campaign, sim: SimConfig, seed: u64) -> Result<Self, LoadError> {
        Self::new(campaign, sim, StdRng::seed_from_u64(seed))
    }

    pub fn sim(&self) -> &SimConfig {
        &self.sim
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn level(&self) -> &Level {
        &self.levels[self.session.level]
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn grid(&self) -> &TileGrid {
        &self.world.grid
    }

    pub fn handle_input(&mut self, input: Input) {
        if self.session.state != GameState::Playing {
            return;
        }
        let tile_size = self.sim.tile_size;
        let world = &mut self.world;
        match input {
            Input::Press(direction) => {
                world.actor.press(direction, &world.grid, tile_size);
            }
            Input::Release(direction) => {
                world.actor.release(direction, &world.grid, tile_size);
            }
        }
    }

    /// Advances the simulation by one fixed step. Does nothing once the game
    /// is won or lost.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if self.session.state != GameState::Playing {
            return report;
        }
        self.tick += 1;

        let actor = collision::resolve_actor(&mut self.world, &mut self.session, &self.sim);
        report.capture = actor.capture;

        let adversaries = collision::resolve_adversaries(
            &mut self.world,
            &mut self.session,
            &self.sim,
            &mut self.rng,
        );
        report.death = actor.death.or(adversaries.death);
        report.reflections = adversaries.reflections;
        report.relocations = adversaries.relocations;
        report.reverted = adversaries.reverted;
        report.propagation_started = adversaries.propagation_started;

        let world = &mut self.world;
        report.powerup = world.powerup.advance(
            &world.grid,
            world.actor.tile(),
            &mut world.adversaries,
            &mut self.rng,
        );
        if report.powerup.contains(&PowerupEvent::SpawnRequested) {
            self.place_item();
        }

        report.level_advanced = self.update_progress();
        report
    }

    pub fn status(&self) -> Status {
        Status {
            level: self.session.level + 1,
            score: self.session.score,
            goal: self.level().goal_percent(),
            lives: self.session.lives,
            effect: self.world.powerup.active_kind(),
            effect_seconds: self.world.powerup.remaining_seconds(),
            state: self.session.state,
        }
    }

    fn place_item(&mut self) {
        let Some(tile) = random_soil_tile(&self.world.grid, 1, &mut self.rng) else {
            return;
        };
        let kind = self.levels[self.session.level].powerup.pick(&mut self.rng);
        self.world.powerup.place_item(PowerItem { tile, kind });
    }

    /// Rescores the level and moves on when the goal is met. Returns whether
    /// a new level was loaded.
    fn update_progress(&mut self) -> bool {
        self.session.score = self.world.grid.score();
        if self.session.score >= self.level().goal_percent() {
            let next = self.session.level + 1;
            if next < self.levels.len() {
                self.load_level(next);
                return true;
            }
            self.session.state = GameState::Won;
            info!(score = self.session.score, "campaign won");
        } else if self.session.lives <= 0 {
            self.session.state = GameState::Lost;
            info!(level = self.session.level + 1, "game over");
        }
        false
    }

    fn load_level(&mut self, index: usize) {
        self.world = World::build(
            &self.levels[index],
            self.templates[index].clone(),
            &self.sim,
            &mut self.rng,
        );
        self.session.level = index;
        self.session.score = self.world.grid.score();
        info!(level = index + 1, "next level");
    }
}
