use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::fill::{self, CaptureReport};
use crate::game::Session;
use crate::grid::TileState;
use crate::level::{random_soil_tile, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Ran into its own trail.
    SelfCollision,
    /// A spreading hit reached the end of the trail.
    CaughtByHit,
    /// Touched by an adversary while in open territory.
    Adversary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorStep {
    pub capture: Option<CaptureReport>,
    pub death: Option<DeathCause>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdversaryStep {
    pub death: Option<DeathCause>,
    pub reflections: usize,
    pub relocations: usize,
    pub reverted: usize,
    pub propagation_started: bool,
}

/// Actor half of a tick: safe-zone re-entry, movement, trail laying and the
/// checks that kill the actor.
pub fn resolve_actor(world: &mut World, session: &mut Session, sim: &SimConfig) -> ActorStep {
    let tile_size = sim.tile_size;
    let mut step = ActorStep::default();

    let previous = world.actor.refresh_tile(tile_size);
    let tile = world.actor.tile();
    let hood = world.grid.neighbors8(tile);
    world.actor.path.orient(world.actor.heading, &hood);

    let state = world.grid.state(tile);
    if world.actor.is_in_open() && state.is_safe() {
        world.actor.path.update_trail(&mut world.grid, tile);
        let occupied = world.adversary_tiles(tile_size);
        step.capture = Some(fill::capture(
            &mut world.grid,
            &mut world.actor.path,
            &occupied,
        ));
        world.actor.stop(tile_size);
    } else if state == TileState::Concrete && world.grid.state(previous) == TileState::Captured {
        world.actor.stop(tile_size);
    }

    world.actor.advance(&world.grid, sim.actor_speed, tile_size);

    if world.actor.is_in_open() && step.capture.is_none() {
        let path = &world.actor.path;
        let cause = if path
            .front()
            .is_some_and(|front| world.grid.state(front).is_trail())
        {
            Some(DeathCause::SelfCollision)
        } else if path.is_caught(&world.grid) {
            Some(DeathCause::CaughtByHit)
        } else {
            None
        };
        if let Some(cause) = cause {
            kill_actor(world, session, cause, tile_size);
            step.death = Some(cause);
            return step;
        }
        world.actor.path.update_trail(&mut world.grid, tile);
    }

    world
        .actor
        .path
        .advance_propagation(&mut world.grid, sim.propagation_interval);
    world.actor.update_in_open(&world.grid);
    step
}

/// Adversary half of a tick: bounce, move, then act on the tile each one
/// stood on before moving.
pub fn resolve_adversaries<R: Rng + ?Sized>(
    world: &mut World,
    session: &mut Session,
    sim: &SimConfig,
    rng: &mut R,
) -> AdversaryStep {
    let tile_size = sim.tile_size;
    let mut step = AdversaryStep::default();

    for idx in 0..world.adversaries.len() {
        let adversary = &mut world.adversaries[idx];
        let tile = adversary.tile(tile_size);
        if !adversary.is_frozen()
            && adversary
                .reflection
                .update(&world.grid, tile, &mut adversary.movement)
                .is_some()
        {
            step.reflections += 1;
        }
        adversary.advance(&world.grid, sim.adversary_speed, tile_size);

        if tile == world.actor.tile() && world.actor.is_in_open() {
            if adversary.is_vulnerable() {
                if let Some(target) = random_soil_tile(&world.grid, 1, rng) {
                    adversary.relocate(target, tile_size, rng);
                    step.relocations += 1;
                    debug!(row = target.row, col = target.col, "vulnerable adversary chased off");
                }
            } else {
                kill_actor(world, session, DeathCause::Adversary, tile_size);
                step.death = Some(DeathCause::Adversary);
            }
        }

        let adversary = &world.adversaries[idx];
        let state = world.grid.state(tile);
        if state.is_trail()
            && !adversary.is_vulnerable()
            && !world.actor.path.is_propagating()
            && world.actor.path.start_propagation(&mut world.grid, tile)
        {
            step.propagation_started = true;
        }
        if adversary.kind.reverts_captured() && state == TileState::Captured {
            world.grid.set_state(tile, TileState::Soil);
            step.reverted += 1;
        }
    }

    step
}

/// Reverts the trail, takes a life and puts a fresh actor on the start tile.
pub fn kill_actor(world: &mut World, session: &mut Session, cause: DeathCause, tile_size: i32) {
    let reverted = world.actor.path.revert(&mut world.grid);
    session.lives -= 1;
    world.respawn_actor(tile_size);
    info!(?cause, lives = session.lives, reverted, "actor died");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Adversary, AdversaryKind, Direction, MovementFlags, Position};
    use crate::game::GameState;
    use crate::grid::{TileGrid, TileId};
    use crate::level::Level;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TILE: i32 = 20;

    fn world(rows: usize, cols: usize, start: TileId) -> (World, Session, StdRng) {
        let mut rng = StdRng::seed_from_u64(21);
        let level = Level::new("", 0.9).with_start(start);
        let world = World::build(
            &level,
            TileGrid::bordered(rows, cols),
            &SimConfig::default(),
            &mut rng,
        );
        let session = Session {
            lives: 3,
            score: 0,
            level: 0,
            state: GameState::Playing,
        };
        (world, session, rng)
    }

    /// Puts the actor in open territory on `tile` with a one-tile trail behind it.
    fn actor_in_open(world: &mut World, tile: TileId, heading: Direction) {
        world.actor.position = Position::center_of(tile, TILE);
        world.actor.refresh_tile(TILE);
        world.actor.update_in_open(&world.grid);
        world.actor.heading = Some(heading);
    }

    fn parked(kind: AdversaryKind, tile: TileId) -> Adversary {
        let mut adversary = Adversary::new(
            kind,
            Position::center_of(tile, TILE),
            MovementFlags::diagonal(Direction::Up, Direction::Left),
        );
        adversary.freeze();
        adversary
    }

    #[test]
    fn test_stepping_on_trail_ahead_kills() {
        let (mut world, mut session, _) = world(8, 8, TileId::new(0, 0));
        actor_in_open(&mut world, TileId::new(3, 3), Direction::Right);
        world.grid.set_state(TileId::new(3, 4), TileState::Trail);

        let step = resolve_actor(&mut world, &mut session, &SimConfig::default());
        assert_eq!(step.death, Some(DeathCause::SelfCollision));
        assert_eq!(session.lives, 2);
        assert_eq!(world.actor.tile(), TileId::new(0, 0));
    }

    #[test]
    fn test_adversary_touch_kills_actor_in_open() {
        let (mut world, mut session, mut rng) = world(8, 8, TileId::new(0, 0));
        let tile = TileId::new(3, 3);
        actor_in_open(&mut world, tile, Direction::Right);
        world.adversaries = vec![parked(AdversaryKind::Plain, tile)];

        let step = resolve_adversaries(&mut world, &mut session, &SimConfig::default(), &mut rng);
        assert_eq!(step.death, Some(DeathCause::Adversary));
        assert_eq!(session.lives, 2);
        assert!(!world.actor.is_in_open());
    }

    #[test]
    fn test_vulnerable_adversary_is_chased_off() {
        let (mut world, mut session, mut rng) = world(8, 8, TileId::new(0, 0));
        let tile = TileId::new(3, 3);
        actor_in_open(&mut world, tile, Direction::Right);
        let mut adversary = parked(AdversaryKind::Plain, tile);
        adversary.set_vulnerable(true);
        world.adversaries = vec![adversary];

        let step = resolve_adversaries(&mut world, &mut session, &SimConfig::default(), &mut rng);
        assert_eq!(step.death, None);
        assert_eq!(step.relocations, 1);
        assert_eq!(session.lives, 3);
        let moved_to = world.adversaries[0].tile(TILE);
        assert_eq!(world.grid.state(moved_to), TileState::Soil);
    }

    #[test]
    fn test_adversary_on_trail_starts_hit() {
        let (mut world, mut session, mut rng) = world(8, 8, TileId::new(0, 0));
        actor_in_open(&mut world, TileId::new(3, 4), Direction::Right);
        world.actor.path.orient(Some(Direction::Right), &world.grid.neighbors8(TileId::new(3, 4)));
        world.actor.path.update_trail(&mut world.grid, TileId::new(3, 4));
        let hit = TileId::new(3, 3);
        assert_eq!(world.grid.state(hit), TileState::Trail);
        world.adversaries = vec![parked(AdversaryKind::Plain, hit)];

        let step = resolve_adversaries(&mut world, &mut session, &SimConfig::default(), &mut rng);
        assert!(step.propagation_started);
        assert_eq!(world.grid.state(hit), TileState::TrailHit);
        // The only trail tile is hit, so the actor is caught on its next move
        let step = resolve_actor(&mut world, &mut session, &SimConfig::default());
        assert_eq!(step.death, Some(DeathCause::CaughtByHit));
        assert_eq!(world.grid.state(hit), TileState::Soil);
    }

    #[test]
    fn test_destructive_adversary_reverts_captured() {
        let (mut world, mut session, mut rng) = world(8, 8, TileId::new(0, 0));
        let tile = TileId::new(4, 4);
        world.grid.set_state(tile, TileState::Captured);
        world.adversaries = vec![
            parked(AdversaryKind::Plain, tile),
            parked(AdversaryKind::Destructive, TileId::new(5, 5)),
        ];
        world.grid.set_state(TileId::new(5, 5), TileState::Captured);

        let step = resolve_adversaries(&mut world, &mut session, &SimConfig::default(), &mut rng);
        assert_eq!(step.reverted, 1);
        assert_eq!(world.grid.state(tile), TileState::Captured);
        assert_eq!(world.grid.state(TileId::new(5, 5)), TileState::Soil);
    }

    #[test]
    fn test_concrete_after_captured_stops_actor() {
        let (mut world, mut session, _) = world(8, 8, TileId::new(0, 0));
        world.grid.set_state(TileId::new(1, 1), TileState::Captured);
        world.actor.position = Position::new(30, 20);
        world.actor.heading = Some(Direction::Up);
        world.actor.refresh_tile(TILE);
        world.actor.update_in_open(&world.grid);
        assert_eq!(world.actor.tile(), TileId::new(1, 1));

        world.actor.position = Position::new(30, 19);
        let step = resolve_actor(&mut world, &mut session, &SimConfig::default());
        assert_eq!(step, ActorStep::default());
        assert_eq!(world.actor.heading, None);
        assert_eq!(world.actor.position, Position::new(30, 10));
    }
}
