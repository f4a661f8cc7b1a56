use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::{TileGrid, TileId, TileState};
use crate::reflection::ReflectionState;
use crate::trail::PathTracker;

/// Agent centre in sub-tile units: a tile spans `tile_size` units on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn center_of(tile: TileId, tile_size: i32) -> Self {
        let half = tile_size / 2;
        Self::new(
            tile.col as i32 * tile_size + half,
            tile.row as i32 * tile_size + half,
        )
    }

    /// Tile containing this point. Only meaningful for clamped positions.
    pub fn tile(&self, tile_size: i32) -> TileId {
        TileId::new(
            (self.y.max(0) / tile_size) as usize,
            (self.x.max(0) / tile_size) as usize,
        )
    }

    pub fn moved(&self, direction: Direction, distance: i32) -> Self {
        let (dx, dy) = direction.delta();
        Position::new(self.x + dx * distance, self.y + dy * distance)
    }

    /// Keeps the centre between the centres of the outermost tiles.
    pub fn clamped(&self, grid: &TileGrid, tile_size: i32) -> Self {
        let half = tile_size / 2;
        Position::new(
            self.x.clamp(half, grid.cols() as i32 * tile_size - half),
            self.y.clamp(half, grid.rows() as i32 * tile_size - half),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One flag per direction. Adversaries wander diagonally, so two orthogonal
/// flags are normally set at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MovementFlags([bool; 4]);

impl MovementFlags {
    pub fn diagonal(vertical: Direction, horizontal: Direction) -> Self {
        let mut flags = Self::default();
        flags.set(vertical, true);
        flags.set(horizontal, true);
        flags
    }

    pub fn random_diagonal<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let vertical = if rng.gen_bool(0.5) {
            Direction::Up
        } else {
            Direction::Down
        };
        let horizontal = if rng.gen_bool(0.5) {
            Direction::Left
        } else {
            Direction::Right
        };
        Self::diagonal(vertical, horizontal)
    }

    pub fn is_set(&self, direction: Direction) -> bool {
        self.0[direction.index()]
    }

    pub fn set(&mut self, direction: Direction, value: bool) {
        self.0[direction.index()] = value;
    }

    pub fn invert_vertical(&mut self) {
        for direction in [Direction::Up, Direction::Down] {
            self.set(direction, !self.is_set(direction));
        }
    }

    pub fn invert_horizontal(&mut self) {
        for direction in [Direction::Left, Direction::Right] {
            self.set(direction, !self.is_set(direction));
        }
    }

    pub fn clear(&mut self) {
        self.0 = [false; 4];
    }

    pub fn is_idle(&self) -> bool {
        self.0.iter().all(|&flag| !flag)
    }

    /// Net displacement for one tick.
    pub fn step(&self, distance: i32) -> (i32, i32) {
        Direction::ALL
            .iter()
            .filter(|&&d| self.is_set(d))
            .fold((0, 0), |(x, y), d| {
                let (dx, dy) = d.delta();
                (x + dx * distance, y + dy * distance)
            })
    }
}

/// The player-controlled agent.
#[derive(Debug, Clone)]
pub struct Actor {
    pub position: Position,
    pub heading: Option<Direction>,
    /// Tile occupied at the start of the current tick.
    tile: TileId,
    in_open: bool,
    pub path: PathTracker,
}

impl Actor {
    pub fn spawn(tile: TileId, tile_size: i32) -> Self {
        Self {
            position: Position::center_of(tile, tile_size),
            heading: None,
            tile,
            in_open: false,
            path: PathTracker::new(),
        }
    }

    pub fn tile(&self) -> TileId {
        self.tile
    }

    /// Whether the actor was on open ground (not concrete, not captured) when
    /// its tile was last refreshed.
    pub fn is_in_open(&self) -> bool {
        self.in_open
    }

    /// Re-reads the occupied tile from the position, returning the previous one.
    pub fn refresh_tile(&mut self, tile_size: i32) -> TileId {
        std::mem::replace(&mut self.tile, self.position.tile(tile_size))
    }

    pub fn update_in_open(&mut self, grid: &TileGrid) {
        self.in_open = !grid.state(self.tile).is_safe();
    }

    pub fn snap_to_tile(&mut self, tile_size: i32) {
        self.position = Position::center_of(self.tile, tile_size);
    }

    pub fn stop(&mut self, tile_size: i32) {
        self.heading = None;
        self.snap_to_tile(tile_size);
    }

    /// Applies a direction press. Reversing is refused on open ground and on
    /// captured tiles; a 90 degree turn on open ground marks a trail corner.
    pub fn press(&mut self, direction: Direction, grid: &TileGrid, tile_size: i32) -> bool {
        let on_captured = grid.state(self.tile) == TileState::Captured;
        if let Some(heading) = self.heading {
            if (self.in_open || on_captured) && heading == direction.opposite() {
                return false;
            }
            if self.in_open && heading.is_vertical() != direction.is_vertical() {
                self.snap_to_tile(tile_size);
                self.path.mark_corner();
            }
        }
        self.heading = Some(direction);
        true
    }

    /// Releasing a key only stops the actor while it stands on concrete.
    pub fn release(&mut self, direction: Direction, grid: &TileGrid, tile_size: i32) {
        if self.in_open || grid.state(self.tile) == TileState::Captured {
            return;
        }
        self.snap_to_tile(tile_size);
        if self.heading == Some(direction) {
            self.heading = None;
        }
    }

    pub fn advance(&mut self, grid: &TileGrid, speed: i32, tile_size: i32) {
        if let Some(heading) = self.heading {
            self.position = self.position.moved(heading, speed).clamped(grid, tile_size);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdversaryKind {
    #[serde(alias = "worm")]
    Plain,
    /// Eats captured tiles it walks over, turning them back into soil.
    #[serde(alias = "beetle")]
    Destructive,
}

impl AdversaryKind {
    pub fn reverts_captured(self) -> bool {
        matches!(self, AdversaryKind::Destructive)
    }
}

#[derive(Debug, Clone)]
pub struct Adversary {
    pub kind: AdversaryKind,
    pub position: Position,
    pub movement: MovementFlags,
    pub reflection: ReflectionState,
    vulnerable: bool,
    frozen: Option<MovementFlags>,
}

impl Adversary {
    pub fn new(kind: AdversaryKind, position: Position, movement: MovementFlags) -> Self {
        Self {
            kind,
            position,
            movement,
            reflection: ReflectionState::default(),
            vulnerable: false,
            frozen: None,
        }
    }

    /// Spawns at a random point inside `tile`, heading in a random diagonal.
    pub fn spawn_in<R: Rng + ?Sized>(
        kind: AdversaryKind,
        tile: TileId,
        tile_size: i32,
        rng: &mut R,
    ) -> Self {
        let position = random_point_in(tile, tile_size, rng);
        Self::new(kind, position, MovementFlags::random_diagonal(rng))
    }

    pub fn tile(&self, tile_size: i32) -> TileId {
        self.position.tile(tile_size)
    }

    pub fn is_vulnerable(&self) -> bool {
        self.vulnerable
    }

    pub fn set_vulnerable(&mut self, vulnerable: bool) {
        self.vulnerable = vulnerable;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Stops all movement, remembering the flags for `unfreeze`.
    pub fn freeze(&mut self) {
        if self.frozen.is_none() {
            self.frozen = Some(self.movement);
            self.movement.clear();
        }
    }

    pub fn unfreeze(&mut self) {
        if let Some(saved) = self.frozen.take() {
            self.movement = saved;
        }
    }

    pub fn relocate<R: Rng + ?Sized>(&mut self, tile: TileId, tile_size: i32, rng: &mut R) {
        self.position = random_point_in(tile, tile_size, rng);
    }

    pub fn advance(&mut self, grid: &TileGrid, speed: i32, tile_size: i32) {
        let (dx, dy) = self.movement.step(speed);
        self.position =
            Position::new(self.position.x + dx, self.position.y + dy).clamped(grid, tile_size);
    }
}

fn random_point_in<R: Rng + ?Sized>(tile: TileId, tile_size: i32, rng: &mut R) -> Position {
    let x0 = tile.col as i32 * tile_size;
    let y0 = tile.row as i32 * tile_size;
    Position::new(
        rng.gen_range(x0..x0 + tile_size),
        rng.gen_range(y0..y0 + tile_size),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TILE: i32 = 20;

    #[test]
    fn test_position_tile_and_center() {
        let pos = Position::center_of(TileId::new(2, 3), TILE);
        assert_eq!(pos, Position::new(70, 50));
        assert_eq!(pos.tile(TILE), TileId::new(2, 3));
        assert_eq!(Position::new(79, 59).tile(TILE), TileId::new(2, 3));
        assert_eq!(Position::new(80, 60).tile(TILE), TileId::new(3, 4));
    }

    #[test]
    fn test_clamp_keeps_centre_inside_outer_tiles() {
        let grid = TileGrid::bordered(4, 5);
        let clamped = Position::new(-8, 500).clamped(&grid, TILE);
        assert_eq!(clamped, Position::new(10, 70));
        assert_eq!(clamped.tile(TILE), TileId::new(3, 0));
    }

    #[test]
    fn test_direction_opposite() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            assert_ne!(direction.opposite(), direction);
            assert_eq!(direction.opposite().is_vertical(), direction.is_vertical());
        }
    }

    #[test]
    fn test_movement_flags_invert_axes() {
        let mut flags = MovementFlags::diagonal(Direction::Up, Direction::Right);
        assert_eq!(flags.step(2), (2, -2));

        flags.invert_vertical();
        assert!(flags.is_set(Direction::Down));
        assert!(!flags.is_set(Direction::Up));
        assert_eq!(flags.step(2), (2, 2));

        flags.invert_horizontal();
        assert_eq!(flags.step(2), (-2, 2));
    }

    #[test]
    fn test_random_diagonal_has_two_orthogonal_flags() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let flags = MovementFlags::random_diagonal(&mut rng);
            let vertical = flags.is_set(Direction::Up) as u8 + flags.is_set(Direction::Down) as u8;
            let horizontal =
                flags.is_set(Direction::Left) as u8 + flags.is_set(Direction::Right) as u8;
            assert_eq!((vertical, horizontal), (1, 1));
        }
    }

    #[test]
    fn test_freeze_restores_movement_verbatim() {
        let flags = MovementFlags::diagonal(Direction::Down, Direction::Left);
        let mut adversary = Adversary::new(AdversaryKind::Plain, Position::new(50, 50), flags);

        adversary.freeze();
        assert!(adversary.is_frozen());
        assert!(adversary.movement.is_idle());

        // Freezing twice must not overwrite the saved flags with the zeroed ones
        adversary.freeze();
        adversary.unfreeze();
        assert!(!adversary.is_frozen());
        assert_eq!(adversary.movement, flags);
    }

    #[test]
    fn test_actor_cannot_reverse_in_open() {
        let mut grid = TileGrid::bordered(6, 6);
        let mut actor = Actor::spawn(TileId::new(2, 2), TILE);
        actor.update_in_open(&grid);
        assert!(actor.is_in_open());

        actor.press(Direction::Right, &grid, TILE);
        assert!(!actor.press(Direction::Left, &grid, TILE));
        assert_eq!(actor.heading, Some(Direction::Right));

        // Captured ground forbids reversing too
        grid.set_state(TileId::new(2, 2), TileState::Captured);
        actor.update_in_open(&grid);
        assert!(!actor.press(Direction::Left, &grid, TILE));
    }

    #[test]
    fn test_actor_can_reverse_on_concrete() {
        let grid = TileGrid::bordered(6, 6);
        let mut actor = Actor::spawn(TileId::new(0, 2), TILE);
        actor.update_in_open(&grid);

        actor.press(Direction::Right, &grid, TILE);
        assert!(actor.press(Direction::Left, &grid, TILE));
        assert_eq!(actor.heading, Some(Direction::Left));
    }

    #[test]
    fn test_perpendicular_turn_in_open_marks_corner_and_snaps() {
        let grid = TileGrid::bordered(6, 6);
        let mut actor = Actor::spawn(TileId::new(2, 2), TILE);
        actor.update_in_open(&grid);
        actor.press(Direction::Down, &grid, TILE);
        actor.position.y += 4;

        actor.press(Direction::Right, &grid, TILE);
        assert!(actor.path.at_corner());
        assert_eq!(actor.position, Position::center_of(TileId::new(2, 2), TILE));
    }

    #[test]
    fn test_release_only_stops_on_concrete() {
        let grid = TileGrid::bordered(6, 6);

        let mut actor = Actor::spawn(TileId::new(2, 2), TILE);
        actor.update_in_open(&grid);
        actor.press(Direction::Up, &grid, TILE);
        actor.release(Direction::Up, &grid, TILE);
        assert_eq!(actor.heading, Some(Direction::Up));

        let mut actor = Actor::spawn(TileId::new(0, 2), TILE);
        actor.update_in_open(&grid);
        actor.press(Direction::Right, &grid, TILE);
        actor.release(Direction::Up, &grid, TILE);
        assert_eq!(actor.heading, Some(Direction::Right));
        actor.release(Direction::Right, &grid, TILE);
        assert_eq!(actor.heading, None);
    }
}
