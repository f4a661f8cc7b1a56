use tracing::debug;

use crate::entity::MovementFlags;
use crate::grid::{Neighbor, Neighborhood, TileGrid, TileId, TileState};

const TOP: [Neighbor; 3] = [Neighbor::TopLeft, Neighbor::Top, Neighbor::TopRight];
const RIGHT: [Neighbor; 3] = [Neighbor::TopRight, Neighbor::Right, Neighbor::BottomRight];
const BOTTOM: [Neighbor; 3] = [Neighbor::BottomLeft, Neighbor::Bottom, Neighbor::BottomRight];
const LEFT: [Neighbor; 3] = [Neighbor::TopLeft, Neighbor::Left, Neighbor::BottomLeft];

/// Blocked neighbours on one side needed before that side counts as a wall.
const WALL_THRESHOLD: usize = 2;

/// Axes to invert when the adversary leaves open territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reflection {
    pub vertical: bool,
    pub horizontal: bool,
}

impl Reflection {
    pub fn is_none(&self) -> bool {
        !self.vertical && !self.horizontal
    }
}

/// Looks at the non-soil neighbours and guesses which way a wall faces.
/// `None` when every neighbour is soil.
pub fn assess_walls(grid: &TileGrid, hood: &Neighborhood) -> Option<Reflection> {
    let blocked: Vec<Neighbor> = hood
        .iter()
        .filter(|&(_, tile)| grid.state(tile) != TileState::Soil)
        .map(|(slot, _)| slot)
        .collect();
    if blocked.is_empty() {
        return None;
    }
    let side = |keys: &[Neighbor; 3]| blocked.iter().filter(|&n| keys.contains(n)).count();
    Some(Reflection {
        vertical: side(&TOP) >= WALL_THRESHOLD || side(&BOTTOM) >= WALL_THRESHOLD,
        horizontal: side(&LEFT) >= WALL_THRESHOLD || side(&RIGHT) >= WALL_THRESHOLD,
    })
}

/// Per-adversary bounce bookkeeping. The pending reflection is worked out
/// while still on soil and applied once the adversary steps off it; the latch
/// keeps it to one inversion per tile visited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReflectionState {
    latched: bool,
    pending: Reflection,
    last_tile: Option<TileId>,
}

impl ReflectionState {
    pub fn is_latched(&self) -> bool {
        self.latched
    }

    pub fn pending(&self) -> Reflection {
        self.pending
    }

    /// Runs one tick for an adversary standing on `tile`. Returns the
    /// reflection applied to `movement`, if any.
    pub fn update(
        &mut self,
        grid: &TileGrid,
        tile: TileId,
        movement: &mut MovementFlags,
    ) -> Option<Reflection> {
        if self.last_tile != Some(tile) {
            self.latched = false;
            self.last_tile = Some(tile);
        }

        if grid.state(tile) == TileState::Soil {
            if !self.latched {
                let hood = grid.neighbors8(tile);
                if hood.is_complete() {
                    if let Some(reflection) = assess_walls(grid, &hood) {
                        self.pending = reflection;
                    }
                }
            }
            return None;
        }

        if tile.row == 0 || tile.row + 1 == grid.rows() {
            self.pending.vertical = true;
        }
        if tile.col == 0 || tile.col + 1 == grid.cols() {
            self.pending.horizontal = true;
        }
        if self.latched {
            return None;
        }
        self.latched = true;
        if self.pending.is_none() {
            return None;
        }

        if self.pending.vertical {
            movement.invert_vertical();
        }
        if self.pending.horizontal {
            movement.invert_horizontal();
        }
        debug!(
            row = tile.row,
            col = tile.col,
            vertical = self.pending.vertical,
            horizontal = self.pending.horizontal,
            "adversary reflected"
        );
        Some(self.pending)
    }
}
