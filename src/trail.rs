use tracing::debug;

use crate::entity::Direction;
use crate::grid::{Neighbor, Neighborhood, TileGrid, TileId, TileState};

/// Which neighbour slots sit in front of, behind and diagonally behind the
/// actor for a given heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingGeometry {
    pub front: Neighbor,
    pub back: Neighbor,
    pub tail_corners: [Neighbor; 2],
}

pub fn heading_geometry(heading: Direction) -> HeadingGeometry {
    use Neighbor::*;
    let (front, back, tail_corners) = match heading {
        Direction::Up => (Top, Bottom, [BottomLeft, BottomRight]),
        Direction::Right => (Right, Left, [TopLeft, BottomLeft]),
        Direction::Down => (Bottom, Top, [TopLeft, TopRight]),
        Direction::Left => (Left, Right, [TopRight, BottomRight]),
    };
    HeadingGeometry {
        front,
        back,
        tail_corners,
    }
}

/// A hit spreading outward along the trail from the tile an adversary touched.
/// Indices point into the trail sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HitPropagation {
    toward_start: Option<usize>,
    toward_actor: Option<usize>,
    cooldown: u32,
}

/// Trail laid by the actor while it crosses open territory.
#[derive(Debug, Clone, Default)]
pub struct PathTracker {
    trail: Vec<TileId>,
    corner: bool,
    front: Option<TileId>,
    back: Option<TileId>,
    tail_corners: [Option<TileId>; 2],
    propagation: Option<HitPropagation>,
}

impl PathTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trail tiles in the order they were laid.
    pub fn trail(&self) -> &[TileId] {
        &self.trail
    }

    pub fn len(&self) -> usize {
        self.trail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trail.is_empty()
    }

    pub fn last(&self) -> Option<TileId> {
        self.trail.last().copied()
    }

    pub fn front(&self) -> Option<TileId> {
        self.front
    }

    pub fn back(&self) -> Option<TileId> {
        self.back
    }

    pub fn tail_corners(&self) -> [Option<TileId>; 2] {
        self.tail_corners
    }

    pub fn at_corner(&self) -> bool {
        self.corner
    }

    pub fn mark_corner(&mut self) {
        self.corner = true;
    }

    /// Looks up front, back and tail corners around the actor. An idle actor
    /// keeps whatever was there before.
    pub fn orient(&mut self, heading: Option<Direction>, hood: &Neighborhood) {
        let Some(heading) = heading else {
            return;
        };
        let geometry = heading_geometry(heading);
        self.front = hood.get(geometry.front);
        self.back = hood.get(geometry.back);
        self.tail_corners = geometry.tail_corners.map(|corner| hood.get(corner));
    }

    /// Lays the tile behind the actor. After a turn the actor's own tile is
    /// laid instead, so the corner is not skipped. Returns the new trail tile.
    pub fn update_trail(&mut self, grid: &mut TileGrid, actor_tile: TileId) -> Option<TileId> {
        if std::mem::take(&mut self.corner) {
            self.back = Some(actor_tile);
        }
        let back = self.back?;
        if grid.state(back) != TileState::Soil || grid.state(actor_tile).is_trail() {
            return None;
        }
        grid.set_state(back, TileState::Trail);
        if !self.trail.contains(&back) {
            self.trail.push(back);
        }
        Some(back)
    }

    /// The most recent trail tile has been reached by a hit.
    pub fn is_caught(&self, grid: &TileGrid) -> bool {
        self.last()
            .is_some_and(|tile| grid.state(tile) == TileState::TrailHit)
    }

    pub fn is_propagating(&self) -> bool {
        self.propagation.is_some()
    }

    /// Marks `hit` and starts spreading outward from it. Ignored while another
    /// hit is spreading or when `hit` is not part of this trail.
    pub fn start_propagation(&mut self, grid: &mut TileGrid, hit: TileId) -> bool {
        if self.propagation.is_some() {
            return false;
        }
        let Some(idx) = self.trail.iter().position(|&tile| tile == hit) else {
            return false;
        };
        grid.set_state(hit, TileState::TrailHit);
        self.propagation = Some(HitPropagation {
            toward_start: idx.checked_sub(1),
            toward_actor: (idx + 1 < self.trail.len()).then_some(idx + 1),
            cooldown: 0,
        });
        debug!(row = hit.row, col = hit.col, "trail hit");
        true
    }

    /// One tick of hit propagation. Every `interval` ticks both fronts move
    /// one tile further. Returns how many tiles were marked.
    pub fn advance_propagation(&mut self, grid: &mut TileGrid, interval: u32) -> usize {
        let len = self.trail.len();
        let Some(hit) = self.propagation.as_mut() else {
            return 0;
        };
        if hit.cooldown > 0 {
            hit.cooldown -= 1;
            return 0;
        }
        hit.cooldown = interval.saturating_sub(1);

        let mut marked = 0;
        if let Some(idx) = hit.toward_start {
            grid.set_state(self.trail[idx], TileState::TrailHit);
            hit.toward_start = idx.checked_sub(1);
            marked += 1;
        }
        if let Some(idx) = hit.toward_actor {
            grid.set_state(self.trail[idx], TileState::TrailHit);
            hit.toward_actor = (idx + 1 < len).then_some(idx + 1);
            marked += 1;
        }
        marked
    }

    /// Turns every trail tile back into soil and forgets the trail.
    pub fn revert(&mut self, grid: &mut TileGrid) -> usize {
        let reverted = self.trail.len();
        for tile in self.trail.drain(..) {
            grid.set_state(tile, TileState::Soil);
        }
        self.reset();
        reverted
    }

    /// Forgets the trail without touching the grid.
    pub fn clear(&mut self) {
        self.trail.clear();
        self.reset();
    }

    fn reset(&mut self) {
        self.corner = false;
        self.propagation = None;
    }
}
