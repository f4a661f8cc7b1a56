use tracing::{info, warn};

use crate::grid::{TileGrid, TileId, TileState};
use crate::trail::PathTracker;

/// A set of tiles with O(1) membership.
#[derive(Debug, Clone)]
pub struct Region {
    tiles: Vec<TileId>,
    mask: Vec<bool>,
    cols: usize,
}

impl Region {
    fn empty(grid: &TileGrid) -> Self {
        Self {
            tiles: Vec::new(),
            mask: vec![false; grid.len()],
            cols: grid.cols(),
        }
    }

    fn insert(&mut self, tile: TileId) -> bool {
        let idx = tile.row * self.cols + tile.col;
        if self.mask[idx] {
            return false;
        }
        self.mask[idx] = true;
        self.tiles.push(tile);
        true
    }

    pub fn contains(&self, tile: TileId) -> bool {
        self.mask
            .get(tile.row * self.cols + tile.col)
            .copied()
            .unwrap_or(false)
    }

    pub fn tiles(&self) -> &[TileId] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// 4-connected soil region containing `start`. Empty when `start` is not soil.
pub fn flood_fill(grid: &TileGrid, start: TileId) -> Region {
    let mut region = Region::empty(grid);
    let mut stack = vec![start];

    while let Some(tile) = stack.pop() {
        if grid.state(tile) != TileState::Soil || !region.insert(tile) {
            continue;
        }
        for (d_row, d_col) in [(0, 1), (0, -1), (1, 0), (-1, 0)] {
            if let Some(next) = grid.offset(tile, d_row, d_col) {
                stack.push(next);
            }
        }
    }

    region
}

/// Every tile that is neither concrete, trail nor part of `region`.
pub fn complement(grid: &TileGrid, region: &Region) -> Region {
    let mut other = Region::empty(grid);
    for tile in grid.tiles() {
        let state = grid.state(tile);
        if state != TileState::Concrete && !state.is_trail() && !region.contains(tile) {
            other.insert(tile);
        }
    }
    other
}

/// Outcome of closing a trail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureReport {
    /// Sizes of the regions turned into captured ground.
    pub captured_regions: Vec<usize>,
    /// Sizes of the regions left alone because an adversary stood inside.
    pub blocked_regions: Vec<usize>,
    pub trail_tiles: usize,
    /// Neither tail corner was soil, only the trail itself was captured.
    pub fallback: bool,
}

impl CaptureReport {
    pub fn captured_tiles(&self) -> usize {
        self.trail_tiles + self.captured_regions.iter().sum::<usize>()
    }
}

/// Closes the trail in `path`: fills the regions on either side of its tail
/// unless an adversary occupies them, then converts the trail itself.
pub fn capture(grid: &mut TileGrid, path: &mut PathTracker, occupied: &[TileId]) -> CaptureReport {
    let mut report = CaptureReport::default();
    let seeds: Vec<TileId> = path
        .tail_corners()
        .into_iter()
        .flatten()
        .filter(|&tile| grid.state(tile) == TileState::Soil)
        .collect();

    if seeds.is_empty() {
        report.fallback = true;
        report.trail_tiles = convert_trail(grid, path);
        warn!(trail = report.trail_tiles, "no soil behind the trail, capturing trail only");
        return report;
    }

    let first = flood_fill(grid, seeds[0]);
    let mut second = seeds
        .get(1)
        .map(|&seed| flood_fill(grid, seed))
        .unwrap_or_else(|| Region::empty(grid));
    if second.is_empty() {
        second = complement(grid, &first);
    }

    // Inherited heuristic: two equal sized regions are taken to be the same
    // region reached from both corners, so only the first one is considered.
    let check_second = !(first.len() == second.len() || second.is_empty());

    let mut regions = vec![&first];
    if check_second {
        regions.push(&second);
    }
    let mut fills = Vec::new();
    for region in regions {
        let blocked = occupied.iter().any(|&tile| region.contains(tile));
        if blocked {
            report.blocked_regions.push(region.len());
        } else {
            report.captured_regions.push(region.len());
            fills.extend_from_slice(region.tiles());
        }
    }
    for tile in fills {
        grid.set_state(tile, TileState::Captured);
    }

    report.trail_tiles = convert_trail(grid, path);
    info!(
        captured = report.captured_tiles(),
        blocked = report.blocked_regions.len(),
        "trail closed"
    );
    report
}

fn convert_trail(grid: &mut TileGrid, path: &mut PathTracker) -> usize {
    let count = path.len();
    for &tile in path.trail() {
        grid.set_state(tile, TileState::Captured);
    }
    path.clear();
    count
}
