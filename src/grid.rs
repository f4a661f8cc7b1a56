use serde::Serialize;

use crate::error::MapDefect;

/// Marker used by text maps for concrete tiles. Every other character is soil.
pub const CONCRETE_MARKER: char = 'X';

/// A tile address. Rows grow downward, columns grow to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TileId {
    pub row: usize,
    pub col: usize,
}

impl TileId {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TileState {
    #[default]
    Soil,
    Concrete,
    Captured,
    Trail,
    TrailHit,
}

impl TileState {
    /// Trail tiles, hit or not.
    pub fn is_trail(self) -> bool {
        matches!(self, TileState::Trail | TileState::TrailHit)
    }

    /// Tiles where the actor can't be attacked and stops laying a trail.
    pub fn is_safe(self) -> bool {
        matches!(self, TileState::Concrete | TileState::Captured)
    }
}

/// Slots of the 8-neighbourhood, numbered like a keypad read left to right:
///
/// ```text
/// 1 2 3
/// 4 o 5
/// 6 7 8
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Neighbor {
    TopLeft = 1,
    Top = 2,
    TopRight = 3,
    Left = 4,
    Right = 5,
    BottomLeft = 6,
    Bottom = 7,
    BottomRight = 8,
}

impl Neighbor {
    pub const ALL: [Neighbor; 8] = [
        Neighbor::TopLeft,
        Neighbor::Top,
        Neighbor::TopRight,
        Neighbor::Left,
        Neighbor::Right,
        Neighbor::BottomLeft,
        Neighbor::Bottom,
        Neighbor::BottomRight,
    ];

    /// (row, col) offset from the centre tile.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Neighbor::TopLeft => (-1, -1),
            Neighbor::Top => (-1, 0),
            Neighbor::TopRight => (-1, 1),
            Neighbor::Left => (0, -1),
            Neighbor::Right => (0, 1),
            Neighbor::BottomLeft => (1, -1),
            Neighbor::Bottom => (1, 0),
            Neighbor::BottomRight => (1, 1),
        }
    }

    fn slot(self) -> usize {
        self as usize - 1
    }
}

/// The neighbours of one tile. Slots outside the grid are empty, so a corner
/// tile has 3 neighbours, an edge tile 5 and an interior tile 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighborhood {
    slots: [Option<TileId>; 8],
}

impl Neighborhood {
    pub fn get(&self, neighbor: Neighbor) -> Option<TileId> {
        self.slots[neighbor.slot()]
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_complete(&self) -> bool {
        self.len() == 8
    }

    pub fn iter(&self) -> impl Iterator<Item = (Neighbor, TileId)> + '_ {
        Neighbor::ALL
            .iter()
            .filter_map(|&n| self.get(n).map(|tile| (n, tile)))
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct TileGrid {
    rows: usize,
    cols: usize,
    tiles: Vec<TileState>,
}

impl TileGrid {
    /// An all-soil grid surrounded by a one tile concrete border.
    pub fn bordered(rows: usize, cols: usize) -> Self {
        let mut grid = Self {
            rows,
            cols,
            tiles: vec![TileState::Soil; rows * cols],
        };
        for row in 0..rows {
            for col in 0..cols {
                let tile = TileId::new(row, col);
                if grid.is_border(tile) {
                    grid.set_state(tile, TileState::Concrete);
                }
            }
        }
        grid
    }

    /// Parses a text map, one row per line. The whole map is rejected if rows
    /// differ in length or any border tile is not concrete.
    pub fn from_layout(layout: &str) -> Result<Self, MapDefect> {
        let lines: Vec<&str> = layout
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect();
        let rows = lines
            .iter()
            .rposition(|line| !line.is_empty())
            .map_or(0, |last| last + 1);
        if rows == 0 {
            return Err(MapDefect::Empty);
        }

        let cols = lines[0].chars().count();
        let mut tiles = Vec::with_capacity(rows * cols);
        for (row, line) in lines[..rows].iter().enumerate() {
            let found = line.chars().count();
            if found != cols {
                return Err(MapDefect::Ragged {
                    row,
                    expected: cols,
                    found,
                });
            }
            tiles.extend(line.chars().map(|c| {
                if c == CONCRETE_MARKER {
                    TileState::Concrete
                } else {
                    TileState::Soil
                }
            }));
        }

        let grid = Self { rows, cols, tiles };
        if let Some(tile) = grid
            .tiles()
            .find(|&tile| grid.is_border(tile) && grid.state(tile) != TileState::Concrete)
        {
            return Err(MapDefect::OpenBorder {
                row: tile.row,
                col: tile.col,
            });
        }
        Ok(grid)
    }

    /// Inverse of `from_layout`. Only concrete survives the round trip, every
    /// other state is written as soil.
    pub fn to_layout(&self) -> String {
        let mut text = String::with_capacity(self.rows * (self.cols + 1));
        for row in 0..self.rows {
            for col in 0..self.cols {
                text.push(match self.state(TileId::new(row, col)) {
                    TileState::Concrete => CONCRETE_MARKER,
                    _ => '.',
                });
            }
            text.push('\n');
        }
        text
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, tile: TileId) -> bool {
        tile.row < self.rows && tile.col < self.cols
    }

    pub fn is_border(&self, tile: TileId) -> bool {
        tile.row == 0 || tile.col == 0 || tile.row + 1 == self.rows || tile.col + 1 == self.cols
    }

    pub fn index_of(&self, tile: TileId) -> usize {
        tile.row * self.cols + tile.col
    }

    pub fn state(&self, tile: TileId) -> TileState {
        self.tiles[self.index_of(tile)]
    }

    /// The only way tile state changes. A tile holds exactly one state, so
    /// setting a new one drops whatever was there.
    pub fn set_state(&mut self, tile: TileId, state: TileState) {
        let idx = self.index_of(tile);
        self.tiles[idx] = state;
    }

    /// Tile at a signed offset from `tile`, if it lies inside the grid.
    pub fn offset(&self, tile: TileId, d_row: isize, d_col: isize) -> Option<TileId> {
        let row = tile.row.checked_add_signed(d_row)?;
        let col = tile.col.checked_add_signed(d_col)?;
        let next = TileId::new(row, col);
        self.contains(next).then_some(next)
    }

    pub fn neighbors8(&self, tile: TileId) -> Neighborhood {
        let mut slots = [None; 8];
        for neighbor in Neighbor::ALL {
            let (d_row, d_col) = neighbor.offset();
            slots[neighbor.slot()] = self.offset(tile, d_row, d_col);
        }
        Neighborhood { slots }
    }

    /// Row-major iterator over every tile address.
    pub fn tiles(&self) -> impl Iterator<Item = TileId> + '_ {
        let cols = self.cols;
        (0..self.tiles.len()).map(move |idx| TileId::new(idx / cols, idx % cols))
    }

    pub fn tiles_in(&self, state: TileState) -> impl Iterator<Item = TileId> + '_ {
        self.tiles().filter(move |&tile| self.state(tile) == state)
    }

    pub fn count(&self, state: TileState) -> usize {
        self.tiles.iter().filter(|&&s| s == state).count()
    }

    /// Captured share of the playable (non-concrete) area, rounded up to a
    /// whole percent.
    pub fn score(&self) -> u32 {
        let playable = self.len() - self.count(TileState::Concrete);
        if playable == 0 {
            return 0;
        }
        let captured = self.count(TileState::Captured);
        ((captured * 100).div_ceil(playable)) as u32
    }
}

impl std::fmt::Debug for TileGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileGrid")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("captured", &self.count(TileState::Captured))
            .field("trail", &(self.count(TileState::Trail) + self.count(TileState::TrailHit)))
            .finish()
    }
}
