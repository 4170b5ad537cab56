//! Fixed-size block of cells wired into a Moore-neighborhood mesh.
//!
//! A [`TileTopology`] is built once per tile geometry and records, for every
//! cell, where each of its 8 neighbors comes from: another cell of the same
//! tile, one bit of an edge input vector, or a corner input scalar. A
//! [`Tile`] only owns its cell bits; the edge and corner inputs are supplied
//! for each generation as [`TilePorts`] by the grid composer.
//!
//! Port bit numbering: north/south vectors are indexed by column, east/west
//! vectors by row. Bit 0 is column 0 (west) or row 0 (north).

use crate::cell::{self, CellInputs};

/// Largest supported tile edge; edge vectors are carried in a `u64`.
pub const MAX_TILE_DIM: usize = 64;

/// Where a cell's neighbor value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborSource {
    /// Cell of the same tile at this row-major index
    Local(usize),
    /// Bit `col` of the north input vector
    North(usize),
    /// Bit `col` of the south input vector
    South(usize),
    /// Bit `row` of the east input vector
    East(usize),
    /// Bit `row` of the west input vector
    West(usize),
    NorthEast,
    SouthEast,
    SouthWest,
    NorthWest,
}

/// Offsets (row, col) of the 8 neighbors in table order: NW, N, NE, E, SE, S, SW, W.
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1), (0, 1), (1, 1), (1, 0), (1, -1), (0, -1),
];

/// Neighbor wiring table for one tile geometry.
#[derive(Debug, Clone)]
pub struct TileTopology {
    pub width: usize,
    pub height: usize,
    neighbors: Vec<[NeighborSource; 8]>,
}

impl TileTopology {
    /// Build the wiring table for a `width` × `height` tile.
    ///
    /// Both dimensions must be in `1..=MAX_TILE_DIM`; configuration
    /// validation guarantees this before a grid is assembled.
    pub fn build(width: usize, height: usize) -> Self {
        debug_assert!((1..=MAX_TILE_DIM).contains(&width));
        debug_assert!((1..=MAX_TILE_DIM).contains(&height));

        let mut neighbors = Vec::with_capacity(width * height);
        for row in 0..height as isize {
            for col in 0..width as isize {
                let mut wiring = [NeighborSource::Local(0); 8];
                for (slot, (dr, dc)) in wiring.iter_mut().zip(NEIGHBOR_OFFSETS) {
                    *slot = Self::source(width, height, row + dr, col + dc);
                }
                neighbors.push(wiring);
            }
        }
        TileTopology { width, height, neighbors }
    }

    /// Classify a neighbor coordinate that may lie one step outside the tile.
    fn source(width: usize, height: usize, row: isize, col: isize) -> NeighborSource {
        let (w, h) = (width as isize, height as isize);
        match (row < 0, row >= h, col < 0, col >= w) {
            (true, _, true, _) => NeighborSource::NorthWest,
            (true, _, _, true) => NeighborSource::NorthEast,
            (true, _, _, _) => NeighborSource::North(col as usize),
            (_, true, true, _) => NeighborSource::SouthWest,
            (_, true, _, true) => NeighborSource::SouthEast,
            (_, true, _, _) => NeighborSource::South(col as usize),
            (_, _, true, _) => NeighborSource::West(row as usize),
            (_, _, _, true) => NeighborSource::East(row as usize),
            _ => NeighborSource::Local((row * w + col) as usize),
        }
    }

    /// Wiring of the cell at row-major `index`.
    pub fn neighbors_of(&self, index: usize) -> &[NeighborSource; 8] {
        &self.neighbors[index]
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }
}

/// Input ports of a tile for one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TilePorts {
    pub north: u64,
    pub east: u64,
    pub south: u64,
    pub west: u64,
    pub north_east: bool,
    pub south_east: bool,
    pub south_west: bool,
    pub north_west: bool,
}

impl TilePorts {
    /// All inputs driven dead (an isolated tile without wrap).
    pub const DEAD: TilePorts = TilePorts {
        north: 0, east: 0, south: 0, west: 0,
        north_east: false, south_east: false, south_west: false, north_west: false,
    };

    #[inline]
    fn sample(&self, cells: &[bool], source: NeighborSource) -> bool {
        match source {
            NeighborSource::Local(i) => cells[i],
            NeighborSource::North(c) => self.north >> c & 1 != 0,
            NeighborSource::South(c) => self.south >> c & 1 != 0,
            NeighborSource::East(r) => self.east >> r & 1 != 0,
            NeighborSource::West(r) => self.west >> r & 1 != 0,
            NeighborSource::NorthEast => self.north_east,
            NeighborSource::SouthEast => self.south_east,
            NeighborSource::SouthWest => self.south_west,
            NeighborSource::NorthWest => self.north_west,
        }
    }
}

/// Row override in tile-local coordinates: bit `c` of each mask is column `c`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowEdit {
    pub row: usize,
    pub clear: u64,
    pub set: u64,
}

/// Inputs shared by every cell of a tile on one clock edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct TileInputs {
    pub reset: bool,
    pub edit: Option<RowEdit>,
    pub advance: bool,
}

/// A `width` × `height` block of cell bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Tile {
    pub fn new(width: usize, height: usize) -> Self {
        Tile { width, height, cells: vec![false; width * height] }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.width + col]
    }

    pub fn set(&mut self, row: usize, col: usize, alive: bool) {
        self.cells[row * self.width + col] = alive;
    }

    /// Row bits, column `c` in bit `c`.
    pub fn row_bits(&self, row: usize) -> u64 {
        let start = row * self.width;
        self.cells[start..start + self.width]
            .iter()
            .enumerate()
            .fold(0u64, |acc, (c, &alive)| acc | ((alive as u64) << c))
    }

    /// Column bits, row `r` in bit `r`.
    pub fn column_bits(&self, col: usize) -> u64 {
        (0..self.height).fold(0u64, |acc, r| acc | ((self.get(r, col) as u64) << r))
    }

    pub fn north_out(&self) -> u64 { self.row_bits(0) }
    pub fn south_out(&self) -> u64 { self.row_bits(self.height - 1) }
    pub fn west_out(&self) -> u64 { self.column_bits(0) }
    pub fn east_out(&self) -> u64 { self.column_bits(self.width - 1) }
    pub fn north_west_out(&self) -> bool { self.get(0, 0) }
    pub fn north_east_out(&self) -> bool { self.get(0, self.width - 1) }
    pub fn south_west_out(&self) -> bool { self.get(self.height - 1, 0) }
    pub fn south_east_out(&self) -> bool { self.get(self.height - 1, self.width - 1) }

    /// Number of live neighbors of the cell at `index`.
    #[inline]
    pub fn live_neighbors(&self, topology: &TileTopology, ports: &TilePorts, index: usize) -> u8 {
        topology
            .neighbors_of(index)
            .iter()
            .filter(|&&src| ports.sample(&self.cells, src))
            .count() as u8
    }

    /// Compute the next cell bits without touching the current ones.
    pub fn next_cells(&self, topology: &TileTopology, ports: &TilePorts, inputs: TileInputs) -> Vec<bool> {
        let mut next = Vec::with_capacity(self.cells.len());
        for (index, &alive) in self.cells.iter().enumerate() {
            let (row, col) = (index / self.width, index % self.width);
            let (clear, set) = match inputs.edit {
                Some(edit) if edit.row == row => (edit.clear >> col & 1 != 0, edit.set >> col & 1 != 0),
                _ => (false, false),
            };
            let cell_inputs = CellInputs { reset: inputs.reset, clear, set, advance: inputs.advance };
            // Neighbor count only matters when the rule can run
            let n = if cell_inputs.advance { self.live_neighbors(topology, ports, index) } else { 0 };
            next.push(cell::decide(alive, n, cell_inputs).resolve(alive));
        }
        next
    }

    /// Replace all cell bits with a previously computed generation.
    pub fn commit(&mut self, cells: Vec<bool>) {
        debug_assert_eq!(cells.len(), self.cells.len());
        self.cells = cells;
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}
