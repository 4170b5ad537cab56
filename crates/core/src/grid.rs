//! Grid composer: stitches Tx × Ty tiles into one logical automaton surface.
//!
//! Tiles live in an arena (`Vec<Tile>`, row-major by tile coordinate). At
//! assembly time every tile gets the arena index of its neighbor in each of
//! the 8 directions, computed toroidally, plus a flag telling whether that
//! link crosses the grid perimeter. When wrap is off, perimeter links are
//! replaced by dead inputs, so only perimeter cells can ever observe the
//! wrap setting.
//!
//! A generation is computed in two phases: all tile input ports are sampled
//! from the committed state first, then every tile computes and commits its
//! next cells. No tile can see a neighbor's new value within a generation.

use crate::tile::{RowEdit, Tile, TileInputs, TilePorts, TileTopology};

/// The 8 compass directions, in the order neighbor links are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North, Direction::NorthEast, Direction::East, Direction::SouthEast,
        Direction::South, Direction::SouthWest, Direction::West, Direction::NorthWest,
    ];

    /// Tile-coordinate offset (dx, dy); north is -y.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }
}

/// Resolved neighbor links of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLinks {
    /// Arena index of the neighbor in each direction (toroidal)
    pub neighbor: [usize; 8],
    /// True where the link crosses the grid perimeter
    pub crosses_perimeter: [bool; 8],
}

impl TileLinks {
    /// Neighbor index under the given boundary policy.
    #[inline]
    pub fn resolve(&self, dir: Direction, wrap: bool) -> Option<usize> {
        let i = dir as usize;
        if self.crosses_perimeter[i] && !wrap {
            None
        } else {
            Some(self.neighbor[i])
        }
    }
}

/// Clock-edge inputs for the whole grid. Row edits use logical coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridInputs {
    pub reset: bool,
    pub edit: Option<GridRowEdit>,
    pub advance: bool,
    pub wrap: bool,
}

/// Row override on a logical row: bit `c` of each mask is logical column `c`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridRowEdit {
    pub row: usize,
    pub clear: u64,
    pub set: u64,
}

impl GridRowEdit {
    /// Absolute overwrite of a row: every column is either cleared or set.
    pub fn overwrite(row: usize, bits: u64, width: usize) -> Self {
        let mask = width_mask(width);
        GridRowEdit { row, clear: !bits & mask, set: bits & mask }
    }
}

#[inline]
pub(crate) fn width_mask(width: usize) -> u64 {
    if width >= 64 { u64::MAX } else { (1u64 << width) - 1 }
}

/// Tx × Ty tiles composed into a GRID_WIDTH × GRID_HEIGHT surface.
#[derive(Debug, Clone)]
pub struct Grid {
    tiles_x: usize,
    tiles_y: usize,
    topology: TileTopology,
    tiles: Vec<Tile>,
    links: Vec<TileLinks>,
    /// Number of committed generations advanced by the Life rule
    pub generation: u64,
}

impl Grid {
    /// Assemble `tiles_x` × `tiles_y` tiles of `tile_width` × `tile_height` cells.
    pub fn new(tile_width: usize, tile_height: usize, tiles_x: usize, tiles_y: usize) -> Self {
        let topology = TileTopology::build(tile_width, tile_height);
        let tiles = (0..tiles_x * tiles_y).map(|_| Tile::new(tile_width, tile_height)).collect();
        let links = Self::link_tiles(tiles_x, tiles_y);
        Grid { tiles_x, tiles_y, topology, tiles, links, generation: 0 }
    }

    fn link_tiles(tiles_x: usize, tiles_y: usize) -> Vec<TileLinks> {
        let (tx_n, ty_n) = (tiles_x as isize, tiles_y as isize);
        let mut links = Vec::with_capacity(tiles_x * tiles_y);
        for ty in 0..ty_n {
            for tx in 0..tx_n {
                let mut neighbor = [0usize; 8];
                let mut crosses_perimeter = [false; 8];
                for dir in Direction::ALL {
                    let (dx, dy) = dir.offset();
                    let (nx, ny) = (tx + dx, ty + dy);
                    crosses_perimeter[dir as usize] = nx < 0 || nx >= tx_n || ny < 0 || ny >= ty_n;
                    let (wx, wy) = (nx.rem_euclid(tx_n), ny.rem_euclid(ty_n));
                    neighbor[dir as usize] = (wy * tx_n + wx) as usize;
                }
                links.push(TileLinks { neighbor, crosses_perimeter });
            }
        }
        links
    }

    pub fn tile_width(&self) -> usize { self.topology.width }
    pub fn tile_height(&self) -> usize { self.topology.height }
    pub fn tiles_x(&self) -> usize { self.tiles_x }
    pub fn tiles_y(&self) -> usize { self.tiles_y }
    pub fn width(&self) -> usize { self.tiles_x * self.topology.width }
    pub fn height(&self) -> usize { self.tiles_y * self.topology.height }

    pub fn tile(&self, tx: usize, ty: usize) -> &Tile {
        &self.tiles[ty * self.tiles_x + tx]
    }

    pub fn links(&self, tx: usize, ty: usize) -> &TileLinks {
        &self.links[ty * self.tiles_x + tx]
    }

    /// Gather the input ports of the tile at arena index `index`.
    pub fn ports_for(&self, index: usize, wrap: bool) -> TilePorts {
        let links = &self.links[index];
        let tile = |dir: Direction| links.resolve(dir, wrap).map(|i| &self.tiles[i]);
        TilePorts {
            north: tile(Direction::North).map_or(0, Tile::south_out),
            east: tile(Direction::East).map_or(0, Tile::west_out),
            south: tile(Direction::South).map_or(0, Tile::north_out),
            west: tile(Direction::West).map_or(0, Tile::east_out),
            north_east: tile(Direction::NorthEast).is_some_and(Tile::south_west_out),
            south_east: tile(Direction::SouthEast).is_some_and(Tile::north_west_out),
            south_west: tile(Direction::SouthWest).is_some_and(Tile::north_east_out),
            north_west: tile(Direction::NorthWest).is_some_and(Tile::south_east_out),
        }
    }

    /// Evaluate one clock edge on every cell and commit the result.
    pub fn clock(&mut self, inputs: &GridInputs) {
        if !inputs.reset && inputs.edit.is_none() && !inputs.advance {
            return;
        }

        // Phase 1: sample every tile's ports from the committed generation.
        let ports: Vec<TilePorts> = if inputs.advance {
            (0..self.tiles.len()).map(|i| self.ports_for(i, inputs.wrap)).collect()
        } else {
            vec![TilePorts::DEAD; self.tiles.len()]
        };

        // Phase 2: compute all next states, then commit.
        let (tw, th) = (self.topology.width, self.topology.height);
        let next: Vec<Vec<bool>> = self
            .tiles
            .iter()
            .enumerate()
            .map(|(i, tile)| {
                let (tx, ty) = (i % self.tiles_x, i / self.tiles_x);
                let edit = inputs.edit.and_then(|e| {
                    if e.row / th != ty {
                        return None;
                    }
                    let shift = (tx * tw) as u32;
                    let mask = width_mask(tw);
                    let slice = |bits: u64| bits.checked_shr(shift).unwrap_or(0) & mask;
                    Some(RowEdit { row: e.row % th, clear: slice(e.clear), set: slice(e.set) })
                });
                let tile_inputs = TileInputs { reset: inputs.reset, edit, advance: inputs.advance };
                tile.next_cells(&self.topology, &ports[i], tile_inputs)
            })
            .collect();

        for (tile, cells) in self.tiles.iter_mut().zip(next) {
            tile.commit(cells);
        }
        if inputs.advance && !inputs.reset {
            self.generation += 1;
        }
    }

    /// Advance one generation with no overrides.
    pub fn step(&mut self, wrap: bool) {
        self.clock(&GridInputs { advance: true, wrap, ..Default::default() });
    }

    /// Logical row bits, column `c` in bit `c`. Out-of-range rows read as zero.
    /// Columns past 63 are not representable and read as zero.
    pub fn read_row(&self, row: usize) -> u64 {
        if row >= self.height() {
            return 0;
        }
        let (tw, th) = (self.topology.width, self.topology.height);
        let ty = row / th;
        (0..self.tiles_x).fold(0u64, |acc, tx| {
            let bits = self.tile(tx, ty).row_bits(row % th);
            acc | bits.checked_shl((tx * tw) as u32).unwrap_or(0)
        })
    }

    /// Overwrite a logical row directly, outside the clocked path.
    pub fn write_row(&mut self, row: usize, bits: u64) {
        if row >= self.height() {
            return;
        }
        for col in 0..self.width().min(64) {
            self.set(row, col, bits >> col & 1 != 0);
        }
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        let (tw, th) = (self.topology.width, self.topology.height);
        self.tile(col / tw, row / th).get(row % th, col % tw)
    }

    pub fn set(&mut self, row: usize, col: usize, alive: bool) {
        let (tw, th) = (self.topology.width, self.topology.height);
        let index = (row / th) * self.tiles_x + col / tw;
        self.tiles[index].set(row % th, col % tw, alive);
    }

    pub fn population(&self) -> usize {
        self.tiles.iter().map(Tile::population).sum()
    }

    /// All logical rows, top to bottom.
    pub fn rows(&self) -> Vec<u64> {
        (0..self.height()).map(|r| self.read_row(r)).collect()
    }

    /// Render as rows of `*` (alive) and ` ` (dead).
    pub fn dump(&self) -> Vec<String> {
        (0..self.height())
            .map(|r| (0..self.width()).map(|c| if self.get(r, c) { '*' } else { ' ' }).collect())
            .collect()
    }

    /// True if the cell touches the grid perimeter.
    pub fn is_perimeter(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row + 1 == self.height() || col + 1 == self.width()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let grid = Grid::new(8, 8, 4, 2);
        assert_eq!(grid.width(), 32);
        assert_eq!(grid.height(), 16);
    }

    #[test]
    fn test_links_interior_and_perimeter() {
        let grid = Grid::new(8, 8, 3, 3);
        let center = grid.links(1, 1);
        assert!(center.crosses_perimeter.iter().all(|&c| !c));
        assert_eq!(center.resolve(Direction::NorthWest, false), Some(0));
        assert_eq!(center.resolve(Direction::SouthEast, false), Some(8));

        let corner = grid.links(0, 0);
        assert_eq!(corner.resolve(Direction::NorthWest, false), None);
        assert_eq!(corner.resolve(Direction::NorthWest, true), Some(8));
        assert_eq!(corner.resolve(Direction::North, true), Some(6));
        assert_eq!(corner.resolve(Direction::East, false), Some(1));
    }

    #[test]
    fn test_single_tile_wraps_onto_itself() {
        let grid = Grid::new(4, 4, 1, 1);
        let links = grid.links(0, 0);
        for dir in Direction::ALL {
            assert_eq!(links.resolve(dir, true), Some(0));
            assert_eq!(links.resolve(dir, false), None);
        }
    }

    #[test]
    fn test_row_read_spans_tiles() {
        let mut grid = Grid::new(8, 8, 4, 1);
        grid.write_row(3, 0x8000_0101);
        assert_eq!(grid.read_row(3), 0x8000_0101);
        assert!(grid.get(3, 0));
        assert!(grid.get(3, 8));
        assert!(grid.get(3, 31));
        assert!(grid.tile(3, 0).get(3, 7));
        assert_eq!(grid.read_row(99), 0);
    }

    #[test]
    fn test_blinker_across_tile_seam() {
        // Horizontal blinker centered on the seam between two tiles
        let mut grid = Grid::new(4, 4, 2, 1);
        grid.write_row(1, 0b0011_1000);
        grid.step(false);
        assert_eq!(grid.read_row(0), 0b0001_0000);
        assert_eq!(grid.read_row(1), 0b0001_0000);
        assert_eq!(grid.read_row(2), 0b0001_0000);
        grid.step(false);
        assert_eq!(grid.read_row(1), 0b0011_1000);
        assert_eq!(grid.generation, 2);
    }

    #[test]
    fn test_wrap_corner_diagonal() {
        // Three cells in the corners feed the opposite corner only under wrap.
        let mut grid = Grid::new(4, 4, 2, 2);
        grid.set(0, 0, true);
        grid.set(0, 7, true);
        grid.set(7, 0, true);
        let mut wrapped = grid.clone();
        wrapped.step(true);
        assert!(wrapped.get(7, 7));
        grid.step(false);
        assert!(!grid.get(7, 7));
    }

    #[test]
    fn test_edit_applies_to_correct_tile() {
        let mut grid = Grid::new(4, 4, 2, 2);
        let edit = GridRowEdit::overwrite(5, 0b1001_0110, 8);
        grid.clock(&GridInputs { edit: Some(edit), ..Default::default() });
        assert_eq!(grid.read_row(5), 0b1001_0110);
        assert_eq!(grid.tile(1, 1).row_bits(1), 0b1001);
        assert_eq!(grid.tile(0, 1).row_bits(1), 0b0110);
        assert_eq!(grid.generation, 0);
    }

    #[test]
    fn test_dump_format() {
        let mut grid = Grid::new(4, 2, 1, 1);
        grid.write_row(0, 0b0101);
        assert_eq!(grid.dump(), vec!["* * ".to_string(), "    ".to_string()]);
    }
}
