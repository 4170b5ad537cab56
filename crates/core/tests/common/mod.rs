//! Naive Game of Life used as the oracle for the integration tests.
//!
//! Plain 2-D array, modular arithmetic for the toroid, no tiles.

#![allow(dead_code)]

use silife_core::{SiLife, SiLifeConfig};

pub struct GameOfLife {
    pub width: usize,
    pub height: usize,
    pub wrap: bool,
    cells: Vec<Vec<bool>>,
}

impl GameOfLife {
    pub fn new(width: usize, height: usize, wrap: bool) -> Self {
        GameOfLife { width, height, wrap, cells: vec![vec![false; width]; height] }
    }

    /// Stamp `*` cells of `pattern` with its top-left at `(row, col)`.
    pub fn load(&mut self, pattern: &[&str], (row, col): (usize, usize)) {
        for (r, line) in pattern.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                if ch == '*' {
                    self.cells[(row + r) % self.height][(col + c) % self.width] = true;
                }
            }
        }
    }

    pub fn from_rows(rows: &[u64], width: usize, wrap: bool) -> Self {
        let mut model = GameOfLife::new(width, rows.len(), wrap);
        for (r, &bits) in rows.iter().enumerate() {
            for c in 0..width {
                model.cells[r][c] = bits >> c & 1 != 0;
            }
        }
        model
    }

    fn neighbors(&self, row: usize, col: usize) -> usize {
        let (h, w) = (self.height as isize, self.width as isize);
        let mut n = 0;
        for dr in -1..=1isize {
            for dc in -1..=1isize {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let (mut r, mut c) = (row as isize + dr, col as isize + dc);
                if self.wrap {
                    r = r.rem_euclid(h);
                    c = c.rem_euclid(w);
                } else if r < 0 || r >= h || c < 0 || c >= w {
                    continue;
                }
                if self.cells[r as usize][c as usize] {
                    n += 1;
                }
            }
        }
        n
    }

    pub fn step(&mut self) {
        let next: Vec<Vec<bool>> = (0..self.height)
            .map(|r| {
                (0..self.width)
                    .map(|c| matches!((self.cells[r][c], self.neighbors(r, c)), (true, 2) | (_, 3)))
                    .collect::<Vec<bool>>()
            })
            .collect();
        self.cells = next;
    }

    pub fn rows(&self) -> Vec<u64> {
        self.cells
            .iter()
            .map(|line| line.iter().enumerate().fold(0u64, |acc, (c, &alive)| acc | ((alive as u64) << c)))
            .collect()
    }

    pub fn dump(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|line| line.iter().map(|&alive| if alive { '*' } else { ' ' }).collect())
            .collect()
    }
}

/// Rows in bus layout from reference-format strings.
pub fn rows_from_strings(lines: &[&str]) -> Vec<u64> {
    lines
        .iter()
        .map(|line| line.chars().enumerate().fold(0u64, |acc, (c, ch)| acc | (((ch == '*') as u64) << c)))
        .collect()
}

/// A device of `tiles_x` × `tiles_y` tiles of `tile_w` × `tile_h` cells.
pub fn device(tile_w: usize, tile_h: usize, tiles_x: usize, tiles_y: usize) -> SiLife {
    let mut config = SiLifeConfig::default();
    config.grid.tile_width = tile_w;
    config.grid.tile_height = tile_h;
    config.grid.tiles_x = tiles_x;
    config.grid.tiles_y = tiles_y;
    SiLife::new(config).unwrap()
}
