//! Device configuration.
//!
//! Geometry, bus placement and loader identity of one device. Every field has
//! a default matching the reference build (4×4 tiles of 8×8 cells at
//! `0x3000_0000`), so an empty TOML file is a valid configuration:
//!
//! ```toml
//! [grid]
//! tile_width = 8
//! tile_height = 8
//! tiles_x = 4
//! tiles_y = 4
//!
//! [bus]
//! base = 0x3000_0000
//! grid_base = 0x3000_1000
//! grid2_base = 0x3000_2000
//!
//! [loader]
//! identity = 0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bus::{BUS_WORD_BITS, CONTROL_WINDOW, GRID_WINDOW};
use crate::error::{Result, SiLifeError};
use crate::tile::MAX_TILE_DIM;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiLifeConfig {
    pub grid: GridConfig,
    pub bus: BusConfig,
    pub loader: LoaderConfig,
}

/// Tile geometry and tile lattice size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub tile_width: usize,
    pub tile_height: usize,
    pub tiles_x: usize,
    pub tiles_y: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig { tile_width: 8, tile_height: 8, tiles_x: 4, tiles_y: 4 }
    }
}

impl GridConfig {
    pub fn width(&self) -> usize { self.tile_width * self.tiles_x }
    pub fn height(&self) -> usize { self.tile_height * self.tiles_y }
}

/// Base addresses of the three bus regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Control block (CTRL, CONFIG, DISPLAY_*)
    pub base: u32,
    /// Read/write row port
    pub grid_base: u32,
    /// Read-only row port
    pub grid2_base: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig { base: 0x3000_0000, grid_base: 0x3000_1000, grid2_base: 0x3000_2000 }
    }
}

/// Serial loader identity within a chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Tile id this device answers to (0..=0x7FFF)
    pub identity: u16,
}

impl SiLifeConfig {
    /// Single-tile device of the given size, other settings default.
    pub fn single_tile(width: usize, height: usize) -> Self {
        SiLifeConfig {
            grid: GridConfig { tile_width: width, tile_height: height, tiles_x: 1, tiles_y: 1 },
            ..Default::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: SiLifeConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SiLifeError::io(path, e))?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let g = &self.grid;
        let invalid = |msg: String| Err(SiLifeError::InvalidConfig(msg));

        if !(1..=MAX_TILE_DIM).contains(&g.tile_width) || !(1..=MAX_TILE_DIM).contains(&g.tile_height) {
            return invalid(format!(
                "tile size {}x{} outside 1..={}", g.tile_width, g.tile_height, MAX_TILE_DIM
            ));
        }
        if g.tiles_x == 0 || g.tiles_y == 0 {
            return invalid(format!("tile lattice {}x{} is empty", g.tiles_x, g.tiles_y));
        }
        if g.width() > BUS_WORD_BITS {
            return invalid(format!("grid width {} does not fit a {}-bit bus word", g.width(), BUS_WORD_BITS));
        }
        let max_rows = (GRID_WINDOW / 4) as usize;
        if g.height() > max_rows {
            return invalid(format!("grid height {} exceeds {} addressable rows", g.height(), max_rows));
        }
        if self.loader.identity > 0x7FFF {
            return invalid(format!("loader identity {:#06x} uses the reserved top bit", self.loader.identity));
        }

        let b = &self.bus;
        if b.base % 4 != 0 || b.grid_base % 4 != 0 || b.grid2_base % 4 != 0 {
            return invalid("bus base addresses must be word aligned".into());
        }
        let regions = [
            ("control", b.base, CONTROL_WINDOW),
            ("grid", b.grid_base, GRID_WINDOW),
            ("grid2", b.grid2_base, GRID_WINDOW),
        ];
        for (i, &(name_a, start_a, len_a)) in regions.iter().enumerate() {
            if start_a.checked_add(len_a).is_none() {
                return invalid(format!("{} region overflows the address space", name_a));
            }
            for &(name_b, start_b, len_b) in &regions[i + 1..] {
                let overlap = start_a < start_b.saturating_add(len_b) && start_b < start_a.saturating_add(len_a);
                if overlap {
                    return invalid(format!("{} and {} bus regions overlap", name_a, name_b));
                }
            }
        }
        Ok(())
    }
}
