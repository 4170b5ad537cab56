//! Save state (quick save / quick load) for a SiLife device.
//!
//! Captures the grid and register state to a file using bincode
//! serialization with deflate compression (F5 save, F9 load in the GUI).
//!
//! ## File format
//!
//! ```text
//! +------------------+
//! | Magic "SLFS"     |  4 bytes
//! +------------------+
//! | Format version   |  u32 little-endian (currently 1)
//! +------------------+
//! | Compressed data  |  deflate-compressed bincode payload
//! +------------------+
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SiLifeError};
use crate::grid::Grid;

/// Magic bytes identifying a silife save state file.
const MAGIC: &[u8; 4] = b"SLFS";
/// Current save state format version.
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveState {
    // Geometry
    pub tile_width: u32,
    pub tile_height: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,

    // Grid, column c in bit c
    pub rows: Vec<u64>,
    pub generation: u64,
    pub cycle: u64,

    // Register images as read from the bus
    pub ctrl: u32,
    pub config: u32,
    pub display_ctrl: u32,
    pub display_config: u32,
    pub brightness: u32,
}

impl SaveState {
    pub fn width(&self) -> usize { (self.tile_width * self.tiles_x) as usize }
    pub fn height(&self) -> usize { (self.tile_height * self.tiles_y) as usize }

    /// Fail unless the state was taken from a grid of the same logical size.
    pub fn check_dimensions(&self, grid: &Grid) -> Result<()> {
        if self.width() != grid.width() || self.height() != grid.height() || self.rows.len() != grid.height() {
            return Err(SiLifeError::DimensionMismatch {
                found_w: self.width(),
                found_h: self.height(),
                expected_w: grid.width(),
                expected_h: grid.height(),
            });
        }
        Ok(())
    }
}

/// Serialize to the on-disk representation.
pub fn encode(state: &SaveState) -> Result<Vec<u8>> {
    let payload = bincode::serialize(state)?;
    let compressed = miniz_oxide::deflate::compress_to_vec(&payload, 6);

    let mut out = Vec::with_capacity(HEADER_LEN + compressed.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&compressed);
    Ok(out)
}

/// Parse the on-disk representation, verifying magic and version.
pub fn decode(data: &[u8]) -> Result<SaveState> {
    if data.len() < HEADER_LEN {
        return Err(SiLifeError::BadSaveState("file too small"));
    }
    if &data[0..4] != MAGIC {
        return Err(SiLifeError::BadSaveState("bad magic"));
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != FORMAT_VERSION {
        return Err(SiLifeError::SaveStateVersion { found: version, expected: FORMAT_VERSION });
    }

    let decompressed = miniz_oxide::inflate::decompress_to_vec(&data[HEADER_LEN..])
        .map_err(|e| SiLifeError::Decompress(format!("{:?}", e.status)))?;
    Ok(bincode::deserialize(&decompressed)?)
}

/// Save state to file with header and deflate compression.
pub fn save_to_file(state: &SaveState, path: &Path) -> Result<()> {
    let out = encode(state)?;
    std::fs::write(path, out).map_err(|e| SiLifeError::io(path, e))
}

/// Load state from file, verifying magic and version.
pub fn load_from_file(path: &Path) -> Result<SaveState> {
    let data = std::fs::read(path).map_err(|e| SiLifeError::io(path, e))?;
    decode(&data)
}

/// Derive save state file path from a pattern path.
/// `glider.cells` → `glider.state`
pub fn state_path(pattern_path: &Path) -> std::path::PathBuf {
    let stem = pattern_path.file_stem().and_then(|s| s.to_str()).unwrap_or("silife");
    let dir = pattern_path.parent().unwrap_or(Path::new("."));
    dir.join(format!("{}.state", stem))
}
