//! Cascaded serial loader.
//!
//! A 3-wire link (select, clock, data) shared by every device in a chain.
//! Data is sampled on each loader clock while select is asserted, MSB first.
//!
//! ## Frames
//!
//! ```text
//! init:      1 | tile_count[16]
//! row load:  0 | tile_id[15] | row_offset[16] | row[W] | row[W] | ...
//! ```
//!
//! The first bit tells the two apart: it is the init marker, or the reserved
//! top bit of `tile_id`. Each row payload is `W` bits (the device's logical
//! row width), the first transmitted bit landing in column 0. Consecutive
//! payloads go to consecutive rows. Completed rows are committed when select
//! is released; a partial trailing payload is dropped.
//!
//! A row load is taken by the one device whose identity equals `tile_id`.
//! The chain length from the init frame is recorded but does not gate row
//! loads. The link is open loop: frames for other devices and malformed
//! frames are silently ignored.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::grid::{width_mask, GridRowEdit};

/// Width of the tile count, tile id and row offset fields.
pub const FIELD_BITS: usize = 16;
/// Valid tile ids; the top bit of the id field is reserved.
pub const TILE_ID_MASK: u16 = 0x7FFF;

/// Pin-level access to a loader endpoint.
pub trait LoaderPins {
    /// Drive the select line (`true` = asserted).
    fn loader_select(&mut self, active: bool);
    /// One loader clock with the given data bit.
    fn loader_clock(&mut self, data: bool);
}

/// A host-side loader transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderFrame {
    Init { tile_count: u16 },
    Rows { tile_id: u16, row_offset: u16, rows: Vec<u64> },
}

impl LoaderFrame {
    /// Serialize to the bit sequence shifted while select is asserted.
    ///
    /// `rows` use the bus layout (column `c` in bit `c`) and are sent
    /// column 0 first.
    pub fn encode(&self, row_width: usize) -> Vec<bool> {
        let mut bits = Vec::new();
        match self {
            LoaderFrame::Init { tile_count } => {
                bits.push(true);
                push_msb_first(&mut bits, *tile_count as u64, FIELD_BITS);
            }
            LoaderFrame::Rows { tile_id, row_offset, rows } => {
                push_msb_first(&mut bits, (*tile_id & TILE_ID_MASK) as u64, FIELD_BITS);
                push_msb_first(&mut bits, *row_offset as u64, FIELD_BITS);
                for &row in rows {
                    bits.extend((0..row_width).map(|c| row >> c & 1 != 0));
                }
            }
        }
        bits
    }

    /// Drive a complete transaction onto every endpoint of a chain.
    pub fn transmit<P: LoaderPins>(&self, chain: &mut [P], row_width: usize) {
        let bits = self.encode(row_width);
        for device in chain.iter_mut() {
            device.loader_select(true);
        }
        for &bit in &bits {
            for device in chain.iter_mut() {
                device.loader_clock(bit);
            }
        }
        for device in chain.iter_mut() {
            device.loader_select(false);
        }
    }
}

fn push_msb_first(bits: &mut Vec<bool>, value: u64, width: usize) {
    bits.extend((0..width).rev().map(|i| value >> i & 1 != 0));
}

/// Receiver position within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Select released
    Idle,
    /// Waiting for the first bit
    Start,
    /// Shifting the tile count
    Init,
    /// Shifting the remaining tile id bits
    TileId,
    RowOffset,
    Payload,
    /// Frame not for us, or overrun; ignore until select is released
    Ignore,
}

/// Loader receiver of one device.
#[derive(Debug, Clone)]
pub struct SerialLoader {
    identity: u16,
    row_width: usize,
    row_count: usize,
    /// Chain length from the last init frame
    pub chain_length: Option<u16>,
    phase: Phase,
    shift: u64,
    bits: usize,
    row: usize,
    /// Rows completed in the current transaction
    staged: Vec<GridRowEdit>,
    /// Committed rows waiting for a clock edge
    queue: VecDeque<GridRowEdit>,
    /// Select releases seen
    pub transactions: u64,
}

impl SerialLoader {
    /// Receiver answering to `identity` for a grid of `row_width` × `row_count`.
    pub fn new(identity: u16, row_width: usize, row_count: usize) -> Self {
        SerialLoader {
            identity: identity & TILE_ID_MASK,
            row_width,
            row_count,
            chain_length: None,
            phase: Phase::Idle,
            shift: 0,
            bits: 0,
            row: 0,
            staged: Vec::new(),
            queue: VecDeque::new(),
            transactions: 0,
        }
    }

    pub fn identity(&self) -> u16 {
        self.identity
    }

    /// Clear receiver state and pending rows. Identity is kept.
    pub fn reset(&mut self) {
        *self = SerialLoader::new(self.identity, self.row_width, self.row_count);
    }

    /// Rows waiting to be written into the grid.
    pub fn pending_rows(&self) -> usize {
        self.queue.len()
    }

    /// Next committed row edit; one is applied per clock edge.
    pub fn take_row_edit(&mut self) -> Option<GridRowEdit> {
        self.queue.pop_front()
    }

    fn shift_in(&mut self, data: bool) {
        self.shift = (self.shift << 1) | data as u64;
        self.bits += 1;
    }

    fn restart_field(&mut self, phase: Phase) {
        self.phase = phase;
        self.shift = 0;
        self.bits = 0;
    }

    fn finish(&mut self) {
        match self.phase {
            Phase::Init if self.bits == FIELD_BITS => {
                let count = self.shift as u16;
                self.chain_length = Some(count);
                debug!(identity = self.identity, chain_length = count, "loader init");
            }
            _ if !self.staged.is_empty() => {
                let rows = self.staged.len();
                self.queue.extend(self.staged.drain(..));
                debug!(identity = self.identity, rows, "loader commit");
            }
            _ => {}
        }
        self.staged.clear();
        self.restart_field(Phase::Idle);
    }
}

impl LoaderPins for SerialLoader {
    fn loader_select(&mut self, active: bool) {
        match (active, self.phase) {
            (true, Phase::Idle) => self.restart_field(Phase::Start),
            (false, Phase::Idle) | (true, _) => {}
            (false, _) => {
                self.transactions += 1;
                self.finish();
            }
        }
    }

    fn loader_clock(&mut self, data: bool) {
        match self.phase {
            Phase::Idle | Phase::Ignore => {}
            Phase::Start => {
                if data {
                    self.restart_field(Phase::Init);
                } else {
                    // Reserved id bit counts towards the id field
                    self.restart_field(Phase::TileId);
                    self.bits = 1;
                }
            }
            Phase::Init => {
                if self.bits == FIELD_BITS {
                    trace!("loader init overrun");
                    self.phase = Phase::Ignore;
                } else {
                    self.shift_in(data);
                }
            }
            Phase::TileId => {
                self.shift_in(data);
                if self.bits == FIELD_BITS {
                    let tile_id = self.shift as u16;
                    if tile_id == self.identity {
                        self.restart_field(Phase::RowOffset);
                    } else {
                        trace!(tile_id, identity = self.identity, "loader frame for another device");
                        self.phase = Phase::Ignore;
                    }
                }
            }
            Phase::RowOffset => {
                self.shift_in(data);
                if self.bits == FIELD_BITS {
                    self.row = self.shift as usize;
                    self.restart_field(Phase::Payload);
                }
            }
            Phase::Payload => {
                // Column 0 arrives first and ends up in bit 0
                self.shift = (self.shift >> 1) | ((data as u64) << (self.row_width - 1));
                self.bits += 1;
                if self.bits == self.row_width {
                    if self.row < self.row_count {
                        let bits = self.shift & width_mask(self.row_width);
                        self.staged.push(GridRowEdit::overwrite(self.row, bits, self.row_width));
                    }
                    self.row += 1;
                    self.shift = 0;
                    self.bits = 0;
                }
            }
        }
    }
}
