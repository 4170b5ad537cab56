//! Register bus address decoding and the control register block.
//!
//! The bus is byte addressed with 32-bit data words. Three regions are
//! placed by [`BusConfig`]:
//!
//! ```text
//! base + 0x00  CTRL            bit0 enable, bit1 pulse (one-shot)
//! base + 0x04  CONFIG          bit0 wrap
//! base + 0x10  DISPLAY_CTRL    bit0 enable, bit1 pause, bit2 frame, bit3 busy (ro)
//! base + 0x14  DISPLAY_CONFIG  bit0 reverse_cols, bit1 serpentine
//! base + 0x18  BRIGHTNESS      bits 3:0
//! grid_base  + row*4           row port 1 (read/write)
//! grid2_base + row*4           row port 2 (read only)
//! ```
//!
//! Every request is acknowledged. Unmapped addresses read as zero and
//! swallow writes.

use crate::config::BusConfig;

/// Data bus width in bits; a logical grid row must fit in one word.
pub const BUS_WORD_BITS: usize = 32;
/// Size of the control register block in bytes.
pub const CONTROL_WINDOW: u32 = 0x20;
/// Size of each row window in bytes (1024 rows).
pub const GRID_WINDOW: u32 = 0x1000;

pub const REG_CTRL: u32 = 0x00;
pub const REG_CONFIG: u32 = 0x04;
pub const REG_DISPLAY_CTRL: u32 = 0x10;
pub const REG_DISPLAY_CONFIG: u32 = 0x14;
pub const REG_BRIGHTNESS: u32 = 0x18;

pub const CTRL_ENABLE: u32 = 1 << 0;
pub const CTRL_PULSE: u32 = 1 << 1;

pub const CONFIG_WRAP: u32 = 1 << 0;

pub const DISPLAY_ENABLE: u32 = 1 << 0;
pub const DISPLAY_PAUSE: u32 = 1 << 1;
pub const DISPLAY_FRAME: u32 = 1 << 2;
pub const DISPLAY_BUSY: u32 = 1 << 3;

pub const DISPLAY_REVERSE_COLS: u32 = 1 << 0;
pub const DISPLAY_SERPENTINE: u32 = 1 << 1;

/// A decoded bus target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Ctrl,
    Config,
    DisplayCtrl,
    DisplayConfig,
    Brightness,
    /// Row port 1 (read/write); the index may be past the last row
    Grid(usize),
    /// Row port 2 (read only)
    Grid2(usize),
}

/// Address decoder for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressMap {
    pub config: BusConfig,
}

impl AddressMap {
    pub fn new(config: BusConfig) -> Self {
        AddressMap { config }
    }

    /// Decode a byte address. Sub-word offsets select the containing word.
    pub fn decode(&self, addr: u32) -> Option<Register> {
        let c = &self.config;
        if let Some(offset) = window_offset(addr, c.grid_base, GRID_WINDOW) {
            return Some(Register::Grid((offset / 4) as usize));
        }
        if let Some(offset) = window_offset(addr, c.grid2_base, GRID_WINDOW) {
            return Some(Register::Grid2((offset / 4) as usize));
        }
        match window_offset(addr, c.base, CONTROL_WINDOW)? & !3 {
            REG_CTRL => Some(Register::Ctrl),
            REG_CONFIG => Some(Register::Config),
            REG_DISPLAY_CTRL => Some(Register::DisplayCtrl),
            REG_DISPLAY_CONFIG => Some(Register::DisplayConfig),
            REG_BRIGHTNESS => Some(Register::Brightness),
            _ => None,
        }
    }

    pub fn ctrl(&self) -> u32 { self.config.base + REG_CTRL }
    pub fn config(&self) -> u32 { self.config.base + REG_CONFIG }
    pub fn display_ctrl(&self) -> u32 { self.config.base + REG_DISPLAY_CTRL }
    pub fn display_config(&self) -> u32 { self.config.base + REG_DISPLAY_CONFIG }
    pub fn brightness(&self) -> u32 { self.config.base + REG_BRIGHTNESS }

    /// Address of `row` on port 1.
    pub fn grid_row(&self, row: usize) -> u32 {
        self.config.grid_base + (row as u32) * 4
    }

    /// Address of `row` on port 2.
    pub fn grid2_row(&self, row: usize) -> u32 {
        self.config.grid2_base + (row as u32) * 4
    }
}

#[inline]
fn window_offset(addr: u32, start: u32, len: u32) -> Option<u32> {
    let offset = addr.checked_sub(start)?;
    (offset < len).then_some(offset)
}

/// Bus transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Read,
    Write(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusRequest {
    pub addr: u32,
    pub op: BusOp,
}

impl BusRequest {
    pub fn read(addr: u32) -> Self {
        BusRequest { addr, op: BusOp::Read }
    }

    pub fn write(addr: u32, value: u32) -> Self {
        BusRequest { addr, op: BusOp::Write(value) }
    }
}

/// Acknowledge returned for every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusAck {
    /// Read data (zero for writes)
    pub data: u32,
    /// Clock cycles the transaction occupied
    pub cycles: u32,
}

/// CTRL and CONFIG registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlRegisters {
    /// Free-running generation advance
    pub enable: bool,
    /// Pending one-shot advance, consumed by the next clock edge
    pub pulse: bool,
    /// Toroidal boundary
    pub wrap: bool,
}

impl ControlRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = ControlRegisters::new();
    }

    pub fn read_ctrl(&self) -> u32 {
        (self.enable as u32) | ((self.pulse as u32) << 1)
    }

    /// Each write carrying the pulse bit issues exactly one advance. A second
    /// pulse before the first is consumed collapses into it.
    pub fn write_ctrl(&mut self, value: u32) {
        self.enable = value & CTRL_ENABLE != 0;
        if value & CTRL_PULSE != 0 {
            self.pulse = true;
        }
    }

    pub fn read_config(&self) -> u32 {
        self.wrap as u32
    }

    pub fn write_config(&mut self, value: u32) {
        self.wrap = value & CONFIG_WRAP != 0;
    }

    /// Consume the pending pulse, if any.
    pub fn take_pulse(&mut self) -> bool {
        std::mem::take(&mut self.pulse)
    }
}
