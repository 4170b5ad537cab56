//! # silife-core
//!
//! Clock-level model of a tileable Conway's Game of Life accelerator.
//!
//! A grid of Tx × Ty tiles, each W × H cells, advances one generation per
//! enabled clock edge. Software reaches it through a memory-mapped register
//! bus, bulk patterns arrive over a cascaded 3-wire serial loader, and a
//! display controller scans the grid out to a chain of MAX7219 8×8 LED
//! modules.
//!
//! ## Architecture
//!
//! - [`SiLife`] — Top-level device wiring the grid, registers, loader and display together
//! - [`cell`] — Per-cell priority cascade (reset, clear, set, advance) and the B3/S23 rule
//! - [`tile`] — Neighbor topology of one tile and its edge/corner ports
//! - [`grid`] — Tile arena, inter-tile links, toroidal or bounded perimeter
//! - [`bus`] — Address decoding, request/acknowledge, CTRL and CONFIG registers
//! - [`loader`] — Cascaded serial loader receiver and host-side frame encoder
//! - [`display`] — Scan engine driving the LED chain
//! - [`max7219`] — LED panel model receiving the scan
//! - [`pattern`] — Plaintext patterns and reference-format dumps
//! - [`savestate`] / [`snapshot`] — Quick save files and rewind history
//! - [`png`] — Grid and panel screenshots
//!
//! ## Timing
//!
//! Every bus transaction occupies exactly one clock. Reads sample the state
//! committed before that clock's edge; a row write is applied on the edge.
//! Register writes take effect immediately, so a CTRL write carrying `pulse`
//! advances the grid on the same transaction's edge.

pub mod bus;
pub mod cell;
pub mod config;
pub mod display;
pub mod error;
pub mod grid;
pub mod loader;
pub mod max7219;
pub mod pattern;
pub mod png;
pub mod savestate;
pub mod snapshot;
pub mod tile;

use tracing::{debug, trace};

pub use bus::{AddressMap, BusAck, BusOp, BusRequest, ControlRegisters, Register};
pub use config::SiLifeConfig;
pub use display::DisplayController;
pub use error::{Result, SiLifeError};
pub use grid::{Grid, GridInputs, GridRowEdit};
pub use loader::{LoaderFrame, LoaderPins, SerialLoader};
pub use max7219::{Max7219Chain, PanelLayout};

/// Clock cycles taken by every bus transaction.
pub const BUS_CYCLES: u32 = 1;

/// Main SiLife device combining all subsystems
pub struct SiLife {
    pub config: SiLifeConfig,
    pub map: AddressMap,
    pub grid: Grid,
    pub ctrl: ControlRegisters,
    pub display: DisplayController,
    /// LED panel at the far end of the display link
    pub panel: Max7219Chain,
    pub loader: SerialLoader,
    /// Bus row edit waiting for the next edge
    pending_edit: Option<GridRowEdit>,
    /// Reset line state for the next edge
    reset_line: bool,
    /// Clock edges since power-on
    pub cycle: u64,
}

impl SiLife {
    /// Build a device from a configuration. The configuration is validated.
    pub fn new(config: SiLifeConfig) -> Result<Self> {
        config.validate()?;
        let g = config.grid;
        let grid = Grid::new(g.tile_width, g.tile_height, g.tiles_x, g.tiles_y);
        let panel = Max7219Chain::new(PanelLayout::for_grid(grid.width(), grid.height()));
        let loader = SerialLoader::new(config.loader.identity, grid.width(), grid.height());
        Ok(SiLife {
            map: AddressMap::new(config.bus),
            config,
            grid,
            ctrl: ControlRegisters::new(),
            display: DisplayController::new(),
            panel,
            loader,
            pending_edit: None,
            reset_line: false,
            cycle: 0,
        })
    }

    /// Power-on reset: every cell dead, every register cleared, loader idle.
    pub fn reset(&mut self) {
        let g = self.config.grid;
        self.grid = Grid::new(g.tile_width, g.tile_height, g.tiles_x, g.tiles_y);
        self.panel = Max7219Chain::new(PanelLayout::for_grid(self.grid.width(), self.grid.height()));
        self.ctrl.reset();
        self.display.reset();
        self.loader.reset();
        self.pending_edit = None;
        self.reset_line = false;
        self.cycle = 0;
        debug!("device reset");
    }

    /// Drive the grid reset line for the next clock edge. All cells die on
    /// that edge regardless of edits or stepping; registers are untouched.
    pub fn assert_reset(&mut self) {
        self.reset_line = true;
    }

    /// One clock edge.
    pub fn clock(&mut self) {
        let reset = std::mem::take(&mut self.reset_line);
        // The bus wins a collision; the loader row stays queued
        let edit = match self.pending_edit.take() {
            Some(edit) => Some(edit),
            None => self.loader.take_row_edit(),
        };
        let pulse = self.ctrl.take_pulse();
        let inputs = GridInputs { reset, edit, advance: pulse || self.ctrl.enable, wrap: self.ctrl.wrap };
        self.grid.clock(&inputs);
        self.display.clock(&self.grid, &mut self.panel);
        self.cycle += 1;
    }

    /// Run `cycles` clock edges with the bus idle.
    pub fn idle(&mut self, cycles: usize) {
        for _ in 0..cycles {
            self.clock();
        }
    }

    /// Clock until every loader row has been written into the grid.
    pub fn drain_loader(&mut self) {
        while self.loader.pending_rows() > 0 {
            self.clock();
        }
    }

    /// Clock until the display controller is idle.
    pub fn wait_display(&mut self) {
        while self.display.busy() {
            self.clock();
        }
    }

    /// Execute one bus transaction.
    pub fn transact(&mut self, req: BusRequest) -> BusAck {
        let reg = self.map.decode(req.addr);
        let data = match req.op {
            BusOp::Read => self.read_register(reg, req.addr),
            BusOp::Write(value) => {
                self.write_register(reg, req.addr, value);
                0
            }
        };
        self.clock();
        BusAck { data, cycles: BUS_CYCLES }
    }

    pub fn read(&mut self, addr: u32) -> u32 {
        self.transact(BusRequest::read(addr)).data
    }

    pub fn write(&mut self, addr: u32, value: u32) {
        self.transact(BusRequest::write(addr, value));
    }

    fn read_register(&self, reg: Option<Register>, addr: u32) -> u32 {
        match reg {
            Some(Register::Ctrl) => self.ctrl.read_ctrl(),
            Some(Register::Config) => self.ctrl.read_config(),
            Some(Register::DisplayCtrl) => self.display.read_ctrl(),
            Some(Register::DisplayConfig) => self.display.read_config(),
            Some(Register::Brightness) => self.display.read_brightness(),
            // GRID_WIDTH fits a bus word; truncation only drops unused bits
            Some(Register::Grid(row)) | Some(Register::Grid2(row)) => self.grid.read_row(row) as u32,
            None => {
                trace!(addr, "unmapped read");
                0
            }
        }
    }

    fn write_register(&mut self, reg: Option<Register>, addr: u32, value: u32) {
        match reg {
            Some(Register::Ctrl) => self.ctrl.write_ctrl(value),
            Some(Register::Config) => self.ctrl.write_config(value),
            Some(Register::DisplayCtrl) => self.display.write_ctrl(value),
            Some(Register::DisplayConfig) => {
                self.display.write_config(value);
                self.panel.set_wiring(self.display.reverse_cols, self.display.serpentine);
            }
            Some(Register::Brightness) => self.display.write_brightness(value),
            Some(Register::Grid(row)) if row < self.grid.height() => {
                self.pending_edit = Some(GridRowEdit::overwrite(row, value as u64, self.grid.width()));
            }
            Some(Register::Grid(row)) => trace!(row, "row write past last row"),
            Some(Register::Grid2(row)) => trace!(row, "write to read-only row port"),
            None => trace!(addr, value, "unmapped write"),
        }
    }

    /// Write every row through port 1, top to bottom.
    pub fn write_rows(&mut self, rows: &[u64]) {
        for (row, &bits) in rows.iter().enumerate() {
            let addr = self.map.grid_row(row);
            self.write(addr, bits as u32);
        }
    }

    /// Read every row through port 2.
    pub fn read_rows(&mut self) -> Vec<u32> {
        (0..self.grid.height()).map(|row| self.read(self.map.grid2_row(row))).collect()
    }

    /// Issue one pulse, keeping the current enable bit.
    pub fn pulse(&mut self) {
        let value = self.ctrl.read_ctrl() | bus::CTRL_PULSE;
        let addr = self.map.ctrl();
        self.write(addr, value);
    }

    /// Provision the whole grid over the serial loader and wait for it to land.
    pub fn load_rows_serial(&mut self, rows: &[u64]) {
        let width = self.grid.width();
        let frame = LoaderFrame::Rows { tile_id: self.loader.identity(), row_offset: 0, rows: rows.to_vec() };
        frame.transmit(std::slice::from_mut(self), width);
        self.drain_loader();
    }

    /// Capture the rewind state.
    pub fn save_snapshot(&self) -> snapshot::Snapshot {
        snapshot::Snapshot {
            rows: self.grid.rows(),
            generation: self.grid.generation,
            cycle: self.cycle,
            ctrl: self.ctrl.read_ctrl() & bus::CTRL_ENABLE,
            config: self.ctrl.read_config(),
        }
    }

    /// Restore a rewind snapshot, including enable and wrap. Display
    /// registers are kept.
    pub fn restore_snapshot(&mut self, snap: &snapshot::Snapshot) {
        for (row, &bits) in snap.rows.iter().enumerate() {
            self.grid.write_row(row, bits);
        }
        self.grid.generation = snap.generation;
        self.cycle = snap.cycle;
        self.ctrl.write_ctrl(snap.ctrl & bus::CTRL_ENABLE);
        self.ctrl.write_config(snap.config);
    }

    /// Build a save state from the current device.
    pub fn save_state(&self) -> savestate::SaveState {
        savestate::SaveState {
            tile_width: self.grid.tile_width() as u32,
            tile_height: self.grid.tile_height() as u32,
            tiles_x: self.grid.tiles_x() as u32,
            tiles_y: self.grid.tiles_y() as u32,
            rows: self.grid.rows(),
            generation: self.grid.generation,
            cycle: self.cycle,
            ctrl: self.ctrl.read_ctrl(),
            config: self.ctrl.read_config(),
            display_ctrl: self.display.read_ctrl() & !bus::DISPLAY_BUSY,
            display_config: self.display.read_config(),
            brightness: self.display.read_brightness(),
        }
    }

    /// Restore a save state taken from a device of the same geometry.
    pub fn load_state(&mut self, state: &savestate::SaveState) -> Result<()> {
        state.check_dimensions(&self.grid)?;
        self.reset();
        for (row, &bits) in state.rows.iter().enumerate() {
            self.grid.write_row(row, bits);
        }
        self.grid.generation = state.generation;
        self.cycle = state.cycle;
        // Pulse is a one-shot and is never restored
        self.ctrl.write_ctrl(state.ctrl & bus::CTRL_ENABLE);
        self.ctrl.write_config(state.config);
        self.display.write_ctrl(state.display_ctrl & !bus::DISPLAY_FRAME);
        self.display.write_config(state.display_config);
        self.display.write_brightness(state.brightness);
        self.panel.set_wiring(self.display.reverse_cols, self.display.serpentine);
        Ok(())
    }
}

impl LoaderPins for SiLife {
    fn loader_select(&mut self, active: bool) {
        self.loader.loader_select(active);
    }

    fn loader_clock(&mut self, data: bool) {
        self.loader.loader_clock(data);
    }
}
