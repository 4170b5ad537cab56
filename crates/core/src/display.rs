//! Display controller: scans grid rows out to a MAX7219 LED matrix chain.
//!
//! ```text
//!  Idle ──frame & enable──▶ Configuring(0..5) ──▶ Scanning(0..GRID_HEIGHT) ──▶ Idle
//! ```
//!
//! One latch is sent per clock while busy: a word per device is shifted out
//! MSB first, farthest device first, then latched. Configuring pushes shutdown,
//! decode mode, scan limit, intensity and display-test words to every
//! device; each Scanning step reads one grid row through port 2 and updates
//! the digit register of the modules on that row, sending no-ops to the rest
//! of the chain.
//!
//! `frame` is a one-shot request. It is dropped if a scan is already running
//! or the controller is disabled. With `enable` set and `pause` clear the
//! controller free-runs, starting a new scan whenever it returns to Idle.

use tracing::debug;

use crate::bus::{
    DISPLAY_BUSY, DISPLAY_ENABLE, DISPLAY_FRAME, DISPLAY_PAUSE, DISPLAY_REVERSE_COLS, DISPLAY_SERPENTINE,
};
use crate::grid::Grid;
use crate::max7219::{
    word, Max7219Chain, PanelLayout, MODULE_SIZE, REG_DECODE_MODE, REG_DIGIT0, REG_DISPLAY_TEST,
    REG_INTENSITY, REG_NOOP, REG_SCAN_LIMIT, REG_SHUTDOWN,
};

/// Latches sent before the first row of every scan.
pub const CONFIG_STEPS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Configuring { step: usize },
    Scanning { row: usize },
}

/// DISPLAY_CTRL / DISPLAY_CONFIG / BRIGHTNESS registers and the scan engine.
#[derive(Debug, Clone)]
pub struct DisplayController {
    pub enable: bool,
    pub pause: bool,
    /// Pending one-shot frame request
    frame_request: bool,
    pub reverse_cols: bool,
    pub serpentine: bool,
    /// Intensity forwarded to the drivers (0..=15)
    pub brightness: u8,
    pub state: ScanState,
    pub frames_started: u64,
    pub frames_completed: u64,
    /// Frame requests dropped because a scan was running
    pub requests_ignored: u64,
}

impl DisplayController {
    pub fn new() -> Self {
        DisplayController {
            enable: false,
            pause: false,
            frame_request: false,
            reverse_cols: false,
            serpentine: false,
            brightness: 0,
            state: ScanState::Idle,
            frames_started: 0,
            frames_completed: 0,
            requests_ignored: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = DisplayController::new();
    }

    pub fn busy(&self) -> bool {
        self.state != ScanState::Idle
    }

    pub fn read_ctrl(&self) -> u32 {
        let mut value = 0;
        if self.enable { value |= DISPLAY_ENABLE; }
        if self.pause { value |= DISPLAY_PAUSE; }
        if self.frame_request { value |= DISPLAY_FRAME; }
        if self.busy() { value |= DISPLAY_BUSY; }
        value
    }

    pub fn write_ctrl(&mut self, value: u32) {
        self.enable = value & DISPLAY_ENABLE != 0;
        self.pause = value & DISPLAY_PAUSE != 0;
        if value & DISPLAY_FRAME != 0 {
            if self.busy() || self.frame_request {
                self.requests_ignored += 1;
                debug!(state = ?self.state, "frame request ignored while busy");
            } else {
                self.frame_request = true;
            }
        }
    }

    pub fn read_config(&self) -> u32 {
        (self.reverse_cols as u32) | ((self.serpentine as u32) << 1)
    }

    pub fn write_config(&mut self, value: u32) {
        self.reverse_cols = value & DISPLAY_REVERSE_COLS != 0;
        self.serpentine = value & DISPLAY_SERPENTINE != 0;
    }

    pub fn read_brightness(&self) -> u32 {
        self.brightness as u32
    }

    pub fn write_brightness(&mut self, value: u32) {
        self.brightness = (value & 0x0F) as u8;
    }

    /// Panel layout implied by the current configuration.
    pub fn layout(&self, grid: &Grid) -> PanelLayout {
        PanelLayout {
            reverse_cols: self.reverse_cols,
            serpentine: self.serpentine,
            ..PanelLayout::for_grid(grid.width(), grid.height())
        }
    }

    fn config_word(&self, step: usize) -> u16 {
        match step {
            0 => word(REG_SHUTDOWN, 1),
            1 => word(REG_DECODE_MODE, 0),
            2 => word(REG_SCAN_LIMIT, (MODULE_SIZE - 1) as u8),
            3 => word(REG_INTENSITY, self.brightness),
            _ => word(REG_DISPLAY_TEST, 0),
        }
    }

    /// Latch words that write grid row `row` to its module row.
    pub fn row_words(&self, layout: &PanelLayout, row: usize, row_bits: u64) -> Vec<u16> {
        let mut words = vec![word(REG_NOOP, 0); layout.chain_len()];
        let (my, digit) = (row / MODULE_SIZE, (row % MODULE_SIZE) as u8);
        for mx in 0..layout.modules_x {
            words[layout.chain_index(mx, my)] = word(REG_DIGIT0 + digit, layout.pack_row(row_bits, mx));
        }
        words
    }

    /// Advance the scan engine by one clock.
    pub fn clock(&mut self, grid: &Grid, panel: &mut Max7219Chain) {
        match self.state {
            ScanState::Idle => {
                let request = std::mem::take(&mut self.frame_request);
                if self.enable && (request || !self.pause) {
                    self.state = ScanState::Configuring { step: 0 };
                    self.frames_started += 1;
                    debug!(frame = self.frames_started, manual = request, "display scan start");
                }
            }
            ScanState::Configuring { step } => {
                let w = self.config_word(step);
                panel.latch_bits(&shift_out(&vec![w; panel.devices.len()]));
                self.state = if step + 1 < CONFIG_STEPS {
                    ScanState::Configuring { step: step + 1 }
                } else {
                    ScanState::Scanning { row: 0 }
                };
            }
            ScanState::Scanning { row } => {
                let layout = self.layout(grid);
                // Port 2 read: no side effects on the grid
                let words = self.row_words(&layout, row, grid.read_row(row));
                panel.latch_bits(&shift_out(&words));
                if row + 1 < grid.height() {
                    self.state = ScanState::Scanning { row: row + 1 };
                } else {
                    self.state = ScanState::Idle;
                    self.frames_completed += 1;
                    debug!(frame = self.frames_completed, "display scan done");
                }
            }
        }
    }

    /// Clocks one full scan takes once started, including the start cycle.
    pub fn scan_cycles(grid: &Grid) -> usize {
        1 + CONFIG_STEPS + grid.height()
    }
}

/// Link bit stream for one latch; `words[i]` is meant for chain device `i`.
pub fn shift_out(words: &[u16]) -> Vec<bool> {
    words.iter().rev().flat_map(|&w| (0..16).rev().map(move |i| w >> i & 1 != 0)).collect()
}

impl Default for DisplayController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(w_tiles: usize, h_tiles: usize) -> (Grid, Max7219Chain, DisplayController) {
        let grid = Grid::new(8, 8, w_tiles, h_tiles);
        let panel = Max7219Chain::new(PanelLayout::for_grid(grid.width(), grid.height()));
        (grid, panel, DisplayController::new())
    }

    fn run_until_idle(disp: &mut DisplayController, grid: &Grid, panel: &mut Max7219Chain) -> usize {
        let mut cycles = 0;
        loop {
            disp.clock(grid, panel);
            cycles += 1;
            if !disp.busy() || cycles > 10_000 {
                return cycles;
            }
        }
    }

    #[test]
    fn test_idle_without_enable() {
        let (grid, mut panel, mut disp) = setup(1, 1);
        disp.write_ctrl(DISPLAY_FRAME);
        disp.clock(&grid, &mut panel);
        assert!(!disp.busy());
        assert_eq!(disp.frames_started, 0);
        // The request is consumed, not held until enable
        disp.write_ctrl(DISPLAY_ENABLE | DISPLAY_PAUSE);
        disp.clock(&grid, &mut panel);
        assert!(!disp.busy());
    }

    #[test]
    fn test_manual_frame_scans_grid() {
        let (mut grid, mut panel, mut disp) = setup(2, 2);
        grid.write_row(0, 0x8001);
        grid.write_row(9, 0x0180);
        disp.write_brightness(12);
        disp.write_ctrl(DISPLAY_ENABLE | DISPLAY_PAUSE | DISPLAY_FRAME);
        let cycles = run_until_idle(&mut disp, &grid, &mut panel);
        assert_eq!(cycles, DisplayController::scan_cycles(&grid));
        assert_eq!(disp.frames_completed, 1);
        assert_eq!(panel.rows(), grid.rows());
        assert!(panel.devices.iter().all(|d| d.intensity == 12 && !d.shutdown));
    }

    #[test]
    fn test_wiring_flags_round_trip() {
        let (mut grid, mut panel, mut disp) = setup(4, 2);
        grid.write_row(3, 0x1234_5678);
        grid.write_row(12, 0xF000_000F);
        disp.write_config(DISPLAY_REVERSE_COLS | DISPLAY_SERPENTINE);
        panel.set_wiring(true, true);
        disp.write_ctrl(DISPLAY_ENABLE | DISPLAY_PAUSE | DISPLAY_FRAME);
        run_until_idle(&mut disp, &grid, &mut panel);
        assert_eq!(panel.rows(), grid.rows());
    }

    #[test]
    fn test_serpentine_changes_device_order() {
        let (mut grid, mut panel, mut disp) = setup(2, 2);
        grid.write_row(8, 0x0001);
        disp.write_config(DISPLAY_SERPENTINE);
        disp.write_ctrl(DISPLAY_ENABLE | DISPLAY_PAUSE | DISPLAY_FRAME);
        run_until_idle(&mut disp, &grid, &mut panel);
        // Module (0,1) is the last device in a serpentine 2x2 chain
        assert_eq!(panel.devices[3].digits[0], 0x01);
        assert_eq!(panel.devices[2].digits[0], 0x00);
    }

    #[test]
    fn test_frame_while_busy_ignored() {
        let (grid, mut panel, mut disp) = setup(1, 1);
        disp.write_ctrl(DISPLAY_ENABLE | DISPLAY_PAUSE | DISPLAY_FRAME);
        disp.clock(&grid, &mut panel);
        assert!(disp.busy());
        disp.write_ctrl(DISPLAY_ENABLE | DISPLAY_PAUSE | DISPLAY_FRAME);
        assert_eq!(disp.requests_ignored, 1);
        run_until_idle(&mut disp, &grid, &mut panel);
        for _ in 0..20 {
            disp.clock(&grid, &mut panel);
        }
        assert_eq!(disp.frames_started, 1);
        assert_eq!(disp.frames_completed, 1);
    }

    #[test]
    fn test_free_running_restarts() {
        let (grid, mut panel, mut disp) = setup(1, 1);
        disp.write_ctrl(DISPLAY_ENABLE);
        let per_frame = DisplayController::scan_cycles(&grid);
        for _ in 0..per_frame * 3 {
            disp.clock(&grid, &mut panel);
        }
        assert_eq!(disp.frames_completed, 3);
        disp.write_ctrl(DISPLAY_ENABLE | DISPLAY_PAUSE);
        run_until_idle(&mut disp, &grid, &mut panel);
        let started = disp.frames_started;
        for _ in 0..per_frame {
            disp.clock(&grid, &mut panel);
        }
        assert_eq!(disp.frames_started, started);
    }

    #[test]
    fn test_shift_out_farthest_device_first() {
        let bits = shift_out(&[word(REG_DIGIT0, 0x01), word(REG_INTENSITY, 0x0F)]);
        assert_eq!(bits.len(), 32);
        // Device 1 (intensity) leads, MSB first
        assert_eq!(&bits[..8], &[false, false, false, false, true, false, true, false]);
        assert!(bits[23] && bits[31]);
        assert_eq!(bits.iter().filter(|&&b| b).count(), 8);
    }

    #[test]
    fn test_scan_latches_one_stream_per_clock() {
        let (mut grid, mut panel, mut disp) = setup(2, 1);
        grid.write_row(0, 0x0180);
        disp.write_ctrl(DISPLAY_ENABLE | DISPLAY_PAUSE | DISPLAY_FRAME);
        run_until_idle(&mut disp, &grid, &mut panel);
        assert_eq!(panel.latches, (CONFIG_STEPS + grid.height()) as u64);
        assert_eq!(panel.devices[0].digits[0], 0x80);
        assert_eq!(panel.devices[1].digits[0], 0x01);
    }

    #[test]
    fn test_ctrl_readback() {
        let mut disp = DisplayController::new();
        disp.write_ctrl(DISPLAY_ENABLE | DISPLAY_PAUSE | DISPLAY_BUSY);
        assert_eq!(disp.read_ctrl(), DISPLAY_ENABLE | DISPLAY_PAUSE);
        disp.write_brightness(0xFC);
        assert_eq!(disp.read_brightness(), 0x0C);
    }
}
