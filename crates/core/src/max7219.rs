//! MAX7219 8×8 LED matrix chain emulation.
//!
//! Models the far end of the display link: a daisy chain of MAX7219 drivers,
//! each lighting one 8×8 module of a larger panel. Every latch delivers one
//! 16-bit word (`register << 8 | data`) to each device; the controller sends
//! the no-op register to devices it does not want to touch.
//!
//! [`PanelLayout`] describes how modules are wired into the chain and is
//! shared with the display controller, so both ends agree on which device
//! shows which part of the grid.

use crate::grid::width_mask;

/// Edge length of one LED module in pixels.
pub const MODULE_SIZE: usize = 8;

pub const REG_NOOP: u8 = 0x00;
/// Digit registers are 0x01..=0x08 (digit 0 to 7).
pub const REG_DIGIT0: u8 = 0x01;
pub const REG_DECODE_MODE: u8 = 0x09;
pub const REG_INTENSITY: u8 = 0x0A;
pub const REG_SCAN_LIMIT: u8 = 0x0B;
pub const REG_SHUTDOWN: u8 = 0x0C;
pub const REG_DISPLAY_TEST: u8 = 0x0F;

/// Pack a register/data pair into a link word.
#[inline]
pub fn word(register: u8, data: u8) -> u16 {
    ((register as u16) << 8) | data as u16
}

/// Module arrangement and wiring of the LED panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLayout {
    pub modules_x: usize,
    pub modules_y: usize,
    /// Module columns wired right-to-left
    pub reverse_cols: bool,
    /// Every other module row is chained in the opposite direction
    pub serpentine: bool,
}

impl PanelLayout {
    /// Layout covering a `width` × `height` grid.
    pub fn for_grid(width: usize, height: usize) -> Self {
        PanelLayout {
            modules_x: width.div_ceil(MODULE_SIZE),
            modules_y: height.div_ceil(MODULE_SIZE),
            reverse_cols: false,
            serpentine: false,
        }
    }

    pub fn chain_len(&self) -> usize {
        self.modules_x * self.modules_y
    }

    /// Position in the chain of the module at (mx, my); 0 is nearest the controller.
    pub fn chain_index(&self, mx: usize, my: usize) -> usize {
        let x = if self.serpentine && my % 2 == 1 { self.modules_x - 1 - mx } else { mx };
        my * self.modules_x + x
    }

    /// Digit bit that lights module-local column `col`.
    #[inline]
    pub fn bit_for_column(&self, col: usize) -> usize {
        if self.reverse_cols { MODULE_SIZE - 1 - col } else { col }
    }

    /// Digit byte for module column `mx` of a logical row.
    pub fn pack_row(&self, row_bits: u64, mx: usize) -> u8 {
        let slice = row_bits.checked_shr((mx * MODULE_SIZE) as u32).unwrap_or(0) & width_mask(MODULE_SIZE);
        (0..MODULE_SIZE).fold(0u8, |acc, col| acc | ((((slice >> col) & 1) as u8) << self.bit_for_column(col)))
    }
}

/// One MAX7219 driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Max7219 {
    pub digits: [u8; 8],
    pub decode_mode: u8,
    pub intensity: u8,
    pub scan_limit: u8,
    /// Power-on state is shutdown
    pub shutdown: bool,
    pub display_test: bool,
}

impl Max7219 {
    pub fn new() -> Self {
        Max7219 {
            digits: [0; 8],
            decode_mode: 0,
            intensity: 0,
            scan_limit: 0,
            shutdown: true,
            display_test: false,
        }
    }

    /// Apply one latched word.
    pub fn receive(&mut self, w: u16) {
        let register = (w >> 8) as u8 & 0x0F;
        let data = w as u8;
        match register {
            REG_NOOP => {}
            0x01..=0x08 => self.digits[(register - REG_DIGIT0) as usize] = data,
            REG_DECODE_MODE => self.decode_mode = data,
            REG_INTENSITY => self.intensity = data & 0x0F,
            REG_SCAN_LIMIT => self.scan_limit = data & 0x07,
            REG_SHUTDOWN => self.shutdown = data & 1 == 0,
            REG_DISPLAY_TEST => self.display_test = data & 1 != 0,
            _ => {}
        }
    }

    /// Whether digit `digit`, segment bit `bit` is lit.
    pub fn lit(&self, digit: usize, bit: usize) -> bool {
        if self.display_test {
            return true;
        }
        if self.shutdown || digit > self.scan_limit as usize {
            return false;
        }
        self.digits[digit] >> bit & 1 != 0
    }
}

impl Default for Max7219 {
    fn default() -> Self {
        Self::new()
    }
}

/// A chain of MAX7219 modules forming one LED panel.
pub struct Max7219Chain {
    pub devices: Vec<Max7219>,
    pub layout: PanelLayout,
    /// RGBA framebuffer, `width() * height() * 4` bytes
    pub framebuffer: Vec<u8>,
    /// Whether device state changed since the last render
    pub dirty: bool,
    /// Latch strobes received
    pub latches: u64,
}

impl Max7219Chain {
    pub fn new(layout: PanelLayout) -> Self {
        let (w, h) = (layout.modules_x * MODULE_SIZE, layout.modules_y * MODULE_SIZE);
        let mut fb = vec![0u8; w * h * 4];
        for i in (3..fb.len()).step_by(4) {
            fb[i] = 0xFF;
        }
        Max7219Chain {
            devices: vec![Max7219::new(); layout.chain_len()],
            layout,
            framebuffer: fb,
            dirty: false,
            latches: 0,
        }
    }

    pub fn width(&self) -> usize { self.layout.modules_x * MODULE_SIZE }
    pub fn height(&self) -> usize { self.layout.modules_y * MODULE_SIZE }

    /// Rewire the panel; device contents are kept.
    pub fn set_wiring(&mut self, reverse_cols: bool, serpentine: bool) {
        self.layout.reverse_cols = reverse_cols;
        self.layout.serpentine = serpentine;
        self.dirty = true;
    }

    /// `words[i]` lands in chain device `i`.
    fn latch(&mut self, words: &[u16]) {
        for (device, &w) in self.devices.iter_mut().zip(words) {
            device.receive(w);
        }
        self.latches += 1;
        self.dirty = true;
    }

    /// Raise the latch line after a raw bit stream was shifted, MSB first.
    /// The first word shifted ends up in the device farthest down the chain.
    pub fn latch_bits(&mut self, bits: &[bool]) {
        let mut words: Vec<u16> = bits
            .chunks_exact(16)
            .map(|chunk| chunk.iter().fold(0u16, |acc, &b| (acc << 1) | b as u16))
            .collect();
        words.reverse();
        words.resize(self.devices.len(), word(REG_NOOP, 0));
        self.latch(&words);
    }

    /// Whether the LED at panel pixel (row, col) is lit.
    pub fn pixel(&self, row: usize, col: usize) -> bool {
        let (mx, my) = (col / MODULE_SIZE, row / MODULE_SIZE);
        let device = &self.devices[self.layout.chain_index(mx, my)];
        device.lit(row % MODULE_SIZE, self.layout.bit_for_column(col % MODULE_SIZE))
    }

    /// Panel rows in bus layout (column `c` in bit `c`).
    pub fn rows(&self) -> Vec<u64> {
        (0..self.height())
            .map(|r| (0..self.width()).fold(0u64, |acc, c| acc | ((self.pixel(r, c) as u64) << c)))
            .collect()
    }

    /// Render lit LEDs in red, scaled by each module's intensity.
    pub fn render_to_framebuffer(&mut self) {
        if !self.dirty { return; }
        self.dirty = false;

        let w = self.width();
        for row in 0..self.height() {
            for col in 0..w {
                let device = &self.devices[self.layout.chain_index(col / MODULE_SIZE, row / MODULE_SIZE)];
                // 16 duty steps; keep the dimmest setting visible
                let level = 0x40 + (device.intensity as u32 * 0xBF / 15) as u8;
                let offset = (row * w + col) * 4;
                let on = self.pixel(row, col);
                self.framebuffer[offset] = if on { level } else { 0x18 };
                self.framebuffer[offset + 1] = if on { level / 8 } else { 0x08 };
                self.framebuffer[offset + 2] = if on { level / 8 } else { 0x08 };
                self.framebuffer[offset + 3] = 0xFF;
            }
        }
    }

    /// Convert framebuffer to u32 pixel array (0xRRGGBB format for minifb)
    pub fn as_pixel_buffer(&self) -> Vec<u32> {
        self.framebuffer
            .chunks_exact(4)
            .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
            .collect()
    }
}
