//! SiLife frontend.
//!
//! Provides two execution modes:
//!
//! - **GUI mode** (default): LED panel view driven through the display
//!   controller, keyboard control of the grid.
//! - **Headless mode** (`--headless`): Step N generations and print reference
//!   dumps, for scripted runs and regression checks.
//!
//! The grid is provisioned either through bus row writes (default) or over the
//! serial loader (`--load-serial`).

use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use minifb::{Key, KeyRepeat, Scale, ScaleMode, Window, WindowOptions};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use silife_core::bus::{CONFIG_WRAP, DISPLAY_ENABLE, DISPLAY_FRAME, DISPLAY_PAUSE};
use silife_core::pattern::{parse_position, Pattern};
use silife_core::snapshot::RewindBuffer;
use silife_core::{png, savestate, LoaderFrame, SiLife, SiLifeConfig};

/// GUI refresh rate
const TARGET_FPS: usize = 60;
/// Rewind history: one snapshot per generation
const REWIND_CAPACITY: usize = 600;

/// Tileable Game of Life grid model
#[derive(Parser)]
#[command(name = "silife", version, about = "Run and view a tiled Game of Life grid")]
struct Args {
    /// Device configuration (TOML); defaults to 4x4 tiles of 8x8 cells
    #[arg(long)]
    config: Option<PathBuf>,

    /// Plaintext pattern to load at startup
    #[arg(long)]
    pattern: Option<PathBuf>,

    /// Pattern placement as ROW,COL
    #[arg(long, default_value = "0,0")]
    at: String,

    /// Toroidal boundary
    #[arg(long)]
    wrap: bool,

    /// Provision through the serial loader instead of the bus
    #[arg(long)]
    load_serial: bool,

    /// Run without GUI
    #[arg(long)]
    headless: bool,

    /// Generations to run (headless)
    #[arg(long, default_value_t = 60)]
    generations: u64,

    /// Print the grid after generation G (repeatable)
    #[arg(long = "snapshot", value_name = "G")]
    snapshots: Vec<u64>,

    /// Write a PNG of the final grid (headless)
    #[arg(long)]
    png: Option<PathBuf>,

    /// Initial LED intensity 0-15
    #[arg(long, default_value_t = 8)]
    brightness: u8,

    /// Generations per second while running (GUI)
    #[arg(long, default_value_t = 10)]
    speed: usize,

    /// Pixels per LED (GUI)
    #[arg(long, default_value_t = 16)]
    scale: usize,

    /// Debug logging
    #[arg(long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();
    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => SiLifeConfig::load(path)?,
        None => SiLifeConfig::default(),
    };
    let mut dev = SiLife::new(config)?;
    info!(
        width = dev.grid.width(),
        height = dev.grid.height(),
        tiles = dev.grid.tiles_x() * dev.grid.tiles_y(),
        "grid ready"
    );

    let config_addr = dev.map.config();
    dev.write(config_addr, if args.wrap { CONFIG_WRAP } else { 0 });
    let brightness_addr = dev.map.brightness();
    dev.write(brightness_addr, args.brightness as u32);

    if let Some(path) = &args.pattern {
        let pattern = Pattern::load(path)?;
        let (row, col) = parse_position(&args.at)?;
        provision(&mut dev, &pattern, row, col, args.wrap, args.load_serial);
        info!(path = %path.display(), row, col, population = dev.grid.population(), "pattern loaded");
    }

    if args.headless {
        run_headless(&args, &mut dev)
    } else {
        run_gui(&args, &mut dev)
    }
}

/// Stamp a pattern into a fresh row image and write it to the device.
fn provision(dev: &mut SiLife, pattern: &Pattern, row: usize, col: usize, wrap: bool, serial: bool) {
    let width = dev.grid.width();
    let mut rows = vec![0u64; dev.grid.height()];
    pattern.stamp(&mut rows, width, row, col, wrap);
    if serial {
        let identity = dev.loader.identity();
        LoaderFrame::Init { tile_count: identity + 1 }.transmit(std::slice::from_mut(dev), width);
        dev.load_rows_serial(&rows);
        debug!(transactions = dev.loader.transactions, "provisioned over serial loader");
    } else {
        dev.write_rows(&rows);
    }
}

// ─── Headless Mode ──────────────────────────────────────────────────────────

fn run_headless(args: &Args, dev: &mut SiLife) -> Result<(), Box<dyn Error>> {
    if args.snapshots.contains(&0) {
        print_grid(dev);
    }
    let start = Instant::now();
    for _ in 0..args.generations {
        dev.pulse();
        let generation = dev.grid.generation;
        debug!(generation, population = dev.grid.population(), "step");
        if args.snapshots.contains(&generation) {
            print_grid(dev);
        }
    }
    if let Some(path) = &args.png {
        png::write_png(path, &png::grid_png(&dev.grid, 8))?;
        info!(path = %path.display(), "grid image written");
    }
    info!(
        generations = dev.grid.generation,
        cycles = dev.cycle,
        population = dev.grid.population(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "done"
    );
    Ok(())
}

fn print_grid(dev: &SiLife) {
    println!("\n  === Generation {} ({} alive) ===", dev.grid.generation, dev.grid.population());
    for line in dev.grid.dump() {
        println!("  |{}|", line);
    }
}

// ─── GUI Mode ───────────────────────────────────────────────────────────────

fn run_gui(args: &Args, dev: &mut SiLife) -> Result<(), Box<dyn Error>> {
    let scale = args.scale.clamp(1, 64);
    let (w, h) = (dev.panel.width(), dev.panel.height());
    let (scaled_w, scaled_h) = (w * scale, h * scale);
    let mut window = Window::new(
        "SiLife",
        scaled_w,
        scaled_h,
        WindowOptions { scale: Scale::X1, scale_mode: ScaleMode::AspectRatioStretch, resize: true, ..Default::default() },
    )?;
    window.set_target_fps(TARGET_FPS);

    let state_file = args
        .pattern
        .as_deref()
        .map(savestate::state_path)
        .unwrap_or_else(|| PathBuf::from("silife.state"));
    let frames_per_generation = (TARGET_FPS / args.speed.max(1)).max(1);
    let mut rewind = RewindBuffer::new(REWIND_CAPACITY, 1);
    let mut scaled_buf = vec![0u32; scaled_w * scaled_h];
    let mut running = false;
    let mut frame: usize = 0;
    let mut screenshot_n = 0u32;
    let mut last_title = Instant::now();

    let display_ctrl = dev.map.display_ctrl();
    let config_addr = dev.map.config();
    let brightness_addr = dev.map.brightness();

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let mut step = false;

        if window.is_key_pressed(Key::Space, KeyRepeat::No) {
            running = !running;
            info!(running, "run toggled");
        }
        if window.is_key_pressed(Key::N, KeyRepeat::Yes) {
            step = true;
        }
        if window.is_key_pressed(Key::W, KeyRepeat::No) {
            let wrap = !dev.ctrl.wrap;
            dev.write(config_addr, if wrap { CONFIG_WRAP } else { 0 });
            info!(wrap, "boundary changed");
        }
        if window.is_key_pressed(Key::C, KeyRepeat::No) {
            dev.assert_reset();
            dev.clock();
            rewind.clear();
        }
        if window.is_key_pressed(Key::Equal, KeyRepeat::Yes) || window.is_key_pressed(Key::Minus, KeyRepeat::Yes) {
            let up = window.is_key_down(Key::Equal);
            let level = dev.display.brightness;
            let level = if up { (level + 1).min(15) } else { level.saturating_sub(1) };
            dev.write(brightness_addr, level as u32);
        }
        if window.is_key_down(Key::Backspace) {
            running = false;
            match rewind.rewind() {
                Some(snap) => dev.restore_snapshot(&snap),
                None => debug!("rewind buffer empty"),
            }
        }
        if window.is_key_pressed(Key::F5, KeyRepeat::No) {
            match savestate::save_to_file(&dev.save_state(), &state_file) {
                Ok(()) => info!(path = %state_file.display(), "state saved"),
                Err(e) => warn!("save failed: {}", e),
            }
        }
        if window.is_key_pressed(Key::F9, KeyRepeat::No) {
            match savestate::load_from_file(&state_file).and_then(|s| dev.load_state(&s)) {
                Ok(()) => {
                    rewind.clear();
                    info!(path = %state_file.display(), generation = dev.grid.generation, "state loaded");
                }
                Err(e) => warn!("load failed: {}", e),
            }
        }
        if window.is_key_pressed(Key::S, KeyRepeat::No) {
            let path = PathBuf::from(format!("screenshot_{:04}.png", screenshot_n));
            match png::write_png(&path, &png::panel_png(&mut dev.panel)) {
                Ok(()) => {
                    info!(path = %path.display(), "screenshot");
                    screenshot_n += 1;
                }
                Err(e) => warn!("screenshot failed: {}", e),
            }
        }

        if running && frame % frames_per_generation == 0 {
            step = true;
        }
        if step {
            rewind.capture(dev.save_snapshot());
            dev.pulse();
        }

        // One manual scan per GUI frame
        dev.write(display_ctrl, DISPLAY_ENABLE | DISPLAY_PAUSE | DISPLAY_FRAME);
        dev.wait_display();

        dev.panel.render_to_framebuffer();
        let pixels = dev.panel.as_pixel_buffer();
        for y in 0..scaled_h {
            let src = (y / scale) * w;
            for x in 0..scaled_w {
                scaled_buf[y * scaled_w + x] = pixels[src + x / scale];
            }
        }
        window.update_with_buffer(&scaled_buf, scaled_w, scaled_h)?;
        frame += 1;

        if last_title.elapsed() >= Duration::from_millis(500) {
            window.set_title(&format!(
                "SiLife - gen {}  pop {}  {}{}",
                dev.grid.generation,
                dev.grid.population(),
                if dev.ctrl.wrap { "wrap" } else { "bounded" },
                if running { "" } else { "  [PAUSED]" },
            ));
            last_title = Instant::now();
        }
    }
    debug!(frames = frame, cycles = dev.cycle, scans = dev.display.frames_completed, "window closed");
    Ok(())
}
