// Host side: window, keypad, sound and the debug controls.
//
//   keypad     1234 / QWER / ASDF / ZXCV
//   PageUp     double clock     PageDown  halve clock
//   Pause      single-step on/off, Space runs one cycle
//   F5         reload the ROM   F1 inspector   F2 memory dump
//   Escape     quit

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use log::{debug, error, info};
use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};

use chirp8::{
    config::{
        parse_clock, parse_color, parse_scale, Settings, DEFAULT_CLOCK_HZ, DEFAULT_SCALE,
        INSPECTOR_REFRESH,
    },
    display::{HEIGHT, WIDTH},
    keyboard::key_to_num,
    memory::read_rom,
    sound::{spawn_player, AudioSink, Mute},
    Emulator, Scheduler,
};

const TITLE: &str = "chirp8 - ESC to exit";

#[derive(Parser, Debug)]
#[command(version, about = "CHIP-8 virtual machine")]
struct Args {
    /// ROM image to run
    rom: PathBuf,

    /// Instructions per second
    #[arg(long, default_value_t = DEFAULT_CLOCK_HZ, value_parser = parse_clock)]
    clock_hz: u32,

    /// Window scale (1, 2, 4, 8, 16 or 32)
    #[arg(long, default_value_t = DEFAULT_SCALE, value_parser = parse_scale)]
    scale: usize,

    /// Lit pixel colour, RRGGBB
    #[arg(long, value_parser = parse_color)]
    foreground: Option<u32>,

    /// Background colour, RRGGBB
    #[arg(long, value_parser = parse_color)]
    background: Option<u32>,

    /// No sound
    #[arg(long)]
    mute: bool,

    /// Start in single-step mode
    #[arg(long)]
    paused: bool,
}

impl From<Args> for Settings {
    fn from(args: Args) -> Self {
        let mut settings = Settings::new(args.rom);
        settings.clock_hz = args.clock_hz;
        settings.scale = args.scale;
        if let Some(fg) = args.foreground {
            settings.palette.foreground = fg;
        }
        if let Some(bg) = args.background {
            settings.palette.background = bg;
        }
        settings.mute = args.mute;
        settings.start_paused = args.paused;
        settings
    }
}

fn window_scale(scale: usize) -> Scale {
    match scale {
        1 => Scale::X1,
        2 => Scale::X2,
        4 => Scale::X4,
        8 => Scale::X8,
        32 => Scale::X32,
        _ => Scale::X16,
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run(Settings::from(Args::parse()))
}

fn run(settings: Settings) -> anyhow::Result<()> {
    let program = read_rom(&settings.rom)?;

    let audio: Box<dyn AudioSink> = if settings.mute {
        Box::new(Mute)
    } else {
        Box::new(spawn_player())
    };
    let emu = Arc::new(Mutex::new(Emulator::new()));
    let mut scheduler = Scheduler::new(emu, settings.clock_hz, audio);
    scheduler
        .load_program(&program)
        .with_context(|| format!("unable to load {}", settings.rom.display()))?;
    if settings.start_paused {
        scheduler.pause();
    }

    let mut window = Window::new(
        TITLE,
        WIDTH,
        HEIGHT,
        WindowOptions {
            scale: window_scale(settings.scale),
            ..WindowOptions::default()
        },
    )
    .context("unable to open window")?;
    // Limit to max ~60 fps update rate
    window.limit_update_rate(Some(Duration::from_micros(16600)));

    scheduler.start();

    let palette = settings.palette;
    let mut buffer = vec![palette.background; WIDTH * HEIGHT];
    let mut inspector = false;
    let mut last_inspect = Instant::now();

    while window.is_open() && !window.is_key_down(Key::Escape) {
        for key in window.get_keys_pressed(KeyRepeat::No) {
            if let Some(n) = key_to_num(key) {
                scheduler.key_down(n);
                continue;
            }
            match key {
                Key::PageUp => {
                    scheduler.double_clock();
                }
                Key::PageDown => {
                    scheduler.halve_clock();
                }
                Key::Pause => scheduler.toggle_pause(),
                Key::Space => scheduler.step_once(),
                Key::F5 => match scheduler.load_program(&program) {
                    Ok(()) => info!("reset"),
                    Err(e) => error!("reset failed: {e}"),
                },
                Key::F1 => {
                    inspector = !inspector;
                    if !inspector {
                        window.set_title(TITLE);
                    }
                }
                Key::F2 => info!("memory dump\n{}", scheduler.memory_dump()),
                _ => {}
            }
        }
        for key in window.get_keys_released() {
            if let Some(n) = key_to_num(key) {
                scheduler.key_up(n);
            }
        }

        if inspector && last_inspect.elapsed() >= INSPECTOR_REFRESH {
            let snapshot = scheduler.snapshot();
            window.set_title(&format!("{TITLE} | {}", snapshot.summary()));
            debug!("\n{snapshot}");
            last_inspect = Instant::now();
        }

        if let Some(frame) = scheduler.take_frame(&palette) {
            buffer = frame;
        }
        window
            .update_with_buffer(&buffer, WIDTH, HEIGHT)
            .context("unable to draw frame")?;
    }

    scheduler.halt();
    Ok(())
}
