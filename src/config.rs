use std::path::PathBuf;
use std::time::Duration;

use crate::display::{from_u8_rgb, Palette};

pub const DEFAULT_CLOCK_HZ: u32 = 1_760_000;
pub const MAX_CLOCK_HZ: u32 = 1_000_000_000;
pub const DEFAULT_SCALE: usize = 16;
pub const SCALES: [usize; 6] = [1, 2, 4, 8, 16, 32];
pub const INSPECTOR_REFRESH: Duration = Duration::from_millis(15);

/// Everything the host needs to start a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rom: PathBuf,
    pub clock_hz: u32,
    pub scale: usize,
    pub palette: Palette,
    pub mute: bool,
    pub start_paused: bool,
}

impl Settings {
    pub fn new(rom: impl Into<PathBuf>) -> Self {
        Self {
            rom: rom.into(),
            clock_hz: DEFAULT_CLOCK_HZ,
            scale: DEFAULT_SCALE,
            palette: Palette::default(),
            mute: false,
            start_paused: false,
        }
    }
}

/// Parses `RRGGBB`, with or without a leading `#`, into 0RGB.
pub fn parse_color(s: &str) -> Result<u32, String> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("expected a colour as RRGGBB, got '{s}'"));
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
    Ok(from_u8_rgb(channel(0)?, channel(2)?, channel(4)?))
}

pub fn parse_scale(s: &str) -> Result<usize, String> {
    let scale: usize = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if SCALES.contains(&scale) {
        Ok(scale)
    } else {
        Err(format!("scale must be one of {SCALES:?}"))
    }
}

pub fn parse_clock(s: &str) -> Result<u32, String> {
    match s.parse::<u32>() {
        Ok(0) => Err("clock must be at least 1 Hz".to_string()),
        Ok(hz) if hz > MAX_CLOCK_HZ => Err(format!("clock must be at most {MAX_CLOCK_HZ} Hz")),
        Ok(hz) => Ok(hz),
        Err(e) => Err(e.to_string()),
    }
}
