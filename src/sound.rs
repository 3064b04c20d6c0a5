use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use log::{debug, warn};

use crate::error::{Chip8Error, Result};

pub const TONE_HZ: u32 = 1000;
pub const TONE_MS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u32,
}

/// Receives tone requests from the CPU thread.
pub trait AudioSink: Send {
    fn tone(&mut self, frequency_hz: u32, duration_ms: u32);
}

/// Drops every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mute;

impl AudioSink for Mute {
    fn tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        debug!("muted tone {frequency_hz} Hz / {duration_ms} ms");
    }
}

/// Hands tones to a dedicated playback thread so the CPU never waits on the device.
pub struct TonePlayer {
    tx: Sender<Tone>,
}

impl AudioSink for TonePlayer {
    fn tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        let tone = Tone {
            frequency_hz,
            duration_ms,
        };
        if self.tx.send(tone).is_err() {
            warn!("audio thread gone, tone skipped");
        }
    }
}

/// Starts the playback thread. The output device is opened on that thread; if
/// none is available every tone is reported and skipped.
pub fn spawn_player() -> TonePlayer {
    let (tx, rx) = mpsc::channel::<Tone>();
    thread::spawn(move || match Sound::new() {
        Ok(sound) => {
            for tone in rx {
                if let Err(e) = sound.beep(tone) {
                    warn!("{e}, tone skipped");
                }
            }
        }
        Err(e) => {
            warn!("{e}, sound disabled");
            for tone in rx {
                debug!("tone skipped: {tone:?}");
            }
        }
    });
    TonePlayer { tx }
}

pub struct Sound {
    device: cpal::Device,
    config: cpal::StreamConfig,
    format: cpal::SampleFormat,
}

impl Sound {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(Chip8Error::NoAudioDevice)?;
        let mut supported_configs_range = device
            .supported_output_configs()
            .map_err(|e| Chip8Error::Audio(e.to_string()))?;
        let supported_config = supported_configs_range
            .next()
            .ok_or_else(|| Chip8Error::Audio("no supported output config".into()))?
            .with_max_sample_rate();
        let sample_format = supported_config.sample_format();
        Ok(Self {
            device,
            config: supported_config.into(),
            format: sample_format,
        })
    }

    /// Plays a sine tone, blocking for its duration.
    pub fn beep(&self, tone: Tone) -> Result<()> {
        match self.format {
            cpal::SampleFormat::I8 => self.run::<i8>(tone),
            cpal::SampleFormat::I16 => self.run::<i16>(tone),
            cpal::SampleFormat::I32 => self.run::<i32>(tone),
            cpal::SampleFormat::I64 => self.run::<i64>(tone),
            cpal::SampleFormat::U8 => self.run::<u8>(tone),
            cpal::SampleFormat::U16 => self.run::<u16>(tone),
            cpal::SampleFormat::U32 => self.run::<u32>(tone),
            cpal::SampleFormat::U64 => self.run::<u64>(tone),
            cpal::SampleFormat::F32 => self.run::<f32>(tone),
            cpal::SampleFormat::F64 => self.run::<f64>(tone),
            sample_format => Err(Chip8Error::Audio(format!(
                "unsupported sample format '{sample_format}'"
            ))),
        }
    }

    fn run<T>(&self, tone: Tone) -> Result<()>
    where
        T: SizedSample + FromSample<f32>,
    {
        let sample_rate = self.config.sample_rate.0 as f32;
        let channels = self.config.channels as usize;
        let frequency = tone.frequency_hz as f32;

        let mut sample_clock = 0f32;
        let mut next_value = move || {
            sample_clock = (sample_clock + 1.0) % sample_rate;
            (sample_clock * frequency * 2.0 * std::f32::consts::PI / sample_rate).sin()
        };

        let err_fn = |err| warn!("an error occurred on stream: {err}");

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    write_data(data, channels, &mut next_value)
                },
                err_fn,
                None,
            )
            .map_err(|e| Chip8Error::Audio(e.to_string()))?;

        stream
            .play()
            .map_err(|e| Chip8Error::Audio(e.to_string()))?;
        thread::sleep(Duration::from_millis(tone.duration_ms as u64));
        Ok(())
    }
}

fn write_data<T>(output: &mut [T], channels: usize, next_sample: &mut dyn FnMut() -> f32)
where
    T: Sample + FromSample<f32>,
{
    for frame in output.chunks_mut(channels) {
        let value: T = T::from_sample(next_sample());
        for sample in frame.iter_mut() {
            *sample = value;
        }
    }
}
