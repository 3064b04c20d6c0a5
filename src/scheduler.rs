use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::{
    config::MAX_CLOCK_HZ,
    display::Palette,
    emulator::Emulator,
    error::Result,
    snapshot::Snapshot,
    sound::{AudioSink, Mute, TONE_HZ, TONE_MS},
    timer::TimerDivider,
};

// shortest sleep worth handing to the OS; the CPU runs in bursts in between
const MIN_SLEEP: Duration = Duration::from_millis(1);
// further behind than this and the deadline is dropped instead of caught up
const MAX_LAG: Duration = Duration::from_millis(100);
const PAUSED_POLL: Duration = Duration::from_millis(2);
// steps per burst under the lock; the run flag and the host get a turn after each
const MAX_BURST: u32 = 100_000;

pub fn lock(emu: &Mutex<Emulator>) -> MutexGuard<'_, Emulator> {
    emu.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Flags shared between the host and the CPU thread.
#[derive(Debug)]
pub struct Controls {
    running: AtomicBool,
    paused: AtomicBool,
    step_requested: AtomicBool,
    clock_hz: AtomicU32,
}

impl Controls {
    fn new(clock_hz: u32, paused: bool) -> Self {
        Self {
            running: AtomicBool::new(false),
            paused: AtomicBool::new(paused),
            step_requested: AtomicBool::new(false),
            clock_hz: AtomicU32::new(clock_hz.clamp(1, MAX_CLOCK_HZ)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn clock_hz(&self) -> u32 {
        self.clock_hz.load(Ordering::Acquire)
    }

    fn take_step(&self) -> bool {
        self.step_requested.swap(false, Ordering::AcqRel)
    }
}

/// Everything the CPU thread owns while it runs. Handed back through the
/// join handle so the next `start` reuses the same audio sink.
struct Driver {
    emu: Arc<Mutex<Emulator>>,
    controls: Arc<Controls>,
    audio: Box<dyn AudioSink>,
    divider: TimerDivider,
}

impl Driver {
    fn run(mut self) -> Self {
        debug!("cpu thread started");
        let mut deadline = Instant::now();
        let mut last_tick = deadline;
        while self.controls.is_running() {
            if self.controls.is_paused() {
                if self.controls.take_step() {
                    self.single_step();
                } else {
                    thread::sleep(PAUSED_POLL);
                }
                deadline = Instant::now();
                last_tick = deadline;
                continue;
            }

            let hz = self.controls.clock_hz();
            let period = Duration::from_secs_f64(1.0 / hz as f64).max(Duration::from_nanos(1));
            let now = Instant::now();
            if now.saturating_duration_since(deadline) > MAX_LAG {
                debug!("cpu fell behind by {:?}, resyncing", now - deadline);
                deadline = now;
            }

            {
                let mut emu = lock(&self.emu);
                let mut burst = 0;
                while deadline <= now && burst < MAX_BURST {
                    if let Err(e) = emu.step() {
                        error!("{e}, execution paused");
                        self.controls.paused.store(true, Ordering::Release);
                        break;
                    }
                    deadline += period;
                    burst += 1;
                }
                let elapsed = now.duration_since(last_tick).as_secs_f64();
                last_tick = now;
                let ticks = self.divider.advance(elapsed * hz as f64, hz);
                Self::tick(&mut emu, self.audio.as_mut(), ticks);
            }

            let ahead = deadline.saturating_duration_since(Instant::now());
            thread::sleep(ahead.max(MIN_SLEEP));
        }
        debug!("cpu thread stopped");
        self
    }

    // one instruction, counted as one cycle towards the timers
    fn single_step(&mut self) {
        let hz = self.controls.clock_hz();
        let mut emu = lock(&self.emu);
        if let Err(e) = emu.step() {
            error!("{e}");
            return;
        }
        let ticks = self.divider.advance(1.0, hz);
        Self::tick(&mut emu, self.audio.as_mut(), ticks);
    }

    fn tick(emu: &mut Emulator, audio: &mut dyn AudioSink, ticks: u32) {
        for _ in 0..ticks {
            if emu.tick_timers() {
                audio.tone(TONE_HZ, TONE_MS);
            }
        }
    }
}

/// Runs an [`Emulator`] on its own thread at a given clock rate and derives
/// the 60 Hz timers from it.
pub struct Scheduler {
    emu: Arc<Mutex<Emulator>>,
    controls: Arc<Controls>,
    worker: Option<JoinHandle<Driver>>,
    parked: Option<Driver>,
}

impl Scheduler {
    pub fn new(emu: Arc<Mutex<Emulator>>, clock_hz: u32, audio: Box<dyn AudioSink>) -> Self {
        let controls = Arc::new(Controls::new(clock_hz, false));
        let driver = Driver {
            emu: Arc::clone(&emu),
            controls: Arc::clone(&controls),
            audio,
            divider: TimerDivider::new(),
        };
        Self {
            emu,
            controls,
            worker: None,
            parked: Some(driver),
        }
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Spawns the CPU thread. Does nothing if it is already running.
    pub fn start(&mut self) {
        let Some(driver) = self.parked.take() else {
            return;
        };
        self.controls.running.store(true, Ordering::Release);
        self.worker = Some(thread::spawn(move || driver.run()));
    }

    /// Stops the CPU thread between cycles and waits for it.
    pub fn halt(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.controls.running.store(false, Ordering::Release);
        let driver = worker.join().unwrap_or_else(|_| {
            warn!("cpu thread panicked, continuing without sound");
            Driver {
                emu: Arc::clone(&self.emu),
                controls: Arc::clone(&self.controls),
                audio: Box::new(Mute),
                divider: TimerDivider::new(),
            }
        });
        self.parked = Some(driver);
    }

    /// Halts, loads `program` into a freshly initialized machine and restarts
    /// if the thread was running. A rejected program leaves everything as it was.
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        let was_running = self.is_running();
        self.halt();
        let loaded = lock(&self.emu).load_program(program);
        if loaded.is_ok() {
            if let Some(driver) = self.parked.as_mut() {
                driver.divider.reset();
            }
        }
        if was_running {
            self.start();
        }
        loaded
    }

    pub fn pause(&self) {
        self.controls.paused.store(true, Ordering::Release);
        info!("paused");
    }

    pub fn resume(&self) {
        self.controls.step_requested.store(false, Ordering::Release);
        self.controls.paused.store(false, Ordering::Release);
        info!("resumed at {} Hz", self.clock_hz());
    }

    pub fn toggle_pause(&self) {
        if self.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.controls.is_paused()
    }

    /// Runs exactly one cycle on the CPU thread. Ignored unless paused.
    pub fn step_once(&self) {
        if self.is_paused() {
            self.controls.step_requested.store(true, Ordering::Release);
        }
    }

    pub fn clock_hz(&self) -> u32 {
        self.controls.clock_hz()
    }

    /// Takes effect on the next burst. Clamped to 1 Hz ..= [`MAX_CLOCK_HZ`].
    pub fn set_clock_hz(&self, hz: u32) -> u32 {
        let hz = hz.clamp(1, MAX_CLOCK_HZ);
        self.controls.clock_hz.store(hz, Ordering::Release);
        info!("clock set to {hz} Hz");
        hz
    }

    pub fn double_clock(&self) -> u32 {
        self.set_clock_hz(self.clock_hz().saturating_mul(2))
    }

    pub fn halve_clock(&self) -> u32 {
        self.set_clock_hz(self.clock_hz() / 2)
    }

    pub fn key_down(&self, key: u8) {
        lock(&self.emu).keyboard.key_down(key);
    }

    pub fn key_up(&self, key: u8) {
        lock(&self.emu).keyboard.key_up(key);
    }

    pub fn take_frame(&self, palette: &Palette) -> Option<Vec<u32>> {
        lock(&self.emu).take_frame(palette)
    }

    pub fn snapshot(&self) -> Snapshot {
        lock(&self.emu).snapshot(self.clock_hz())
    }

    pub fn memory_dump(&self) -> String {
        lock(&self.emu).mem.dump()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.halt();
    }
}
