pub const TIMER_DEC_PER_SECOND: u32 = 60;

/// 8-bit down-counter, floored at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    pub count: u8,
}

impl Timer {
    pub fn new(init_count: u8) -> Self {
        Self { count: init_count }
    }

    pub fn set(&mut self, value: u8) {
        self.count = value;
    }

    /// Counts down once. Returns true on the 1 -> 0 transition.
    pub fn decrement(&mut self) -> bool {
        match self.count {
            0 => false,
            1 => {
                self.count = 0;
                true
            }
            _ => {
                self.count -= 1;
                false
            }
        }
    }
}

/// Turns elapsed CPU cycles into 60 Hz timer ticks.
///
/// Fractional cycles carry over, so at clock `F` one tick is produced for
/// every `F / 60` cycles however they are split between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerDivider {
    accumulated: f64,
}

impl TimerDivider {
    pub fn new() -> Self {
        Self { accumulated: 0.0 }
    }

    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }

    pub fn advance(&mut self, cycles: f64, clock_hz: u32) -> u32 {
        let period = clock_hz.max(1) as f64 / TIMER_DEC_PER_SECOND as f64;
        self.accumulated += cycles;
        if self.accumulated < period {
            return 0;
        }
        let ticks = (self.accumulated / period).floor();
        self.accumulated -= ticks * period;
        ticks as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_floors_at_zero() {
        let mut timer = Timer::new(2);
        assert!(!timer.decrement());
        assert_eq!(timer.count, 1);
        assert!(timer.decrement());
        assert_eq!(timer.count, 0);
        assert!(!timer.decrement());
        assert_eq!(timer.count, 0);
    }

    #[test]
    fn one_tick_per_sixtieth_of_clock() {
        let hz = 600;
        let mut divider = TimerDivider::new();
        for _ in 0..9 {
            assert_eq!(divider.advance(1.0, hz), 0);
        }
        assert_eq!(divider.advance(1.0, hz), 1);
        assert_eq!(divider.advance(1.0, hz), 0);
    }

    #[test]
    fn fractional_cycles_carry_over() {
        let hz = 1_760_000;
        let mut divider = TimerDivider::new();
        let period = hz as f64 / 60.0;
        assert_eq!(divider.advance(period / 2.0, hz), 0);
        assert_eq!(divider.advance(period / 2.0, hz), 1);
        assert_eq!(divider.advance(period * 3.0 + 1.0, hz), 3);
    }
}
