use std::time::Duration;

/// Fixed-tick accumulator for a variable-rate frame loop.
///
/// Each frame feeds its elapsed time in; when more than one tick's worth has
/// accumulated a tick fires and the overage carries into the next tick.
#[derive(Debug, Clone)]
pub struct TickClock {
    ticks_per_second: f32,
    accumulated: f64,
    ticks: u64,
}

impl TickClock {
    pub fn new(ticks_per_second: f32) -> Self {
        Self {
            ticks_per_second,
            accumulated: 0.0,
            ticks: 0,
        }
    }

    pub fn ticks_per_second(&self) -> f32 {
        self.ticks_per_second
    }

    /// Change the tick rate; accumulated time is kept.
    pub fn set_ticks_per_second(&mut self, ticks_per_second: f32) {
        self.ticks_per_second = ticks_per_second;
    }

    /// Length of one tick in seconds.
    pub fn tick_seconds(&self) -> f64 {
        1.0 / self.ticks_per_second as f64
    }

    /// Ticks fired so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Feed one frame's elapsed time. Returns true if a tick fired.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        self.accumulated += elapsed.as_secs_f64();
        let tick = self.tick_seconds();
        if self.accumulated > tick {
            self.accumulated -= tick;
            self.ticks += 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_enough_time_accumulates() {
        let mut clock = TickClock::new(10.0);
        assert!(!clock.advance(Duration::from_millis(60)));
        assert!(clock.advance(Duration::from_millis(60)));
        assert_eq!(clock.ticks(), 1);
    }

    #[test]
    fn overage_carries_into_next_tick() {
        let mut clock = TickClock::new(10.0);
        assert!(clock.advance(Duration::from_millis(150)));
        // 50ms left over; another 60ms crosses the next boundary.
        assert!(clock.advance(Duration::from_millis(60)));
        assert_eq!(clock.ticks(), 2);
    }

    #[test]
    fn at_most_one_tick_per_frame() {
        let mut clock = TickClock::new(30.0);
        assert!(clock.advance(Duration::from_secs(1)));
        assert_eq!(clock.ticks(), 1);
    }

    #[test]
    fn rate_change_keeps_accumulator() {
        let mut clock = TickClock::new(10.0);
        assert!(!clock.advance(Duration::from_millis(60)));
        clock.set_ticks_per_second(20.0);
        assert!(clock.advance(Duration::from_millis(1)));
    }
}
