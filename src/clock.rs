//! Simulation time.
//!
//! Two channels: a monotonic wall channel read by countdowns that run on real
//! time (mining), and a per-tick delta fed to movement, battery and charge.

use std::time::Instant;

#[derive(Debug, Clone)]
enum WallSource {
    System(Instant),
    Manual(f64),
}

#[derive(Debug, Clone)]
pub struct SimClock {
    wall: WallSource,
    last_dt: f64,
    ticks: u64,
}

impl SimClock {
    /// Wall channel backed by the process monotonic clock.
    pub fn system() -> Self {
        Self {
            wall: WallSource::System(Instant::now()),
            last_dt: 0.0,
            ticks: 0,
        }
    }

    /// Wall channel advanced only by `advance`; headless runs and tests use this.
    pub fn manual() -> Self {
        Self {
            wall: WallSource::Manual(0.0),
            last_dt: 0.0,
            ticks: 0,
        }
    }

    /// Seconds since the clock started.
    pub fn now(&self) -> f64 {
        match &self.wall {
            WallSource::System(start) => start.elapsed().as_secs_f64(),
            WallSource::Manual(seconds) => *seconds,
        }
    }

    pub fn advance(&mut self, dt: f64) {
        let dt = dt.max(0.0);
        if let WallSource::Manual(seconds) = &mut self.wall {
            *seconds += dt;
        }
        self.last_dt = dt;
        self.ticks += 1;
    }

    pub fn dt(&self) -> f64 {
        self.last_dt
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::manual()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_tracks_both_channels() {
        let mut clock = SimClock::manual();
        clock.advance(0.25);
        clock.advance(0.5);
        assert_eq!(clock.now(), 0.75);
        assert_eq!(clock.dt(), 0.5);
        assert_eq!(clock.ticks(), 2);
    }

    #[test]
    fn negative_deltas_are_ignored() {
        let mut clock = SimClock::manual();
        clock.advance(-3.0);
        assert_eq!(clock.now(), 0.0);
    }
}
