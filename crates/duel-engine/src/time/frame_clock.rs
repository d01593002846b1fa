use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds. Clamped.
    pub dt: f32,

    /// Seconds since the clock was created. Monotonic and unclamped; this is
    /// the time base scene animations are keyed on.
    pub game_time: f64,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// `dt` is clamped to avoid pathological values after debugger pauses or
/// minimized windows. `game_time` is not clamped: animators compare it against
/// absolute start times, so it must track wall time.
#[derive(Debug, Clone)]
pub struct FrameClock {
    origin: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            origin: now,
            last: now,
            frame_index: 0,
            dt_min: Duration::from_micros(100),
            dt_max: Duration::from_millis(250),
        }
    }

    /// Seconds elapsed since the clock was created.
    pub fn game_time(&self) -> f64 {
        Instant::now().saturating_duration_since(self.origin).as_secs_f64()
    }

    /// Resets the delta baseline without touching `game_time`.
    ///
    /// Used after the surface is reconfigured so the next `dt` does not
    /// include the stall.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);

        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            game_time: now.saturating_duration_since(self.origin).as_secs_f64(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_time_is_monotonic() {
        let mut clock = FrameClock::new();
        let a = clock.tick();
        std::thread::sleep(Duration::from_millis(2));
        let b = clock.tick();
        assert!(b.game_time > a.game_time);
        assert_eq!(b.frame_index, a.frame_index + 1);
    }

    #[test]
    fn dt_is_clamped_but_game_time_is_not() {
        let mut clock = FrameClock::new();
        clock.last -= Duration::from_secs(5);
        clock.origin -= Duration::from_secs(5);
        let ft = clock.tick();
        assert!(ft.dt <= 0.25 + f32::EPSILON);
        assert!(ft.game_time >= 5.0);
    }
}
