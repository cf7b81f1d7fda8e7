// Global opacity, eased toward a target with a cubic ease-out.
// A new target restarts the transition from wherever the value is now.

use std::time::Duration;

pub const FADE_DURATION: Duration = Duration::from_millis(700);

#[derive(Clone, Debug)]
pub struct OpacityFade {
    from: f32,
    target: f32,
    started: Duration,
    duration: Duration,
}

impl OpacityFade {
    pub fn new(initial: f32) -> Self {
        let v = initial.clamp(0.0, 1.0);
        Self { from: v, target: v, started: Duration::ZERO, duration: FADE_DURATION }
    }

    /// Start easing toward `target`; supersedes any transition in flight.
    pub fn retarget(&mut self, target: f32, now: Duration) {
        self.from = self.value(now);
        self.target = target.clamp(0.0, 1.0);
        self.started = now;
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn value(&self, now: Duration) -> f32 {
        let t = if self.duration.is_zero() {
            1.0
        } else {
            (now.saturating_sub(self.started).as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
        };
        let eased = 1.0 - (1.0 - t).powi(3);
        (self.from + (self.target - self.from) * eased).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test_log::test]
    fn reaches_target_after_duration() {
        let mut f = OpacityFade::new(0.0);
        f.retarget(1.0, ms(100));
        assert_eq!(f.value(ms(100)), 0.0);
        assert!(f.value(ms(450)) > 0.5); // ease-out is past halfway at t=0.5
        assert_eq!(f.value(ms(800)), 1.0);
        assert_eq!(f.value(ms(5_000)), 1.0);
    }

    #[test_log::test]
    fn retarget_starts_from_current_value() {
        let mut f = OpacityFade::new(0.0);
        f.retarget(1.0, ms(0));
        let mid = f.value(ms(200));
        f.retarget(0.0, ms(200));
        assert!((f.value(ms(200)) - mid).abs() < 1e-6);
        assert_eq!(f.value(ms(900)), 0.0);
    }

    #[test_log::test]
    fn rapid_flips_stay_in_unit_range() {
        let mut f = OpacityFade::new(1.0);
        for i in 0..200u64 {
            let now = ms(i * 7);
            f.retarget(if i % 2 == 0 { 0.0 } else { 1.0 }, now);
            for offset in [0, 3, 6, 700, 2_000] {
                let v = f.value(now + ms(offset));
                assert!((0.0..=1.0).contains(&v), "{v}");
            }
        }
    }
}
