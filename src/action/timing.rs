use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;

/// Window from which the response delay is drawn.
/// A fresh delay is sampled for every synthesized action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delay {
    min: Duration,
    max: Duration,
}

impl Default for Delay {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(1),
            max: Duration::from_secs(4),
        }
    }
}

impl Delay {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }
    pub fn from_secs(min: f64, max: f64) -> anyhow::Result<Self> {
        anyhow::ensure!(min.is_finite() && max.is_finite(), "delay bounds must be finite");
        anyhow::ensure!(min >= 0.0, "delay bounds must be non-negative");
        anyhow::ensure!(min <= max, "minimum delay {} exceeds maximum {}", min, max);
        Ok(Self::new(
            Duration::from_secs_f64(min),
            Duration::from_secs_f64(max),
        ))
    }
    pub fn min(&self) -> Duration {
        self.min
    }
    pub fn max(&self) -> Duration {
        self.max
    }
    pub fn sample<R>(&self, rng: &mut R) -> Duration
    where
        R: Rng + ?Sized,
    {
        Duration::from_secs_f64(rng.random_range(self.min.as_secs_f64()..=self.max.as_secs_f64()))
    }
    /// Time still to wait so that at least `delay` separates the request
    /// from our response.
    pub fn remaining(delay: Duration, requested: Instant, now: Instant) -> Duration {
        delay.saturating_sub(now.saturating_duration_since(requested))
    }
    /// Earliest instant a response to a request received at `requested`
    /// may be emitted, sampled fresh.
    pub fn deadline(&self, requested: Instant) -> Instant {
        let now = Instant::now();
        now + Self::remaining(self.sample(&mut rand::rng()), requested, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_within_window() {
        let delay = Delay::from_secs(0.5, 1.5).unwrap();
        let ref mut rng = rand::rng();
        for _ in 0..1000 {
            let d = delay.sample(rng);
            assert!(d >= delay.min() && d <= delay.max());
        }
    }

    #[test]
    fn degenerate_window_is_constant() {
        let delay = Delay::from_secs(2.0, 2.0).unwrap();
        assert_eq!(delay.sample(&mut rand::rng()), Duration::from_secs(2));
    }

    #[test]
    fn rejects_bad_bounds() {
        assert!(Delay::from_secs(3.0, 1.0).is_err());
        assert!(Delay::from_secs(-1.0, 1.0).is_err());
        assert!(Delay::from_secs(0.0, f64::NAN).is_err());
    }

    #[test]
    fn remaining_subtracts_elapsed() {
        let requested = Instant::now();
        let now = requested + Duration::from_millis(700);
        assert_eq!(
            Delay::remaining(Duration::from_secs(2), requested, now),
            Duration::from_millis(1300)
        );
        assert_eq!(
            Delay::remaining(Duration::from_millis(500), requested, now),
            Duration::ZERO
        );
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_never_precedes_minimum() {
        let delay = Delay::from_secs(1.0, 3.0).unwrap();
        let requested = Instant::now();
        for _ in 0..100 {
            let deadline = delay.deadline(requested);
            assert!(deadline >= requested + delay.min());
            assert!(deadline <= requested + delay.max());
        }
    }
}
