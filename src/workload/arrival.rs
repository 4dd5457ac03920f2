//! Exponential inter-arrival process.
//!
//! Samples are drawn as `Exp(1) / rate`, so the rate can be replaced between
//! draws without resetting or re-seeding the underlying random stream.

use rand::Rng;
use rand_distr::{Distribution, Exp1};

use crate::config::ConfigError;

/// Exponential inter-event time generator with rate λ
#[derive(Debug, Clone)]
pub struct ArrivalProcess {
    rate: f64,
}

impl ArrivalProcess {
    pub fn new(rate: f64) -> Result<Self, ConfigError> {
        check_rate(rate)?;
        Ok(Self { rate })
    }

    /// Draw the next inter-arrival time; mean is `1 / rate`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let unit: f64 = Exp1.sample(rng);
        unit / self.rate
    }

    /// Replace λ in place; later samples use the new rate immediately
    pub fn set_rate(&mut self, rate: f64) -> Result<(), ConfigError> {
        check_rate(rate)?;
        self.rate = rate;
        Ok(())
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

/// Rate that scales with the number of active contents.
///
/// Falls back to a single active content when none are active so the
/// process never degenerates to a zero rate.
pub fn adapted_rate(base_rate: f64, active: u64) -> f64 {
    base_rate * active.max(1) as f64
}

fn check_rate(rate: f64) -> Result<(), ConfigError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate(format!("arrival rate must be positive, got {}", rate)))
    }
}
