//! Zipf-Mandelbrot content popularity.
//!
//! Rank `k` (1-based) is requested with probability proportional to
//! `1 / (k + plateau)^exponent`. Rank `k` maps to content identifier `k - 1`,
//! so content 0 is always the most popular item.
//!
//! The cumulative distribution is computed once at construction; each draw
//! is one uniform sample and a binary search over the table.

use rand::{Rng, SeedableRng};

use crate::config::ConfigError;
use crate::types::ContentId;
use crate::workload::SimRng;

/// Zipf-Mandelbrot sampler over `[0, num_contents)`
#[derive(Debug, Clone)]
pub struct ZipfMandelbrot {
    cumulative: Vec<f64>,
    exponent: f64,
    plateau: f64,
    rng: SimRng,
}

impl ZipfMandelbrot {
    /// Build the sampler with its own generator seeded from `seed`.
    pub fn new(num_contents: u32, plateau: f64, exponent: f64, seed: u64) -> Result<Self, ConfigError> {
        if num_contents == 0 {
            return Err(ConfigError::InvalidCatalog(
                "catalog must contain at least one content".to_string(),
            ));
        }
        if !(exponent.is_finite() && exponent >= 0.0) {
            return Err(ConfigError::InvalidCatalog(format!(
                "exponent must be a non-negative number, got {}",
                exponent
            )));
        }
        if !(plateau.is_finite() && plateau >= 0.0) {
            return Err(ConfigError::InvalidCatalog(format!(
                "plateau must be a non-negative number, got {}",
                plateau
            )));
        }

        let mut cumulative = Vec::with_capacity(num_contents as usize);
        let mut total = 0.0;
        for rank in 1..=num_contents {
            total += 1.0 / (rank as f64 + plateau).powf(exponent);
            cumulative.push(total);
        }
        for value in cumulative.iter_mut() {
            *value /= total;
        }
        // Guard the last bucket against rounding so every draw lands in the table.
        if let Some(last) = cumulative.last_mut() {
            *last = 1.0;
        }

        Ok(Self {
            cumulative,
            exponent,
            plateau,
            rng: SimRng::seed_from_u64(seed),
        })
    }

    /// Draw the next content identifier
    pub fn next_content(&mut self) -> ContentId {
        // Uniform in (0, 1]; a zero draw would select nothing.
        let p: f64 = 1.0 - self.rng.gen::<f64>();
        let index = self.cumulative.partition_point(|&c| c < p);
        ContentId(index.min(self.cumulative.len() - 1) as u32)
    }

    /// Probability mass of a content identifier
    pub fn probability(&self, content: ContentId) -> f64 {
        let i = content.0 as usize;
        match i {
            0 => self.cumulative.first().copied().unwrap_or(0.0),
            _ if i < self.cumulative.len() => self.cumulative[i] - self.cumulative[i - 1],
            _ => 0.0,
        }
    }

    pub fn num_contents(&self) -> u32 {
        self.cumulative.len() as u32
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    pub fn plateau(&self) -> f64 {
        self.plateau
    }
}

impl Iterator for ZipfMandelbrot {
    type Item = ContentId;

    fn next(&mut self) -> Option<ContentId> {
        Some(self.next_content())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_catalog() {
        assert!(ZipfMandelbrot::new(0, 0.0, 0.8, 1).is_err());
    }

    #[test]
    fn test_rejects_negative_exponent() {
        assert!(ZipfMandelbrot::new(10, 0.0, -0.1, 1).is_err());
        assert!(ZipfMandelbrot::new(10, -1.0, 0.8, 1).is_err());
    }

    #[test]
    fn test_draws_stay_in_catalog() {
        let mut dist = ZipfMandelbrot::new(25, 0.0, 1.2, 3).unwrap();
        for _ in 0..10_000 {
            assert!(dist.next_content().0 < 25);
        }
    }

    #[test]
    fn test_single_content_catalog() {
        let mut dist = ZipfMandelbrot::new(1, 0.0, 0.8, 3).unwrap();
        assert!(dist.by_ref().take(100).all(|c| c == ContentId(0)));
        assert_eq!(dist.probability(ContentId(0)), 1.0);
    }

    #[test]
    fn test_probabilities_follow_power_law() {
        let dist = ZipfMandelbrot::new(10, 0.0, 1.0, 0).unwrap();
        let total: f64 = (0..10).map(|i| dist.probability(ContentId(i))).sum();
        assert!((total - 1.0).abs() < 1e-12);

        // With exponent 1 and no plateau, p(rank 1) / p(rank 2) == 2.
        let ratio = dist.probability(ContentId(0)) / dist.probability(ContentId(1));
        assert!((ratio - 2.0).abs() < 1e-9);
        assert_eq!(dist.probability(ContentId(10)), 0.0);
    }

    #[test]
    fn test_zero_exponent_is_uniform() {
        let dist = ZipfMandelbrot::new(4, 0.0, 0.0, 0).unwrap();
        for i in 0..4 {
            assert!((dist.probability(ContentId(i)) - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empirical_frequencies_converge() {
        let num_contents = 10;
        let samples = 200_000;
        let mut dist = ZipfMandelbrot::new(num_contents, 0.0, 0.8, 2024).unwrap();
        let mut counts = vec![0usize; num_contents as usize];
        for _ in 0..samples {
            counts[dist.next_content().0 as usize] += 1;
        }

        for (i, &count) in counts.iter().enumerate() {
            let expected = dist.probability(ContentId(i as u32));
            let observed = count as f64 / samples as f64;
            assert!(
                (observed - expected).abs() < 0.01,
                "content {} observed {} expected {}",
                i,
                observed,
                expected
            );
        }
        // Popular items really are drawn more often.
        assert!(counts[0] > counts[num_contents as usize - 1]);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a: Vec<_> = ZipfMandelbrot::new(50, 0.0, 0.8, 9).unwrap().take(200).collect();
        let b: Vec<_> = ZipfMandelbrot::new(50, 0.0, 0.8, 9).unwrap().take(200).collect();
        assert_eq!(a, b);
    }
}
