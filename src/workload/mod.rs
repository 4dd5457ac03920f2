//! Statistical workload models.
//!
//! This module contains the two random processes that shape the timeline:
//!
//! - **Popularity**: Zipf-Mandelbrot distribution of requested content
//! - **Arrival**: exponential inter-event times with a mutable rate
//!
//! Both are driven by seeded ChaCha generators, so a run is fully
//! determined by its seed.

pub mod arrival;
pub mod popularity;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub use arrival::ArrivalProcess;
pub use popularity::ZipfMandelbrot;

/// Generator used for every draw of a run
pub type SimRng = ChaCha8Rng;

/// Create the run generator from a seed
pub fn seeded_rng(seed: u64) -> SimRng {
    ChaCha8Rng::seed_from_u64(seed)
}
