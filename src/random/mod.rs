//! Named, independently seeded random number streams.
//!
//! Every consumer of randomness in the simulation draws from its own stream, identified by a
//! type declared with [`define_rng!`]. A stream is created lazily the first time it is
//! requested and seeded with `base_seed + hash(name)`, so adding draws to one stream never
//! perturbs the sequence seen by another, and a run is fully determined by its base seed.
mod macros;
mod streams;

use std::any::Any;

pub use macros::define_rng;
pub use streams::RngStreams;

use crate::rand::{RngCore, SeedableRng};

pub trait RngId: Copy + Clone + Any {
    type RngType: SeedableRng + RngCore + 'static;
    fn get_name() -> &'static str;
}

// This is a wrapper that allows for future support for different types of
// random number generators (anything that implements SeedableRng is valid).
struct RngHolder {
    rng: Box<dyn Any>,
}
