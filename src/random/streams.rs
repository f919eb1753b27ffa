use std::any::TypeId;

use log::trace;

use crate::hashing::{hash_str, HashMap};
use crate::rand::SeedableRng;
use crate::random::{RngHolder, RngId};

/// Holds a base seed and the streams created from it so far.
pub struct RngStreams {
    base_seed: u64,
    rng_holders: HashMap<TypeId, RngHolder>,
}

impl RngStreams {
    /// Creates an empty set of streams. Streams are created lazily when `get_rng` is called.
    #[must_use]
    pub fn new(base_seed: u64) -> Self {
        trace!("initializing random streams (seed={base_seed})");
        RngStreams {
            base_seed,
            rng_holders: HashMap::default(),
        }
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Gets a mutable reference to the random number generator associated with the given
    /// [`RngId`]. If the Rng has not been used before, one will be created from the base seed.
    pub fn get_rng<R: RngId>(&mut self) -> &mut R::RngType {
        let base_seed = self.base_seed;
        self.rng_holders
            .entry(TypeId::of::<R>())
            // Create a new rng holder if it doesn't exist yet
            .or_insert_with(|| {
                trace!(
                    "creating new RNG (seed={}) for {}",
                    base_seed,
                    R::get_name()
                );
                let seed_offset = hash_str(R::get_name());
                RngHolder {
                    rng: Box::new(R::RngType::seed_from_u64(
                        base_seed.wrapping_add(seed_offset),
                    )),
                }
            })
            .rng
            .downcast_mut::<R::RngType>()
            .expect("rng holders are keyed by the type id of their RngId")
    }
}
