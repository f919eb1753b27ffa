//! A small agent-based model of epidemic spread in a grid city.
//!
//! Agents roam the roads of a square street grid. Infected agents pass the
//! disease to healthy agents within a fixed radius; after a while they are
//! taken by an arc-shaped transit to a quarantine box, and once the infection
//! runs its course they either recover or die and are carried to a graveyard.
//!
//! The crate is organized around a few pieces:
//! * [`agent::Agent`]: the per-agent health and movement state machine.
//! * [`city::CityMap`]: what an agent needs to know about the city, with
//!   [`city::GridCity`] as the concrete street grid.
//! * [`simulation::Simulation`]: the tick driver. Each tick moves every
//!   agent, then runs all transmission checks, then updates every agent's
//!   infection status, and records the resulting state counts.
//! * [`parameters::Parameters`]: the immutable run configuration, loadable
//!   from JSON.
//! * [`runner`]: the command line entry point used by the `epicity` binary.
//!
//! All randomness comes from named streams (see [`random`]) derived from a
//! single base seed, so a run is reproducible for a given seed.
pub mod agent;
pub mod city;
pub mod error;
pub mod geometry;
pub mod hashing;
pub mod log;
pub mod parameters;
pub mod prelude;
pub mod random;
pub mod runner;
pub mod simulation;

pub use crate::agent::{Agent, AgentId, HealthStatus, MovementMode, Outcome};
pub use crate::city::{CityMap, GridCity};
pub use crate::error::EpiCityError;
pub use crate::parameters::Parameters;
pub use crate::simulation::{RunSummary, Simulation, StateCounts};

// Re-exported for use by `define_rng!`
pub use paste;
pub use rand;
