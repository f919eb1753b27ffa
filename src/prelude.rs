pub use crate::agent::{Agent, AgentId, AgentSnapshot, HealthStatus, MovementMode, Outcome};
pub use crate::city::{CityMap, GridCity};
pub use crate::define_rng;
pub use crate::error::EpiCityError;
pub use crate::geometry::{Direction, Point, Zone};
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::parameters::{
    AgentParameters, CityParameters, DiseaseParameters, MotionParameters, Parameters,
};
pub use crate::random::RngStreams;
pub use crate::simulation::{RunSummary, Simulation, StateCounts, TickRecord};
