//! Run configuration.
//!
//! All values are plain data fixed at construction time. Agents share their slice of the
//! configuration through an `Arc<AgentParameters>`; nothing here is mutated during a run.
//!
//! A configuration file is a JSON document with the shape of [`Parameters`]. Every field is
//! optional and falls back to its default:
//!
//! ```json
//! {
//!     "population": 80,
//!     "disease": { "infection_radius": 0.8, "mortality_rate": 0.15 },
//!     "city": { "city_size": 6 }
//! }
//! ```
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::city::ROAD_EDGE_BUFFER;
use crate::error::EpiCityError;

/// Transmission and progression parameters of the disease.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiseaseParameters {
    /// Maximum distance at which an infected agent can infect a healthy one.
    pub infection_radius: f64,
    /// Probability used by each Bernoulli draw of a transmission attempt.
    pub infection_probability: f64,
    /// Time from infection onset to removal.
    pub infection_duration: f64,
    /// Probability that a removal is a death.
    pub mortality_rate: f64,
    /// Time from infection onset after which the agent is sent to quarantine.
    pub quarantine_threshold: f64,
}

impl Default for DiseaseParameters {
    fn default() -> Self {
        DiseaseParameters {
            infection_radius: 0.5,
            infection_probability: 0.75,
            infection_duration: 15.0,
            mortality_rate: 0.2,
            quarantine_threshold: 5.0,
        }
    }
}

/// Movement and animation constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotionParameters {
    /// Distance covered by one roaming step.
    pub step_size: f64,
    /// Transit progress added per tick. Not time scaled.
    pub transit_speed: f64,
    /// Vertical offset of the arc control point above the chord midpoint.
    pub arc_lift: f64,
    /// Maximum per-axis displacement of one random-walk step inside quarantine.
    pub quarantine_jitter: f64,
    /// Time between death and the start of the graveyard transit.
    pub graveyard_delay: f64,
    /// Distance kept between a grave and the far edges of the graveyard.
    pub grave_margin: f64,
    /// Upper bound of the step budget drawn on each direction change.
    pub max_step_budget: f64,
    /// Upper bound of the budget consumed by one committed step.
    pub max_step_cost: f64,
}

impl Default for MotionParameters {
    fn default() -> Self {
        MotionParameters {
            step_size: 0.05,
            transit_speed: 0.3,
            arc_lift: 5.0,
            quarantine_jitter: 0.02,
            graveyard_delay: 1.0,
            grave_margin: 0.2,
            max_step_budget: 0.05,
            max_step_cost: 0.02,
        }
    }
}

/// Geometry of the grid city.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CityParameters {
    /// Number of blocks along each axis.
    pub city_size: u32,
    pub building_size: f64,
    pub road_width: f64,
    /// Inset from the road edges used when sampling spawn positions.
    pub road_buffer: f64,
}

impl Default for CityParameters {
    fn default() -> Self {
        CityParameters {
            city_size: 5,
            building_size: 2.0,
            road_width: 1.0,
            road_buffer: 0.001,
        }
    }
}

/// The parameters each agent is constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentParameters {
    pub disease: DiseaseParameters,
    pub motion: MotionParameters,
}

/// Everything needed to set up one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    pub population: usize,
    /// Number of agents infected at time zero.
    pub initial_infections: usize,
    /// Simulation time elapsed per tick.
    pub tick_duration: f64,
    pub disease: DiseaseParameters,
    pub motion: MotionParameters,
    pub city: CityParameters,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            population: 50,
            initial_infections: 1,
            tick_duration: 1.0 / 30.0,
            disease: DiseaseParameters::default(),
            motion: MotionParameters::default(),
            city: CityParameters::default(),
        }
    }
}

fn check_probability(name: &str, value: f64) -> Result<(), EpiCityError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EpiCityError::InvalidParameter(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

fn check_positive(name: &str, value: f64) -> Result<(), EpiCityError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EpiCityError::InvalidParameter(format!(
            "{name} must be a positive finite number, got {value}"
        )))
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<(), EpiCityError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EpiCityError::InvalidParameter(format!(
            "{name} must be a non-negative finite number, got {value}"
        )))
    }
}

impl DiseaseParameters {
    /// # Errors
    /// Returns `EpiCityError::InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<(), EpiCityError> {
        check_non_negative("infection_radius", self.infection_radius)?;
        check_probability("infection_probability", self.infection_probability)?;
        check_positive("infection_duration", self.infection_duration)?;
        check_probability("mortality_rate", self.mortality_rate)?;
        check_non_negative("quarantine_threshold", self.quarantine_threshold)
    }
}

impl MotionParameters {
    /// # Errors
    /// Returns `EpiCityError::InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<(), EpiCityError> {
        check_positive("step_size", self.step_size)?;
        check_positive("transit_speed", self.transit_speed)?;
        check_non_negative("arc_lift", self.arc_lift)?;
        check_non_negative("quarantine_jitter", self.quarantine_jitter)?;
        check_non_negative("graveyard_delay", self.graveyard_delay)?;
        check_non_negative("grave_margin", self.grave_margin)?;
        check_non_negative("max_step_budget", self.max_step_budget)?;
        check_non_negative("max_step_cost", self.max_step_cost)
    }
}

impl CityParameters {
    /// Side length of one block plus the road that follows it.
    pub fn cell_size(&self) -> f64 {
        self.building_size + self.road_width
    }

    /// # Errors
    /// Returns `EpiCityError::InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<(), EpiCityError> {
        if self.city_size < 2 {
            return Err(EpiCityError::InvalidParameter(format!(
                "city_size must be at least 2, got {}",
                self.city_size
            )));
        }
        check_positive("building_size", self.building_size)?;
        check_positive("road_width", self.road_width)?;
        if self.road_width <= 2.0 * ROAD_EDGE_BUFFER {
            return Err(EpiCityError::InvalidParameter(format!(
                "road_width must exceed {}, got {}",
                2.0 * ROAD_EDGE_BUFFER,
                self.road_width
            )));
        }
        check_non_negative("road_buffer", self.road_buffer)?;
        if 2.0 * self.road_buffer >= self.road_width {
            return Err(EpiCityError::InvalidParameter(format!(
                "road_buffer ({}) leaves no room on a road of width {}",
                self.road_buffer, self.road_width
            )));
        }
        Ok(())
    }
}

impl Parameters {
    /// The subset of parameters handed to every agent.
    pub fn agent_parameters(&self) -> AgentParameters {
        AgentParameters {
            disease: self.disease,
            motion: self.motion,
        }
    }

    /// # Errors
    /// Returns `EpiCityError::InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<(), EpiCityError> {
        if self.initial_infections > self.population {
            return Err(EpiCityError::InvalidParameter(format!(
                "initial_infections ({}) exceeds population ({})",
                self.initial_infections, self.population
            )));
        }
        check_positive("tick_duration", self.tick_duration)?;
        self.disease.validate()?;
        self.motion.validate()?;
        self.city.validate()
    }

    /// Reads parameters from a JSON file and validates them.
    ///
    /// # Errors
    /// Returns an `EpiCityError` if the file cannot be read, is not valid JSON for
    /// [`Parameters`], or holds out-of-range values.
    pub fn load_from_json(path: &Path) -> Result<Parameters, EpiCityError> {
        info!("Loading parameters from: {}", path.display());
        let contents = fs::read_to_string(path)?;
        let parameters: Parameters = serde_json::from_str(&contents)?;
        parameters.validate()?;
        Ok(parameters)
    }
}
