//! The tick driver.
//!
//! One call to [`Simulation::step`] advances the clock by `tick_duration` and then runs three
//! phases over the whole population, each one finishing before the next starts:
//!
//! 1. every agent moves;
//! 2. every infected agent attempts to infect every healthy agent (all ordered pairs);
//! 3. every agent's infection status is updated.
//!
//! Each phase draws from its own random stream, so the sequence of draws in one phase does not
//! depend on how many draws another phase made.
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId, AgentSnapshot, HealthStatus, MovementMode, Outcome};
use crate::city::{CityMap, GridCity};
use crate::define_rng;
use crate::error::EpiCityError;
use crate::parameters::Parameters;
use crate::random::RngStreams;

define_rng!(PlacementRng);
define_rng!(MovementRng);
define_rng!(TransmissionRng);
define_rng!(ProgressionRng);

/// Number of agents in each health state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateCounts {
    pub healthy: usize,
    pub infected: usize,
    pub recovered: usize,
    pub deceased: usize,
}

impl StateCounts {
    #[must_use]
    pub fn tally(agents: &[Agent]) -> Self {
        let mut counts = StateCounts::default();
        for agent in agents {
            match agent.health() {
                HealthStatus::Healthy => counts.healthy += 1,
                HealthStatus::Infected { .. } => counts.infected += 1,
                HealthStatus::Removed {
                    outcome: Outcome::Recovered,
                    ..
                } => counts.recovered += 1,
                HealthStatus::Removed {
                    outcome: Outcome::Deceased,
                    ..
                } => counts.deceased += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.healthy + self.infected + self.recovered + self.deceased
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub tick: u64,
    pub time: f64,
    pub counts: StateCounts,
}

/// Outcome of [`Simulation::run_until`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub random_seed: u64,
    pub ticks: u64,
    pub time: f64,
    pub final_counts: StateCounts,
    /// Deceased agents that have reached their grave.
    pub buried: usize,
}

pub struct Simulation<M: CityMap = GridCity> {
    parameters: Parameters,
    map: M,
    agents: Vec<Agent>,
    rngs: RngStreams,
    tick: u64,
    now: f64,
    history: Vec<TickRecord>,
}

impl Simulation<GridCity> {
    /// Builds a simulation on the grid city described by `parameters.city`.
    ///
    /// # Errors
    /// Returns `EpiCityError::InvalidParameter` if `parameters` do not validate.
    pub fn on_grid_city(parameters: Parameters, random_seed: u64) -> Result<Self, EpiCityError> {
        let map = GridCity::new(&parameters.city);
        Simulation::new(parameters, map, random_seed)
    }
}

impl<M: CityMap> Simulation<M> {
    /// Spawns `parameters.population` agents on `map` and infects the first
    /// `parameters.initial_infections` of them at time zero.
    ///
    /// # Errors
    /// Returns `EpiCityError::InvalidParameter` if `parameters` do not validate.
    pub fn new(parameters: Parameters, map: M, random_seed: u64) -> Result<Self, EpiCityError> {
        parameters.validate()?;
        info!(
            "Starting simulation: population={} initial_infections={} seed={}",
            parameters.population, parameters.initial_infections, random_seed
        );

        let mut rngs = RngStreams::new(random_seed);
        let agent_parameters = Arc::new(parameters.agent_parameters());
        let rng = rngs.get_rng::<PlacementRng>();
        let mut agents: Vec<Agent> = (0..parameters.population)
            .map(|index| Agent::spawn(AgentId(index), agent_parameters.clone(), &map, rng))
            .collect();
        for agent in agents.iter_mut().take(parameters.initial_infections) {
            agent.seed_infection(0.0);
        }

        let mut simulation = Simulation {
            parameters,
            map,
            agents,
            rngs,
            tick: 0,
            now: 0.0,
            history: Vec::new(),
        };
        simulation.record_counts();
        Ok(simulation)
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn random_seed(&self) -> u64 {
        self.rngs.base_seed()
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.0)
    }

    /// Positions and states for a renderer.
    #[must_use]
    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents.iter().map(Agent::snapshot).collect()
    }

    /// Current simulation time.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Number of ticks executed so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn counts(&self) -> StateCounts {
        StateCounts::tally(&self.agents)
    }

    /// Counts after every tick, starting with the initial state at tick 0.
    pub fn history(&self) -> &[TickRecord] {
        &self.history
    }

    /// Whether nothing but roaming can happen any more: nobody is infected and every deceased
    /// agent has reached its grave.
    pub fn is_settled(&self) -> bool {
        self.agents.iter().all(|agent| match agent.health() {
            HealthStatus::Infected { .. } => false,
            HealthStatus::Removed {
                outcome: Outcome::Deceased,
                ..
            } => agent.movement() == MovementMode::AtGrave,
            HealthStatus::Healthy
            | HealthStatus::Removed {
                outcome: Outcome::Recovered,
                ..
            } => true,
        })
    }

    /// Runs one tick.
    pub fn step(&mut self) {
        self.tick += 1;
        // Derived from the tick count so that rounding does not accumulate.
        #[allow(clippy::cast_precision_loss)]
        let now = self.tick as f64 * self.parameters.tick_duration;
        self.now = now;

        let rng = self.rngs.get_rng::<MovementRng>();
        for agent in &mut self.agents {
            agent.move_step(now, &mut self.map, rng);
        }

        let new_infections = self.transmission_phase(now);

        let rng = self.rngs.get_rng::<ProgressionRng>();
        for agent in &mut self.agents {
            agent.update_infection_status(now, &self.map, rng);
        }

        let counts = self.record_counts();
        debug!(
            "tick {} t={:.3}: {} new infections, {:?}",
            self.tick, now, new_infections, counts
        );
    }

    /// Steps until `max_time` is reached or the simulation is settled.
    pub fn run_until(&mut self, max_time: f64) -> RunSummary {
        while self.now < max_time && !self.is_settled() {
            self.step();
        }
        let summary = self.summary();
        info!(
            "Simulation finished after {} ticks (t={:.3}): {:?}",
            summary.ticks, summary.time, summary.final_counts
        );
        summary
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            random_seed: self.random_seed(),
            ticks: self.tick,
            time: self.now,
            final_counts: self.counts(),
            buried: self
                .agents
                .iter()
                .filter(|agent| agent.movement() == MovementMode::AtGrave)
                .count(),
        }
    }

    // Infection status is read live: an agent infected earlier in this phase attempts
    // transmission itself when its turn comes.
    fn transmission_phase(&mut self, now: f64) -> usize {
        let rng = self.rngs.get_rng::<TransmissionRng>();
        let agents = &mut self.agents;
        let mut new_infections = 0;
        for source in 0..agents.len() {
            if !agents[source].is_infected() {
                continue;
            }
            for target in 0..agents.len() {
                if target == source || !agents[target].is_healthy() {
                    continue;
                }
                let (infector, healthy) = source_and_target(agents, source, target);
                if infector.check_infection(healthy, now, rng) {
                    new_infections += 1;
                }
            }
        }
        new_infections
    }

    fn record_counts(&mut self) -> StateCounts {
        let counts = self.counts();
        self.history.push(TickRecord {
            tick: self.tick,
            time: self.now,
            counts,
        });
        counts
    }
}

fn source_and_target(agents: &mut [Agent], source: usize, target: usize) -> (&Agent, &mut Agent) {
    debug_assert_ne!(source, target);
    if source < target {
        let (head, tail) = agents.split_at_mut(target);
        (&head[source], &mut tail[0])
    } else {
        let (head, tail) = agents.split_at_mut(source);
        (&tail[0], &mut head[target])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Direction, Point, Zone};
    use crate::parameters::{AgentParameters, DiseaseParameters};
    use rand::Rng;

    /// Everything inside a large square is road.
    struct OpenField;

    impl CityMap for OpenField {
        fn is_on_road(&self, point: Point) -> bool {
            (0.0..=100.0).contains(&point.x) && (0.0..=100.0).contains(&point.y)
        }

        fn center(&self) -> Point {
            Point::new(50.0, 50.0)
        }

        fn quarantine_zone(&self) -> Zone {
            Zone::new(Point::new(-7.0, 0.0), 2.0, 2.0)
        }

        fn graveyard_zone(&self) -> Zone {
            Zone::new(Point::new(-7.0, 4.0), 2.0, 2.0)
        }

        fn random_road_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
            Point::new(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0))
        }

        fn register_grave(&mut self, _grave: Point) {}
    }

    fn place(simulation: &mut Simulation<OpenField>, positions: &[Point]) {
        let parameters = Arc::new(AgentParameters {
            disease: simulation.parameters.disease,
            motion: simulation.parameters.motion,
        });
        simulation.agents = positions
            .iter()
            .enumerate()
            .map(|(index, position)| {
                Agent::new(AgentId(index), parameters.clone(), *position, Direction::Up)
            })
            .collect();
    }

    #[test]
    fn initial_state() {
        let parameters = Parameters {
            population: 30,
            initial_infections: 3,
            ..Parameters::default()
        };
        let simulation = Simulation::on_grid_city(parameters, 42).unwrap();
        assert_eq!(simulation.agents().len(), 30);
        assert_eq!(
            simulation.counts(),
            StateCounts {
                healthy: 27,
                infected: 3,
                recovered: 0,
                deceased: 0
            }
        );
        assert!(simulation.agents()[..3].iter().all(Agent::is_infected));
        assert!(simulation
            .agents()
            .iter()
            .all(|agent| simulation.map().is_on_road(agent.position())));
        assert_eq!(simulation.history().len(), 1);
        assert_eq!(simulation.history()[0].tick, 0);
    }

    #[test]
    fn rejects_invalid_parameters() {
        let mut parameters = Parameters::default();
        parameters.disease.infection_probability = 2.0;
        assert!(matches!(
            Simulation::on_grid_city(parameters, 0),
            Err(EpiCityError::InvalidParameter(_))
        ));
    }

    #[test]
    fn rejects_roads_too_narrow_to_stand_on() {
        let mut parameters = Parameters::default();
        parameters.city.road_width = 0.09;
        assert!(matches!(
            Simulation::on_grid_city(parameters, 1),
            Err(EpiCityError::InvalidParameter(_))
        ));
    }

    #[test]
    fn narrow_roads_spawn_every_agent_on_road() {
        let mut parameters = Parameters::default();
        parameters.city.road_width = 0.11;
        let simulation = Simulation::on_grid_city(parameters, 1).unwrap();
        let off_road = simulation
            .agents()
            .iter()
            .filter(|agent| !simulation.map().is_on_road(agent.position()))
            .count();
        assert_eq!(off_road, 0);
    }

    #[test]
    fn step_advances_clock_and_history() {
        let mut simulation = Simulation::on_grid_city(Parameters::default(), 1).unwrap();
        for _ in 0..30 {
            simulation.step();
        }
        assert_eq!(simulation.tick(), 30);
        assert!((simulation.now() - 1.0).abs() < 1e-9);
        assert_eq!(simulation.history().len(), 31);
        for record in simulation.history() {
            assert_eq!(record.counts.total(), 50);
        }
    }

    #[test]
    fn same_seed_same_history() {
        let run = |seed| {
            let mut simulation = Simulation::on_grid_city(Parameters::default(), seed).unwrap();
            simulation.run_until(8.0);
            (simulation.history().to_vec(), simulation.snapshots())
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn every_infected_agent_checks_every_healthy_agent() {
        let parameters = Parameters {
            population: 4,
            initial_infections: 0,
            disease: DiseaseParameters {
                infection_probability: 1.0,
                infection_radius: 0.5,
                ..DiseaseParameters::default()
            },
            ..Parameters::default()
        };
        let mut simulation = Simulation::new(parameters, OpenField, 3).unwrap();
        // Two separate clusters, each with one infected agent.
        place(
            &mut simulation,
            &[
                Point::new(10.0, 10.0),
                Point::new(10.1, 10.0),
                Point::new(80.0, 80.0),
                Point::new(80.1, 80.0),
            ],
        );
        simulation.agents[0].seed_infection(0.0);
        simulation.agents[3].seed_infection(0.0);

        let infections = simulation.transmission_phase(0.1);
        assert_eq!(infections, 2);
        assert!(simulation.agents().iter().all(Agent::is_infected));
    }

    #[test]
    fn newly_infected_agents_transmit_in_the_same_phase() {
        let parameters = Parameters {
            population: 3,
            initial_infections: 0,
            disease: DiseaseParameters {
                infection_probability: 1.0,
                infection_radius: 0.5,
                ..DiseaseParameters::default()
            },
            ..Parameters::default()
        };
        let mut simulation = Simulation::new(parameters, OpenField, 3).unwrap();
        // A chain: 0 reaches 1, 1 reaches 2, 0 does not reach 2.
        place(
            &mut simulation,
            &[
                Point::new(10.0, 10.0),
                Point::new(10.4, 10.0),
                Point::new(10.8, 10.0),
            ],
        );
        simulation.agents[0].seed_infection(0.0);

        assert_eq!(simulation.transmission_phase(0.1), 2);
        assert_eq!(
            simulation.agents[2].health(),
            HealthStatus::Infected { since: 0.1 }
        );
    }

    #[test]
    fn infections_use_post_move_positions() {
        let parameters = Parameters {
            population: 2,
            initial_infections: 0,
            tick_duration: 0.1,
            disease: DiseaseParameters {
                infection_probability: 1.0,
                infection_radius: 0.06,
                ..DiseaseParameters::default()
            },
            ..Parameters::default()
        };
        let mut simulation = Simulation::new(parameters, OpenField, 5).unwrap();
        // Out of range before moving. Both agents face up: the healthy one sits on the field's
        // top edge and cannot move, the infected one steps 0.05 towards it.
        place(
            &mut simulation,
            &[Point::new(20.0, 99.9), Point::new(20.0, 100.0)],
        );
        simulation.agents[0].seed_infection(0.0);

        simulation.step();
        assert!(simulation.agents[1].is_infected());
    }

    #[test]
    fn epidemic_with_certain_death_settles_with_everyone_buried() {
        let parameters = Parameters {
            population: 5,
            initial_infections: 5,
            tick_duration: 0.1,
            disease: DiseaseParameters {
                infection_duration: 2.0,
                mortality_rate: 1.0,
                ..DiseaseParameters::default()
            },
            ..Parameters::default()
        };
        let mut simulation = Simulation::on_grid_city(parameters, 11).unwrap();
        let summary = simulation.run_until(100.0);

        assert!(simulation.is_settled());
        assert_eq!(summary.final_counts.deceased, 5);
        assert_eq!(summary.buried, 5);
        assert_eq!(simulation.map().graves().len(), 5);
        // Two time units of infection, one of waiting, four ticks of transit.
        assert!(summary.time < 4.0, "settled late at t={}", summary.time);
        for agent in simulation.agents() {
            assert_eq!(Some(agent.position()), agent.grave());
            assert!(simulation.map().graveyard_zone().contains(agent.position()));
        }
    }

    #[test]
    fn run_until_stops_at_time_limit() {
        let mut simulation = Simulation::on_grid_city(Parameters::default(), 2).unwrap();
        let summary = simulation.run_until(1.0);
        assert!(summary.time >= 1.0 - 1e-9);
        assert!(summary.time < 1.0 + simulation.parameters().tick_duration);
        assert_eq!(summary.random_seed, 2);
    }

    #[test]
    fn removed_counts_never_decrease() {
        let parameters = Parameters {
            population: 40,
            disease: DiseaseParameters {
                infection_radius: 1.0,
                infection_probability: 1.0,
                infection_duration: 3.0,
                ..DiseaseParameters::default()
            },
            ..Parameters::default()
        };
        let mut simulation = Simulation::on_grid_city(parameters, 9).unwrap();
        simulation.run_until(10.0);
        for window in simulation.history().windows(2) {
            let (before, after) = (window[0].counts, window[1].counts);
            assert!(after.recovered >= before.recovered);
            assert!(after.deceased >= before.deceased);
            assert!(after.healthy <= before.healthy);
        }
    }
}
