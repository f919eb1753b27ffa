//! The per-agent health and movement state machine.
//!
//! Health only moves forward: `Healthy` → `Infected` → `Removed` (recovered or deceased).
//! Movement is driven by health:
//!
//! * healthy, recovered and not-yet-quarantined infected agents roam the roads;
//! * an infected agent past the quarantine threshold is carried along an arc into the
//!   quarantine box, then random-walks inside it;
//! * a deceased agent stands still for a short delay, is carried along an arc to a grave
//!   chosen for it, and stays there.
//!
//! Every operation checks its own preconditions and silently does nothing when they do not
//! hold. Randomness, the current time and the map are passed in by the caller.
use std::sync::Arc;

use log::trace;
use rand::seq::IteratorRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::city::CityMap;
use crate::geometry::{quadratic_bezier, Direction, Point, Zone};
use crate::parameters::AgentParameters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub usize);

/// How a removed agent left the infected state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Recovered,
    Deceased,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    /// Infected since the given time.
    Infected { since: f64 },
    /// Removed at the given time.
    Removed { outcome: Outcome, at: f64 },
}

/// A scripted arc from `start` to `end`, bowed through `control`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transit {
    pub start: Point,
    pub control: Point,
    pub end: Point,
    /// Fraction of the arc covered so far.
    pub progress: f64,
}

impl Transit {
    /// The control point sits above the midpoint between `start` and the destination zone's
    /// `anchor`, which bows the arc upwards.
    fn new(start: Point, anchor: Point, end: Point, lift: f64) -> Self {
        Transit {
            start,
            control: start.midpoint(anchor) + Point::new(0.0, lift),
            end,
            progress: 0.0,
        }
    }

    pub fn position(&self) -> Point {
        quadratic_bezier(self.start, self.control, self.end, self.progress)
    }

    // Returns true once the arc is complete.
    fn advance(&mut self, speed: f64) -> bool {
        self.progress += speed;
        self.progress >= 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MovementMode {
    RoamingRoad,
    MovingToQuarantine(Transit),
    InQuarantine,
    MovingToGraveyard(Transit),
    AtGrave,
}

/// What a renderer needs to draw one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub position: Point,
    pub health: HealthStatus,
    pub movement: MovementMode,
}

#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    parameters: Arc<AgentParameters>,
    position: Point,
    health: HealthStatus,
    movement: MovementMode,
    direction: Direction,
    steps_remaining: f64,
    grave: Option<Point>,
}

impl Agent {
    /// Creates a healthy, roaming agent at `position` facing `direction` with a full step
    /// budget.
    #[must_use]
    pub fn new(
        id: AgentId,
        parameters: Arc<AgentParameters>,
        position: Point,
        direction: Direction,
    ) -> Self {
        let steps_remaining = parameters.motion.max_step_budget;
        Agent {
            id,
            parameters,
            position,
            health: HealthStatus::Healthy,
            movement: MovementMode::RoamingRoad,
            direction,
            steps_remaining,
            grave: None,
        }
    }

    /// Creates a healthy agent at a random road position with a random heading and budget.
    pub fn spawn<M: CityMap, R: Rng + ?Sized>(
        id: AgentId,
        parameters: Arc<AgentParameters>,
        map: &M,
        rng: &mut R,
    ) -> Self {
        let position = map.random_road_position(rng);
        let direction = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
        let mut agent = Agent::new(id, parameters, position, direction);
        agent.steps_remaining = rng.random_range(0.0..=agent.parameters.motion.max_step_budget);
        agent
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn parameters(&self) -> &AgentParameters {
        &self.parameters
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn health(&self) -> HealthStatus {
        self.health
    }

    pub fn movement(&self) -> MovementMode {
        self.movement
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn steps_remaining(&self) -> f64 {
        self.steps_remaining
    }

    /// The grave assigned when the graveyard transit began, if any.
    pub fn grave(&self) -> Option<Point> {
        self.grave
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.health, HealthStatus::Healthy)
    }

    pub fn is_infected(&self) -> bool {
        matches!(self.health, HealthStatus::Infected { .. })
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.health {
            HealthStatus::Removed { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    pub fn is_in_transit(&self) -> bool {
        matches!(
            self.movement,
            MovementMode::MovingToQuarantine(_) | MovementMode::MovingToGraveyard(_)
        )
    }

    /// Transit progress, only while moving to quarantine or to the graveyard.
    pub fn transit_progress(&self) -> Option<f64> {
        match self.movement {
            MovementMode::MovingToQuarantine(transit) | MovementMode::MovingToGraveyard(transit) => {
                Some(transit.progress)
            }
            _ => None,
        }
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            position: self.position,
            health: self.health,
            movement: self.movement,
        }
    }

    /// Infects a healthy agent with probability `infection_probability`. Returns whether the
    /// agent became infected.
    pub fn infect<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R) -> bool {
        if !self.is_healthy() {
            return false;
        }
        if rng.random_bool(self.parameters.disease.infection_probability) {
            self.become_infected(now);
            true
        } else {
            false
        }
    }

    /// Infects a healthy agent unconditionally. Used for index cases.
    pub fn seed_infection(&mut self, now: f64) -> bool {
        if !self.is_healthy() {
            return false;
        }
        self.become_infected(now);
        true
    }

    fn become_infected(&mut self, now: f64) {
        trace!("{:?} infected at t={now:.3}", self.id);
        self.health = HealthStatus::Infected { since: now };
    }

    /// Attempts to pass the infection from this agent to `other`. Nothing happens unless this
    /// agent is infected, `other` is healthy and within `infection_radius`; then a Bernoulli
    /// draw gates the call to `other.infect`. Returns whether `other` became infected.
    pub fn check_infection<R: Rng + ?Sized>(
        &self,
        other: &mut Agent,
        now: f64,
        rng: &mut R,
    ) -> bool {
        if !self.is_infected() || !other.is_healthy() {
            return false;
        }
        let disease = &self.parameters.disease;
        if self.position.distance(other.position) <= disease.infection_radius
            && rng.random_bool(disease.infection_probability)
        {
            other.infect(now, rng)
        } else {
            false
        }
    }

    /// Ends the infection once `infection_duration` has elapsed, choosing death with
    /// probability `mortality_rate`. Before that, sends a roaming agent to quarantine once
    /// `quarantine_threshold` has elapsed.
    pub fn update_infection_status<M: CityMap, R: Rng + ?Sized>(
        &mut self,
        now: f64,
        map: &M,
        rng: &mut R,
    ) {
        let HealthStatus::Infected { since } = self.health else {
            return;
        };
        let elapsed = now - since;
        let disease = self.parameters.disease;

        if elapsed >= disease.infection_duration {
            let outcome = if rng.random_bool(disease.mortality_rate) {
                Outcome::Deceased
            } else {
                Outcome::Recovered
            };
            trace!("{:?} removed ({outcome:?}) at t={now:.3}", self.id);
            self.health = HealthStatus::Removed { outcome, at: now };
            // An unfinished quarantine transit is dropped where it stands.
            if let MovementMode::MovingToQuarantine(_) = self.movement {
                self.movement = MovementMode::RoamingRoad;
            }
        } else if elapsed >= disease.quarantine_threshold
            && self.movement == MovementMode::RoamingRoad
        {
            self.start_quarantine_transit(map.quarantine_zone(), rng);
        }
    }

    /// Advances the agent by one tick.
    pub fn move_step<M: CityMap, R: Rng + ?Sized>(&mut self, now: f64, map: &mut M, rng: &mut R) {
        match self.health {
            HealthStatus::Removed {
                outcome: Outcome::Deceased,
                at,
            } => {
                self.move_deceased(now - at, map, rng);
                return;
            }
            // Recovered agents keep moving like everyone else.
            HealthStatus::Removed {
                outcome: Outcome::Recovered,
                ..
            }
            | HealthStatus::Healthy
            | HealthStatus::Infected { .. } => {}
        }

        if self.movement == MovementMode::InQuarantine {
            self.wander_in_quarantine(map.quarantine_zone(), rng);
            return;
        }

        if let HealthStatus::Infected { since } = self.health {
            if now - since >= self.parameters.disease.quarantine_threshold {
                let zone = map.quarantine_zone();
                if !matches!(self.movement, MovementMode::MovingToQuarantine(_)) {
                    self.start_quarantine_transit(zone, rng);
                }
                self.advance_quarantine_transit(zone, rng);
                return;
            }
        }

        self.roam(map, rng);
    }

    fn start_quarantine_transit<R: Rng + ?Sized>(&mut self, zone: Zone, rng: &mut R) {
        trace!("{:?} heading to quarantine", self.id);
        let end = zone.sample_point(rng, 0.0);
        self.movement = MovementMode::MovingToQuarantine(Transit::new(
            self.position,
            zone.origin,
            end,
            self.parameters.motion.arc_lift,
        ));
    }

    fn advance_quarantine_transit<R: Rng + ?Sized>(&mut self, zone: Zone, rng: &mut R) {
        let MovementMode::MovingToQuarantine(ref mut transit) = self.movement else {
            return;
        };
        if transit.advance(self.parameters.motion.transit_speed) {
            trace!("{:?} arrived in quarantine", self.id);
            self.movement = MovementMode::InQuarantine;
            self.position = zone.sample_point(rng, 0.0);
        } else {
            self.position = transit.position();
        }
    }

    fn wander_in_quarantine<R: Rng + ?Sized>(&mut self, zone: Zone, rng: &mut R) {
        let jitter = self.parameters.motion.quarantine_jitter;
        let delta = Point::new(
            rng.random_range(-jitter..=jitter),
            rng.random_range(-jitter..=jitter),
        );
        self.position = zone.clamp(self.position + delta);
    }

    fn move_deceased<M: CityMap, R: Rng + ?Sized>(
        &mut self,
        time_since_death: f64,
        map: &mut M,
        rng: &mut R,
    ) {
        let motion = self.parameters.motion;
        match self.movement {
            MovementMode::MovingToGraveyard(ref mut transit) => {
                if transit.advance(motion.transit_speed) {
                    let grave = transit.end;
                    trace!("{:?} laid to rest at {grave:?}", self.id);
                    self.movement = MovementMode::AtGrave;
                    self.position = grave;
                    map.register_grave(grave);
                } else {
                    self.position = transit.position();
                }
            }
            MovementMode::AtGrave => {
                if let Some(grave) = self.grave {
                    self.position = grave;
                }
            }
            MovementMode::RoamingRoad
            | MovementMode::MovingToQuarantine(_)
            | MovementMode::InQuarantine => {
                if time_since_death >= motion.graveyard_delay && self.grave.is_none() {
                    let zone = map.graveyard_zone();
                    let grave = zone.sample_point(rng, motion.grave_margin);
                    trace!("{:?} heading to the graveyard", self.id);
                    self.grave = Some(grave);
                    self.movement = MovementMode::MovingToGraveyard(Transit::new(
                        self.position,
                        zone.origin,
                        grave,
                        motion.arc_lift,
                    ));
                }
            }
        }
    }

    /// One step of road-constrained roaming. The step is only committed if the target is on a
    /// road; otherwise, or once the step budget runs out, a new heading is drawn.
    fn roam<M: CityMap, R: Rng + ?Sized>(&mut self, map: &M, rng: &mut R) {
        let motion = self.parameters.motion;
        if self.steps_remaining <= 0.0 {
            self.choose_new_direction(map.center(), rng);
        }

        let candidate = self.direction.step(self.position, motion.step_size);
        if map.is_on_road(candidate) {
            self.position = candidate;
            self.steps_remaining -= rng.random_range(0.0..=motion.max_step_cost);
        } else {
            self.choose_new_direction(map.center(), rng);
        }
    }

    /// Picks a heading uniformly among those that do not lead further away from `center`, and
    /// draws a fresh step budget.
    fn choose_new_direction<R: Rng + ?Sized>(&mut self, center: Point, rng: &mut R) {
        let position = self.position;
        if let Some(direction) = Direction::ALL
            .into_iter()
            .filter(|direction| !direction.is_outward(position, center))
            .choose(rng)
        {
            self.direction = direction;
        }
        self.steps_remaining = rng.random_range(0.0..=self.parameters.motion.max_step_budget);
    }
}
