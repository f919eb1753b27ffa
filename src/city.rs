//! City geometry consumed by agents.
//!
//! Agents only see the city through the [`CityMap`] trait: a road-membership predicate, the two
//! fixed zones, the geometric center used by the roaming bias and a hook to record graves.
//! [`GridCity`] is the square street grid the simulation runs on.
use log::{trace, warn};
use rand::Rng;

use crate::geometry::{Point, Zone};
use crate::parameters::CityParameters;

/// Side length of the square quarantine box.
pub const QUARANTINE_SIZE: f64 = 2.0;
/// Width and height of the graveyard.
pub const GRAVEYARD_SIZE: f64 = 2.0;
/// Vertical offset of the graveyard origin; it sits above the quarantine box.
pub const GRAVEYARD_OFFSET_Y: f64 = 4.0;
/// Distance agents keep from the edges of a road.
pub const ROAD_EDGE_BUFFER: f64 = 0.05;
// Spawn sampling gives up after this many rejected candidates.
const MAX_PLACEMENT_ATTEMPTS: usize = 1_000;

pub trait CityMap {
    /// Whether an agent may stand at `point`.
    fn is_on_road(&self, point: Point) -> bool;

    /// Geometric center of the street grid.
    fn center(&self) -> Point;

    fn quarantine_zone(&self) -> Zone;

    fn graveyard_zone(&self) -> Zone;

    /// Draws a position for which `is_on_road` holds.
    fn random_road_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Point;

    /// Records a grave marker. Called once per deceased agent, on arrival.
    fn register_grave(&mut self, grave: Point);
}

/// A `city_size` × `city_size` grid of square blocks separated by roads, with a road along the
/// outer border. The quarantine box and the graveyard lie to the left of the grid.
#[derive(Debug, Clone)]
pub struct GridCity {
    parameters: CityParameters,
    graves: Vec<Point>,
}

impl GridCity {
    #[must_use]
    pub fn new(parameters: &CityParameters) -> Self {
        GridCity {
            parameters: *parameters,
            graves: Vec::new(),
        }
    }

    /// Side length of the street grid.
    pub fn extent(&self) -> f64 {
        f64::from(self.parameters.city_size) * self.parameters.cell_size()
    }

    /// Grave markers registered so far, in arrival order.
    pub fn graves(&self) -> &[Point] {
        &self.graves
    }

    // Lower edge of the `index`th interior-or-top road, counted from the bottom.
    fn road_start(&self, index: u32) -> f64 {
        f64::from(index + 1) * self.parameters.cell_size() - self.parameters.road_width
    }

    fn along_grid(&self, coordinate: f64) -> bool {
        (ROAD_EDGE_BUFFER..=self.extent() - ROAD_EDGE_BUFFER).contains(&coordinate)
    }

    fn across_road(&self, coordinate: f64) -> bool {
        (0..self.parameters.city_size).any(|index| {
            let start = self.road_start(index);
            (start + ROAD_EDGE_BUFFER..=start + self.parameters.road_width - ROAD_EDGE_BUFFER)
                .contains(&coordinate)
        })
    }

    fn on_border_road(&self, coordinate: f64) -> bool {
        (-self.parameters.road_width..=ROAD_EDGE_BUFFER).contains(&coordinate)
    }

    fn sample_road_coordinate<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let CityParameters {
            city_size,
            building_size,
            road_width,
            road_buffer,
        } = self.parameters;
        let block = rng.random_range(0..=city_size.saturating_sub(2));
        f64::from(block) * self.parameters.cell_size()
            + building_size
            + road_buffer
            + rng.random_range(0.0..=road_width - 2.0 * road_buffer)
    }

    // Middle of the first interior intersection. On the road whenever the road is wider than
    // twice `ROAD_EDGE_BUFFER`, which `CityParameters::validate` enforces.
    fn fallback_position(&self) -> Point {
        let middle = self.road_start(0) + self.parameters.road_width / 2.0;
        Point::new(middle, middle)
    }
}

impl CityMap for GridCity {
    fn is_on_road(&self, point: Point) -> bool {
        let horizontal = self.along_grid(point.x)
            && (self.across_road(point.y) || self.on_border_road(point.y));
        let vertical = self.along_grid(point.y)
            && (self.across_road(point.x) || self.on_border_road(point.x));
        horizontal || vertical
    }

    fn center(&self) -> Point {
        let half = self.extent() / 2.0;
        Point::new(half, half)
    }

    fn quarantine_zone(&self) -> Zone {
        let origin = Point::new(-f64::from(self.parameters.city_size) - QUARANTINE_SIZE, 0.0);
        Zone::new(origin, QUARANTINE_SIZE, QUARANTINE_SIZE)
    }

    fn graveyard_zone(&self) -> Zone {
        let origin = Point::new(
            -f64::from(self.parameters.city_size) - GRAVEYARD_SIZE,
            GRAVEYARD_OFFSET_Y,
        );
        Zone::new(origin, GRAVEYARD_SIZE, GRAVEYARD_SIZE)
    }

    fn random_road_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let candidate = Point::new(
                self.sample_road_coordinate(rng),
                self.sample_road_coordinate(rng),
            );
            if self.is_on_road(candidate) {
                return candidate;
            }
        }
        let fallback = self.fallback_position();
        warn!(
            "no road position found after {MAX_PLACEMENT_ATTEMPTS} attempts, using {fallback:?}"
        );
        debug_assert!(self.is_on_road(fallback), "{fallback:?} is off road");
        fallback
    }

    fn register_grave(&mut self, grave: Point) {
        trace!("registering grave #{} at {:?}", self.graves.len() + 1, grave);
        self.graves.push(grave);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn default_city() -> GridCity {
        GridCity::new(&CityParameters::default())
    }

    #[test]
    fn roads_and_blocks() {
        let city = default_city();
        // Interior horizontal road between the first and second row of blocks.
        assert!(city.is_on_road(Point::new(1.0, 2.5)));
        // Interior vertical road.
        assert!(city.is_on_road(Point::new(5.5, 7.0)));
        // Inside the first block.
        assert!(!city.is_on_road(Point::new(1.0, 1.0)));
        // Bottom and left border roads.
        assert!(city.is_on_road(Point::new(4.0, -0.5)));
        assert!(city.is_on_road(Point::new(-0.5, 4.0)));
        // Top border road.
        assert!(city.is_on_road(Point::new(7.0, 14.5)));
        // Beyond the grid.
        assert!(!city.is_on_road(Point::new(16.0, 2.5)));
        assert!(!city.is_on_road(Point::new(7.0, 20.0)));
    }

    #[test]
    fn edge_buffer_excludes_road_margins() {
        let city = default_city();
        assert!(!city.is_on_road(Point::new(1.0, 2.01)));
        assert!(city.is_on_road(Point::new(1.0, 2.06)));
        assert!(!city.is_on_road(Point::new(1.0, 2.97)));
    }

    #[test]
    fn zones_lie_left_of_the_grid() {
        let city = default_city();
        let quarantine = city.quarantine_zone();
        assert_eq!(quarantine.origin, Point::new(-7.0, 0.0));
        assert_eq!((quarantine.width, quarantine.height), (2.0, 2.0));

        let graveyard = city.graveyard_zone();
        assert_eq!(graveyard.origin, Point::new(-7.0, 4.0));
        assert_eq!((graveyard.width, graveyard.height), (2.0, 2.0));
    }

    #[test]
    fn center_of_default_grid() {
        assert_eq!(default_city().center(), Point::new(7.5, 7.5));
    }

    #[test]
    fn spawn_positions_are_on_road() {
        let city = default_city();
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..1_000 {
            let position = city.random_road_position(&mut rng);
            assert!(city.is_on_road(position), "{position:?} is off road");
        }
    }

    #[test]
    fn narrowest_valid_road_still_spawns_on_road() {
        let parameters = CityParameters {
            road_width: 2.0 * ROAD_EDGE_BUFFER + 0.01,
            road_buffer: 0.001,
            ..CityParameters::default()
        };
        assert!(parameters.validate().is_ok());
        let city = GridCity::new(&parameters);
        assert!(city.is_on_road(city.fallback_position()));

        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..200 {
            let position = city.random_road_position(&mut rng);
            assert!(city.is_on_road(position), "{position:?} is off road");
        }
    }

    #[test]
    fn fallback_is_on_default_road() {
        let city = default_city();
        assert_eq!(city.fallback_position(), Point::new(2.5, 2.5));
        assert!(city.is_on_road(city.fallback_position()));
    }

    #[test]
    fn graves_are_recorded_in_order() {
        let mut city = default_city();
        city.register_grave(Point::new(-6.5, 4.5));
        city.register_grave(Point::new(-6.0, 5.0));
        assert_eq!(
            city.graves(),
            &[Point::new(-6.5, 4.5), Point::new(-6.0, 5.0)]
        );
    }
}
