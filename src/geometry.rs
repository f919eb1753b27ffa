//! Plane geometry shared by the city and its agents: points, the rectangular zones of the
//! quarantine box and graveyard, the four roaming headings and the arc used by transits.
use std::ops::{Add, Mul};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A point in city coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Mul<Point> for f64 {
    type Output = Point;

    fn mul(self, rhs: Point) -> Point {
        Point::new(self * rhs.x, self * rhs.y)
    }
}

/// Evaluates the quadratic Bezier curve through `start`, `control` and `end` at `t`.
///
/// `t` is not clamped; callers stop interpolating once it reaches 1.
pub fn quadratic_bezier(start: Point, control: Point, end: Point, t: f64) -> Point {
    let s = 1.0 - t;
    (s * s) * start + (2.0 * s * t) * control + (t * t) * end
}

/// A fixed axis-aligned rectangle, such as the quarantine box or the graveyard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Lower-left corner.
    pub origin: Point,
    pub width: f64,
    pub height: f64,
}

impl Zone {
    pub const fn new(origin: Point, width: f64, height: f64) -> Self {
        Zone {
            origin,
            width,
            height,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        (self.origin.x..=self.origin.x + self.width).contains(&point.x)
            && (self.origin.y..=self.origin.y + self.height).contains(&point.y)
    }

    /// Moves `point` to the nearest position inside the zone.
    pub fn clamp(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(self.origin.x, self.origin.x + self.width),
            point.y.clamp(self.origin.y, self.origin.y + self.height),
        )
    }

    /// Draws a uniform point from the zone shrunk by `margin` on its upper and right edges.
    pub fn sample_point<R: Rng + ?Sized>(&self, rng: &mut R, margin: f64) -> Point {
        let width = (self.width - margin).max(0.0);
        let height = (self.height - margin).max(0.0);
        Point::new(
            self.origin.x + rng.random_range(0.0..=width),
            self.origin.y + rng.random_range(0.0..=height),
        )
    }
}

/// Facing direction of a roaming agent. `Up` is towards positive `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// The position reached by moving `distance` from `from` in this direction.
    pub fn step(self, from: Point, distance: f64) -> Point {
        match self {
            Direction::Up => Point::new(from.x, from.y + distance),
            Direction::Down => Point::new(from.x, from.y - distance),
            Direction::Left => Point::new(from.x - distance, from.y),
            Direction::Right => Point::new(from.x + distance, from.y),
        }
    }

    /// Whether moving this way from `position` takes an agent further from `center` on the
    /// axis of motion. Directions are never outward when the agent sits exactly on the axis.
    pub fn is_outward(self, position: Point, center: Point) -> bool {
        match self {
            Direction::Left => position.x < center.x,
            Direction::Right => position.x > center.x,
            Direction::Down => position.y < center.y,
            Direction::Up => position.y > center.y,
        }
    }
}
