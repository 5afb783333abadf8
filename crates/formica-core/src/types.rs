//! Shared types used across all Formica crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulation time, counted in whole ticks.
pub type Tick = u64;

/// Unique identifier for an agent. Assigned monotonically by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

/// Unique identifier for a food source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FoodId(pub u64);

/// Unique identifier for a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ant-{}", self.0)
    }
}

impl fmt::Display for FoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "food-{}", self.0)
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker-{}", self.0)
    }
}

/// Monotonic id source. Not thread-safe; owned by whoever mints ids.
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next raw id.
    pub fn next_raw(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// How many ids have been issued.
    pub fn issued(&self) -> u64 {
        self.next
    }
}

/// Opaque reference stored in the spatial index.
///
/// The index never owns entities. A handle is resolved back to the owning
/// list by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityHandle {
    Agent(AgentId),
    Food(FoodId),
    Home,
    Marker(MarkerId),
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityHandle::Agent(id) => write!(f, "{id}"),
            EntityHandle::Food(id) => write!(f, "{id}"),
            EntityHandle::Home => write!(f, "home"),
            EntityHandle::Marker(id) => write!(f, "{id}"),
        }
    }
}

/// A point on the playing field. Screen coordinates: y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Bearing from `self` to `other` in whole degrees, as `atan2` reports it.
    ///
    /// The result lies in [-180, 180]; callers normalize when storing it.
    pub fn direction_to(&self, other: &Position) -> i32 {
        let dy = other.y - self.y;
        let dx = other.x - self.x;
        dy.atan2(dx).to_degrees().round() as i32
    }

    /// Move `distance` along `heading` (degrees).
    pub fn advanced(&self, heading: f64, distance: f64) -> Position {
        let rad = heading.to_radians();
        Position::new(self.x + distance * rad.cos(), self.y + distance * rad.sin())
    }
}

/// Axis-aligned bounding box. Closed on all sides: touching boxes overlap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Position,
    pub max: Position,
}

impl BoundingBox {
    pub fn new(min: Position, max: Position) -> Self {
        Self { min, max }
    }

    /// Box of the given extents centred on `center`.
    pub fn centered(center: Position, width: f64, height: f64) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self {
            min: Position::new(center.x - hw, center.y - hh),
            max: Position::new(center.x + hw, center.y + hh),
        }
    }

    /// Square hull of a circle.
    pub fn around(center: Position, radius: f64) -> Self {
        Self::centered(center, radius * 2.0, radius * 2.0)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Position {
        Position::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains(&self, point: &Position) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

/// Dimensions of the playing field. The origin is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f64,
    pub height: f64,
}

impl Field {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }

    /// Simulation-wide base for the marking range: half the diagonal.
    pub fn base_range(&self) -> f64 {
        self.diagonal() / 2.0
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(Position::new(0.0, 0.0), Position::new(self.width, self.height))
    }

    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Fold any angle in degrees into [0, 360).
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let folded = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if folded >= 360.0 {
        0.0
    } else {
        folded
    }
}

/// Fold a heading difference into (-180, 180].
pub fn shortest_turn(from: f64, to: f64) -> f64 {
    let diff = normalize_degrees(to - from);
    if diff > 180.0 {
        diff - 360.0
    } else {
        diff
    }
}
