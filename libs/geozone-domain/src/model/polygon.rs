//! Polygon boundary model
//!
//! A polygon is a list of rings; each ring is an ordered list of points and
//! is closed implicitly. Holes are not modeled. An empty polygon means
//! "boundary unavailable" and is a normal value, never an error.

use serde::{Deserialize, Serialize};

use super::Point;

/// Minimum number of vertices for a ring to be kept
pub const MIN_RING_POINTS: usize = 3;

/// An ordered sequence of points, closed implicitly
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ring(Vec<Point>);

impl Ring {
    pub fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Arithmetic mean of the ring's vertices
    ///
    /// A closing vertex repeating the first one is counted once. Returns
    /// `None` for an empty ring.
    pub fn centroid(&self) -> Option<Point> {
        let mut vertices = self.0.as_slice();
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices = &vertices[..vertices.len() - 1];
        }
        if vertices.is_empty() {
            return None;
        }
        let n = vertices.len() as f64;
        let (lat, lon) = vertices
            .iter()
            .fold((0.0, 0.0), |(lat, lon), p| (lat + p.lat, lon + p.lon));
        Some(Point::new(lat / n, lon / n))
    }

    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// A boundary made of one or more outer rings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    rings: Vec<Ring>,
}

impl Polygon {
    /// Build a polygon, discarding rings with fewer than three points
    pub fn new(rings: Vec<Ring>) -> Self {
        Self {
            rings: rings
                .into_iter()
                .filter(|ring| ring.len() >= MIN_RING_POINTS)
                .collect(),
        }
    }

    /// The "boundary unavailable" value
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(ring: Ring) -> Self {
        Self::new(vec![ring])
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.rings.iter().map(Ring::len).sum()
    }

    /// Centroid of the first ring
    pub fn centroid(&self) -> Option<Point> {
        self.rings.first().and_then(Ring::centroid)
    }
}
