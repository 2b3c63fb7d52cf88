//! Domain entities
//!
//! Points, zones, polygons and stores as the resolution pipeline hands them
//! between components. Provider identifiers stay opaque strings here.

mod point;
mod polygon;
mod progress;
mod store;
mod zone;

pub use point::Point;
pub use polygon::{Polygon, Ring};
pub use progress::{ProgressEvent, ProgressPhase, ProgressSender};
pub use store::Store;
pub use zone::{Zone, ZoneKind};
