use serde::{Deserialize, Serialize};

use super::Point;

/// A store listed inside a zone
///
/// Only the raw listing is modeled; classification and ranking happen
/// downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    pub name: String,
    /// Top-level business category as published by the provider
    pub category: Option<String>,
    pub address: Option<String>,
    pub location: Option<Point>,
}
