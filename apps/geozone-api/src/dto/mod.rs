//! Request and response bodies

pub mod error;
pub mod zones;
