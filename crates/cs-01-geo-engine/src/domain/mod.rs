//! Domain layer for the Geo Engine.

pub mod discovery;
pub mod distance;
pub mod errors;
pub mod normalize;
