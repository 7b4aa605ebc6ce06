//! # Geo Engine Subsystem
//!
//! **Subsystem ID:** 1
//! **Status:** Pure functions, no state
//!
//! ## Purpose
//!
//! Turns raw vendor coordinates into a ranked, radius-bounded discovery
//! result for a customer.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | `distance_km(A, A) == 0` | `domain/distance.rs` - haversine of zero deltas |
//! | `distance_km(A, B) == distance_km(B, A)` | `domain/distance.rs` - absolute deltas only |
//! | Only finite, in-range coordinates are used | `domain/distance.rs` - `is_valid_coordinate()` |
//! | Results within radius, ascending, ties by vendor id | `domain/discovery.rs` - `within_radius()` |
//! | Vendors without a resolvable coordinate are skipped, not errors | `domain/discovery.rs` |
//!
//! ## Coordinate Normalization
//!
//! Upstream vendor records carry positions in several shapes. They are
//! normalized in a fixed precedence order before any distance is computed:
//!
//! ```text
//! 1. top-level  { lat, lng }
//! 2. GeoJSON    { location: { type: "Point", coordinates: [lng, lat] } }
//! 3. nested     { location: { lat, lng } }
//! 4. flat       { latitude, longitude }
//! ```
//!
//! The first shape that is present *and* valid wins.

pub mod domain;

pub use domain::discovery::{within_radius, DistanceResult, Locatable, VendorRecord};
pub use domain::distance::{distance_km, is_valid_coordinate, round2, validate, EARTH_RADIUS_KM};
pub use domain::errors::GeoError;
pub use domain::normalize::{PositionShape, RawLocation, RawPosition};
