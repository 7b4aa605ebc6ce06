//! Domain layer for the Order Synchronizer.

pub mod errors;
pub mod placement;
pub mod state;

pub use errors::OrderError;
pub use placement::{NewOrder, OrderPlacement};
pub use state::{allowed_transitions, is_valid_transition};
