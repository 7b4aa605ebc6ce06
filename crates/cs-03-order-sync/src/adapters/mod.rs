//! Adapters Layer
//!
//! In-process order stores. `FailingOrderStore` exists for exercising the
//! degraded paths.

pub mod memory_store;

pub use memory_store::{FailingOrderStore, InMemoryOrderStore};
