//! Adapters Layer

pub mod memory_store;

pub use memory_store::InMemoryLocationStore;
