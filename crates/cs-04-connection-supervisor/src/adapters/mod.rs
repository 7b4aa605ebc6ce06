//! Adapters Layer

pub mod token;

pub use token::HmacTokenResolver;
