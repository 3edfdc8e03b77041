//! Signal generators and comparison helpers for testing the aural crates.

pub mod comparison;
pub mod generators;

pub use proptest;
pub use test_strategy;
