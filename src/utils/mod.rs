//! # Utilities Module
//!
//! Seeded randomness and shared math for generation and tactics.

pub mod math;
pub mod rng;

pub use math::*;
pub use rng::*;
