//! Report presentation and rendering.

pub mod generator;

pub use generator::*;
