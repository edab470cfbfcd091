//! Procedural forest generation.
//!
//! Main components:
//! - [`fractal`] - one-shot recursive trees with surface rings and leaves.
//! - [`phases`] - incremental growth, split into a read-only scan and a
//!   single-writer apply.
//! - [`forest`] - many trees: spawn placement, planting and parallel
//!   growth ticks.
//! - [`density`] - attraction density fields and weighted cell sampling.
//! - [`attractor`] - attraction point sets feeding a density field.
//! - [`tree`] - the node arena shared by both tree kinds.
//! - [`intensity_buffer`] - per-point splat buffers merged into a field.
//! - [`config`] - tunables, loadable from TOML.
//! - [`math`] - rotation, ring and mapping helpers.
//! - [`types`] - shared id aliases.

pub mod attractor;
pub mod config;
pub mod density;
pub mod error;
pub mod forest;
pub mod fractal;
pub mod intensity_buffer;
pub mod math;
pub mod phases;
pub mod tree;
pub mod types;

pub use error::{ConfigError, Error, Result};
