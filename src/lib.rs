//! arbor-sampler: split neuron skeletons into sampling intervals
//!
//! Layers, from the inside out:
//! - [`domain`]: arbor, positions, interpolation, partitioning, membership
//! - [`application`]: skeleton files and the sampler service
//! - [`infrastructure`]: filesystem boundary and service wiring
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
