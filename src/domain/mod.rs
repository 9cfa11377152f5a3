//! Domain layer: arbor model and the interval partitioning algorithms
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod distance;
pub mod entities;
pub mod error;
pub mod interpolation;
pub mod membership;
pub mod partition;
pub mod report;

pub use arena::{Arbor, TreeNode};
pub use distance::{distance_between, distances_from, edge_length, path_length};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use interpolation::{interpolate_positions, SECTION_TOLERANCE};
pub use membership::interval_nodes;
pub use partition::partition;
pub use report::{report, IntervalLength, PartitionReport};
