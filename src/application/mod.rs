//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod services;
pub mod skeleton_file;

pub use error::{ApplicationError, ApplicationResult, IoResultExt};
pub use skeleton_file::{PartitionPayload, SkeletonFile};
