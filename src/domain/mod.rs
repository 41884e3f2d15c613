//! Domain layer: entities and the hierarchy builder
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;

pub use arena::{NodeData, TreeArena, TreeNode, MAX_DISPLAY_DEPTH};
pub use builder::{Hierarchy, HierarchyBuilder, TreeResult};
pub use entities::FlatRecord;
pub use error::DomainError;
