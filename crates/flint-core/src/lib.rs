//! Flint Core - Foundational types for the Flint engine
//!
//! This crate provides the core types that all other Flint crates depend on:
//! - `EntityId` - Random 128-bit entity identifiers
//! - `ComponentId` - Process-unique component instance identifiers
//! - `Transform`, `Vec3` - Spatial types
//! - Error types and Result alias

mod error;
mod id;
mod types;

pub use error::{FlintError, Result};
pub use id::{ComponentId, EntityId};
pub use types::{Transform, Vec3};
