//! Flint ECS - Entities that own ordered, polymorphic components
//!
//! Each [`Entity`] owns its components exclusively. Components implement the
//! [`Component`] contract (update, clone, singleton flag) and may expose a
//! [`Renderable`] capability that scenes use when drawing.

mod component;
mod entity;
mod render;

pub use component::{Component, ComponentContext, EntityCommand, EntityCommands};
pub use entity::Entity;
pub use render::{Camera, DrawCall, MeshHandle, RenderSurface, Renderable};
