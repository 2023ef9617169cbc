//! Flint Scene - Scenes and the edit/play lifecycle
//!
//! A [`Scene`] is an ordered list of entities. The [`SceneManager`] keeps the
//! authoring template and, while playing, a deep-cloned runtime copy.

mod camera;
mod components;
mod manager;
mod scene;

pub use camera::{FixedCamera, OrbitCamera};
pub use components::{MeshRenderer, TransformComponent};
pub use manager::{SceneManager, SceneState};
pub use scene::Scene;
