//! Render seams between components and the external renderer

use crate::entity::Entity;
use flint_core::{ComponentId, EntityId, Transform};

/// Opaque handle to a GPU mesh owned by the renderer
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct MeshHandle(pub u64);

/// Viewpoint used when drawing a scene
pub trait Camera {
    /// World transform of the viewer
    fn view(&self) -> Transform;
}

/// One draw request issued while rendering a scene
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCall {
    pub entity: EntityId,
    pub component: ComponentId,
    pub mesh: MeshHandle,
    pub transform: Transform,
    pub view: Transform,
}

/// Receives draw calls. Implemented by the renderer or a window target.
pub trait RenderSurface {
    fn draw(&mut self, call: DrawCall);
}

/// Capability of components that produce draw calls
pub trait Renderable {
    fn render(
        &self,
        entity: &Entity,
        component: ComponentId,
        camera: &dyn Camera,
        surface: &mut dyn RenderSurface,
    );
}
