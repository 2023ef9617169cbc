//! Built-in components

use flint_core::{ComponentId, Result, Transform};
use flint_ecs::{Camera, Component, DrawCall, Entity, MeshHandle, RenderSurface, Renderable};
use std::any::Any;

/// Spatial placement of an entity. At most one per entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformComponent {
    pub transform: Transform,
}

impl TransformComponent {
    pub fn new(transform: Transform) -> Self {
        Self { transform }
    }
}

impl Component for TransformComponent {
    fn clone_component(&self) -> Result<Box<dyn Component>> {
        Ok(Box::new(self.clone()))
    }

    fn can_have_multiple(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Draws a renderer-owned mesh at the entity's transform
#[derive(Clone, Debug, PartialEq)]
pub struct MeshRenderer {
    pub mesh: MeshHandle,
}

impl MeshRenderer {
    pub fn new(mesh: MeshHandle) -> Self {
        Self { mesh }
    }
}

impl Component for MeshRenderer {
    fn clone_component(&self) -> Result<Box<dyn Component>> {
        Ok(Box::new(self.clone()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }
}

impl Renderable for MeshRenderer {
    fn render(
        &self,
        entity: &Entity,
        component: ComponentId,
        camera: &dyn Camera,
        surface: &mut dyn RenderSurface,
    ) {
        let transform = entity
            .get::<TransformComponent>()
            .map(|t| t.transform)
            .unwrap_or(Transform::IDENTITY);

        surface.draw(DrawCall {
            entity: entity.id(),
            component,
            mesh: self.mesh,
            transform,
            view: camera.view(),
        });
    }
}
