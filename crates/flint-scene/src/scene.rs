//! Scene - an ordered collection of entities

use flint_core::{EntityId, Result};
use flint_ecs::{Camera, Entity, RenderSurface};

/// An ordered collection of entities.
///
/// Insertion order is the update and render order and stays stable
/// across frames until entities are added or removed.
#[derive(Debug, Default)]
pub struct Scene {
    name: String,
    entities: Vec<Entity>,
}

impl Scene {
    /// Create an empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append an entity, returning its id
    pub fn add(&mut self, entity: Entity) -> EntityId {
        let id = entity.id();
        self.entities.push(entity);
        id
    }

    /// Remove an entity, handing it back. Later entities keep their order.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|e| e.id() == id)?;
        Some(self.entities.remove(index))
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id() == id)
    }

    /// First entity with the given name
    pub fn find_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name() == name)
    }

    pub fn find_by_name_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.name() == name)
    }

    /// Entities in update order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Update every enabled component of every entity, in list order
    pub fn update(&mut self, delta: f64) {
        for entity in &mut self.entities {
            entity.update(delta);
        }
    }

    /// Issue one draw call per enabled renderable component, in list order
    pub fn render(&self, camera: &dyn Camera, surface: &mut dyn RenderSurface) {
        for entity in &self.entities {
            for (id, component) in entity.enabled_components() {
                if let Some(renderable) = component.as_renderable() {
                    renderable.render(entity, id, camera, surface);
                }
            }
        }
    }

    /// Deep-clone every entity. Either the whole scene clones or nothing does.
    pub fn try_clone(&self) -> Result<Scene> {
        let entities = self
            .entities
            .iter()
            .map(Entity::try_clone)
            .collect::<Result<Vec<_>>>()?;

        Ok(Scene {
            name: self.name.clone(),
            entities,
        })
    }
}
