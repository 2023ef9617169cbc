//! Entity - an identity owning an ordered list of components

use crate::component::{Component, ComponentContext, EntityCommand, EntityCommands};
use flint_core::{ComponentId, EntityId, Result};
use std::fmt;

/// One attached component plus its registry bookkeeping
struct ComponentSlot {
    id: ComponentId,
    /// Always `Some(entity.id)` while the slot lives inside an entity
    owner: Option<EntityId>,
    enabled: bool,
    component: Box<dyn Component>,
}

/// An identity that owns an ordered set of components.
///
/// Components are owned exclusively by their entity. Insertion order is
/// preserved and is the order used by `update` and by queries that return
/// several matches.
pub struct Entity {
    id: EntityId,
    name: String,
    cloned_from: Option<EntityId>,
    slots: Vec<ComponentSlot>,
}

impl Entity {
    /// Create an empty entity with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            cloned_from: None,
            slots: Vec::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The entity this one was cloned from, if any
    pub fn cloned_from(&self) -> Option<EntityId> {
        self.cloned_from
    }

    /// Attach a component.
    ///
    /// Returns `None` without touching the entity when the component's type
    /// is a singleton and an instance of it is already attached.
    pub fn add(&mut self, component: impl Component) -> Option<ComponentId> {
        self.add_boxed(Box::new(component))
    }

    /// Attach an already boxed component
    pub fn add_boxed(&mut self, component: Box<dyn Component>) -> Option<ComponentId> {
        if !component.can_have_multiple() {
            let variant = component.as_any().type_id();
            if self
                .slots
                .iter()
                .any(|slot| slot.component.as_any().type_id() == variant)
            {
                return None;
            }
        }

        let id = ComponentId::next();
        self.slots.push(ComponentSlot {
            id,
            owner: Some(self.id),
            enabled: true,
            component,
        });
        Some(id)
    }

    /// Remove and drop a component. Returns false if it is not attached here.
    pub fn remove(&mut self, id: ComponentId) -> bool {
        self.detach(id).is_some()
    }

    /// Remove a component and hand it back to the caller
    pub fn detach(&mut self, id: ComponentId) -> Option<Box<dyn Component>> {
        let index = self.slots.iter().position(|slot| slot.id == id)?;
        if self.slots[index].owner != Some(self.id) {
            return None;
        }

        let mut slot = self.slots.remove(index);
        slot.owner = None;
        Some(slot.component)
    }

    /// First component of type `T`, in insertion order
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.slots
            .iter()
            .find_map(|slot| slot.component.as_any().downcast_ref::<T>())
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.slots
            .iter_mut()
            .find_map(|slot| slot.component.as_any_mut().downcast_mut::<T>())
    }

    /// First component of type `T` together with its id
    pub fn get_with_id<T: Component>(&self) -> Option<(ComponentId, &T)> {
        self.slots.iter().find_map(|slot| {
            slot.component
                .as_any()
                .downcast_ref::<T>()
                .map(|c| (slot.id, c))
        })
    }

    /// Every component of type `T`, in insertion order
    pub fn get_all<T: Component>(&self) -> Vec<&T> {
        self.slots
            .iter()
            .filter_map(|slot| slot.component.as_any().downcast_ref::<T>())
            .collect()
    }

    pub fn has<T: Component>(&self) -> bool {
        self.get::<T>().is_some()
    }

    /// Look up a component by id
    pub fn component(&self, id: ComponentId) -> Option<&dyn Component> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| slot.component.as_ref())
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut dyn Component> {
        self.slots
            .iter_mut()
            .find(|slot| slot.id == id)
            .map(|slot| slot.component.as_mut())
    }

    /// Owning entity recorded for a component, if it is attached here
    pub fn owner_of(&self, id: ComponentId) -> Option<EntityId> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .and_then(|slot| slot.owner)
    }

    pub fn is_enabled(&self, id: ComponentId) -> Option<bool> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| slot.enabled)
    }

    /// Enable or disable a component. Returns false if it is not attached here.
    pub fn set_enabled(&mut self, id: ComponentId, enabled: bool) -> bool {
        match self.slots.iter_mut().find(|slot| slot.id == id) {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Component ids in insertion order
    pub fn component_ids(&self) -> Vec<ComponentId> {
        self.slots.iter().map(|slot| slot.id).collect()
    }

    /// Iterate over enabled components in insertion order
    pub fn enabled_components(&self) -> impl Iterator<Item = (ComponentId, &dyn Component)> {
        self.slots
            .iter()
            .filter(|slot| slot.enabled)
            .map(|slot| (slot.id, slot.component.as_ref()))
    }

    /// Number of attached components
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Deep-clone this entity.
    ///
    /// The clone gets a fresh id and records this entity in `cloned_from`.
    /// Every component is cloned through its own `clone_component` and
    /// attached to the clone under a new `ComponentId`. Nothing is shared
    /// with the original. On failure no partially built entity escapes.
    pub fn try_clone(&self) -> Result<Entity> {
        let id = EntityId::new();
        let mut slots = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            slots.push(ComponentSlot {
                id: ComponentId::next(),
                owner: Some(id),
                enabled: slot.enabled,
                component: slot.component.clone_component()?,
            });
        }

        Ok(Entity {
            id,
            name: self.name.clone(),
            cloned_from: Some(self.id),
            slots,
        })
    }

    /// Update every enabled component in insertion order, then apply any
    /// structural changes the components queued.
    pub fn update(&mut self, delta: f64) {
        let entity = self.id;
        let mut commands = EntityCommands::new();

        for slot in self.slots.iter_mut().filter(|slot| slot.enabled) {
            let mut ctx = ComponentContext {
                delta,
                entity,
                component: slot.id,
                commands: &mut commands,
            };
            slot.component.update(&mut ctx);
        }

        self.apply(commands);
    }

    /// Apply queued structural changes in order
    pub fn apply(&mut self, mut commands: EntityCommands) {
        for command in commands.take() {
            match command {
                EntityCommand::Add(component) => {
                    let name = component.type_name();
                    if self.add_boxed(component).is_none() {
                        log::debug!(
                            "entity '{}': rejected duplicate singleton component {}",
                            self.name,
                            name
                        );
                    }
                }
                EntityCommand::Remove(id) => {
                    if !self.remove(id) {
                        log::debug!("entity '{}': component {} not attached", self.name, id);
                    }
                }
                EntityCommand::SetEnabled(id, enabled) => {
                    self.set_enabled(id, enabled);
                }
            }
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("cloned_from", &self.cloned_from)
            .field(
                "components",
                &self
                    .slots
                    .iter()
                    .map(|slot| slot.component.type_name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flint_core::FlintError;
    use std::any::Any;

    #[derive(Clone, Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
        z: f32,
    }

    impl Component for Position {
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

    #[derive(Clone, Debug, PartialEq)]
    struct Tag(&'static str);

    impl Component for Tag {
        fn clone_component(&self) -> Result<Box<dyn Component>> {
            Ok(Box::new(self.clone()))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[derive(Clone, Default)]
    struct Counter {
        updates: u32,
        total_delta: f64,
    }

    impl Component for Counter {
        fn update(&mut self, ctx: &mut ComponentContext<'_>) {
            self.updates += 1;
            self.total_delta += ctx.delta;
        }

        fn clone_component(&self) -> Result<Box<dyn Component>> {
            Ok(Box::new(self.clone()))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// Adds a tag and removes itself on its first update
    #[derive(Clone)]
    struct OneShot;

    impl Component for OneShot {
        fn update(&mut self, ctx: &mut ComponentContext<'_>) {
            ctx.commands.add(Tag("spawned"));
            ctx.commands.remove(ctx.component);
        }

        fn clone_component(&self) -> Result<Box<dyn Component>> {
            Ok(Box::new(self.clone()))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct Unclonable;

    impl Component for Unclonable {
        fn clone_component(&self) -> Result<Box<dyn Component>> {
            Err(FlintError::ComponentCloneFailed {
                component: "Unclonable",
                reason: "holds a unique resource".into(),
            })
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn origin() -> Position {
        Position {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    #[test]
    fn test_singleton_duplicate_rejected() {
        let mut entity = Entity::new("player");
        assert!(entity.add(origin()).is_some());
        assert_eq!(entity.len(), 1);

        assert!(entity.add(origin()).is_none());
        assert_eq!(entity.len(), 1);
    }

    #[test]
    fn test_multiple_allowed() {
        let mut entity = Entity::new("player");
        entity.add(Tag("a")).unwrap();
        entity.add(Tag("b")).unwrap();

        let tags = entity.get_all::<Tag>();
        assert_eq!(tags, vec![&Tag("a"), &Tag("b")]);
        assert_eq!(entity.get::<Tag>(), Some(&Tag("a")));
    }

    #[test]
    fn test_get_and_has() {
        let mut entity = Entity::new("e");
        assert!(!entity.has::<Position>());
        assert!(entity.get::<Position>().is_none());

        entity.add(origin()).unwrap();
        assert!(entity.has::<Position>());
        assert!(!entity.has::<Tag>());

        entity.get_mut::<Position>().unwrap().x = 3.0;
        assert_eq!(entity.get::<Position>().unwrap().x, 3.0);
    }

    #[test]
    fn test_lookup_by_component_id() {
        let mut entity = Entity::new("e");
        let first = entity.add(Tag("first")).unwrap();
        let second = entity.add(Tag("second")).unwrap();
        let position = entity.add(origin()).unwrap();
        assert!(entity.get_with_id::<Counter>().is_none());

        let (id, tag) = entity.get_with_id::<Tag>().unwrap();
        assert_eq!(tag, &Tag("first"));
        assert_eq!(id, first);
        assert_ne!(id, second);

        entity
            .component_mut(position)
            .and_then(|c| c.as_any_mut().downcast_mut::<Position>())
            .unwrap()
            .y = 2.0;
        assert_eq!(entity.get::<Position>().unwrap().y, 2.0);
        assert!(entity.component(first).unwrap().as_any().is::<Tag>());

        entity.remove(position);
        assert!(entity.component_mut(position).is_none());
    }

    #[test]
    fn test_owner_set_on_attach() {
        let mut entity = Entity::new("e");
        let id = entity.add(Tag("x")).unwrap();
        assert_eq!(entity.owner_of(id), Some(entity.id()));
    }

    #[test]
    fn test_remove() {
        let mut entity = Entity::new("e");
        let id = entity.add(Tag("x")).unwrap();

        assert!(entity.remove(id));
        assert_eq!(entity.len(), 0);
        assert_eq!(entity.owner_of(id), None);
        assert!(!entity.remove(id));
    }

    #[test]
    fn test_remove_foreign_component_fails() {
        let mut a = Entity::new("a");
        let mut b = Entity::new("b");
        let id = a.add(Tag("x")).unwrap();
        b.add(Tag("y")).unwrap();

        assert!(!b.remove(id));
        assert_eq!(b.len(), 1);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_detach_returns_component() {
        let mut entity = Entity::new("e");
        let id = entity.add(Tag("keep")).unwrap();

        let detached = entity.detach(id).unwrap();
        assert_eq!(detached.as_any().downcast_ref::<Tag>(), Some(&Tag("keep")));
        assert!(entity.is_empty());
    }

    #[test]
    fn test_clone_never_aliases_components() {
        let mut original = Entity::new("player");
        original.add(origin()).unwrap();
        original.add(Tag("a")).unwrap();
        original.add(Tag("b")).unwrap();

        let mut clone = original.try_clone().unwrap();
        assert_ne!(clone.id(), original.id());
        assert_eq!(clone.cloned_from(), Some(original.id()));
        assert_eq!(clone.len(), original.len());
        assert_eq!(clone.name(), "player");

        let original_ids = original.component_ids();
        for id in clone.component_ids() {
            assert_eq!(clone.owner_of(id), Some(clone.id()));
            assert!(!original_ids.contains(&id));
        }

        clone.get_mut::<Position>().unwrap().x = 1.0;
        assert_eq!(original.get::<Position>().unwrap().x, 0.0);
        assert_eq!(clone.get_all::<Tag>(), vec![&Tag("a"), &Tag("b")]);
    }

    #[test]
    fn test_clone_failure_propagates() {
        let mut entity = Entity::new("e");
        entity.add(Tag("ok")).unwrap();
        entity.add(Unclonable).unwrap();

        assert!(matches!(
            entity.try_clone(),
            Err(FlintError::ComponentCloneFailed { .. })
        ));
    }

    #[test]
    fn test_update_skips_disabled() {
        let mut entity = Entity::new("e");
        let on = entity.add(Counter::default()).unwrap();
        let off = entity.add(Counter::default()).unwrap();
        assert!(entity.set_enabled(off, false));

        entity.update(0.5);
        entity.update(0.25);

        let counters = entity.get_all::<Counter>();
        assert_eq!(counters[0].updates, 2);
        assert!((counters[0].total_delta - 0.75).abs() < 1e-12);
        assert_eq!(counters[1].updates, 0);
        assert_eq!(entity.is_enabled(on), Some(true));
        assert_eq!(entity.is_enabled(off), Some(false));
    }

    #[test]
    fn test_commands_applied_after_sweep() {
        let mut entity = Entity::new("e");
        entity.add(OneShot).unwrap();
        entity.add(Counter::default()).unwrap();

        entity.update(0.1);

        // OneShot removed itself and the counter still ran this frame
        assert!(!entity.has::<OneShot>());
        assert_eq!(entity.get::<Counter>().unwrap().updates, 1);
        assert_eq!(entity.get::<Tag>(), Some(&Tag("spawned")));
        assert_eq!(entity.len(), 2);
    }

    #[test]
    fn test_commands_respect_singletons() {
        let mut entity = Entity::new("e");
        entity.add(origin()).unwrap();

        let mut commands = EntityCommands::new();
        commands.add(origin());
        entity.apply(commands);

        assert_eq!(entity.len(), 1);
    }
}
