//! Component contract and per-update context

use flint_core::{ComponentId, EntityId, Result};
use std::any::Any;

/// A behavior/data unit attached to exactly one entity.
///
/// Components are stored as `Box<dyn Component>` inside their owning
/// [`Entity`](crate::Entity). The concrete type identifies the component
/// "variant": singleton checks compare concrete types.
pub trait Component: Any {
    /// Advance this component by one frame.
    ///
    /// Structural changes to the owning entity go through `ctx.commands`
    /// and are applied after the entity's sweep finishes.
    fn update(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Produce an independent copy of this component for another entity.
    fn clone_component(&self) -> Result<Box<dyn Component>>;

    /// Whether an entity may hold more than one component of this type
    fn can_have_multiple(&self) -> bool {
        true
    }

    /// Human-readable name, used in logs and errors
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Renderable capability, if this component draws anything
    fn as_renderable(&self) -> Option<&dyn crate::Renderable> {
        None
    }
}

/// Context handed to [`Component::update`]
pub struct ComponentContext<'a> {
    /// Logical seconds since the previous frame
    pub delta: f64,
    /// The entity that owns the component being updated
    pub entity: EntityId,
    /// The component being updated
    pub component: ComponentId,
    /// Deferred structural changes to the owning entity
    pub commands: &'a mut EntityCommands,
}

/// A structural change requested during an update sweep
pub enum EntityCommand {
    Add(Box<dyn Component>),
    Remove(ComponentId),
    SetEnabled(ComponentId, bool),
}

/// Queue of structural changes, applied in order once the sweep is done
#[derive(Default)]
pub struct EntityCommands {
    queue: Vec<EntityCommand>,
}

impl EntityCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a component to be attached after the sweep
    pub fn add(&mut self, component: impl Component) {
        self.queue.push(EntityCommand::Add(Box::new(component)));
    }

    /// Queue a component to be removed after the sweep
    pub fn remove(&mut self, id: ComponentId) {
        self.queue.push(EntityCommand::Remove(id));
    }

    /// Queue an enable/disable toggle
    pub fn set_enabled(&mut self, id: ComponentId, enabled: bool) {
        self.queue.push(EntityCommand::SetEnabled(id, enabled));
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn take(&mut self) -> Vec<EntityCommand> {
        std::mem::take(&mut self.queue)
    }
}
