use serde::Serialize;
use thiserror::Error;

use super::assets::AssetProvider;
use super::input::InputSnapshot;
use super::render::{RenderFrame, Viewport};
use crate::content::DefDatabase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntityId(pub u64);

/// Hands out monotonically increasing ids. Ids are never reused.
#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Read-only startup state handed to a scene when it loads.
#[derive(Clone, Copy)]
pub struct SceneResources<'a> {
    pub def_database: &'a DefDatabase,
    pub assets: &'a dyn AssetProvider,
    pub viewport: Viewport,
}

#[derive(Debug, Error)]
pub enum SceneLoadError {
    #[error("missing EntityDef '{def_name}'; add it to assets/base or an enabled mod")]
    MissingDef { def_name: String },
    #[error("EntityDef '{def_name}' cannot be used here: {reason}")]
    InvalidDef { def_name: String, reason: String },
}

pub trait Scene {
    fn load(&mut self, resources: SceneResources<'_>) -> Result<(), SceneLoadError>;
    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand;
    fn render(&mut self, frame: &mut RenderFrame);
    fn unload(&mut self);
    fn debug_title(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = EntityIdAllocator::default();
        let first = allocator.allocate();
        let second = allocator.allocate();
        let third = allocator.allocate();

        assert_eq!(first.0, 0);
        assert_eq!(second.0, 1);
        assert_eq!(third.0, 2);
    }

    #[test]
    fn entity_ids_order_by_allocation() {
        let mut allocator = EntityIdAllocator::default();
        let first = allocator.allocate();
        let second = allocator.allocate();
        assert!(first < second);
    }
}
