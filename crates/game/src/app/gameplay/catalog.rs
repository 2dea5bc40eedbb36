use std::collections::BTreeMap;

use fishtank_engine::{
    ArchetypeTuning, AssetProvider, DefDatabase, EntityCategory, EntityDefId, SceneLoadError,
    SpriteBounds, PLACEHOLDER_SPRITE_BOUNDS,
};
use tracing::warn;

use super::economy::Money;

pub(crate) const WASTE_DEF_NAME: &str = "drop.poop";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CatalogEntry {
    pub(crate) def_id: EntityDefId,
    pub(crate) def_name: String,
    pub(crate) label: String,
    pub(crate) sprite: String,
    pub(crate) category: EntityCategory,
    pub(crate) cost: Option<Money>,
    pub(crate) tuning: ArchetypeTuning,
    pub(crate) bounds: SpriteBounds,
}

/// Compiled defs joined with the sprite sizes they render at.
#[derive(Debug, Clone, Default)]
pub(crate) struct TankCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl TankCatalog {
    pub(crate) fn from_defs(
        defs: &DefDatabase,
        assets: &dyn AssetProvider,
    ) -> Result<Self, SceneLoadError> {
        let mut entries = BTreeMap::new();
        for def in defs.entity_defs() {
            let bounds = match assets.sprite_bounds(&def.sprite) {
                Some(bounds) => bounds,
                None => {
                    warn!(
                        def_name = %def.def_name,
                        sprite = %def.sprite,
                        "sprite_missing_using_placeholder"
                    );
                    PLACEHOLDER_SPRITE_BOUNDS
                }
            };
            entries.insert(
                def.def_name.clone(),
                CatalogEntry {
                    def_id: def.id,
                    def_name: def.def_name.clone(),
                    label: def.label.clone(),
                    sprite: def.sprite.clone(),
                    category: def.category,
                    cost: def.cost,
                    tuning: def.tuning.clone(),
                    bounds,
                },
            );
        }

        let catalog = Self { entries };
        catalog.require(WASTE_DEF_NAME, EntityCategory::Poop)?;
        Ok(catalog)
    }

    pub(crate) fn lookup(&self, def_name: &str) -> Option<&CatalogEntry> {
        self.entries.get(def_name)
    }

    /// Fails scene load unless `def_name` exists with `category`.
    pub(crate) fn require(
        &self,
        def_name: &str,
        category: EntityCategory,
    ) -> Result<&CatalogEntry, SceneLoadError> {
        let entry = self
            .lookup(def_name)
            .ok_or_else(|| SceneLoadError::MissingDef {
                def_name: def_name.to_string(),
            })?;
        if entry.category != category {
            return Err(SceneLoadError::InvalidDef {
                def_name: def_name.to_string(),
                reason: format!("expected category {}, found {}", category, entry.category),
            });
        }
        Ok(entry)
    }

    /// Cheapest purchasable entry in `category`, if any is for sale.
    pub(crate) fn cheapest_cost(&self, category: EntityCategory) -> Option<Money> {
        self.entries
            .values()
            .filter(|entry| entry.category == category)
            .filter_map(|entry| entry.cost)
            .min()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use fishtank_engine::{compile_def_database_from_str, AssetRegistry, DefDatabase};

    use super::*;

    pub(crate) fn shipped_defs() -> DefDatabase {
        compile_def_database_from_str(
            "base",
            Path::new("assets/base/catalog.xml"),
            include_str!("../../../../../assets/base/catalog.xml"),
        )
        .expect("shipped catalog compiles")
    }

    /// Shipped catalog with every sprite at `width`x`height`.
    pub(crate) fn shipped_catalog_with_bounds(width: f32, height: f32) -> TankCatalog {
        let defs = shipped_defs();
        let mut assets = AssetRegistry::default();
        for def in defs.entity_defs() {
            assets.insert_sprite(&def.sprite, SpriteBounds { width, height });
        }
        TankCatalog::from_defs(&defs, &assets).expect("catalog")
    }
}
