use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityDefId(pub u32);

/// What an entity is, checked by value instead of by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityCategory {
    Agent,
    Chum,
    Poop,
    Coin,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 4] = [
        EntityCategory::Agent,
        EntityCategory::Chum,
        EntityCategory::Poop,
        EntityCategory::Coin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "Agent",
            Self::Chum => "Chum",
            Self::Poop => "Poop",
            Self::Coin => "Coin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinDrop {
    pub def_name: String,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentTuning {
    pub max_health: f32,
    pub attrition_per_second: f32,
    pub speed: f32,
    pub coin_interval_seconds: f32,
    pub coin_drops: Vec<CoinDrop>,
    pub preferred_prey: EntityCategory,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropTuning {
    pub fall_rate: f32,
    /// Health restored when eaten. Zero for coins.
    pub heal_amount: f32,
    /// Currency credited on redemption. Zero for food.
    pub coin_value: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArchetypeTuning {
    Agent(AgentTuning),
    Drop(DropTuning),
}

#[derive(Debug, Clone)]
pub struct EntityArchetype {
    pub id: EntityDefId,
    pub def_name: String,
    pub label: String,
    pub sprite: String,
    pub category: EntityCategory,
    /// Purchasable only when present.
    pub cost: Option<i64>,
    pub tuning: ArchetypeTuning,
}

impl EntityArchetype {
    pub fn agent_tuning(&self) -> Option<&AgentTuning> {
        match &self.tuning {
            ArchetypeTuning::Agent(tuning) => Some(tuning),
            ArchetypeTuning::Drop(_) => None,
        }
    }

    pub fn drop_tuning(&self) -> Option<&DropTuning> {
        match &self.tuning {
            ArchetypeTuning::Drop(tuning) => Some(tuning),
            ArchetypeTuning::Agent(_) => None,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct DefDatabase {
    entity_defs: Vec<EntityArchetype>,
    entity_ids_by_name: HashMap<String, EntityDefId>,
}

impl DefDatabase {
    pub(crate) fn from_entity_defs(mut entity_defs: Vec<EntityArchetype>) -> Self {
        let mut entity_ids_by_name = HashMap::with_capacity(entity_defs.len());
        for (idx, def) in entity_defs.iter_mut().enumerate() {
            let id = EntityDefId(idx as u32);
            def.id = id;
            entity_ids_by_name.insert(def.def_name.clone(), id);
        }
        Self {
            entity_defs,
            entity_ids_by_name,
        }
    }

    pub fn entity_def_id_by_name(&self, name: &str) -> Option<EntityDefId> {
        self.entity_ids_by_name.get(name).copied()
    }

    pub fn entity_def(&self, id: EntityDefId) -> Option<&EntityArchetype> {
        self.entity_defs.get(id.0 as usize)
    }

    pub fn entity_def_by_name(&self, name: &str) -> Option<&EntityArchetype> {
        self.entity_def_id_by_name(name)
            .and_then(|id| self.entity_def(id))
    }

    pub fn entity_defs(&self) -> &[EntityArchetype] {
        &self.entity_defs
    }

    /// Lowest cost among purchasable defs of `category`.
    pub fn cheapest_cost(&self, category: EntityCategory) -> Option<i64> {
        self.entity_defs
            .iter()
            .filter(|def| def.category == category)
            .filter_map(|def| def.cost)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drop_def(name: &str, category: EntityCategory, cost: Option<i64>) -> EntityArchetype {
        EntityArchetype {
            id: EntityDefId(99),
            def_name: name.to_string(),
            label: name.to_string(),
            sprite: "poop".to_string(),
            category,
            cost,
            tuning: ArchetypeTuning::Drop(DropTuning {
                fall_rate: 1.0,
                heal_amount: 1.0,
                coin_value: 0,
            }),
        }
    }

    #[test]
    fn ids_follow_input_order() {
        let db = DefDatabase::from_entity_defs(vec![
            drop_def("a", EntityCategory::Chum, Some(15)),
            drop_def("b", EntityCategory::Poop, None),
        ]);
        assert_eq!(db.entity_def_id_by_name("a"), Some(EntityDefId(0)));
        assert_eq!(db.entity_def_id_by_name("b"), Some(EntityDefId(1)));
        assert_eq!(
            db.entity_def_by_name("b").map(|def| def.id),
            Some(EntityDefId(1))
        );
        assert!(db.entity_def_by_name("c").is_none());
    }

    #[test]
    fn cheapest_cost_ignores_unpriced_and_other_categories() {
        let db = DefDatabase::from_entity_defs(vec![
            drop_def("big", EntityCategory::Chum, Some(50)),
            drop_def("small", EntityCategory::Chum, Some(15)),
            drop_def("free", EntityCategory::Chum, None),
            drop_def("poop", EntityCategory::Poop, None),
        ]);
        assert_eq!(db.cheapest_cost(EntityCategory::Chum), Some(15));
        assert_eq!(db.cheapest_cost(EntityCategory::Poop), None);
    }

    #[test]
    fn category_round_trips_through_text() {
        for category in EntityCategory::ALL {
            assert_eq!(EntityCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(EntityCategory::parse("Fish"), None);
    }
}
