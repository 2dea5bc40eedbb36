use fishtank_engine::{
    ArchetypeTuning, EntityCategory, EntityId, EntityIdAllocator, ScreenBounds, Vec2, Viewport,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::agent::{Agent, AgentContext, AgentEffect, TargetView};
use super::catalog::{CatalogEntry, TankCatalog, WASTE_DEF_NAME};
use super::drops::Perishable;
use super::economy::{Ledger, Money};
use super::entity::{EntityBody, TankEntity};
use super::observers::{ObserverRegistry, Topic};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum SpawnError {
    #[error("unknown catalog key '{def_name}'")]
    UnknownDef { def_name: String },
    #[error("'{def_name}' is a {actual} def, expected {expected}")]
    WrongCategory {
        def_name: String,
        expected: &'static str,
        actual: EntityCategory,
    },
    #[error("drop '{def_name}' needs a spawn position")]
    MissingPosition { def_name: String },
}

/// A validated spawn request. Committing it cannot fail.
#[derive(Debug, Clone)]
pub(crate) struct SpawnPlan {
    entry: CatalogEntry,
    /// `None` for agents, which pick a random point on commit.
    position: Option<Vec2>,
}

impl SpawnPlan {
    pub(crate) fn def_name(&self) -> &str {
        &self.entry.def_name
    }

    pub(crate) fn category(&self) -> EntityCategory {
        self.entry.category
    }

    pub(crate) fn cost(&self) -> Option<Money> {
        self.entry.cost
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct UpdateReport {
    pub(crate) visited: Vec<EntityId>,
    pub(crate) added: Vec<EntityId>,
    pub(crate) removed: Vec<EntityId>,
    pub(crate) credited: Money,
    pub(crate) redeemed_coins: usize,
}

/// Owns every entity in the tank. Spawns and removals requested during a
/// pass are buffered and applied after every live entity has been visited.
pub(crate) struct TankWorld {
    allocator: EntityIdAllocator,
    entities: Vec<TankEntity>,
    pending_spawns: Vec<TankEntity>,
    pending_removals: Vec<EntityId>,
    observers: ObserverRegistry,
    catalog: TankCatalog,
    viewport: Viewport,
    rng: StdRng,
}

impl TankWorld {
    pub(crate) fn new(catalog: TankCatalog, viewport: Viewport, seed: u64) -> Self {
        Self {
            allocator: EntityIdAllocator::default(),
            entities: Vec::new(),
            pending_spawns: Vec::new(),
            pending_removals: Vec::new(),
            observers: ObserverRegistry::default(),
            catalog,
            viewport,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub(crate) fn catalog(&self) -> &TankCatalog {
        &self.catalog
    }

    pub(crate) fn plan_spawn(
        &self,
        def_name: &str,
        at: Option<Vec2>,
    ) -> Result<SpawnPlan, SpawnError> {
        let entry = self
            .catalog
            .lookup(def_name)
            .ok_or_else(|| SpawnError::UnknownDef {
                def_name: def_name.to_string(),
            })?;
        let position = match entry.category {
            EntityCategory::Agent => None,
            EntityCategory::Chum | EntityCategory::Poop | EntityCategory::Coin => {
                Some(at.ok_or_else(|| SpawnError::MissingPosition {
                    def_name: def_name.to_string(),
                })?)
            }
        };
        Ok(SpawnPlan {
            entry: entry.clone(),
            position,
        })
    }

    /// Stages the entity for the next pass, subscribes it to the
    /// notifications its category cares about and announces it.
    pub(crate) fn commit_spawn(&mut self, plan: SpawnPlan) -> EntityId {
        let SpawnPlan { entry, position } = plan;
        let position = position.unwrap_or_else(|| self.random_spawn_point());
        let id = self.allocator.allocate();
        let body = match &entry.tuning {
            ArchetypeTuning::Agent(tuning) => EntityBody::Agent(Agent::from_tuning(tuning)),
            ArchetypeTuning::Drop(tuning) => EntityBody::Drop(Perishable::from_tuning(tuning)),
        };

        match entry.category {
            EntityCategory::Agent => {
                self.observers.subscribe(Topic::Appeared, id);
                self.observers.subscribe(Topic::Removed, id);
            }
            EntityCategory::Coin => {
                self.observers.subscribe(Topic::PointerClick, id);
            }
            EntityCategory::Chum | EntityCategory::Poop => {}
        }

        debug!(
            entity_id = id.0,
            def_id = entry.def_id.0,
            def_name = %entry.def_name,
            x = position.x,
            y = position.y,
            "entity_spawned"
        );
        self.pending_spawns.push(TankEntity {
            id,
            def_name: entry.def_name,
            sprite: entry.sprite,
            category: entry.category,
            position,
            bounds: entry.bounds,
            to_delete: false,
            announce_elapsed_seconds: 0.0,
            body,
        });
        self.broadcast_appeared(id);
        id
    }

    pub(crate) fn spawn_agent(&mut self, def_name: &str) -> Result<EntityId, SpawnError> {
        let category = self
            .catalog
            .lookup(def_name)
            .map(|entry| entry.category)
            .ok_or_else(|| SpawnError::UnknownDef {
                def_name: def_name.to_string(),
            })?;
        if category != EntityCategory::Agent {
            return Err(SpawnError::WrongCategory {
                def_name: def_name.to_string(),
                expected: "an Agent",
                actual: category,
            });
        }
        let plan = self.plan_spawn(def_name, None)?;
        Ok(self.commit_spawn(plan))
    }

    pub(crate) fn spawn_drop(
        &mut self,
        def_name: &str,
        position: Vec2,
    ) -> Result<EntityId, SpawnError> {
        let plan = self.plan_spawn(def_name, Some(position))?;
        if plan.category() == EntityCategory::Agent {
            return Err(SpawnError::WrongCategory {
                def_name: def_name.to_string(),
                expected: "a Chum, Poop or Coin",
                actual: plan.category(),
            });
        }
        Ok(self.commit_spawn(plan))
    }

    /// Flags an entity for removal and tells its watchers. Returns false if
    /// the entity is unknown or already flagged.
    pub(crate) fn despawn(&mut self, id: EntityId) -> bool {
        let Some(entity) = find_entity_mut(&mut self.entities, &mut self.pending_spawns, id)
        else {
            return false;
        };
        if entity.to_delete {
            return false;
        }
        entity.to_delete = true;
        debug!(entity_id = id.0, def_name = %entity.def_name, "entity_despawned");
        self.broadcast_removed(id);
        true
    }

    /// Delivers a click to every coin still listening. Returns the coins it
    /// redeemed.
    pub(crate) fn dispatch_pointer_click(&mut self, point: Vec2) -> Vec<EntityId> {
        let mut redeemed = Vec::new();
        for id in self.observers.subscribers(Topic::PointerClick) {
            let Some(entity) = find_entity_mut(&mut self.entities, &mut self.pending_spawns, id)
            else {
                continue;
            };
            if entity.to_delete {
                continue;
            }
            let hitbox = entity.hitbox();
            let EntityBody::Drop(drop) = &mut entity.body else {
                continue;
            };
            if !drop.hit_test(hitbox, point) {
                continue;
            }
            redeemed.push(id);
            self.despawn(id);
            self.observers.unsubscribe(Topic::PointerClick, id);
        }
        if !redeemed.is_empty() {
            debug!(
                x = point.x,
                y = point.y,
                redeemed = redeemed.len(),
                "pointer_click_redeemed"
            );
        }
        redeemed
    }

    /// One pass: every live entity updates once in registry order, then
    /// buffered spawns and removals are applied.
    pub(crate) fn update(&mut self, dt_seconds: f32, ledger: &mut Ledger) -> UpdateReport {
        let mut visited = Vec::with_capacity(self.entities.len());
        for index in 0..self.entities.len() {
            let id = self.entities[index].id;
            visited.push(id);
            if self.entities[index].to_delete {
                continue;
            }
            self.update_entity(index, dt_seconds);

            let entity = &mut self.entities[index];
            if !entity.to_delete && entity.tick_announce(dt_seconds) {
                self.broadcast_appeared(id);
            }
        }

        let mut report = self.apply_pending(ledger);
        report.visited = visited;
        report
    }

    /// Collects flagged entities (crediting redeemed coins), appends staged
    /// spawns, then drops the flagged entities and their subscriptions.
    pub(crate) fn apply_pending(&mut self, ledger: &mut Ledger) -> UpdateReport {
        let mut report = UpdateReport::default();

        for entity in &self.entities {
            if !entity.to_delete {
                continue;
            }
            self.pending_removals.push(entity.id);
            let Some(coin) = entity
                .perishable()
                .filter(|drop| entity.category == EntityCategory::Coin && drop.is_redeemed())
            else {
                continue;
            };
            match ledger.credit(coin.coin_value()) {
                Ok(balance) => {
                    report.credited = report.credited.saturating_add(coin.coin_value());
                    report.redeemed_coins += 1;
                    info!(
                        coin_id = entity.id.0,
                        value = coin.coin_value(),
                        balance,
                        "coin_redeemed"
                    );
                }
                Err(error) => warn!(coin_id = entity.id.0, error = %error, "coin_credit_rejected"),
            }
        }

        for entity in self.pending_spawns.drain(..) {
            report.added.push(entity.id);
            self.entities.push(entity);
        }

        if !self.pending_removals.is_empty() {
            self.pending_removals.sort();
            self.pending_removals.dedup();
            let pending = &self.pending_removals;
            self.entities
                .retain(|entity| pending.binary_search(&entity.id).is_err());
            for id in self.pending_removals.drain(..) {
                self.observers.prune(id);
                report.removed.push(id);
            }
        }

        report
    }

    pub(crate) fn entities(&self) -> &[TankEntity] {
        &self.entities
    }

    #[cfg(test)]
    pub(crate) fn find(&self, id: EntityId) -> Option<&TankEntity> {
        search(&self.entities, id)
    }

    pub(crate) fn query(&self, predicate: impl Fn(&TankEntity) -> bool) -> Vec<&TankEntity> {
        self.entities
            .iter()
            .filter(|entity| predicate(entity))
            .collect()
    }

    pub(crate) fn query_category(&self, category: EntityCategory) -> Vec<&TankEntity> {
        self.query(|entity| entity.category == category)
    }

    pub(crate) fn has_living_agents(&self) -> bool {
        self.entities.iter().any(TankEntity::is_living_agent)
    }

    #[cfg(test)]
    pub(crate) fn pending_spawn_count(&self) -> usize {
        self.pending_spawns.len()
    }

    #[cfg(test)]
    pub(crate) fn is_subscribed(&self, topic: Topic, id: EntityId) -> bool {
        self.observers.is_subscribed(topic, id)
    }

    #[cfg(test)]
    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut TankEntity> {
        find_entity_mut(&mut self.entities, &mut self.pending_spawns, id)
    }

    fn update_entity(&mut self, index: usize, dt_seconds: f32) {
        let target = self.entities[index]
            .agent()
            .and_then(Agent::target)
            .and_then(|target| find_entity(&self.entities, &self.pending_spawns, target))
            .filter(|target| !target.to_delete)
            .map(|target| TargetView {
                position: target.position,
                category: target.category,
                payload: target.payload(),
            });
        let viewport = self.viewport;
        let entity = &mut self.entities[index];
        let id = entity.id;

        match &mut entity.body {
            EntityBody::Agent(agent) => {
                let context = AgentContext {
                    dt_seconds,
                    sprite_bounds: entity.bounds,
                    screen: &viewport,
                    target,
                };
                let was_alive = agent.is_alive();
                let effects = agent.update(&mut entity.position, &context, &mut self.rng);
                if was_alive && !agent.is_alive() {
                    info!(entity_id = id.0, def_name = %entity.def_name, "agent_died");
                }
                let position = entity.position;
                self.apply_agent_effects(id, position, effects);
            }
            EntityBody::Drop(drop) => {
                if drop.fall(&mut entity.position, dt_seconds, viewport.height()) {
                    self.despawn(id);
                }
            }
        }
    }

    fn apply_agent_effects(&mut self, id: EntityId, position: Vec2, effects: Vec<AgentEffect>) {
        for effect in effects {
            match effect {
                AgentEffect::Consume { target } => {
                    debug!(entity_id = id.0, target_id = target.0, "agent_fed");
                    self.despawn(target);
                }
                AgentEffect::EmitCoin { def_name } => self.spawn_emitted(id, &def_name, position),
                AgentEffect::EmitWaste => self.spawn_emitted(id, WASTE_DEF_NAME, position),
                AgentEffect::FloatedAway => {
                    self.despawn(id);
                }
            }
        }
    }

    fn spawn_emitted(&mut self, source: EntityId, def_name: &str, position: Vec2) {
        if let Err(error) = self.spawn_drop(def_name, position) {
            warn!(source_id = source.0, error = %error, "spawn_failed");
        }
    }

    fn broadcast_appeared(&mut self, id: EntityId) {
        let Some(candidate) = find_entity(&self.entities, &self.pending_spawns, id)
            .filter(|entity| !entity.to_delete)
            .map(TankEntity::as_candidate)
        else {
            return;
        };

        for subscriber in self.observers.subscribers(Topic::Appeared) {
            if subscriber == id {
                continue;
            }
            let Some(listener) = find_entity(&self.entities, &self.pending_spawns, subscriber)
            else {
                continue;
            };
            if listener.to_delete {
                continue;
            }
            let listener_position = listener.position;
            let current_target = listener
                .agent()
                .and_then(Agent::target)
                .and_then(|target| find_entity(&self.entities, &self.pending_spawns, target))
                .filter(|target| !target.to_delete)
                .map(|target| target.position);

            let Some(agent) = find_entity_mut(&mut self.entities, &mut self.pending_spawns, subscriber)
                .and_then(TankEntity::agent_mut)
            else {
                continue;
            };
            if agent.on_entity_appeared(subscriber, listener_position, &candidate, current_target) {
                debug!(entity_id = subscriber.0, target_id = id.0, "target_acquired");
            }
        }
    }

    fn broadcast_removed(&mut self, id: EntityId) {
        for subscriber in self.observers.subscribers(Topic::Removed) {
            if subscriber == id {
                continue;
            }
            let Some(listener) =
                find_entity_mut(&mut self.entities, &mut self.pending_spawns, subscriber)
            else {
                continue;
            };
            if listener.to_delete {
                continue;
            }
            let bounds = listener.bounds;
            let Some(agent) = listener.agent_mut() else {
                continue;
            };
            if agent.on_entity_removed(id, bounds, &self.viewport, &mut self.rng) {
                debug!(entity_id = subscriber.0, target_id = id.0, "target_released");
            }
        }
    }

    fn random_spawn_point(&mut self) -> Vec2 {
        Vec2 {
            x: self.rng.gen_range(0.0..=self.viewport.width()),
            y: self.rng.gen_range(0.0..=self.viewport.height()),
        }
    }
}

// Live and pending entities are each sorted by id: ids are allocated in
// increasing order and only ever appended.
fn search(entities: &[TankEntity], id: EntityId) -> Option<&TankEntity> {
    entities
        .binary_search_by_key(&id, |entity| entity.id)
        .ok()
        .map(|index| &entities[index])
}

fn find_entity<'a>(
    live: &'a [TankEntity],
    pending: &'a [TankEntity],
    id: EntityId,
) -> Option<&'a TankEntity> {
    search(live, id).or_else(|| search(pending, id))
}

fn find_entity_mut<'a>(
    live: &'a mut [TankEntity],
    pending: &'a mut [TankEntity],
    id: EntityId,
) -> Option<&'a mut TankEntity> {
    if let Ok(index) = live.binary_search_by_key(&id, |entity| entity.id) {
        return live.get_mut(index);
    }
    pending
        .binary_search_by_key(&id, |entity| entity.id)
        .ok()
        .and_then(move |index| pending.get_mut(index))
}

#[cfg(test)]
mod tests {
    use super::super::agent::AgentState;
    use super::super::catalog::test_support::shipped_catalog_with_bounds;
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn world() -> TankWorld {
        TankWorld::new(
            shipped_catalog_with_bounds(20.0, 10.0),
            Viewport {
                width: 640,
                height: 480,
            },
            7,
        )
    }

    fn place(world: &mut TankWorld, id: EntityId, position: Vec2) {
        world.entity_mut(id).expect("entity").position = position;
    }

    fn agent_of(world: &TankWorld, id: EntityId) -> &Agent {
        world.find(id).and_then(TankEntity::agent).expect("agent")
    }

    fn set_health(world: &mut TankWorld, id: EntityId, health: f32) {
        world
            .entity_mut(id)
            .and_then(TankEntity::agent_mut)
            .expect("agent")
            .set_health(health);
    }

    #[test]
    fn spawned_entities_join_on_the_next_pass() {
        let mut world = world();
        let mut ledger = Ledger::default();
        let cod = world.spawn_agent("fish.cod").expect("cod");
        assert_eq!(world.pending_spawn_count(), 1);
        assert!(world.find(cod).is_none());

        let first = world.update(DT, &mut ledger);
        assert!(!first.visited.contains(&cod));
        assert_eq!(first.added, vec![cod]);

        let second = world.update(DT, &mut ledger);
        assert_eq!(second.visited, vec![cod]);
        assert!(second.added.is_empty());
    }

    #[test]
    fn agents_spawn_on_screen_and_subscribe() {
        let mut world = world();
        let cod = world.spawn_agent("fish.cod").expect("cod");
        let coin = world
            .spawn_drop("coin.silver", Vec2::new(5.0, 5.0))
            .expect("coin");
        world.apply_pending(&mut Ledger::default());

        let position = world.find(cod).expect("cod").position;
        assert!((0.0..=640.0).contains(&position.x));
        assert!((0.0..=480.0).contains(&position.y));
        assert!(world.is_subscribed(Topic::Appeared, cod));
        assert!(world.is_subscribed(Topic::Removed, cod));
        assert!(world.is_subscribed(Topic::PointerClick, coin));
        assert!(!world.is_subscribed(Topic::Appeared, coin));
    }

    #[test]
    fn spawn_requests_are_validated() {
        let mut world = world();
        assert_eq!(
            world.spawn_agent("fish.shark"),
            Err(SpawnError::UnknownDef {
                def_name: "fish.shark".to_string()
            })
        );
        assert_eq!(
            world.spawn_agent("chum.small"),
            Err(SpawnError::WrongCategory {
                def_name: "chum.small".to_string(),
                expected: "an Agent",
                actual: EntityCategory::Chum,
            })
        );
        assert!(matches!(
            world.spawn_agent("coin.gold"),
            Err(SpawnError::WrongCategory {
                actual: EntityCategory::Coin,
                ..
            })
        ));
        assert!(matches!(
            world.spawn_drop("fish.cod", Vec2::ZERO),
            Err(SpawnError::WrongCategory { .. })
        ));
        assert!(matches!(
            world.plan_spawn("chum.small", None),
            Err(SpawnError::MissingPosition { .. })
        ));
        assert_eq!(world.pending_spawn_count(), 0);
    }

    #[test]
    fn coin_click_redeems_once_and_credits_once() {
        let mut world = world();
        let mut ledger = Ledger::new(0).expect("ledger");
        let coin = world
            .spawn_drop("coin.silver", Vec2::new(100.0, 100.0))
            .expect("coin");
        world.apply_pending(&mut ledger);

        assert!(world.dispatch_pointer_click(Vec2::new(300.0, 300.0)).is_empty());
        assert_eq!(world.dispatch_pointer_click(Vec2::new(115.0, 105.0)), vec![coin]);
        assert!(world.dispatch_pointer_click(Vec2::new(100.0, 100.0)).is_empty());
        assert!(!world.is_subscribed(Topic::PointerClick, coin));

        let report = world.update(DT, &mut ledger);
        assert_eq!(report.credited, 25);
        assert_eq!(report.redeemed_coins, 1);
        assert_eq!(report.removed, vec![coin]);
        assert_eq!(ledger.balance(), 25);
        assert!(world.find(coin).is_none());

        let again = world.update(DT, &mut ledger);
        assert_eq!(again.credited, 0);
        assert_eq!(ledger.balance(), 25);
    }

    #[test]
    fn drops_leaving_the_screen_are_removed_without_credit() {
        let mut world = world();
        let mut ledger = Ledger::new(0).expect("ledger");
        let coin = world
            .spawn_drop("coin.silver", Vec2::new(100.0, 479.9))
            .expect("coin");
        world.apply_pending(&mut ledger);

        let report = world.update(0.1, &mut ledger);
        assert_eq!(report.removed, vec![coin]);
        assert_eq!(report.credited, 0);
        assert_eq!(ledger.balance(), 0);
        assert!(!world.is_subscribed(Topic::PointerClick, coin));
    }

    #[test]
    fn hungry_agent_acquires_food_when_it_appears() {
        let mut world = world();
        let cod = world.spawn_agent("fish.cod").expect("cod");
        world.apply_pending(&mut Ledger::default());
        set_health(&mut world, cod, 30.0);

        let pellet = world
            .spawn_drop("chum.small", Vec2::new(50.0, 50.0))
            .expect("pellet");
        assert_eq!(agent_of(&world, cod).target(), Some(pellet));
    }

    #[test]
    fn despawn_releases_chasers_once() {
        let mut world = world();
        let cod = world.spawn_agent("fish.cod").expect("cod");
        world.apply_pending(&mut Ledger::default());
        set_health(&mut world, cod, 30.0);
        let pellet = world
            .spawn_drop("chum.small", Vec2::new(50.0, 50.0))
            .expect("pellet");

        assert!(world.despawn(pellet));
        assert!(!world.despawn(pellet));
        assert!(matches!(
            agent_of(&world, cod).state(),
            AgentState::Wandering { .. }
        ));
    }

    #[test]
    fn agent_eats_food_it_reaches() {
        let mut world = world();
        let mut ledger = Ledger::default();
        let cod = world.spawn_agent("fish.cod").expect("cod");
        world.apply_pending(&mut ledger);
        place(&mut world, cod, Vec2::new(100.0, 100.0));
        set_health(&mut world, cod, 40.0);

        let pellet = world
            .spawn_drop("chum.small", Vec2::new(100.0, 130.0))
            .expect("pellet");
        assert_eq!(agent_of(&world, cod).target(), Some(pellet));

        let mut eaten = false;
        for _ in 0..300 {
            let report = world.update(DT, &mut ledger);
            if report.removed.contains(&pellet) {
                eaten = true;
                break;
            }
        }
        assert!(eaten);
        let agent = agent_of(&world, cod);
        assert!(agent.health() > 80.0, "health {}", agent.health());
        assert!(agent.waste_armed());
    }

    #[test]
    fn food_present_before_hunger_is_noticed_on_reannounce() {
        let mut world = world();
        let mut ledger = Ledger::default();
        let cod = world.spawn_agent("fish.cod").expect("cod");
        let pellet = world
            .spawn_drop("chum.small", Vec2::new(300.0, 10.0))
            .expect("pellet");
        world.apply_pending(&mut ledger);
        assert_eq!(agent_of(&world, cod).target(), None);

        set_health(&mut world, cod, 20.0);
        for _ in 0..31 {
            world.update(DT, &mut ledger);
        }
        assert_eq!(agent_of(&world, cod).target(), Some(pellet));
    }

    #[test]
    fn carnivore_eats_a_living_agent() {
        let mut world = world();
        let mut ledger = Ledger::default();
        let cod = world.spawn_agent("fish.cod").expect("cod");
        let carnivore = world.spawn_agent("fish.carnivore").expect("carnivore");
        world.apply_pending(&mut ledger);
        place(&mut world, cod, Vec2::new(200.0, 200.0));
        place(&mut world, carnivore, Vec2::new(205.0, 200.0));
        set_health(&mut world, carnivore, 600.0);

        let mut health_gain = None;
        for _ in 0..600 {
            let before = agent_of(&world, carnivore).health();
            let report = world.update(DT, &mut ledger);
            if report.removed.contains(&cod) {
                health_gain = Some(agent_of(&world, carnivore).health() - before);
                break;
            }
        }
        let gain = health_gain.expect("cod eaten");
        assert!(gain > 50.0, "gain {gain}");
        assert_eq!(agent_of(&world, carnivore).target(), None);
    }

    #[test]
    fn coin_clicked_while_staged_lands_once_then_is_credited_once() {
        let mut world = world();
        let mut ledger = Ledger::new(0).expect("ledger");
        let coin = world
            .spawn_drop("coin.silver", Vec2::new(100.0, 100.0))
            .expect("coin");
        assert_eq!(world.dispatch_pointer_click(Vec2::new(100.0, 100.0)), vec![coin]);

        let staged = world.update(DT, &mut ledger);
        assert!(staged.visited.is_empty());
        assert_eq!(staged.added, vec![coin]);
        assert!(staged.removed.is_empty());
        assert_eq!(ledger.balance(), 0);

        let landed = world.update(DT, &mut ledger);
        assert_eq!(landed.visited, vec![coin]);
        assert_eq!(landed.removed, vec![coin]);
        assert_eq!(landed.credited, 25);
        assert_eq!(ledger.balance(), 25);

        let after = world.update(DT, &mut ledger);
        assert!(after.visited.is_empty());
        assert!(after.removed.is_empty());
        assert_eq!(after.credited, 0);
        assert_eq!(ledger.balance(), 25);
    }

    #[test]
    fn health_stays_in_bounds_through_feeding_and_starvation() {
        let mut world = world();
        let mut ledger = Ledger::default();
        let cod = world.spawn_agent("fish.cod").expect("cod");
        world.apply_pending(&mut ledger);
        place(&mut world, cod, Vec2::new(200.0, 200.0));

        let feeding_frames = 40 * 60;
        let mut died = false;
        let mut removed = false;
        for frame in 0..120 * 60 {
            if frame < feeding_frames && frame % 120 == 0 {
                let at = world.find(cod).expect("cod").position;
                world.spawn_drop("chum.small", at).expect("pellet");
            }
            world.update(DT, &mut ledger);

            let Some(agent) = world.find(cod).and_then(TankEntity::agent) else {
                removed = true;
                break;
            };
            assert!(agent.health() >= 0.0, "health {}", agent.health());
            let fraction = agent.health_fraction();
            assert!((0.0..=1.0).contains(&fraction), "fraction {fraction}");
            if frame < feeding_frames {
                assert!(agent.is_alive(), "starved while fed at frame {frame}");
            }
            died |= !agent.is_alive();
        }
        assert!(died);
        assert!(removed);
    }

    #[test]
    fn queries_filter_live_entities() {
        let mut world = world();
        let mut ledger = Ledger::default();
        assert!(!world.has_living_agents());
        world.spawn_agent("fish.cod").expect("cod");
        world
            .spawn_drop("coin.gold", Vec2::new(10.0, 10.0))
            .expect("coin");
        world
            .spawn_drop("chum.large", Vec2::new(10.0, 10.0))
            .expect("chum");
        assert!(!world.has_living_agents());
        world.apply_pending(&mut ledger);

        assert!(world.has_living_agents());
        assert_eq!(world.query_category(EntityCategory::Coin).len(), 1);
        assert_eq!(world.query_category(EntityCategory::Agent).len(), 1);
        assert_eq!(
            world
                .query(|entity| entity.category != EntityCategory::Agent)
                .len(),
            2
        );
        assert_eq!(world.entities().len(), 3);
    }
}
