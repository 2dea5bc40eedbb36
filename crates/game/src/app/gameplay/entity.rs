use fishtank_engine::{EntityCategory, EntityId, Rect, SpriteBounds, Vec2};

use super::agent::{Agent, Candidate};
use super::drops::Perishable;

/// Seconds between "appeared" re-broadcasts of a live entity.
pub(crate) const ANNOUNCE_INTERVAL_SECONDS: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EntityBody {
    Agent(Agent),
    Drop(Perishable),
}

#[derive(Debug, Clone)]
pub(crate) struct TankEntity {
    pub(crate) id: EntityId,
    pub(crate) def_name: String,
    pub(crate) sprite: String,
    pub(crate) category: EntityCategory,
    /// Center of the sprite, screen pixels, y down.
    pub(crate) position: Vec2,
    pub(crate) bounds: SpriteBounds,
    pub(crate) to_delete: bool,
    pub(crate) announce_elapsed_seconds: f32,
    pub(crate) body: EntityBody,
}

impl TankEntity {
    /// Twice the sprite size, centered on the position.
    pub(crate) fn hitbox(&self) -> Rect {
        Rect::from_center_size(
            self.position,
            self.bounds.width * 2.0,
            self.bounds.height * 2.0,
        )
    }

    /// Health gained by whoever eats this entity.
    pub(crate) fn payload(&self) -> f32 {
        match &self.body {
            EntityBody::Agent(agent) => agent.health(),
            EntityBody::Drop(drop) => drop.heal_amount(),
        }
    }

    pub(crate) fn as_candidate(&self) -> Candidate {
        Candidate {
            id: self.id,
            category: self.category,
            position: self.position,
            payload: self.payload(),
        }
    }

    pub(crate) fn agent(&self) -> Option<&Agent> {
        match &self.body {
            EntityBody::Agent(agent) => Some(agent),
            EntityBody::Drop(_) => None,
        }
    }

    pub(crate) fn agent_mut(&mut self) -> Option<&mut Agent> {
        match &mut self.body {
            EntityBody::Agent(agent) => Some(agent),
            EntityBody::Drop(_) => None,
        }
    }

    pub(crate) fn perishable(&self) -> Option<&Perishable> {
        match &self.body {
            EntityBody::Drop(drop) => Some(drop),
            EntityBody::Agent(_) => None,
        }
    }

    pub(crate) fn is_living_agent(&self) -> bool {
        !self.to_delete && self.agent().is_some_and(Agent::is_alive)
    }

    /// Advances the re-announce timer; true when a broadcast is due.
    pub(crate) fn tick_announce(&mut self, dt_seconds: f32) -> bool {
        self.announce_elapsed_seconds += dt_seconds;
        if self.announce_elapsed_seconds >= ANNOUNCE_INTERVAL_SECONDS {
            self.announce_elapsed_seconds = 0.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use fishtank_engine::DropTuning;

    use super::*;

    fn pellet() -> TankEntity {
        TankEntity {
            id: EntityId(3),
            def_name: "chum.small".to_string(),
            sprite: "pellet_small".to_string(),
            category: EntityCategory::Chum,
            position: Vec2::new(100.0, 50.0),
            bounds: SpriteBounds {
                width: 10.0,
                height: 6.0,
            },
            to_delete: false,
            announce_elapsed_seconds: 0.0,
            body: EntityBody::Drop(Perishable::from_tuning(&DropTuning {
                fall_rate: 30.0,
                heal_amount: 50.0,
                coin_value: 0,
            })),
        }
    }

    #[test]
    fn hitbox_is_double_sprite_size_around_center() {
        let entity = pellet();
        let hitbox = entity.hitbox();
        assert_eq!(hitbox.width(), 20.0);
        assert_eq!(hitbox.height(), 12.0);
        assert!(hitbox.contains(Vec2::new(90.0, 44.0)));
        assert!(!hitbox.contains(Vec2::new(89.0, 50.0)));
    }

    #[test]
    fn announce_fires_every_half_second() {
        let mut entity = pellet();
        let fired = (0..6)
            .map(|_| entity.tick_announce(0.25))
            .collect::<Vec<_>>();
        assert_eq!(fired, vec![false, true, false, true, false, true]);
    }

    #[test]
    fn drops_carry_heal_payload_and_are_not_agents() {
        let entity = pellet();
        assert_eq!(entity.payload(), 50.0);
        assert!(entity.agent().is_none());
        assert!(!entity.is_living_agent());
        assert_eq!(entity.as_candidate().category, EntityCategory::Chum);
    }
}
