use fishtank_engine::{
    step_toward, AgentTuning, CoinDrop, EntityCategory, EntityId, ScreenBounds, SpriteBounds,
    Vec2,
};
use rand::seq::SliceRandom;
use rand::Rng;

pub(crate) const ARRIVAL_THRESHOLD_PX: f32 = 15.0;
pub(crate) const DEAD_FLOAT_SPEED: f32 = 25.0;
pub(crate) const WASTE_INTERVAL_SECONDS: f32 = 30.0;
const MIN_IDLE_SECONDS: u32 = 1;
const MAX_IDLE_SECONDS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum AgentState {
    ChooseNext,
    Idle { remaining_seconds: f32 },
    Wandering { destination: Vec2 },
    Chasing { target: EntityId },
    Dead,
}

/// What the world has to do on an agent's behalf after its update.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AgentEffect {
    Consume { target: EntityId },
    EmitCoin { def_name: String },
    EmitWaste,
    FloatedAway,
}

/// The world's view of the entity an agent is chasing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TargetView {
    pub(crate) position: Vec2,
    pub(crate) category: EntityCategory,
    pub(crate) payload: f32,
}

/// An entity announcing itself to potential predators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    pub(crate) id: EntityId,
    pub(crate) category: EntityCategory,
    pub(crate) position: Vec2,
    pub(crate) payload: f32,
}

pub(crate) struct AgentContext<'a> {
    pub(crate) dt_seconds: f32,
    pub(crate) sprite_bounds: SpriteBounds,
    pub(crate) screen: &'a dyn ScreenBounds,
    /// `None` when chasing and the target no longer exists. A target with
    /// nothing left to eat is released like a vanished one.
    pub(crate) target: Option<TargetView>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Agent {
    health: f32,
    max_health: f32,
    attrition_per_second: f32,
    speed: f32,
    preferred_prey: EntityCategory,
    coin_interval_seconds: f32,
    coin_elapsed_seconds: f32,
    coin_drops: Vec<CoinDrop>,
    /// Zero while unarmed.
    waste_remaining_seconds: f32,
    state: AgentState,
    facing_left: bool,
}

impl Agent {
    pub(crate) fn from_tuning(tuning: &AgentTuning) -> Self {
        Self {
            health: tuning.max_health,
            max_health: tuning.max_health,
            attrition_per_second: tuning.attrition_per_second,
            speed: tuning.speed,
            preferred_prey: tuning.preferred_prey,
            coin_interval_seconds: tuning.coin_interval_seconds,
            coin_elapsed_seconds: 0.0,
            coin_drops: tuning.coin_drops.clone(),
            waste_remaining_seconds: 0.0,
            state: AgentState::ChooseNext,
            facing_left: false,
        }
    }

    pub(crate) fn health(&self) -> f32 {
        self.health
    }

    pub(crate) fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> AgentState {
        self.state
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.state != AgentState::Dead
    }

    pub(crate) fn facing_left(&self) -> bool {
        self.facing_left
    }

    pub(crate) fn target(&self) -> Option<EntityId> {
        match self.state {
            AgentState::Chasing { target } => Some(target),
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn waste_armed(&self) -> bool {
        self.waste_remaining_seconds > 0.0
    }

    #[cfg(test)]
    pub(crate) fn set_health(&mut self, health: f32) {
        self.health = health.clamp(0.0, self.max_health);
    }

    #[cfg(test)]
    pub(crate) fn set_state(&mut self, state: AgentState) {
        self.state = state;
    }

    /// One frame: state machine, then attrition, then coin and waste timers.
    pub(crate) fn update<R: Rng + ?Sized>(
        &mut self,
        position: &mut Vec2,
        context: &AgentContext<'_>,
        rng: &mut R,
    ) -> Vec<AgentEffect> {
        let mut effects = Vec::new();
        let dt = context.dt_seconds;

        if self.state == AgentState::Dead {
            position.y -= DEAD_FLOAT_SPEED * dt;
            if position.y < 0.0 {
                effects.push(AgentEffect::FloatedAway);
            }
            return effects;
        }

        self.run_state_machine(position, context, rng, &mut effects);

        self.health = (self.health - self.attrition_per_second * dt).clamp(0.0, self.max_health);
        if self.health <= 0.0 {
            self.state = AgentState::Dead;
            return effects;
        }

        self.coin_elapsed_seconds += dt;
        if self.coin_elapsed_seconds >= self.coin_interval_seconds {
            self.coin_elapsed_seconds = 0.0;
            if let Ok(drop) = self.coin_drops.choose_weighted(rng, |drop| drop.weight) {
                effects.push(AgentEffect::EmitCoin {
                    def_name: drop.def_name.clone(),
                });
            }
        }

        if self.waste_remaining_seconds > 0.0 {
            self.waste_remaining_seconds -= dt;
            if self.waste_remaining_seconds <= 0.0 {
                self.waste_remaining_seconds = 0.0;
                effects.push(AgentEffect::EmitWaste);
            }
        }

        effects
    }

    fn run_state_machine<R: Rng + ?Sized>(
        &mut self,
        position: &mut Vec2,
        context: &AgentContext<'_>,
        rng: &mut R,
        effects: &mut Vec<AgentEffect>,
    ) {
        match self.state {
            AgentState::ChooseNext => {
                self.state = if rng.gen_bool(0.5) {
                    AgentState::Idle {
                        remaining_seconds: rng.gen_range(MIN_IDLE_SECONDS..=MAX_IDLE_SECONDS)
                            as f32,
                    }
                } else {
                    AgentState::Wandering {
                        destination: random_destination(
                            context.sprite_bounds,
                            context.screen,
                            rng,
                        ),
                    }
                };
            }
            AgentState::Idle { remaining_seconds } => {
                let remaining_seconds = remaining_seconds - context.dt_seconds;
                self.state = if remaining_seconds <= 0.0 {
                    AgentState::ChooseNext
                } else {
                    AgentState::Idle { remaining_seconds }
                };
            }
            AgentState::Wandering { destination } => {
                if self.move_toward(position, destination, context.dt_seconds) {
                    self.state = AgentState::ChooseNext;
                }
            }
            AgentState::Chasing { target } => match context
                .target
                .filter(|view| view.payload > 0.0)
            {
                None => {
                    self.state = AgentState::Wandering {
                        destination: random_destination(
                            context.sprite_bounds,
                            context.screen,
                            rng,
                        ),
                    };
                }
                Some(view) => {
                    if self.move_toward(position, view.position, context.dt_seconds) {
                        self.feed(view.payload, view.category);
                        effects.push(AgentEffect::Consume { target });
                        self.state = AgentState::ChooseNext;
                    }
                }
            },
            AgentState::Dead => {}
        }
    }

    fn move_toward(&mut self, position: &mut Vec2, destination: Vec2, dt_seconds: f32) -> bool {
        if destination.x != position.x {
            self.facing_left = destination.x < position.x;
        }
        let (next, arrived) = step_toward(
            *position,
            destination,
            self.speed,
            dt_seconds,
            ARRIVAL_THRESHOLD_PX,
        );
        *position = next;
        arrived
    }

    /// Heals by `payload`, never past max health. Returns the applied amount.
    pub(crate) fn feed(&mut self, payload: f32, food: EntityCategory) -> f32 {
        if !self.is_alive() {
            return 0.0;
        }
        let applied = payload.max(0.0).min(self.max_health - self.health);
        self.health = (self.health + applied).clamp(0.0, self.max_health);
        if food != EntityCategory::Poop && self.waste_remaining_seconds <= 0.0 {
            self.waste_remaining_seconds = WASTE_INTERVAL_SECONDS;
        }
        applied
    }

    /// Reacts to an "appeared" notification. `current_target` is the
    /// position of the entity currently chased, if it still exists.
    /// Returns true when the agent starts chasing `candidate`.
    pub(crate) fn on_entity_appeared(
        &mut self,
        self_id: EntityId,
        self_position: Vec2,
        candidate: &Candidate,
        current_target: Option<Vec2>,
    ) -> bool {
        if candidate.id == self_id
            || !self.is_alive()
            || candidate.category != self.preferred_prey
            || candidate.payload <= 0.0
        {
            return false;
        }
        if self.max_health - self.health < candidate.payload / 2.0 {
            return false;
        }

        if let AgentState::Chasing { target } = self.state {
            if target == candidate.id {
                return false;
            }
            if let Some(current) = current_target {
                let current_distance = self_position.distance(current);
                let candidate_distance = self_position.distance(candidate.position);
                if candidate_distance > current_distance / 2.0 {
                    return false;
                }
            }
        }

        self.state = AgentState::Chasing {
            target: candidate.id,
        };
        true
    }

    /// Releases the target if it was `removed`. Returns true when released.
    pub(crate) fn on_entity_removed<R: Rng + ?Sized>(
        &mut self,
        removed: EntityId,
        sprite_bounds: SpriteBounds,
        screen: &dyn ScreenBounds,
        rng: &mut R,
    ) -> bool {
        if self.target() != Some(removed) {
            return false;
        }
        self.state = AgentState::Wandering {
            destination: random_destination(sprite_bounds, screen, rng),
        };
        true
    }
}

/// Random point that keeps a sprite of `bounds` clear of the screen edges.
/// Collapses to the screen center on an axis that is too small.
pub(crate) fn random_destination<R: Rng + ?Sized>(
    bounds: SpriteBounds,
    screen: &dyn ScreenBounds,
    rng: &mut R,
) -> Vec2 {
    Vec2 {
        x: random_axis(bounds.width, screen.width(), rng),
        y: random_axis(bounds.height, screen.height(), rng),
    }
}

fn random_axis<R: Rng + ?Sized>(sprite_extent: f32, screen_extent: f32, rng: &mut R) -> f32 {
    let low = sprite_extent;
    let high = screen_extent - 2.0 * sprite_extent;
    if high < low {
        screen_extent / 2.0
    } else {
        rng.gen_range(low..=high)
    }
}
