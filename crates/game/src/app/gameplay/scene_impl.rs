use fishtank_engine::{
    EntityCategory, HudState, InputAction, InputSnapshot, RenderFrame, Scene, SceneCommand,
    SceneLoadError, SceneResources, SpriteDraw,
};
use tracing::{debug, info};

use super::catalog::TankCatalog;
use super::economy::Ledger;
use super::entity::EntityBody;
use super::store::{purchase, purchase_win, WIN_COST};
use super::world::TankWorld;

pub(crate) const STARTER_DEF_NAME: &str = "fish.cod";
/// Health bars appear below this fraction of max health.
pub(crate) const HEALTH_BAR_THRESHOLD: f32 = 0.75;
pub(crate) const COIN_SOUND: &str = "coin";
pub(crate) const PURCHASE_SOUND: &str = "purchase";

const HOTKEY_PURCHASES: [(InputAction, &str); 6] = [
    (InputAction::BuySmallChum, "chum.small"),
    (InputAction::BuyLargeChum, "chum.large"),
    (InputAction::BuyCod, "fish.cod"),
    (InputAction::BuyBass, "fish.bass"),
    (InputAction::BuyJanitor, "fish.janitor"),
    (InputAction::BuyCarnivore, "fish.carnivore"),
];
const HOTKEY_LABELS: [&str; 6] = ["Q", "W", "1", "2", "3", "4"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GameOutcome {
    Ongoing,
    Won,
    Lost,
}

pub(crate) struct TankScene {
    seed: u64,
    ledger: Ledger,
    world: Option<TankWorld>,
    outcome: GameOutcome,
    pending_sound_cues: Vec<&'static str>,
    elapsed_seconds: f32,
}

impl TankScene {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            seed,
            ledger: Ledger::default(),
            world: None,
            outcome: GameOutcome::Ongoing,
            pending_sound_cues: Vec::new(),
            elapsed_seconds: 0.0,
        }
    }

    #[cfg(test)]
    pub(crate) fn outcome(&self) -> GameOutcome {
        self.outcome
    }

    #[cfg(test)]
    pub(crate) fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[cfg(test)]
    pub(crate) fn world(&self) -> Option<&TankWorld> {
        self.world.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn parts_mut(&mut self) -> (&mut Ledger, Option<&mut TankWorld>) {
        (&mut self.ledger, self.world.as_mut())
    }

    fn handle_input(&mut self, input: &InputSnapshot) {
        let Some(world) = self.world.as_mut() else {
            return;
        };

        if let Some(point) = input.click_position() {
            world.dispatch_pointer_click(point);
        }

        for (action, def_name) in HOTKEY_PURCHASES {
            if !input.was_pressed(action) {
                continue;
            }
            if purchase(&mut self.ledger, world, def_name, input.cursor_position_px()).is_ok() {
                self.pending_sound_cues.push(PURCHASE_SOUND);
            }
        }

        if input.was_pressed(InputAction::BuyWin) && purchase_win(&mut self.ledger).is_ok() {
            self.pending_sound_cues.push(PURCHASE_SOUND);
            self.outcome = GameOutcome::Won;
            info!(
                elapsed_seconds = self.elapsed_seconds,
                balance = self.ledger.balance(),
                "game_won"
            );
        }
    }

    fn hud(&self, world: &TankWorld) -> HudState {
        let catalog = world.catalog();
        let mut lines = vec![format!("Balance: ${}", self.ledger.balance())];
        for ((_, def_name), key) in HOTKEY_PURCHASES.iter().zip(HOTKEY_LABELS) {
            if let Some(entry) = catalog.lookup(def_name) {
                let cost = entry.cost.unwrap_or_default();
                lines.push(format!("[{key}] {} ${cost}", entry.label));
            }
        }
        lines.push(format!("[Enter] Win ${WIN_COST}"));

        let banner = match self.outcome {
            GameOutcome::Ongoing => None,
            GameOutcome::Won => Some("You win!".to_string()),
            GameOutcome::Lost => Some("Game over: the tank is empty".to_string()),
        };
        HudState {
            balance: self.ledger.balance(),
            banner,
            lines,
        }
    }
}

/// Lost when nothing can earn money any more: no fish, no coins left to
/// collect, and not enough money for the cheapest fish.
pub(crate) fn is_lost(ledger: &Ledger, world: &TankWorld) -> bool {
    let cannot_restock = world
        .catalog()
        .cheapest_cost(EntityCategory::Agent)
        .is_none_or(|cost| !ledger.can_afford(cost));
    cannot_restock
        && !world.has_living_agents()
        && world.query_category(EntityCategory::Coin).is_empty()
}

impl Scene for TankScene {
    fn load(&mut self, resources: SceneResources<'_>) -> Result<(), SceneLoadError> {
        let catalog = TankCatalog::from_defs(resources.def_database, resources.assets)?;
        catalog.require(STARTER_DEF_NAME, EntityCategory::Agent)?;

        let mut world = TankWorld::new(catalog, resources.viewport, self.seed);
        world
            .spawn_agent(STARTER_DEF_NAME)
            .map_err(|error| SceneLoadError::InvalidDef {
                def_name: STARTER_DEF_NAME.to_string(),
                reason: error.to_string(),
            })?;
        world.apply_pending(&mut self.ledger);

        info!(
            seed = self.seed,
            catalog_size = world.catalog().len(),
            entity_count = world.entities().len(),
            balance = self.ledger.balance(),
            "tank_loaded"
        );
        self.world = Some(world);
        self.outcome = GameOutcome::Ongoing;
        self.elapsed_seconds = 0.0;
        Ok(())
    }

    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        if input.quit_requested() {
            return SceneCommand::Quit;
        }
        self.elapsed_seconds += fixed_dt_seconds;

        if self.outcome == GameOutcome::Ongoing {
            self.handle_input(input);
        }

        let Some(world) = self.world.as_mut() else {
            return SceneCommand::None;
        };
        let report = world.update(fixed_dt_seconds, &mut self.ledger);
        if report.redeemed_coins > 0 {
            self.pending_sound_cues.push(COIN_SOUND);
        }
        if !report.added.is_empty() || !report.removed.is_empty() {
            debug!(
                visited = report.visited.len(),
                added = report.added.len(),
                removed = report.removed.len(),
                credited = report.credited,
                "tank_pass"
            );
        }

        if self.outcome == GameOutcome::Ongoing && is_lost(&self.ledger, world) {
            self.outcome = GameOutcome::Lost;
            info!(
                elapsed_seconds = self.elapsed_seconds,
                balance = self.ledger.balance(),
                "game_lost"
            );
        }

        SceneCommand::None
    }

    fn render(&mut self, frame: &mut RenderFrame) {
        let Some(world) = self.world.as_ref() else {
            return;
        };

        for entity in world.entities() {
            let (flip_x, flip_y, health_fraction) = match &entity.body {
                EntityBody::Agent(agent) => {
                    let fraction = agent.health_fraction();
                    let show_bar = agent.is_alive() && fraction < HEALTH_BAR_THRESHOLD;
                    (
                        agent.facing_left(),
                        !agent.is_alive(),
                        show_bar.then_some(fraction),
                    )
                }
                EntityBody::Drop(_) => (false, false, None),
            };
            frame.sprites.push(SpriteDraw {
                entity_id: entity.id,
                sprite: entity.sprite.clone(),
                position: entity.position,
                bounds: entity.bounds,
                flip_x,
                flip_y,
                health_fraction,
                clickable: entity.category == EntityCategory::Coin && !entity.to_delete,
            });
        }

        frame.hud = self.hud(world);
        frame
            .sound_cues
            .extend(self.pending_sound_cues.drain(..).map(str::to_string));
    }

    fn unload(&mut self) {
        if let Some(world) = self.world.take() {
            info!(
                entity_count = world.entities().len(),
                balance = self.ledger.balance(),
                outcome = ?self.outcome,
                "tank_unloaded"
            );
        }
    }

    fn debug_title(&self) -> Option<String> {
        let world = self.world.as_ref()?;
        let fish = world
            .query(|entity| entity.is_living_agent())
            .len();
        let coins = world.query_category(EntityCategory::Coin).len();
        Some(format!(
            "fishtank | balance=${} | fish={} | coins={} | outcome={:?}",
            self.ledger.balance(),
            fish,
            coins,
            self.outcome
        ))
    }
}
