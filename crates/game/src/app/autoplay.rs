use fishtank_engine::{InputSource, KeyCode, RawInputEvent, RenderFrame, SpriteDraw, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

const SMALL_CHUM_COST: i64 = 15;
const COD_COST: i64 = 150;
const WIN_COST: i64 = 5000;
/// Money kept back for food after restocking.
const RESTOCK_RESERVE: i64 = 100;
const MIN_THINK_FRAMES: u32 = 6;
const MAX_THINK_FRAMES: u32 = 24;
/// Random spread when dropping food onto a fish.
const FEED_SCATTER_PX: f32 = 12.0;

/// Scripted player for headless runs. Reads the previous frame and answers
/// with the same raw events a mouse and keyboard would produce.
pub(crate) struct AutoplayInput {
    rng: StdRng,
    think_frames_left: u32,
}

impl AutoplayInput {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            think_frames_left: 0,
        }
    }

    fn decide(&mut self, frame: &RenderFrame) -> Vec<RawInputEvent> {
        if frame.hud.banner.is_some() {
            debug!(frame_index = frame.frame_index, "autoplay_game_over");
            return tap(KeyCode::Escape);
        }

        if let Some(coin) = frame.clickable_sprites().next() {
            return vec![
                RawInputEvent::CursorMoved(coin.position),
                RawInputEvent::PointerPressed,
                RawInputEvent::PointerReleased,
            ];
        }

        let balance = frame.hud.balance;
        if balance >= WIN_COST {
            return tap(KeyCode::Enter);
        }

        if balance >= SMALL_CHUM_COST {
            if let Some(fish) = hungriest_fish(&frame.sprites) {
                let target = Vec2::new(
                    fish.position.x + self.rng.gen_range(-FEED_SCATTER_PX..=FEED_SCATTER_PX),
                    fish.position.y + self.rng.gen_range(-FEED_SCATTER_PX..=FEED_SCATTER_PX),
                );
                let mut events = vec![RawInputEvent::CursorMoved(target)];
                events.extend(tap(KeyCode::Q));
                return events;
            }
        }

        if balance >= COD_COST + RESTOCK_RESERVE {
            return tap(KeyCode::Digit1);
        }

        Vec::new()
    }
}

impl InputSource for AutoplayInput {
    fn poll(&mut self, last_frame: &RenderFrame) -> Vec<RawInputEvent> {
        if self.think_frames_left > 0 {
            self.think_frames_left -= 1;
            return Vec::new();
        }
        let events = self.decide(last_frame);
        if !events.is_empty() {
            self.think_frames_left = self.rng.gen_range(MIN_THINK_FRAMES..=MAX_THINK_FRAMES);
        }
        events
    }
}

fn tap(key: KeyCode) -> Vec<RawInputEvent> {
    vec![RawInputEvent::KeyPressed(key), RawInputEvent::KeyReleased(key)]
}

/// Only fish with a visible health bar are worth feeding.
fn hungriest_fish(sprites: &[SpriteDraw]) -> Option<&SpriteDraw> {
    sprites
        .iter()
        .filter(|sprite| !sprite.flip_y)
        .filter_map(|sprite| sprite.health_fraction.map(|fraction| (sprite, fraction)))
        .min_by(|(_, left), (_, right)| left.total_cmp(right))
        .map(|(sprite, _)| sprite)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use fishtank_engine::{
        compile_def_database_from_str, run_scene, AssetRegistry, EntityId, FramePacing,
        HeadlessRenderer, HudState, LoopConfig, SpriteBounds,
    };

    use super::super::gameplay;
    use super::*;

    fn sprite(id: u64, position: Vec2) -> SpriteDraw {
        SpriteDraw {
            entity_id: EntityId(id),
            sprite: "fish_cod".to_string(),
            position,
            bounds: SpriteBounds {
                width: 32.0,
                height: 32.0,
            },
            flip_x: false,
            flip_y: false,
            health_fraction: None,
            clickable: false,
        }
    }

    fn frame_with(balance: i64, sprites: Vec<SpriteDraw>) -> RenderFrame {
        RenderFrame {
            sprites,
            hud: HudState {
                balance,
                ..HudState::default()
            },
            ..RenderFrame::default()
        }
    }

    #[test]
    fn coins_are_clicked_first() {
        let mut coin = sprite(2, Vec2::new(30.0, 40.0));
        coin.clickable = true;
        let frame = frame_with(10_000, vec![sprite(1, Vec2::ZERO), coin]);

        let events = AutoplayInput::new(1).poll(&frame);
        assert_eq!(
            events,
            vec![
                RawInputEvent::CursorMoved(Vec2::new(30.0, 40.0)),
                RawInputEvent::PointerPressed,
                RawInputEvent::PointerReleased,
            ]
        );
    }

    #[test]
    fn hungriest_living_fish_gets_fed_nearby() {
        let mut hungry = sprite(1, Vec2::new(100.0, 100.0));
        hungry.health_fraction = Some(0.3);
        let mut peckish = sprite(2, Vec2::new(500.0, 500.0));
        peckish.health_fraction = Some(0.6);
        let mut dead = sprite(3, Vec2::new(900.0, 900.0));
        dead.flip_y = true;
        dead.health_fraction = Some(0.0);
        let frame = frame_with(20, vec![peckish, dead, hungry]);

        let events = AutoplayInput::new(2).poll(&frame);
        let RawInputEvent::CursorMoved(target) = events[0] else {
            panic!("expected a cursor move, got {events:?}");
        };
        assert!(target.distance(Vec2::new(100.0, 100.0)) <= FEED_SCATTER_PX * 1.5);
        assert_eq!(&events[1..], tap(KeyCode::Q).as_slice());
    }

    #[test]
    fn restocks_only_with_a_reserve_and_wins_when_rich() {
        let mut input = AutoplayInput::new(3);
        assert!(input.poll(&frame_with(COD_COST, Vec::new())).is_empty());
        assert_eq!(
            input.poll(&frame_with(COD_COST + RESTOCK_RESERVE, Vec::new())),
            tap(KeyCode::Digit1)
        );

        let mut input = AutoplayInput::new(3);
        assert_eq!(
            input.poll(&frame_with(WIN_COST, Vec::new())),
            tap(KeyCode::Enter)
        );
    }

    #[test]
    fn waits_between_actions_and_quits_after_game_over() {
        let mut input = AutoplayInput::new(4);
        let mut frame = frame_with(WIN_COST, Vec::new());
        assert!(!input.poll(&frame).is_empty());
        assert!(input.poll(&frame).is_empty());

        frame.hud.banner = Some("You win!".to_string());
        let events = (0..=MAX_THINK_FRAMES)
            .map(|_| input.poll(&frame))
            .find(|events| !events.is_empty())
            .expect("acts again after thinking");
        assert_eq!(events, tap(KeyCode::Escape));
    }

    #[test]
    fn drives_a_headless_tank_run() {
        let defs = compile_def_database_from_str(
            "base",
            Path::new("assets/base/catalog.xml"),
            include_str!("../../../../assets/base/catalog.xml"),
        )
        .expect("shipped catalog compiles");
        let config = LoopConfig {
            pacing: FramePacing::Fixed,
            max_frames: Some(1_200),
            ..LoopConfig::default()
        };
        let mut input = AutoplayInput::new(5);
        let mut renderer = HeadlessRenderer::default();

        let summary = run_scene(
            &config,
            gameplay::build_scene(5),
            &defs,
            &AssetRegistry::default(),
            &mut input,
            &mut renderer,
        )
        .expect("run completes");
        assert_eq!(summary.frames, 1_200);
        assert_eq!(summary.ticks, 1_200);
        assert!(!summary.quit_requested);
        assert_eq!(renderer.frames_presented(), 1_200);
        let title = summary.final_title.expect("title");
        assert!(title.starts_with("fishtank | balance=$"), "{title}");
    }
}
