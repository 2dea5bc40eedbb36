use serde::Serialize;
use tracing::{debug, info};

use super::geometry::{SpriteBounds, Vec2};
use super::scene::EntityId;

/// Drawable area of the tank, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

pub trait ScreenBounds {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
}

impl ScreenBounds for Viewport {
    fn width(&self) -> f32 {
        self.width as f32
    }

    fn height(&self) -> f32 {
        self.height as f32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpriteDraw {
    pub entity_id: EntityId,
    pub sprite: String,
    /// Center of the sprite.
    pub position: Vec2,
    pub bounds: SpriteBounds,
    pub flip_x: bool,
    pub flip_y: bool,
    /// Present only when a health bar should be drawn.
    pub health_fraction: Option<f32>,
    pub clickable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HudState {
    pub balance: i64,
    pub banner: Option<String>,
    pub lines: Vec<String>,
}

/// Everything one presented frame needs; rebuilt by the scene every frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderFrame {
    pub frame_index: u64,
    pub sprites: Vec<SpriteDraw>,
    pub hud: HudState,
    pub sound_cues: Vec<String>,
}

impl RenderFrame {
    pub fn clear(&mut self) {
        self.sprites.clear();
        self.hud = HudState::default();
        self.sound_cues.clear();
    }

    pub fn clickable_sprites(&self) -> impl Iterator<Item = &SpriteDraw> {
        self.sprites.iter().filter(|sprite| sprite.clickable)
    }
}

pub trait Renderer {
    fn present(&mut self, frame: &RenderFrame);
}

/// Renderer with no window: logs HUD changes and counts frames.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    frames_presented: u64,
    last_hud: Option<HudState>,
}

impl HeadlessRenderer {
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl Renderer for HeadlessRenderer {
    fn present(&mut self, frame: &RenderFrame) {
        self.frames_presented = self.frames_presented.saturating_add(1);
        debug!(
            frame_index = frame.frame_index,
            sprite_count = frame.sprites.len(),
            "frame_presented"
        );
        if self.last_hud.as_ref() != Some(&frame.hud) {
            info!(
                frame_index = frame.frame_index,
                balance = frame.hud.balance,
                banner = frame.hud.banner.as_deref().unwrap_or(""),
                "hud_changed"
            );
            self.last_hud = Some(frame.hud.clone());
        }
    }
}
