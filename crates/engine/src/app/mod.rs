mod assets;
mod geometry;
mod input;
mod loop_runner;
mod render;
mod scene;

pub use assets::{AssetError, AssetProvider, AssetRegistry, PLACEHOLDER_SPRITE_BOUNDS};
pub use geometry::{step_toward, Rect, SpriteBounds, Vec2};
pub use input::{InputAction, InputSnapshot, KeyCode, RawInputEvent};
pub use loop_runner::{
    run_app, run_scene, AppError, FramePacing, InputSource, LoopConfig, RunSummary,
};
pub use render::{
    HeadlessRenderer, HudState, RenderFrame, Renderer, ScreenBounds, SpriteDraw, Viewport,
};
pub use scene::{
    EntityId, EntityIdAllocator, Scene, SceneCommand, SceneLoadError, SceneResources,
};
