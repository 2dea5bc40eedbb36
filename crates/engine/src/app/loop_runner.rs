use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    build_def_database, resolve_app_paths, ContentPipelineError, ContentPlanRequest, DefDatabase,
    StartupError,
};

use super::assets::{AssetError, AssetProvider, AssetRegistry};
use super::input::{InputCollector, RawInputEvent};
use super::render::{RenderFrame, Renderer, Viewport};
use super::scene::{Scene, SceneCommand, SceneLoadError, SceneResources};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePacing {
    /// Exactly one fixed tick per frame and no sleeping.
    Fixed,
    /// Wall-clock accumulator with a render cap.
    Realtime,
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub viewport: Viewport,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub max_render_fps: Option<u32>,
    pub max_frames: Option<u64>,
    pub pacing: FramePacing,
    pub metrics_log_interval_frames: u64,
    pub content_plan_request: ContentPlanRequest,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            max_render_fps: Some(60),
            max_frames: None,
            pacing: FramePacing::Realtime,
            metrics_log_interval_frames: 600,
            content_plan_request: ContentPlanRequest::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to build content database: {0}")]
    ContentPipeline(#[from] ContentPipelineError),
    #[error("failed to index assets: {0}")]
    Assets(#[from] AssetError),
    #[error("failed to load scene: {0}")]
    SceneLoad(#[from] SceneLoadError),
}

/// Source of raw device events. Sees the previous frame so scripted drivers
/// can react to what is on screen.
pub trait InputSource {
    fn poll(&mut self, last_frame: &RenderFrame) -> Vec<RawInputEvent>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub ticks: u64,
    pub quit_requested: bool,
    pub final_title: Option<String>,
}

pub fn run_app(
    config: LoopConfig,
    scene: Box<dyn Scene>,
    input: &mut dyn InputSource,
    renderer: &mut dyn Renderer,
) -> Result<RunSummary, AppError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        base_content_dir = %app_paths.base_content_dir.display(),
        mods_dir = %app_paths.mods_dir.display(),
        sprites_dir = %app_paths.sprites_dir.display(),
        audio_dir = %app_paths.audio_dir.display(),
        "startup"
    );
    let def_database = build_def_database(&app_paths, &config.content_plan_request)?;
    let assets = AssetRegistry::scan(&app_paths.sprites_dir, &app_paths.audio_dir)?;

    run_scene(&config, scene, &def_database, &assets, input, renderer)
}

pub fn run_scene(
    config: &LoopConfig,
    mut scene: Box<dyn Scene>,
    def_database: &DefDatabase,
    assets: &dyn AssetProvider,
    input: &mut dyn InputSource,
    renderer: &mut dyn Renderer,
) -> Result<RunSummary, AppError> {
    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let metrics_log_interval_frames = config.metrics_log_interval_frames.max(1);

    scene.load(SceneResources {
        def_database,
        assets,
        viewport: config.viewport,
    })?;
    info!(
        viewport_width = config.viewport.width,
        viewport_height = config.viewport.height,
        def_count = def_database.entity_defs().len(),
        "scene_loaded"
    );
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        pacing = ?config.pacing,
        max_frames = ?config.max_frames,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut collector = InputCollector::default();
    let mut frame = RenderFrame::default();
    let mut summary = RunSummary::default();
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();

    loop {
        if config.max_frames.is_some_and(|max| summary.frames >= max) {
            info!(frames = summary.frames, "frame_limit_reached");
            break;
        }

        for event in input.poll(&frame) {
            collector.handle_event(event);
        }
        if collector.quit_requested() {
            summary.quit_requested = true;
            info!(reason = "quit_input", "shutdown_requested");
            break;
        }

        let ticks_to_run = match config.pacing {
            FramePacing::Fixed => 1,
            FramePacing::Realtime => {
                let now = Instant::now();
                let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                last_frame_instant = now;
                accumulator =
                    accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));
                let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                accumulator = step_plan.remaining_accumulator;
                if step_plan.dropped_backlog > Duration::ZERO {
                    warn!(
                        dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                        max_ticks_per_frame, "sim_clamp_triggered"
                    );
                }
                step_plan.ticks_to_run
            }
        };

        let mut quit_from_scene = false;
        for _ in 0..ticks_to_run {
            let snapshot = collector.snapshot_for_tick();
            summary.ticks = summary.ticks.saturating_add(1);
            if scene.update(fixed_dt_seconds, &snapshot) == SceneCommand::Quit {
                quit_from_scene = true;
                break;
            }
        }

        if config.pacing == FramePacing::Realtime {
            let elapsed_since_last_present =
                Instant::now().saturating_duration_since(last_present_instant);
            let cap_sleep = compute_cap_sleep(elapsed_since_last_present, render_frame_target);
            if cap_sleep > Duration::ZERO {
                thread::sleep(cap_sleep);
            }
        }

        frame.clear();
        frame.frame_index = summary.frames;
        scene.render(&mut frame);
        for cue in &frame.sound_cues {
            assets.play_sound(cue);
        }
        renderer.present(&frame);
        last_present_instant = Instant::now();
        summary.frames = summary.frames.saturating_add(1);

        if summary.frames % metrics_log_interval_frames == 0 {
            let title = scene.debug_title().unwrap_or_default();
            info!(
                frames = summary.frames,
                ticks = summary.ticks,
                sprite_count = frame.sprites.len(),
                title = %title,
                "loop_metrics"
            );
        }

        if quit_from_scene {
            summary.quit_requested = true;
            info!(reason = "scene_command", "shutdown_requested");
            break;
        }
    }

    summary.final_title = scene.debug_title();
    scene.unload();
    info!(frames = summary.frames, ticks = summary.ticks, "shutdown");
    Ok(summary)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;
    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}
