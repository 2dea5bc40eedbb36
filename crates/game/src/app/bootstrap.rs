use fishtank_engine::{ContentPlanRequest, FramePacing, HeadlessRenderer, LoopConfig, Scene};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::autoplay::AutoplayInput;
use super::gameplay;

const ENABLED_MODS_ENV_VAR: &str = "FISHTANK_ENABLED_MODS";
const SEED_ENV_VAR: &str = "FISHTANK_SEED";
const MAX_FRAMES_ENV_VAR: &str = "FISHTANK_MAX_FRAMES";
const REALTIME_ENV_VAR: &str = "FISHTANK_REALTIME";
/// Thirty simulated minutes at the default tick rate.
const DEFAULT_MAX_FRAMES: u64 = 60 * 60 * 30;

pub(crate) struct AppWiring {
    pub(crate) seed: u64,
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
    pub(crate) input: AutoplayInput,
    pub(crate) renderer: HeadlessRenderer,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Fishtank Startup ===");

    let seed = parse_seed(read_env(SEED_ENV_VAR)).unwrap_or_else(rand::random);
    let config = LoopConfig {
        max_frames: parse_max_frames(read_env(MAX_FRAMES_ENV_VAR)),
        pacing: parse_pacing(read_env(REALTIME_ENV_VAR)),
        content_plan_request: ContentPlanRequest {
            enabled_mods: parse_enabled_mods(read_env(ENABLED_MODS_ENV_VAR)),
        },
        ..LoopConfig::default()
    };
    info!(
        seed,
        max_frames = ?config.max_frames,
        pacing = ?config.pacing,
        enabled_mods = ?config.content_plan_request.enabled_mods,
        "app_config"
    );

    AppWiring {
        seed,
        config,
        scene: gameplay::build_scene(seed),
        input: AutoplayInput::new(seed),
        renderer: HeadlessRenderer::default(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn read_env(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

fn parse_enabled_mods(raw: Option<String>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect::<Vec<_>>()
    })
    .unwrap_or_default()
}

fn parse_seed(raw: Option<String>) -> Option<u64> {
    let raw = raw?;
    match raw.trim().parse::<u64>() {
        Ok(seed) => Some(seed),
        Err(error) => {
            warn!(var = SEED_ENV_VAR, value = %raw, error = %error, "env_value_ignored");
            None
        }
    }
}

/// `0` lifts the frame limit.
fn parse_max_frames(raw: Option<String>) -> Option<u64> {
    let Some(raw) = raw else {
        return Some(DEFAULT_MAX_FRAMES);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => None,
        Ok(max_frames) => Some(max_frames),
        Err(error) => {
            warn!(var = MAX_FRAMES_ENV_VAR, value = %raw, error = %error, "env_value_ignored");
            Some(DEFAULT_MAX_FRAMES)
        }
    }
}

fn parse_pacing(raw: Option<String>) -> FramePacing {
    match raw.as_deref().map(str::trim) {
        Some("1" | "true" | "yes") => FramePacing::Realtime,
        _ => FramePacing::Fixed,
    }
}
