use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod content;
mod sprite_keys;

pub use app::{
    run_app, run_scene, step_toward, AppError, AssetError, AssetProvider, AssetRegistry,
    EntityId, EntityIdAllocator, FramePacing, HeadlessRenderer, HudState, InputAction,
    InputSnapshot, InputSource, KeyCode, LoopConfig, RawInputEvent, Rect, RenderFrame, Renderer,
    RunSummary, Scene, SceneCommand, SceneLoadError, SceneResources, ScreenBounds, SpriteBounds,
    SpriteDraw, Vec2, Viewport, PLACEHOLDER_SPRITE_BOUNDS,
};
pub use content::{
    build_def_database, compile_def_database, compile_def_database_from_str, AgentTuning,
    ArchetypeTuning, CoinDrop, ContentCompileError, ContentErrorCode, ContentPipelineError,
    ContentPlanError, ContentPlanRequest, DefDatabase, DropTuning, EntityArchetype,
    EntityCategory, EntityDefId, SourceLocation,
};
pub use sprite_keys::SpriteKeyError;

pub const ROOT_ENV_VAR: &str = "FISHTANK_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub base_content_dir: PathBuf,
    pub mods_dir: PathBuf,
    pub sprites_dir: PathBuf,
    pub audio_dir: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let assets = root.join("assets");
        Self {
            base_content_dir: assets.join("base"),
            mods_dir: root.join("mods"),
            sprites_dir: assets.join("sprites"),
            audio_dir: assets.join("audio"),
            root,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "FISHTANK_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/fishtank\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    Ok(AppPaths::from_root(root))
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
