use thiserror::Error;
use tracing::info;

use crate::AppPaths;

use super::compiler::{compile_mod_sources, ContentCompileError};
use super::database::{DefDatabase, EntityCategory};
use super::discovery::discover_mod_sources;
use super::types::{ContentPlanError, ContentPlanRequest};

#[derive(Debug, Error)]
pub enum ContentPipelineError {
    #[error(transparent)]
    Plan(#[from] ContentPlanError),
    #[error(transparent)]
    Compile(#[from] ContentCompileError),
}

/// Discovers base content plus enabled mods and compiles them into one
/// database.
pub fn build_def_database(
    app_paths: &AppPaths,
    request: &ContentPlanRequest,
) -> Result<DefDatabase, ContentPipelineError> {
    let sources = discover_mod_sources(app_paths, request)?;
    for source in &sources {
        info!(
            mod_id = %source.mod_id,
            mod_load_index = source.mod_load_index,
            source_dir = %source.source_dir.display(),
            "content_mod_source"
        );
    }

    let database = compile_mod_sources(&sources)?;

    let count_of = |category: EntityCategory| {
        database
            .entity_defs()
            .iter()
            .filter(|def| def.category == category)
            .count()
    };
    info!(
        total_mods = sources.len(),
        total_defs = database.entity_defs().len(),
        agent_defs = count_of(EntityCategory::Agent),
        chum_defs = count_of(EntityCategory::Chum),
        poop_defs = count_of(EntityCategory::Poop),
        coin_defs = count_of(EntityCategory::Coin),
        "content_pipeline_summary"
    );

    Ok(database)
}
