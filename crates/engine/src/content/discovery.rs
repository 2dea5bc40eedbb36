use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::AppPaths;

use super::types::{ContentPlanError, ContentPlanRequest};

#[derive(Debug, Clone)]
pub(crate) struct ModSource {
    pub mod_id: String,
    pub mod_load_index: u32,
    pub source_dir: PathBuf,
}

/// Base content first, then enabled mods in request order. Later sources
/// override earlier ones.
pub(crate) fn discover_mod_sources(
    app_paths: &AppPaths,
    request: &ContentPlanRequest,
) -> Result<Vec<ModSource>, ContentPlanError> {
    let mut seen = HashSet::<String>::new();
    let mut sources = vec![ModSource {
        mod_id: "base".to_string(),
        mod_load_index: 0,
        source_dir: app_paths.base_content_dir.clone(),
    }];

    for (idx, mod_id) in request.enabled_mods.iter().enumerate() {
        let trimmed = mod_id.trim();
        if trimmed.is_empty() {
            return Err(ContentPlanError::EmptyEnabledMod);
        }
        if !seen.insert(trimmed.to_string()) {
            return Err(ContentPlanError::DuplicateEnabledMod {
                mod_id: trimmed.to_string(),
            });
        }
        let mod_dir = app_paths.mods_dir.join(trimmed);
        ensure_dir_exists(trimmed, &mod_dir)?;
        sources.push(ModSource {
            mod_id: trimmed.to_string(),
            mod_load_index: (idx + 1) as u32,
            source_dir: mod_dir,
        });
    }

    Ok(sources)
}

fn ensure_dir_exists(mod_id: &str, path: &Path) -> Result<(), ContentPlanError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ContentPlanError::EnabledModMissing {
            mod_id: mod_id.to_string(),
            expected_dir: path.to_path_buf(),
        })
    }
}
