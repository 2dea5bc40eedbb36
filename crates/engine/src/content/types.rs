use std::path::PathBuf;

use thiserror::Error;

/// Which content mods to layer over `assets/base`, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPlanRequest {
    pub enabled_mods: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ContentPlanError {
    #[error("enabled mod id cannot be empty")]
    EmptyEnabledMod,
    #[error("duplicate enabled mod id in request: {mod_id}")]
    DuplicateEnabledMod { mod_id: String },
    #[error("enabled mod does not exist on disk: {mod_id} at {expected_dir}")]
    EnabledModMissing {
        mod_id: String,
        expected_dir: PathBuf,
    },
}
