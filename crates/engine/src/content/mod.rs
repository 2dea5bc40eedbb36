mod compiler;
mod database;
mod discovery;
mod pipeline;
mod types;

pub use compiler::{
    compile_def_database, compile_def_database_from_str, ContentCompileError, ContentErrorCode,
    SourceLocation,
};
pub use database::{
    AgentTuning, ArchetypeTuning, CoinDrop, DefDatabase, DropTuning, EntityArchetype,
    EntityCategory, EntityDefId,
};
pub use pipeline::{build_def_database, ContentPipelineError};
pub use types::{ContentPlanError, ContentPlanRequest};
