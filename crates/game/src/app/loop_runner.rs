use std::process::ExitCode;

use fishtank_engine::{run_app, RunSummary};
use serde::Serialize;
use tracing::error;

use super::bootstrap::AppWiring;

#[derive(Debug, Serialize)]
struct RunReport {
    seed: u64,
    frames_presented: u64,
    #[serde(flatten)]
    summary: RunSummary,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        seed,
        config,
        scene,
        mut input,
        mut renderer,
    } = app;

    let summary = match run_app(config, scene, &mut input, &mut renderer) {
        Ok(summary) => summary,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    let report = RunReport {
        seed,
        frames_presented: renderer.frames_presented(),
        summary,
    };
    match serde_json::to_string(&report) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "run_report_failed");
            ExitCode::FAILURE
        }
    }
}
