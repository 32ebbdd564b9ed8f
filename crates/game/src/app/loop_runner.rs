use std::process::ExitCode;

use engine::run_town;
use tracing::error;

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = run_town(
        app.config,
        app.map,
        app.stats,
        app.assets_dir,
        app.locations,
        app.hud_actions,
    ) {
        error!(error = %err, "town_loop_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
