use anyhow::Context;
use hand_cursor::hand_gestures::{run_from_settings, LoopExit};
use hand_cursor::logging;
use hand_cursor::settings::{Settings, SETTINGS_FILE};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let settings_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| SETTINGS_FILE.to_string());
    let settings = Settings::load(&settings_path)
        .with_context(|| format!("failed to load settings from {settings_path}"))?;
    logging::init(
        settings.debug_logging,
        settings.log_file.as_ref().map(PathBuf::from),
    );

    let summary = run_from_settings(&settings).context("failed to start hand cursor")?;
    if let LoopExit::AcquisitionFailed(err) = &summary.exit {
        tracing::error!(%err, "stopped after frame acquisition failure");
    }
    Ok(())
}
