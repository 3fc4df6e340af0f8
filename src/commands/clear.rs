//! Clear command handler: bulk delete across every account.

use anyhow::Result;
use session_jar_core::JarConfig;
use tracing::{info, warn};

pub fn run_clear_command(include_protected: bool, config: &JarConfig) -> Result<()> {
    let report = config.clear_all(include_protected);

    if report.failed > 0 {
        warn!(failed = report.failed, "Some cookie files could not be removed");
    }
    info!(
        root = %config.storage_root().display(),
        removed = report.removed,
        kept = report.kept,
        "Cleared cookies"
    );
    Ok(())
}
