//! Config command handler: show effective configuration.

use anyhow::Result;
use session_jar_core::JarConfig;
use session_jar_core::store::DEFAULT_NAMESPACE_KEY;

use crate::app_config::LoadedConfig;

pub fn run_config_show_command(loaded: &LoadedConfig, config: &JarConfig) -> Result<()> {
    let resolved_path = loaded.path.as_ref().map_or_else(
        || "<unresolved>".to_string(),
        |path| path.display().to_string(),
    );
    println!("config_path = {resolved_path}");
    println!(
        "config_file = {}",
        if loaded.loaded_from_file() {
            "loaded"
        } else {
            "not found (using defaults)"
        }
    );
    println!("storage_dir = {}", config.storage_root().display());
    println!(
        "namespace_key = {}",
        if config.namespace_key == DEFAULT_NAMESPACE_KEY {
            "default"
        } else {
            "custom"
        }
    );
    println!("protected_prefix = {}", config.protected_prefix);

    Ok(())
}
