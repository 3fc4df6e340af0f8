//! CLI command handlers.

mod clear;
mod config;
mod cookies;
mod fetch;

pub use clear::run_clear_command;
pub use config::run_config_show_command;
pub use cookies::{
    run_delete_command, run_list_command, run_path_command, run_purge_since_command,
    run_set_command,
};
pub use fetch::run_fetch_command;
