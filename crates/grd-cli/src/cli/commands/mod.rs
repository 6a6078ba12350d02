mod config_path;
mod run;

pub use config_path::run_config_path;
pub use run::run_download;
