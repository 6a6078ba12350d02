use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/grd/config.toml`.
///
/// Constructed once at process start and passed explicitly to every
/// component; nothing in the crate reads configuration ambiently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrdConfig {
    /// Origin that remote file paths from the logs are joined against.
    pub base_origin: String,
    /// Origin under which the 10-minute upload logs are published.
    pub logs_origin: String,
    /// Marker line a metadata file must contain.
    pub required_game_version: String,
    /// Marker line that rejects a metadata file even when the required
    /// marker is present (the required marker is a substring of this one).
    pub excluded_game_version: String,
    /// Install-type marker line a metadata file must contain.
    pub required_install_type: String,
    /// Concurrency ceiling shared by all three fetch rounds.
    pub max_concurrent_downloads: usize,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Maximum number of redirects followed per request.
    pub max_redirects: usize,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for GrdConfig {
    fn default() -> Self {
        Self {
            base_origin: "https://www.gentool.net".to_string(),
            logs_origin: "https://www.gentool.net/data/zh/logs".to_string(),
            required_game_version: "Game Version:     Zero Hour 1.04".to_string(),
            excluded_game_version: "Game Version:     Zero Hour 1.04 The First Decade"
                .to_string(),
            required_install_type: "Install Type:     Normal Game Install".to_string(),
            max_concurrent_downloads: 50,
            request_timeout_secs: 30,
            max_redirects: 3,
            user_agent: "grd/0.1".to_string(),
        }
    }
}

impl GrdConfig {
    /// Checks that the configured origins are well-formed URLs.
    /// Called once after load so a bad config fails before any fetch round.
    pub fn validate(&self) -> Result<()> {
        for origin in [&self.base_origin, &self.logs_origin] {
            url::Url::parse(origin)
                .with_context(|| format!("invalid origin in config: {}", origin))?;
        }
        if self.max_concurrent_downloads == 0 {
            anyhow::bail!("max_concurrent_downloads must be at least 1");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("grd")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<GrdConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = GrdConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: GrdConfig = toml::from_str(&data)?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = GrdConfig::default();
        assert_eq!(cfg.max_concurrent_downloads, 50);
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.max_redirects, 3);
        assert!(cfg.excluded_game_version.contains(&cfg.required_game_version));
        cfg.validate().unwrap();
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = GrdConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: GrdConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.base_origin, cfg.base_origin);
        assert_eq!(parsed.logs_origin, cfg.logs_origin);
        assert_eq!(parsed.max_concurrent_downloads, cfg.max_concurrent_downloads);
    }

    #[test]
    fn config_toml_partial_uses_defaults() {
        let toml = r#"
            max_concurrent_downloads = 8
            request_timeout_secs = 5
        "#;
        let cfg: GrdConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.max_concurrent_downloads, 8);
        assert_eq!(cfg.request_timeout_secs, 5);
        assert_eq!(cfg.base_origin, GrdConfig::default().base_origin);
        assert_eq!(cfg.max_redirects, 3);
    }

    #[test]
    fn validate_rejects_bad_origin() {
        let cfg = GrdConfig {
            logs_origin: "not a url".to_string(),
            ..GrdConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let cfg = GrdConfig {
            max_concurrent_downloads: 0,
            ..GrdConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
