// Portal configuration
//
// Layers, lowest precedence first: built-in defaults, `portal.toml` in the config directory,
// an explicit `--config` file, then `PORTAL_*` environment variables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::forms::therapy::BgUnits;

pub const CONFIG_FILE_NAME: &str = "portal.toml";
pub const ENV_PREFIX: &str = "PORTAL";
const CONFIG_DIR_ENV: &str = "PORTAL_CONFIG_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Overrides the discovered log folder.
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
    pub log_to_stdout: bool,
    pub bg_units: BgUnits,
    pub is_prescriber: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            log_level: "debug".to_string(),
            log_to_stdout: false,
            bg_units: BgUnits::MgDl,
            is_prescriber: false,
        }
    }
}

/// `PORTAL_CONFIG_DIR`, else `<platform config dir>/prescription-portal`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os(CONFIG_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|d| d.join("prescription-portal")))
}

impl PortalConfig {
    /// Load from the default config directory, an optional explicit file and the process env.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_layers(config_dir().as_deref(), explicit, None)
    }

    /// Load with every layer supplied by the caller. `env` replaces the process environment
    /// when given.
    pub fn load_layers(
        dir: Option<&Path>,
        explicit: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let defaults = PortalConfig::default();
        let mut builder = config::Config::builder()
            .set_default("log_level", defaults.log_level.clone())?
            .set_default("log_to_stdout", defaults.log_to_stdout)?
            .set_default("bg_units", defaults.bg_units.as_str())?
            .set_default("is_prescriber", defaults.is_prescriber)?;

        if let Some(dir) = dir {
            let file = dir.join(CONFIG_FILE_NAME);
            debug!("[PHASE: config] [STEP: discover] Looking for {}", file.display());
            builder = builder.add_source(
                config::File::from(file)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            builder = builder.add_source(
                config::File::from(path.to_path_buf())
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );

        let cfg: PortalConfig = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        Ok(cfg)
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Debug)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration as TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn defaults_without_any_sources() {
        let cfg = PortalConfig::load_layers(None, None, no_env()).unwrap();
        assert_eq!(cfg, PortalConfig::default());
        assert_eq!(cfg.level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn config_dir_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "bg_units = \"mmol/L\"\nis_prescriber = true\n",
        )
        .unwrap();

        let cfg = PortalConfig::load_layers(Some(dir.path()), None, no_env()).unwrap();
        assert_eq!(cfg.bg_units, BgUnits::MmolL);
        assert!(cfg.is_prescriber);
        assert_eq!(cfg.log_level, "debug", "unset keys keep their defaults");
    }

    #[test]
    fn explicit_file_then_env_take_precedence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "log_level = \"warn\"\n").unwrap();
        let explicit = dir.path().join("override.toml");
        std::fs::write(&explicit, "log_level = \"info\"\nlog_to_stdout = true\n").unwrap();

        let cfg = PortalConfig::load_layers(Some(dir.path()), Some(&explicit), no_env()).unwrap();
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.log_to_stdout);

        let mut env = HashMap::new();
        env.insert("PORTAL_LOG_LEVEL".to_string(), "error".to_string());
        let cfg = PortalConfig::load_layers(Some(dir.path()), Some(&explicit), Some(env)).unwrap();
        assert_eq!(cfg.level_filter(), log::LevelFilter::Error);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PortalConfig::load_layers(None, Some(&dir.path().join("nope.toml")), no_env())
            .unwrap_err();
        assert!(err.to_string().contains("Config file not found"), "{}", err);
    }

    #[test]
    fn unknown_units_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "bg_units = \"grains\"\n").unwrap();
        assert!(PortalConfig::load_layers(Some(dir.path()), None, no_env()).is_err());
    }

    #[test]
    fn renders_as_toml() {
        let rendered = PortalConfig::default().to_toml().unwrap();
        assert!(rendered.contains("bg_units = \"mg/dL\""), "{}", rendered);
        assert!(rendered.contains("is_prescriber = false"), "{}", rendered);
    }
}
