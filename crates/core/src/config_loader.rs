use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration by merging defaults, TOML, environment
    /// variables, and JSON.
    ///
    /// Nested keys come from the environment with a double underscore, e.g.
    /// `APP_ENGINE__LIVE_CONFIDENCE_GATE=90`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        Self::base()
            .merge(Toml::file("config/Config.toml"))
            .merge(Env::prefixed("APP_").split("__"))
            .join(Json::file("config/Config.json"))
            .extract()
            .context("Failed to load configuration")
    }

    /// Loads application configuration with a specific profile layered on top.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_with_profile(profile: &str) -> Result<AppConfig> {
        Self::base()
            .merge(Toml::file("config/Config.toml"))
            .merge(Toml::file(format!("config/Config.{profile}.toml")))
            .merge(Env::prefixed("APP_").split("__"))
            .join(Json::file("config/Config.json"))
            .extract()
            .with_context(|| format!("Failed to load configuration for profile {profile}"))
    }

    /// Loads configuration from an explicit TOML file plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        Self::base()
            .merge(Toml::file(path))
            .merge(Env::prefixed("APP_").split("__"))
            .extract()
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    fn base() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
    }
}
