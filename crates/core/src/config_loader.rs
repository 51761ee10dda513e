use crate::config::ScanConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::Path;
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the scan configuration by merging defaults, a TOML file,
    /// `SUREBET_` environment variables, and an optional JSON file next to it.
    ///
    /// Missing files are skipped, so an absent config falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration source cannot be parsed or the
    /// merged result fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<ScanConfig> {
        let path = path.as_ref();
        let config: ScanConfig = Figment::from(Serialized::defaults(ScanConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SUREBET_"))
            .join(Json::file(path.with_extension("json")))
            .extract()?;

        config.validate()?;
        debug!(
            path = %path.display(),
            total_stake = %config.total_stake,
            rounding_base = %config.rounding_base,
            markets = config.markets.len(),
            "Loaded scan config"
        );
        Ok(config)
    }

    /// Loads the scan configuration with a profile overlay
    /// (e.g. `Surebet.toml` + `Surebet.weekend.toml`).
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration source cannot be parsed or the
    /// merged result fails validation.
    pub fn load_with_profile(path: impl AsRef<Path>, profile: &str) -> Result<ScanConfig> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Surebet");
        let profile_path = path.with_file_name(format!("{stem}.{profile}.toml"));

        let config: ScanConfig = Figment::from(Serialized::defaults(ScanConfig::default()))
            .merge(Toml::file(path))
            .merge(Toml::file(profile_path))
            .merge(Env::prefixed("SUREBET_"))
            .join(Json::file(path.with_extension("json")))
            .extract()?;

        config.validate()?;
        debug!(
            path = %path.display(),
            profile = %profile,
            total_stake = %config.total_stake,
            rounding_base = %config.rounding_base,
            markets = config.markets.len(),
            "Loaded scan config"
        );
        Ok(config)
    }
}
