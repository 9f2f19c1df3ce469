use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use bulkseed_core::{PopulationRatio, RowSizes};
use bulkseed_generate::{DEFAULT_INTERVAL, GenerateOptions};
use bulkseed_storage::StorageOptions;

use crate::CliError;

/// Default storage budget for `generate`, in GiB.
pub const DEFAULT_TARGET_GIB: f64 = 50.0;

/// Settings file, every key optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BulkseedConfig {
    pub target_gib: Option<f64>,
    pub batch_size: Option<u64>,
    pub concurrency: Option<usize>,
    pub interval_secs: Option<u64>,
    pub seed: Option<u64>,
    pub progress_every: Option<u64>,
    pub max_connections: Option<u32>,
    pub run_dir: Option<PathBuf>,
    pub live_feed: Option<bool>,
    pub row_sizes: Option<RowSizes>,
    pub ratio: Option<PopulationRatio>,
}

pub fn load_config(path: &Path) -> Result<BulkseedConfig, CliError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<BulkseedConfig, CliError> {
    Ok(toml::from_str(content)?)
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub target_gib: Option<f64>,
    pub batch_size: Option<u64>,
    pub concurrency: Option<usize>,
    pub interval_secs: Option<u64>,
    pub seed: Option<u64>,
    pub run_dir: Option<PathBuf>,
    pub no_live_feed: bool,
}

/// Fully resolved `generate` settings.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateSettings {
    pub target_gib: f64,
    pub row_sizes: RowSizes,
    pub ratio: PopulationRatio,
    pub options: GenerateOptions,
    pub interval_secs: u64,
    pub live_feed: bool,
    pub run_dir: Option<PathBuf>,
    pub max_connections: u32,
}

impl GenerateSettings {
    /// Layer defaults, then the config file, then overrides.
    pub fn resolve(config: BulkseedConfig, overrides: Overrides) -> Result<Self, CliError> {
        let defaults = GenerateOptions::default();
        let interval_secs = overrides
            .interval_secs
            .or(config.interval_secs)
            .unwrap_or(DEFAULT_INTERVAL.as_secs());
        if interval_secs == 0 {
            return Err(CliError::InvalidConfig(
                "live feed interval must be at least one second".to_string(),
            ));
        }

        let target_gib = overrides
            .target_gib
            .or(config.target_gib)
            .unwrap_or(DEFAULT_TARGET_GIB);
        if !target_gib.is_finite() || target_gib < 0.0 {
            return Err(CliError::InvalidConfig(format!(
                "target size must be a non-negative number of GiB, got {target_gib}"
            )));
        }

        let options = GenerateOptions {
            batch_size: overrides
                .batch_size
                .or(config.batch_size)
                .unwrap_or(defaults.batch_size)
                .max(1),
            concurrency: overrides
                .concurrency
                .or(config.concurrency)
                .unwrap_or(defaults.concurrency)
                .max(1),
            seed: overrides.seed.or(config.seed),
            progress_every: config.progress_every.unwrap_or(defaults.progress_every),
        };

        let max_connections = config.max_connections.unwrap_or_else(|| {
            let floor = StorageOptions::default().max_connections as usize;
            options.concurrency.max(floor).min(u32::MAX as usize) as u32
        });

        Ok(Self {
            target_gib,
            row_sizes: config.row_sizes.unwrap_or_default(),
            ratio: config.ratio.unwrap_or_default(),
            options,
            interval_secs,
            live_feed: !overrides.no_live_feed && config.live_feed.unwrap_or(true),
            run_dir: overrides.run_dir.or(config.run_dir),
            max_connections,
        })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn storage_options(&self) -> StorageOptions {
        StorageOptions {
            max_connections: self.max_connections,
            ..StorageOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_config() {
        let settings = GenerateSettings::resolve(BulkseedConfig::default(), Overrides::default())
            .expect("defaults are valid");
        assert_eq!(settings.target_gib, DEFAULT_TARGET_GIB);
        assert_eq!(settings.options.batch_size, 1_000);
        assert_eq!(settings.interval_secs, 30);
        assert!(settings.live_feed);
        assert_eq!(settings.row_sizes, RowSizes::default());
        assert!(settings.max_connections >= 16);
    }

    #[test]
    fn flags_override_config_file() {
        let config = parse_config(
            r#"
            target_gib = 2.5
            batch_size = 500
            interval_secs = 10
            seed = 9
            live_feed = false

            [ratio]
            products_divisor = 5
            "#,
        )
        .expect("config parses");

        let settings = GenerateSettings::resolve(
            config,
            Overrides {
                batch_size: Some(250),
                interval_secs: Some(60),
                ..Overrides::default()
            },
        )
        .expect("settings resolve");

        assert_eq!(settings.target_gib, 2.5);
        assert_eq!(settings.options.batch_size, 250);
        assert_eq!(settings.options.seed, Some(9));
        assert_eq!(settings.interval_secs, 60);
        assert!(!settings.live_feed);
        assert_eq!(settings.ratio.products_divisor, 5);
        assert_eq!(settings.ratio.orders_per_user, 10);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result = GenerateSettings::resolve(
            BulkseedConfig::default(),
            Overrides {
                interval_secs: Some(0),
                ..Overrides::default()
            },
        );
        assert!(matches!(result, Err(CliError::InvalidConfig(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            parse_config("batchsize = 10"),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn no_live_feed_flag_wins() {
        let config = parse_config("live_feed = true").expect("config parses");
        let settings = GenerateSettings::resolve(
            config,
            Overrides {
                no_live_feed: true,
                ..Overrides::default()
            },
        )
        .expect("settings resolve");
        assert!(!settings.live_feed);
    }
}
