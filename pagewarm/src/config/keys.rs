//! Addressable configuration keys for `config get` / `config set`.

use std::path::PathBuf;
use std::str::FromStr;

use super::file::{split_list, ConfigError, ConfigFile};
use crate::readiness::check_selector;

/// A `section.key` setting in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ApiBaseUrl,
    ApiTimeoutSecs,
    PreloadStartupPages,
    PreloadMaxCritical,
    PreloadMaxHigh,
    PreloadMaxLow,
    PreloadConcurrentCritical,
    PreloadConcurrentHigh,
    PreloadConcurrentLow,
    PreloadImageTimeoutMs,
    PreloadCacheTtlSecs,
    PreloadCacheCapacity,
    ReadinessSelectors,
    ReadinessImageTimeoutMs,
    ReadinessNoImageGraceMs,
    ReadinessStabilityWindowMs,
    ReadinessStableWindows,
    ReadinessFrameIntervalMs,
    LoggingLevel,
    LoggingDirectory,
}

const ALL_KEYS: &[ConfigKey] = &[
    ConfigKey::ApiBaseUrl,
    ConfigKey::ApiTimeoutSecs,
    ConfigKey::PreloadStartupPages,
    ConfigKey::PreloadMaxCritical,
    ConfigKey::PreloadMaxHigh,
    ConfigKey::PreloadMaxLow,
    ConfigKey::PreloadConcurrentCritical,
    ConfigKey::PreloadConcurrentHigh,
    ConfigKey::PreloadConcurrentLow,
    ConfigKey::PreloadImageTimeoutMs,
    ConfigKey::PreloadCacheTtlSecs,
    ConfigKey::PreloadCacheCapacity,
    ConfigKey::ReadinessSelectors,
    ConfigKey::ReadinessImageTimeoutMs,
    ConfigKey::ReadinessNoImageGraceMs,
    ConfigKey::ReadinessStabilityWindowMs,
    ConfigKey::ReadinessStableWindows,
    ConfigKey::ReadinessFrameIntervalMs,
    ConfigKey::LoggingLevel,
    ConfigKey::LoggingDirectory,
];

impl ConfigKey {
    /// Every key, grouped by section in file order.
    pub fn all() -> &'static [ConfigKey] {
        ALL_KEYS
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    pub fn section(&self) -> &'static str {
        use ConfigKey::*;
        match self {
            ApiBaseUrl | ApiTimeoutSecs => "api",
            PreloadStartupPages | PreloadMaxCritical | PreloadMaxHigh | PreloadMaxLow
            | PreloadConcurrentCritical | PreloadConcurrentHigh | PreloadConcurrentLow
            | PreloadImageTimeoutMs | PreloadCacheTtlSecs | PreloadCacheCapacity => "preload",
            ReadinessSelectors
            | ReadinessImageTimeoutMs
            | ReadinessNoImageGraceMs
            | ReadinessStabilityWindowMs
            | ReadinessStableWindows
            | ReadinessFrameIntervalMs => "readiness",
            LoggingLevel | LoggingDirectory => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        use ConfigKey::*;
        match self {
            ApiBaseUrl => "base_url",
            ApiTimeoutSecs => "timeout_secs",
            PreloadStartupPages => "startup_pages",
            PreloadMaxCritical => "max_critical",
            PreloadMaxHigh => "max_high",
            PreloadMaxLow => "max_low",
            PreloadConcurrentCritical => "concurrent_critical",
            PreloadConcurrentHigh => "concurrent_high",
            PreloadConcurrentLow => "concurrent_low",
            PreloadImageTimeoutMs | ReadinessImageTimeoutMs => "image_timeout_ms",
            PreloadCacheTtlSecs => "cache_ttl_secs",
            PreloadCacheCapacity => "cache_capacity",
            ReadinessSelectors => "selectors",
            ReadinessNoImageGraceMs => "no_image_grace_ms",
            ReadinessStabilityWindowMs => "stability_window_ms",
            ReadinessStableWindows => "stable_windows",
            ReadinessFrameIntervalMs => "frame_interval_ms",
            LoggingLevel => "level",
            LoggingDirectory => "directory",
        }
    }

    /// Current value rendered as it would appear in the file.
    pub fn get(&self, config: &ConfigFile) -> String {
        use ConfigKey::*;
        let (api, p, r, l) = (
            &config.api,
            &config.preload,
            &config.readiness,
            &config.logging,
        );
        match self {
            ApiBaseUrl => api.base_url.clone(),
            ApiTimeoutSecs => api.timeout_secs.to_string(),
            PreloadStartupPages => p.startup_pages.join(", "),
            PreloadMaxCritical => p.max_critical.to_string(),
            PreloadMaxHigh => p.max_high.to_string(),
            PreloadMaxLow => p.max_low.to_string(),
            PreloadConcurrentCritical => p.concurrent_critical.to_string(),
            PreloadConcurrentHigh => p.concurrent_high.to_string(),
            PreloadConcurrentLow => p.concurrent_low.to_string(),
            PreloadImageTimeoutMs => p.image_timeout_ms.to_string(),
            PreloadCacheTtlSecs => p.cache_ttl_secs.to_string(),
            PreloadCacheCapacity => p.cache_capacity.to_string(),
            ReadinessSelectors => r.selectors.join(", "),
            ReadinessImageTimeoutMs => r.image_timeout_ms.to_string(),
            ReadinessNoImageGraceMs => r.no_image_grace_ms.to_string(),
            ReadinessStabilityWindowMs => r.stability_window_ms.to_string(),
            ReadinessStableWindows => r.stable_windows.to_string(),
            ReadinessFrameIntervalMs => r.frame_interval_ms.to_string(),
            LoggingLevel => l.level.clone(),
            LoggingDirectory => l
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Validate and store a value.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        use ConfigKey::*;
        let value = value.trim();
        match self {
            ApiBaseUrl => {
                crate::preload::parse_base_url(value).map_err(|reason| self.invalid(value, reason))?;
                config.api.base_url = value.to_string();
            }
            ApiTimeoutSecs => config.api.timeout_secs = self.parse(value)?,
            PreloadStartupPages => config.preload.startup_pages = split_list(value),
            PreloadMaxCritical => config.preload.max_critical = self.parse(value)?,
            PreloadMaxHigh => config.preload.max_high = self.parse(value)?,
            PreloadMaxLow => config.preload.max_low = self.parse(value)?,
            PreloadConcurrentCritical => config.preload.concurrent_critical = self.parse(value)?,
            PreloadConcurrentHigh => config.preload.concurrent_high = self.parse(value)?,
            PreloadConcurrentLow => config.preload.concurrent_low = self.parse(value)?,
            PreloadImageTimeoutMs => config.preload.image_timeout_ms = self.parse(value)?,
            PreloadCacheTtlSecs => config.preload.cache_ttl_secs = self.parse(value)?,
            PreloadCacheCapacity => config.preload.cache_capacity = self.parse(value)?,
            ReadinessSelectors => {
                let selectors = split_list(value);
                if selectors.is_empty() {
                    return Err(self.invalid(value, "at least one selector is required".into()));
                }
                for selector in &selectors {
                    check_selector(selector).map_err(|reason| self.invalid(value, reason))?;
                }
                config.readiness.selectors = selectors;
            }
            ReadinessImageTimeoutMs => config.readiness.image_timeout_ms = self.parse(value)?,
            ReadinessNoImageGraceMs => config.readiness.no_image_grace_ms = self.parse(value)?,
            ReadinessStabilityWindowMs => {
                config.readiness.stability_window_ms = self.parse(value)?
            }
            ReadinessStableWindows => config.readiness.stable_windows = self.parse(value)?,
            ReadinessFrameIntervalMs => config.readiness.frame_interval_ms = self.parse(value)?,
            LoggingLevel => {
                if value.is_empty() {
                    return Err(self.invalid(value, "level must not be empty".into()));
                }
                config.logging.level = value.to_string();
            }
            LoggingDirectory => {
                config.logging.directory = (!value.is_empty()).then(|| PathBuf::from(value));
            }
        }
        Ok(())
    }

    fn parse<T>(&self, value: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        value
            .parse()
            .map_err(|e: T::Err| self.invalid(value, e.to_string()))
    }

    fn invalid(&self, value: &str, reason: String) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.section().to_string(),
            key: self.key_name().to_string(),
            value: value.to_string(),
            reason,
        }
    }
}

impl FromStr for ConfigKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or_else(|| format!("unknown configuration key '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_names() {
        assert_eq!(
            "api.base_url".parse::<ConfigKey>(),
            Ok(ConfigKey::ApiBaseUrl)
        );
        assert_eq!(
            "readiness.image_timeout_ms".parse::<ConfigKey>(),
            Ok(ConfigKey::ReadinessImageTimeoutMs)
        );
        assert_eq!(
            "preload.image_timeout_ms".parse::<ConfigKey>(),
            Ok(ConfigKey::PreloadImageTimeoutMs)
        );
        assert!("preload.nope".parse::<ConfigKey>().is_err());
    }

    #[test]
    fn test_every_key_round_trips_its_name() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>(), Ok(*key));
        }
    }

    #[test]
    fn test_set_and_get() {
        let mut config = ConfigFile::default();

        ConfigKey::PreloadStartupPages
            .set(&mut config, "home, complex ,")
            .unwrap();
        ConfigKey::PreloadConcurrentHigh.set(&mut config, "8").unwrap();
        ConfigKey::LoggingDirectory.set(&mut config, "/tmp/logs").unwrap();

        assert_eq!(config.preload.startup_pages, vec!["home", "complex"]);
        assert_eq!(ConfigKey::PreloadStartupPages.get(&config), "home, complex");
        assert_eq!(ConfigKey::PreloadConcurrentHigh.get(&config), "8");
        assert_eq!(ConfigKey::LoggingDirectory.get(&config), "/tmp/logs");

        ConfigKey::LoggingDirectory.set(&mut config, "").unwrap();
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = ConfigFile::default();

        assert!(ConfigKey::PreloadMaxLow.set(&mut config, "-1").is_err());
        assert!(ConfigKey::ApiBaseUrl.set(&mut config, "not a url").is_err());
        assert!(ConfigKey::ReadinessSelectors.set(&mut config, " , ").is_err());
        assert!(ConfigKey::ReadinessSelectors
            .set(&mut config, ".hero-image, .gallery img")
            .is_err());
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_set_accepts_compound_selectors() {
        let mut config = ConfigFile::default();

        ConfigKey::ReadinessSelectors
            .set(&mut config, "img.hero-image, .gallery, #plan")
            .unwrap();

        assert_eq!(
            config.readiness.selectors,
            vec!["img.hero-image", ".gallery", "#plan"]
        );
    }
}
