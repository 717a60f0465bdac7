//! INI configuration file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::loading::{LoadingConfig, DEFAULT_IMAGE_TIMEOUT_MS};
use crate::preload::{
    PreloadConfig, DEFAULT_CONCURRENT_CRITICAL, DEFAULT_CONCURRENT_HIGH, DEFAULT_CONCURRENT_LOW,
    DEFAULT_CONTENT_CACHE_CAPACITY, DEFAULT_CONTENT_CACHE_TTL_SECS, DEFAULT_CONTENT_TIMEOUT_SECS,
    DEFAULT_IMAGE_TIMEOUT_MS as DEFAULT_PRELOAD_IMAGE_TIMEOUT_MS, DEFAULT_MAX_CRITICAL_IMAGES,
    DEFAULT_MAX_HIGH_IMAGES, DEFAULT_MAX_LOW_IMAGES,
};
use crate::readiness::{
    check_selector, ReadinessConfig, DEFAULT_FRAME_INTERVAL_MS, DEFAULT_NO_IMAGE_GRACE_MS,
    DEFAULT_STABILITY_WINDOW_MS, DEFAULT_STABLE_WINDOWS_REQUIRED,
};

/// Default content API root.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/";

/// Pages warmed at startup when none are configured.
pub const DEFAULT_STARTUP_PAGES: &[&str] = &["home", "about-us"];

/// Default log level when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors loading or saving the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value '{value}' for {section}.{key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("could not determine the user configuration directory")]
    NoConfigDir,
}

/// `[api]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// Root of the content API, e.g. `https://example.com/api/`.
    pub base_url: String,
    /// Request timeout for content documents.
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_CONTENT_TIMEOUT_SECS,
        }
    }
}

/// `[preload]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadSettings {
    /// Strategies warmed in the background at startup.
    pub startup_pages: Vec<String>,
    pub max_critical: usize,
    pub max_high: usize,
    pub max_low: usize,
    pub concurrent_critical: usize,
    pub concurrent_high: usize,
    pub concurrent_low: usize,
    pub image_timeout_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
}

impl Default for PreloadSettings {
    fn default() -> Self {
        Self {
            startup_pages: DEFAULT_STARTUP_PAGES.iter().map(|s| s.to_string()).collect(),
            max_critical: DEFAULT_MAX_CRITICAL_IMAGES,
            max_high: DEFAULT_MAX_HIGH_IMAGES,
            max_low: DEFAULT_MAX_LOW_IMAGES,
            concurrent_critical: DEFAULT_CONCURRENT_CRITICAL,
            concurrent_high: DEFAULT_CONCURRENT_HIGH,
            concurrent_low: DEFAULT_CONCURRENT_LOW,
            image_timeout_ms: DEFAULT_PRELOAD_IMAGE_TIMEOUT_MS,
            cache_ttl_secs: DEFAULT_CONTENT_CACHE_TTL_SECS,
            cache_capacity: DEFAULT_CONTENT_CACHE_CAPACITY,
        }
    }
}

impl PreloadSettings {
    pub fn to_preload_config(&self) -> PreloadConfig {
        PreloadConfig {
            max_critical_images_per_page: self.max_critical,
            max_high_images_per_page: self.max_high,
            max_low_images_per_page: self.max_low,
            max_concurrent_critical: self.concurrent_critical,
            max_concurrent_high: self.concurrent_high,
            max_concurrent_low: self.concurrent_low,
            image_timeout: Duration::from_millis(self.image_timeout_ms),
        }
    }
}

/// `[readiness]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessSettings {
    pub selectors: Vec<String>,
    pub image_timeout_ms: u64,
    pub no_image_grace_ms: u64,
    pub stability_window_ms: u64,
    pub stable_windows: u32,
    pub frame_interval_ms: u64,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            selectors: vec!["img".to_string()],
            image_timeout_ms: DEFAULT_IMAGE_TIMEOUT_MS,
            no_image_grace_ms: DEFAULT_NO_IMAGE_GRACE_MS,
            stability_window_ms: DEFAULT_STABILITY_WINDOW_MS,
            stable_windows: DEFAULT_STABLE_WINDOWS_REQUIRED,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
        }
    }
}

impl ReadinessSettings {
    pub fn to_readiness_config(&self) -> ReadinessConfig {
        ReadinessConfig::new()
            .with_frame_interval(Duration::from_millis(self.frame_interval_ms))
            .with_no_image_grace(Duration::from_millis(self.no_image_grace_ms))
            .with_stability(
                Duration::from_millis(self.stability_window_ms),
                self.stable_windows,
            )
    }

    /// Loading defaults for pages; the page id is filled in per controller.
    pub fn to_loading_config(&self) -> LoadingConfig {
        LoadingConfig {
            selectors: self.selectors.clone(),
            image_timeout: Duration::from_millis(self.image_timeout_ms),
            page_id: None,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for daily-rolling log files; stderr only when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            directory: None,
        }
    }
}

/// The whole configuration file.
///
/// Missing sections and keys fall back to their defaults, so an empty file
/// (or no file at all) is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub api: ApiSettings,
    pub preload: PreloadSettings,
    pub readiness: ReadinessSettings,
    pub logging: LoggingSettings,
}

/// Default location of the configuration file.
///
/// `~/.config/pagewarm/config.ini` on Linux; falls back to the working
/// directory when no user configuration directory exists.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("pagewarm"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.ini")
}

impl ConfigFile {
    /// Load from the default path, or defaults when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parse INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Read {
            path: PathBuf::from("<string>"),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Save to the default path, creating parent directories.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let reader = SectionReader { ini };

        let api = &mut config.api;
        reader.string("api", "base_url", &mut api.base_url);
        reader.parse("api", "timeout_secs", &mut api.timeout_secs)?;

        let preload = &mut config.preload;
        reader.list("preload", "startup_pages", &mut preload.startup_pages);
        reader.parse("preload", "max_critical", &mut preload.max_critical)?;
        reader.parse("preload", "max_high", &mut preload.max_high)?;
        reader.parse("preload", "max_low", &mut preload.max_low)?;
        reader.parse("preload", "concurrent_critical", &mut preload.concurrent_critical)?;
        reader.parse("preload", "concurrent_high", &mut preload.concurrent_high)?;
        reader.parse("preload", "concurrent_low", &mut preload.concurrent_low)?;
        reader.parse("preload", "image_timeout_ms", &mut preload.image_timeout_ms)?;
        reader.parse("preload", "cache_ttl_secs", &mut preload.cache_ttl_secs)?;
        reader.parse("preload", "cache_capacity", &mut preload.cache_capacity)?;

        let readiness = &mut config.readiness;
        reader.list("readiness", "selectors", &mut readiness.selectors);
        for selector in &readiness.selectors {
            check_selector(selector).map_err(|reason| ConfigError::InvalidValue {
                section: "readiness".to_string(),
                key: "selectors".to_string(),
                value: selector.clone(),
                reason,
            })?;
        }
        reader.parse("readiness", "image_timeout_ms", &mut readiness.image_timeout_ms)?;
        reader.parse("readiness", "no_image_grace_ms", &mut readiness.no_image_grace_ms)?;
        reader.parse("readiness", "stability_window_ms", &mut readiness.stability_window_ms)?;
        reader.parse("readiness", "stable_windows", &mut readiness.stable_windows)?;
        reader.parse("readiness", "frame_interval_ms", &mut readiness.frame_interval_ms)?;

        let logging = &mut config.logging;
        reader.string("logging", "level", &mut logging.level);
        if let Some(dir) = reader.get("logging", "directory") {
            logging.directory = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    /// Render as an INI document.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("api"))
            .set("base_url", &self.api.base_url)
            .set("timeout_secs", self.api.timeout_secs.to_string());

        let p = &self.preload;
        ini.with_section(Some("preload"))
            .set("startup_pages", p.startup_pages.join(", "))
            .set("max_critical", p.max_critical.to_string())
            .set("max_high", p.max_high.to_string())
            .set("max_low", p.max_low.to_string())
            .set("concurrent_critical", p.concurrent_critical.to_string())
            .set("concurrent_high", p.concurrent_high.to_string())
            .set("concurrent_low", p.concurrent_low.to_string())
            .set("image_timeout_ms", p.image_timeout_ms.to_string())
            .set("cache_ttl_secs", p.cache_ttl_secs.to_string())
            .set("cache_capacity", p.cache_capacity.to_string());

        let r = &self.readiness;
        ini.with_section(Some("readiness"))
            .set("selectors", r.selectors.join(", "))
            .set("image_timeout_ms", r.image_timeout_ms.to_string())
            .set("no_image_grace_ms", r.no_image_grace_ms.to_string())
            .set("stability_window_ms", r.stability_window_ms.to_string())
            .set("stable_windows", r.stable_windows.to_string())
            .set("frame_interval_ms", r.frame_interval_ms.to_string());

        let mut logging = ini.with_section(Some("logging"));
        logging.set("level", &self.logging.level);
        if let Some(dir) = &self.logging.directory {
            logging.set("directory", dir.display().to_string());
        }

        ini
    }
}

impl fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        self.to_ini().write_to(&mut buf).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

struct SectionReader<'a> {
    ini: &'a Ini,
}

impl SectionReader<'_> {
    fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.ini
            .section(Some(section))
            .and_then(|props| props.get(key))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn string(&self, section: &str, key: &str, target: &mut String) {
        if let Some(value) = self.get(section, key) {
            *target = value.to_string();
        }
    }

    fn list(&self, section: &str, key: &str, target: &mut Vec<String>) {
        if let Some(value) = self.get(section, key) {
            *target = split_list(value);
        }
    }

    fn parse<T>(&self, section: &str, key: &str, target: &mut T) -> Result<(), ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        if let Some(value) = self.get(section, key) {
            *target = value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                section: section.to_string(),
                key: key.to_string(),
                value: value.to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}

/// Split a comma-separated list, dropping empty entries.
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = ConfigFile::parse("").unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.preload.startup_pages, vec!["home", "about-us"]);
        assert_eq!(config.readiness.selectors, vec!["img"]);
    }

    #[test]
    fn test_parse_overrides() {
        let text = r#"
[api]
base_url = https://cms.example.com/api/
timeout_secs = 5

[preload]
startup_pages = home, apartments
max_critical = 10
concurrent_low = 1

[readiness]
selectors = .hero-image, img.gallery
no_image_grace_ms = 1000

[logging]
level = pagewarm=debug
directory = /var/log/pagewarm
"#;
        let config = ConfigFile::parse(text).unwrap();

        assert_eq!(config.api.base_url, "https://cms.example.com/api/");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.preload.startup_pages, vec!["home", "apartments"]);
        assert_eq!(config.preload.max_critical, 10);
        assert_eq!(config.preload.max_high, DEFAULT_MAX_HIGH_IMAGES);
        assert_eq!(config.preload.concurrent_low, 1);
        assert_eq!(config.readiness.selectors, vec![".hero-image", "img.gallery"]);
        assert_eq!(config.readiness.no_image_grace_ms, 1000);
        assert_eq!(config.logging.level, "pagewarm=debug");
        assert_eq!(
            config.logging.directory,
            Some(PathBuf::from("/var/log/pagewarm"))
        );
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let err = ConfigFile::parse("[preload]\nmax_high = lots\n").unwrap_err();
        match err {
            ConfigError::InvalidValue {
                section, key, value, ..
            } => {
                assert_eq!(section, "preload");
                assert_eq!(key, "max_high");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_descendant_selector_is_rejected() {
        let err = ConfigFile::parse("[readiness]\nselectors = img, .gallery img\n").unwrap_err();
        match err {
            ConfigError::InvalidValue {
                section, key, value, ..
            } => {
                assert_eq!(section, "readiness");
                assert_eq!(key, "selectors");
                assert_eq!(value, ".gallery img");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.api.base_url = "https://cms.example.com/api/".to_string();
        config.preload.startup_pages = vec!["complex".to_string()];
        config.logging.directory = Some(dir.path().join("logs"));
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_conversions() {
        let mut config = ConfigFile::default();
        config.preload.max_low = 5;
        config.preload.image_timeout_ms = 2000;
        config.readiness.stable_windows = 0;
        config.readiness.image_timeout_ms = 10_000;

        let preload = config.preload.to_preload_config();
        assert_eq!(preload.max_low_images_per_page, 5);
        assert_eq!(preload.image_timeout, Duration::from_millis(2000));

        let readiness = config.readiness.to_readiness_config();
        assert_eq!(readiness.stable_windows_required, 1);

        let loading = config.readiness.to_loading_config();
        assert_eq!(loading.image_timeout, Duration::from_secs(10));
        assert_eq!(loading.selectors, vec!["img"]);
        assert!(loading.page_id.is_none());
    }

    #[test]
    fn test_display_renders_ini() {
        let rendered = ConfigFile::default().to_string();
        assert!(rendered.contains("[api]"));
        assert!(rendered.contains("base_url=http://localhost:8000/api/"));
        assert!(rendered.contains("startup_pages=home, about-us"));
        assert!(!rendered.contains("directory"));
    }
}
