use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{TransformError, TransformResult};
use crate::types::WorkerCount;

/// Default location of the config file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/xorcrypt/config.toml";

/// Top-level configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct XorcryptConfig {
    pub transform: TransformConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Worker thread count when none is given on the command line (0 = cpu_count)
    pub workers: usize,
    /// Worker thread stack size in KiB (0 = platform default)
    pub worker_stack_kib: usize,
}

impl TransformConfig {
    /// Resolve the configured worker count, falling back to available parallelism
    pub fn worker_count(&self) -> WorkerCount {
        match self.workers {
            0 => WorkerCount::available(),
            n => WorkerCount::new(n as i64).unwrap_or_else(|_| WorkerCount::available()),
        }
    }

    pub fn worker_stack_size(&self) -> Option<usize> {
        (self.worker_stack_kib > 0).then(|| self.worker_stack_kib * 1024)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Load the config file at `path`, or defaults if it does not exist.
pub fn load_config(path: &Path) -> TransformResult<XorcryptConfig> {
    if !path.exists() {
        tracing::warn!(
            "config file not found: {}  (using defaults)",
            path.display()
        );
        return Ok(XorcryptConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| TransformError::Config(format!("reading {}: {e}", path.display())))?;
    toml::from_str(&content)
        .map_err(|e| TransformError::Config(format!("parsing {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[transform]
workers = 4
worker_stack_kib = 256

[log]
level = "debug"
format = "json"
"#;
        let config: XorcryptConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.transform.workers, 4);
        assert_eq!(config.transform.worker_count().get(), 4);
        assert_eq!(config.transform.worker_stack_size(), Some(256 * 1024));
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, "json");
    }

    #[test]
    fn test_parse_defaults() {
        let config: XorcryptConfig = toml::from_str("").unwrap();

        assert_eq!(config.transform.workers, 0);
        assert!(config.transform.worker_count().get() >= 1);
        assert_eq!(config.transform.worker_stack_size(), None);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, "text");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[log]
level = "trace"
"#;
        let config: XorcryptConfig = toml::from_str(toml_str).unwrap();

        // Overridden
        assert_eq!(config.log.level, "trace");
        // Defaults
        assert_eq!(config.log.format, "text");
        assert_eq!(config.transform.workers, 0);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        std::fs::write(&path, "[transform]\nworkers = \"many\"\n").unwrap();

        assert!(matches!(load_config(&path), Err(TransformError::Config(_))));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = XorcryptConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: XorcryptConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.transform.workers, parsed.transform.workers);
        assert_eq!(config.log.level, parsed.log.level);
    }
}
