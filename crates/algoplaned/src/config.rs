//! algoplane.toml configuration parser.
//!
//! Every field is optional; CLI flags override file values and anything
//! still unset falls back to the built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "/var/lib/algoplane";
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;
const DEFAULT_KUBECTL_BIN: &str = "kubectl";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    pub server: Option<ServerConfig>,
    pub sync: Option<SyncConfig>,
    pub kubectl: Option<KubectlConfig>,
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubectlConfig {
    pub bin: Option<PathBuf>,
}

impl DaemonConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DaemonConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Effective settings after merging the config file and CLI flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub data_dir: PathBuf,
    pub sync_interval: Duration,
    pub kubectl_bin: PathBuf,
}

impl Settings {
    /// Flags win over file values; defaults fill the rest.
    pub fn resolve(
        file: DaemonConfig,
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        sync_interval_secs: Option<u64>,
        kubectl_bin: Option<PathBuf>,
    ) -> Self {
        let port = port
            .or(file.server.and_then(|s| s.port))
            .unwrap_or(DEFAULT_PORT);
        let data_dir = data_dir
            .or(file.data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let interval_secs = sync_interval_secs
            .or(file.sync.and_then(|s| s.interval_secs))
            .unwrap_or(DEFAULT_SYNC_INTERVAL_SECS);
        let kubectl_bin = kubectl_bin
            .or(file.kubectl.and_then(|k| k.bin))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KUBECTL_BIN));

        Settings {
            port,
            data_dir,
            sync_interval: Duration::from_secs(interval_secs),
            kubectl_bin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let toml_str = r#"
[server]
port = 9090

[sync]
interval_secs = 30
"#;
        let config: DaemonConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.unwrap().port, Some(9090));
        assert_eq!(config.sync.unwrap().interval_secs, Some(30));
        assert!(config.kubectl.is_none());
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let settings = Settings::resolve(DaemonConfig::default(), None, None, None, None);
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.sync_interval, Duration::from_secs(300));
        assert_eq!(settings.kubectl_bin, PathBuf::from("kubectl"));
        assert_eq!(settings.data_dir, PathBuf::from("/var/lib/algoplane"));
    }

    #[test]
    fn flags_override_file_values() {
        let file: DaemonConfig = toml::from_str(
            r#"
data_dir = "/srv/algoplane"

[server]
port = 9090

[sync]
interval_secs = 60
"#,
        )
        .unwrap();

        let settings = Settings::resolve(file, Some(7070), None, None, None);

        // The flag wins for port, the file for everything it sets.
        assert_eq!(settings.port, 7070);
        assert_eq!(settings.sync_interval, Duration::from_secs(60));
        assert_eq!(settings.data_dir, PathBuf::from("/srv/algoplane"));
    }
}
