use std::{env, fmt, fs, io, path};

use healthwatch::EngineConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    ReadFailed { path: path::PathBuf, source: io::Error },
    #[error("failed to write {path}: {source}")]
    WriteFailed { path: path::PathBuf, source: io::Error },
    #[error("invalid config: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("cannot serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("no config directory: neither XDG_CONFIG_HOME nor HOME is set")]
    ConfigPathUnavailable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub path: path::PathBuf,
}

impl Default for Server {
    fn default() -> Self {
        Self { bind: "127.0.0.1".into(), port: 8080 }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self { path: "healthwatch.db".into() }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().is_none_or(|ext| ext != "toml") {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/healthwatch/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("healthwatch/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);
        let engine = &self.engine;

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Server")?;
        write_1(f, "Bind Address", &self.server.bind)?;
        write_1(f, "Port", &self.server.port)?;
        write_title_1(f, "Database")?;
        write_1(f, "Path", &self.database.path.display())?;
        write_title_1(f, "Engine")?;
        write_1(f, "Probe Timeout (s)", &engine.probe.timeout_secs)?;
        write_1(f, "User Agent", &engine.probe.user_agent)?;
        write_1(f, "Retry Delay (ms)", &engine.retry.delay_ms)?;
        write_1(f, "Write Retry Delay (ms)", &engine.persistence.retry_delay_ms)?;
        write_1(f, "Alert Cooldown (s)", &engine.notifications.cooldown_secs)?;
        write_1(f, "Resume Settle (ms)", &engine.scheduler.resume_settle_ms)?;
        write_1(f, "Min Interval (s)", &engine.scheduler.min_interval_secs)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/healthwatch/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        let mut config = if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| ConfigError::ReadFailed { path: config_path.clone(), source })?;
            toml::from_str(raw_string.as_str())?
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            config
        };

        config.apply_env(|var| env::var(var).ok())?;
        Ok(config)
    }

    /// Override file values with `HEALTHWATCH_*` variables
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(bind) = lookup("HEALTHWATCH_BIND") {
            self.server.bind = bind;
        }
        if let Some(port) = lookup("HEALTHWATCH_PORT") {
            self.server.port =
                port.parse().map_err(|_err| ConfigError::InvalidEnv { var: "HEALTHWATCH_PORT", value: port })?;
        }
        if let Some(database) = lookup("HEALTHWATCH_DATABASE") {
            self.database.path = database.into();
        }
        Ok(())
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::WriteFailed { path: parent.to_path_buf(), source })?;
        }

        fs::write(path, config_str).map_err(|source| ConfigError::WriteFailed { path: path.to_path_buf(), source })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/healthwatch");

        let config = Config::from_config(Some(&path)).unwrap();

        assert_eq!(config.server, Server::default());
        assert!(dir.path().join("nested/healthwatch.toml").exists());
        assert_eq!(Config::from_config(Some(&path)).unwrap(), config);
    }

    #[test]
    fn partial_file_keeps_engine_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            bind = "0.0.0.0"
            port = 9000

            [engine.notifications]
            cooldown_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database, Database::default());
        assert_eq!(config.engine.notifications.cooldown_secs, 60);
        assert_eq!(config.engine.retry.delay_ms, 1000);
    }

    #[test]
    fn env_overrides_file_values() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("HEALTHWATCH_PORT", "7000"), ("HEALTHWATCH_DATABASE", "/var/lib/hw.db")]);
        let mut config = Config::default();

        config.apply_env(|var| vars.get(var).map(|v| v.to_string())).unwrap();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.database.path, path::PathBuf::from("/var/lib/hw.db"));
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut config = Config::default();
        let err = config.apply_env(|var| (var == "HEALTHWATCH_PORT").then(|| "http".to_string())).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidEnv { var: "HEALTHWATCH_PORT", .. }));
    }

    #[test]
    fn display_lists_every_section() {
        let dump = Config::default().to_string();
        for section in ["Server", "Database", "Engine", "Alert Cooldown (s): 300"] {
            assert!(dump.contains(section), "missing {section} in\n{dump}");
        }
    }
}
