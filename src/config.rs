use crate::core::{DbError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `database.name`.
pub const DATABASE_ENV: &str = "SQLGATE_DATABASE";

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    pub log: Option<LogConfig>,
}

/// Database connection parameters, read once when the connection opens.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path, a `file:` URI, or `:memory:`
    #[serde(default = "default_name")]
    pub name: String,
    /// Text encoding applied right after connecting
    pub charset: Option<String>,
    #[serde(default)]
    pub read_only: bool,
    /// Create the database file if it does not exist
    #[serde(default = "default_true")]
    pub create: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: Option<String>,
}

fn default_name() -> String {
    "./sqlgate.sqlite".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            name: default_name(),
            charset: None,
            read_only: false,
            create: true,
        }
    }
}

impl DatabaseConfig {
    pub fn new(name: impl Into<String>) -> Self {
        DatabaseConfig {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }
}

impl Config {
    /// `<config dir>/sqlgate/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sqlgate").join("config.toml"))
    }

    /// Resolve configuration from an explicit file, the default file, and
    /// the environment.
    ///
    /// Priority: explicit file > default file > built-in defaults; the
    /// `SQLGATE_DATABASE` variable then overrides the database name.
    pub fn resolve(explicit: Option<&Path>) -> Result<Config> {
        let mut config = match explicit {
            Some(path) => load_config(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => load_config(path)?,
                None => Config::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        if let Ok(name) = std::env::var(DATABASE_ENV) {
            if !name.is_empty() {
                self.database.name = name;
            }
        }
    }

    pub fn log_level(&self) -> Option<&str> {
        self.log.as_ref().and_then(|l| l.level.as_deref())
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
///
/// # Example
///
/// ```no_run
/// let config = sqlgate::config::load_config("config.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| DbError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serializes tests that touch the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const SAMPLE_CONFIG: &str = r#"
[database]
name = "/var/lib/forum/forum.db"
charset = "UTF-8"
read_only = true

[log]
level = "debug"
"#;

    #[test]
    fn test_load_config_from_str() {
        let config: Config = toml::from_str(SAMPLE_CONFIG).expect("Failed to parse sample config");
        assert_eq!(config.database.name, "/var/lib/forum/forum.db");
        assert_eq!(config.database.charset.as_deref(), Some("UTF-8"));
        assert!(config.database.read_only);
        assert!(config.database.create);
        assert_eq!(config.log_level(), Some("debug"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.database, DatabaseConfig::default());
        assert_eq!(config.log_level(), None);
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, SAMPLE_CONFIG).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.database.name, "/var/lib/forum/forum.db");
    }

    #[test]
    fn test_load_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_config(dir.path().join("missing.toml")), Err(DbError::Io(_))));

        let path = dir.path().join("bad.toml");
        fs::write(&path, "[database\nname = 1").unwrap();
        assert!(matches!(load_config(&path), Err(DbError::Config(_))));
    }

    #[test]
    fn test_env_overrides_database_name() {
        let _lock = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, SAMPLE_CONFIG).unwrap();

        std::env::set_var(DATABASE_ENV, ":memory:");
        let config = Config::resolve(Some(&path));
        std::env::remove_var(DATABASE_ENV);

        let config = config.unwrap();
        assert_eq!(config.database.name, ":memory:");
        assert_eq!(config.database.charset.as_deref(), Some("UTF-8"));
    }

    #[test]
    fn test_explicit_file_without_env() {
        let _lock = ENV_LOCK.lock().unwrap();
        std::env::remove_var(DATABASE_ENV);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[database]\nname = \"forum.db\"\n").unwrap();

        let config = Config::resolve(Some(&path)).unwrap();
        assert_eq!(config.database.name, "forum.db");
    }
}
