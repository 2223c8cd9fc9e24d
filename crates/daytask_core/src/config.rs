//! Runtime configuration loaded from TOML.
//!
//! # Responsibility
//! - Describe where data and logs live, how to reach the remote store and
//!   which offset days are displayed in.
//! - Reject unusable settings before any store is opened.
//!
//! # Invariants
//! - Every field has a default; an empty file is a valid config.
//! - A configured remote always has a user id.

use crate::model::session::UserSession;
use crate::remote::HttpRemoteStoreConfig;
use crate::sync::engine::SyncOptions;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_DB_FILE_NAME: &str = "daytask.sqlite3";
const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 10_000;
/// UTC-14:00 .. UTC+14:00 covers every real zone.
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config syntax: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub logging: LoggingConfig,
    pub remote: RemoteConfig,
    pub display: DisplayConfig,
    pub profile: ProfileConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`; build-mode default when absent.
    pub level: Option<String>,
    /// Absolute directory for rolling log files; file logging is off when
    /// absent.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    /// Document store root; no remote sync when absent.
    pub base_url: Option<String>,
    pub user_id: Option<String>,
    pub auth_token: Option<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Offset from UTC used to cut task dates into calendar days.
    pub utc_offset_minutes: i32,
}

/// Profile fields reported by the sign-in provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            logging: LoggingConfig::default(),
            remote: RemoteConfig::default(),
            display: DisplayConfig::default(),
            profile: ProfileConfig::default(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            user_id: None,
            auth_token: None,
            timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("db_path cannot be empty".to_string()));
        }
        if self.remote.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "remote.timeout_ms must be positive".to_string(),
            ));
        }
        if self.display.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "display.utc_offset_minutes `{}` is outside +/-{MAX_OFFSET_MINUTES}",
                self.display.utc_offset_minutes
            )));
        }
        let has_base_url = non_blank(self.remote.base_url.as_deref()).is_some();
        if has_base_url && non_blank(self.remote.user_id.as_deref()).is_none() {
            return Err(ConfigError::Invalid(
                "remote.user_id is required when remote.base_url is set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote.timeout_ms)
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            remote_timeout: self.remote_timeout(),
        }
    }

    /// Display offset; falls back to UTC for out-of-range values.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.display.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    /// HTTP remote settings, or `None` when remote sync is disabled.
    pub fn http_remote(&self) -> Option<HttpRemoteStoreConfig> {
        let base_url = non_blank(self.remote.base_url.as_deref())?;
        let user_id = non_blank(self.remote.user_id.as_deref())?;
        Some(HttpRemoteStoreConfig {
            base_url: base_url.to_string(),
            user_id: user_id.to_string(),
            auth_token: self.remote.auth_token.clone(),
            request_timeout: self.remote_timeout(),
        })
    }

    /// Signed-in user, when a remote user id is configured.
    pub fn session(&self) -> Option<UserSession> {
        let user_id = non_blank(self.remote.user_id.as_deref())?;
        Some(UserSession {
            user_id: user_id.to_string(),
            email: self.profile.email.clone(),
            display_name: self.profile.display_name.clone(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn empty_document_uses_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.db_path, PathBuf::from("daytask.sqlite3"));
        assert_eq!(config.remote_timeout(), Duration::from_secs(10));
        assert!(config.http_remote().is_none());
        assert!(config.session().is_none());
    }

    #[test]
    fn parses_full_document() {
        let config = CoreConfig::from_toml_str(
            r#"
            db_path = "/var/lib/daytask/tasks.sqlite3"

            [logging]
            level = "debug"
            dir = "/var/log/daytask"

            [remote]
            base_url = "https://tasks.example.com/api"
            user_id = "uid-1"
            auth_token = "secret"
            timeout_ms = 2500

            [display]
            utc_offset_minutes = -180

            [profile]
            display_name = "Ada"
            "#,
        )
        .unwrap();

        let remote = config.http_remote().unwrap();
        assert_eq!(remote.user_id, "uid-1");
        assert_eq!(remote.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.utc_offset().local_minus_utc(), -180 * 60);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));

        let profile = config.session().unwrap().profile_summary();
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.email, "not provided");
    }

    #[test]
    fn rejects_remote_without_user() {
        let err = CoreConfig::from_toml_str(
            r#"
            [remote]
            base_url = "https://tasks.example.com"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("user_id")));
    }

    #[test]
    fn rejects_zero_timeout_and_unknown_keys() {
        assert!(matches!(
            CoreConfig::from_toml_str("[remote]\ntimeout_ms = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_toml_str("colour = \"blue\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
