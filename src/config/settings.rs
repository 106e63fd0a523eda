//! Configuration settings for the admitd daemon.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{AdmitError, AuthErrorKind};

/// Main configuration structure for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub whitelist: WhitelistConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address and port to bind (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

/// Security configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Shared HMAC secret, inline. Mutually exclusive with `secret_path`.
    pub secret: Option<String>,
    /// Path to a file holding the HMAC secret. Mutually exclusive with
    /// `secret`. The file must be owner-readable only (0600 or 0400).
    pub secret_path: Option<PathBuf>,
    /// Token rotation granularity in seconds.
    #[serde(default = "default_token_bucket")]
    pub token_bucket_seconds: u64,
    /// Whether requests must carry a valid rotating token.
    #[serde(default)]
    pub require_token: bool,
}

/// Rate limit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Length of the sliding window in seconds.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    /// Maximum admissions per client per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    /// Interval between background sweeps of stale client entries.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
}

/// Source-address allow-list configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WhitelistConfig {
    /// Whether the allow-list check is enforced.
    #[serde(default)]
    pub enabled: bool,
    /// Client addresses exempt from the allow-list denial.
    #[serde(default)]
    pub clients: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Whether to emit a log line per admitted/denied request.
    #[serde(default = "default_log_requests")]
    pub log_requests: bool,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_token_bucket() -> u64 {
    10
}

fn default_window_seconds() -> u64 {
    10
}

fn default_max_requests() -> usize {
    20
}

fn default_cleanup_interval() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_log_requests() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret: None,
            secret_path: None,
            token_bucket_seconds: default_token_bucket(),
            require_token: false,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            max_requests: default_max_requests(),
            cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_requests: default_log_requests(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AdmitError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| AdmitError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| AdmitError::Config {
            message: format!("Failed to parse config file '{}': {}", path.display(), e),
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    ///
    /// All failures here are fatal; the daemon must not start with a
    /// configuration the core cannot honor.
    pub fn validate(&self) -> Result<(), AdmitError> {
        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(AdmitError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        // Validate log format
        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(AdmitError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        if self.rate_limit.window_seconds == 0 {
            return Err(AdmitError::Config {
                message: "rate_limit.window_seconds must be positive".to_string(),
            });
        }

        if self.rate_limit.max_requests == 0 {
            return Err(AdmitError::Config {
                message: "rate_limit.max_requests must be positive".to_string(),
            });
        }

        if self.security.token_bucket_seconds == 0 {
            return Err(AdmitError::Config {
                message: "security.token_bucket_seconds must be positive".to_string(),
            });
        }

        if self.security.secret.is_some() && self.security.secret_path.is_some() {
            return Err(AdmitError::Config {
                message: "security.secret and security.secret_path are mutually exclusive"
                    .to_string(),
            });
        }

        if matches!(&self.security.secret, Some(s) if s.is_empty()) {
            return Err(AdmitError::Auth {
                kind: AuthErrorKind::EmptySecret,
            });
        }

        if self.security.require_token
            && self.security.secret.is_none()
            && self.security.secret_path.is_none()
        {
            return Err(AdmitError::Config {
                message: "security.require_token is set but no secret is configured".to_string(),
            });
        }

        Ok(())
    }

    /// Resolve the shared secret to raw bytes.
    ///
    /// Returns `None` when no secret is configured (token auth disabled).
    /// File-backed secrets must have restrictive permissions (0600 or 0400)
    /// so they are not readable by other users.
    pub fn resolve_secret(&self) -> Result<Option<Vec<u8>>, AdmitError> {
        if let Some(secret) = &self.security.secret {
            return Ok(Some(secret.clone().into_bytes()));
        }

        let Some(path) = &self.security.secret_path else {
            return Ok(None);
        };

        let metadata = std::fs::metadata(path).map_err(|e| AdmitError::Auth {
            kind: AuthErrorKind::SecretReadError {
                path: path.clone(),
                message: e.to_string(),
            },
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = metadata.permissions().mode();
            // Group and world bits must all be zero (only owner can access)
            if mode & 0o077 != 0 {
                return Err(AdmitError::Auth {
                    kind: AuthErrorKind::InsecureSecretFile {
                        path: path.clone(),
                        mode: mode & 0o777,
                    },
                });
            }
        }
        #[cfg(not(unix))]
        let _ = metadata;

        let bytes = std::fs::read(path).map_err(|e| AdmitError::Auth {
            kind: AuthErrorKind::SecretReadError {
                path: path.clone(),
                message: e.to_string(),
            },
        })?;

        if bytes.is_empty() {
            return Err(AdmitError::Auth {
                kind: AuthErrorKind::EmptySecret,
            });
        }

        Ok(Some(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_bind_addr(), "0.0.0.0:8080");
        assert_eq!(default_window_seconds(), 10);
        assert_eq!(default_max_requests(), 20);
        assert_eq!(default_token_bucket(), 10);
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_log_format(), "pretty");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        settings.validate().unwrap();
        assert_eq!(settings.rate_limit.window_seconds, 10);
        assert_eq!(settings.rate_limit.max_requests, 20);
        assert!(!settings.whitelist.enabled);
        assert!(!settings.security.require_token);
    }

    #[test]
    fn test_zero_window_rejected() {
        let settings: Settings = toml::from_str("[rate_limit]\nwindow_seconds = 0").unwrap();
        assert!(matches!(
            settings.validate(),
            Err(AdmitError::Config { .. })
        ));
    }

    #[test]
    fn test_zero_bucket_rejected() {
        let settings: Settings =
            toml::from_str("[security]\ntoken_bucket_seconds = 0").unwrap();
        assert!(matches!(
            settings.validate(),
            Err(AdmitError::Config { .. })
        ));
    }

    #[test]
    fn test_empty_inline_secret_rejected() {
        let settings: Settings = toml::from_str("[security]\nsecret = \"\"").unwrap();
        assert!(matches!(settings.validate(), Err(AdmitError::Auth { .. })));
    }

    #[test]
    fn test_require_token_without_secret_rejected() {
        let settings: Settings = toml::from_str("[security]\nrequire_token = true").unwrap();
        assert!(matches!(
            settings.validate(),
            Err(AdmitError::Config { .. })
        ));
    }

    #[test]
    fn test_resolve_inline_secret() {
        let settings: Settings = toml::from_str("[security]\nsecret = \"k\"").unwrap();
        let secret = settings.resolve_secret().unwrap();
        assert_eq!(secret, Some(b"k".to_vec()));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_secret_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.key");
        std::fs::write(&path, "file-secret").unwrap();

        // World-readable file must be rejected
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        let mut settings = Settings::default_for_tests();
        settings.security.secret_path = Some(path.clone());
        assert!(matches!(
            settings.resolve_secret(),
            Err(AdmitError::Auth {
                kind: AuthErrorKind::InsecureSecretFile { .. }
            })
        ));

        // Owner-only file is accepted
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();
        let secret = settings.resolve_secret().unwrap();
        assert_eq!(secret, Some(b"file-secret".to_vec()));
    }

    impl Settings {
        /// All-defaults settings for tests.
        pub(crate) fn default_for_tests() -> Self {
            toml::from_str("").unwrap()
        }
    }
}
