use crate::workflows::audit::CompletenessPolicy;
use crate::workflows::session::{Principal, Role};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_MAX_PDF_BYTES: usize = 25 * 1024 * 1024;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }

    /// Diagnostic error detail is only rendered outside production.
    pub fn exposes_diagnostics(self) -> bool {
        !matches!(self, Self::Production)
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub audit: AuditConfig,
    pub sessions: Vec<SessionSeed>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let max_upload_bytes = byte_limit("AUDIT_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let max_pdf_bytes = byte_limit("AUDIT_MAX_PDF_BYTES", DEFAULT_MAX_PDF_BYTES)?;
        let completeness = match env::var("AUDIT_COMPLETENESS") {
            Ok(raw) => CompletenessPolicy::parse(&raw)
                .ok_or(ConfigError::InvalidCompleteness { value: raw })?,
            Err(_) => CompletenessPolicy::Core,
        };

        let sessions = match env::var("APP_SESSION_TOKENS") {
            Ok(raw) => parse_session_seeds(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: false,
            },
            audit: AuditConfig {
                max_upload_bytes,
                max_pdf_bytes,
                completeness,
            },
            sessions,
        })
    }
}

fn byte_limit(key: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidByteLimit { key }),
        },
        Err(_) => Ok(default),
    }
}

/// Parses `token=role:id:email` entries separated by `;`.
fn parse_session_seeds(raw: &str) -> Result<Vec<SessionSeed>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let malformed = || ConfigError::InvalidSessionToken {
                entry: entry.to_string(),
            };
            let (token, identity) = entry.split_once('=').ok_or_else(malformed)?;
            let mut parts = identity.splitn(3, ':');
            let role = parts
                .next()
                .and_then(Role::parse)
                .ok_or_else(malformed)?;
            let id = parts.next().filter(|id| !id.is_empty()).ok_or_else(malformed)?;
            let email = parts.next().ok_or_else(malformed)?;
            if token.trim().is_empty() {
                return Err(malformed());
            }

            Ok(SessionSeed {
                token: token.trim().to_string(),
                principal: Principal {
                    id: id.to_string(),
                    role,
                    email: email.to_string(),
                },
            })
        })
        .collect()
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Upload limits and the submission completeness rule.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub max_upload_bytes: usize,
    pub max_pdf_bytes: usize,
    pub completeness: CompletenessPolicy,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_pdf_bytes: DEFAULT_MAX_PDF_BYTES,
            completeness: CompletenessPolicy::Core,
        }
    }
}

/// Pre-issued session token accepted by the development verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSeed {
    pub token: String,
    pub principal: Principal,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidByteLimit { key: &'static str },
    InvalidCompleteness { value: String },
    InvalidSessionToken { entry: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidByteLimit { key } => {
                write!(f, "{key} must be a positive number of bytes")
            }
            ConfigError::InvalidCompleteness { value } => write!(
                f,
                "AUDIT_COMPLETENESS must be 'core' or 'strict' (found '{value}')"
            ),
            ConfigError::InvalidSessionToken { entry } => write!(
                f,
                "APP_SESSION_TOKENS entry '{entry}' must look like token=role:id:email"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "AUDIT_MAX_UPLOAD_BYTES",
            "AUDIT_MAX_PDF_BYTES",
            "AUDIT_COMPLETENESS",
            "APP_SESSION_TOKENS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.audit.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.audit.completeness, CompletenessPolicy::Core);
        assert!(config.sessions.is_empty());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn parses_strict_completeness_and_session_tokens() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("AUDIT_COMPLETENESS", "Strict");
        env::set_var(
            "APP_SESSION_TOKENS",
            "abc=college:college-7:office@college.in; root=admin:admin-1:registrar@ipu.ac.in",
        );
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.audit.completeness, CompletenessPolicy::Strict);
        assert_eq!(config.sessions.len(), 2);
        assert_eq!(config.sessions[0].token, "abc");
        assert_eq!(config.sessions[0].principal.role, Role::College);
        assert_eq!(config.sessions[1].principal.email, "registrar@ipu.ac.in");
    }

    #[test]
    fn rejects_malformed_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("AUDIT_MAX_PDF_BYTES", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidByteLimit {
                key: "AUDIT_MAX_PDF_BYTES"
            })
        ));

        reset_env();
        env::set_var("APP_SESSION_TOKENS", "missing-identity");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidSessionToken { .. })
        ));
        reset_env();
    }
}
