/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, Magic secret key, CORS 許可など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAGIC_API_BASE_URL: &str = "https://api.magic.link";
const DEFAULT_NBF_GRACE_SECONDS: u64 = 300;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_REQUEST_BODY_LIMIT_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Per-request limits enforced by the HTTP middleware stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpLimits {
    // Also bounds the identity provider call, which has no timeout of its own.
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
}

impl Default for HttpLimits {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS),
            body_limit_bytes: DEFAULT_REQUEST_BODY_LIMIT_BYTES,
        }
    }
}

pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub magic_secret_key: String,
    pub magic_api_base_url: Url,
    pub magic_client_id: Option<String>,
    pub did_token_nbf_grace_seconds: u64,

    pub http_limits: HttpLimits,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // secret key は出力しない
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("magic_api_base_url", &self.magic_api_base_url.as_str())
            .field("magic_client_id", &self.magic_client_id)
            .field(
                "did_token_nbf_grace_seconds",
                &self.did_token_nbf_grace_seconds,
            )
            .field("http_limits", &self.http_limits)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests do not have to
    /// touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT").filter(|s| !s.trim().is_empty()) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => DEFAULT_PORT,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = lookup("APP_ENV")
            .map(|raw| AppEnv::parse(&raw))
            .unwrap_or(AppEnv::Development);

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        // Fail fast: a missing key would otherwise only surface on the first login.
        let magic_secret_key = lookup("MAGIC_SECRET_KEY")
            .or_else(|| lookup("MAGIC_TEST_SECRET_KEY"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("MAGIC_SECRET_KEY"))?;

        let magic_api_base_url = Url::parse(
            &lookup("MAGIC_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_MAGIC_API_BASE_URL.to_string()),
        )
        .map_err(|_| ConfigError::Invalid("MAGIC_API_BASE_URL"))?;

        let magic_client_id = lookup("MAGIC_CLIENT_ID")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let did_token_nbf_grace_seconds = match lookup("DID_TOKEN_NBF_GRACE_SECONDS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("DID_TOKEN_NBF_GRACE_SECONDS"))?,
            None => DEFAULT_NBF_GRACE_SECONDS,
        };

        let request_timeout = match lookup("REQUEST_TIMEOUT_SECONDS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS"))?,
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS),
        };

        let body_limit_bytes = match lookup("REQUEST_BODY_LIMIT_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|bytes| *bytes > 0)
                .ok_or(ConfigError::Invalid("REQUEST_BODY_LIMIT_BYTES"))?,
            None => DEFAULT_REQUEST_BODY_LIMIT_BYTES,
        };

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            magic_secret_key,
            magic_api_base_url,
            magic_client_id,
            did_token_nbf_grace_seconds,
            http_limits: HttpLimits {
                request_timeout,
                body_limit_bytes,
            },
        })
    }
}
