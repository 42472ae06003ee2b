//! Application configuration management.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Global configuration instance.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json or pretty).
    pub log_format: LogFormat,
    /// Spotify application client ID.
    pub client_id: String,
    /// Spotify application client secret.
    pub client_secret: String,
    /// OAuth redirect URI registered with Spotify.
    pub redirect_uri: String,
    /// Frontend origin: the only CORS origin and the post-login redirect target.
    pub frontend_url: String,
    /// Domain attribute for the session cookie, if any.
    pub cookie_domain: Option<String>,
    /// Base URL of the Spotify Web API.
    pub api_base: String,
    /// Base URL of the Spotify accounts service.
    pub accounts_base: String,
    /// Refresh the access token and retry once when Spotify answers 401.
    pub refresh_on_unauthorized: bool,
    /// Where the generated mosaic is written.
    pub mosaic_path: PathBuf,
    /// Maximum number of album covers downloaded at once.
    pub mosaic_fetch_concurrency: usize,
    /// Fixed RNG seed for reproducible mosaics.
    pub mosaic_seed: Option<u64>,
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable colored output.
    Pretty,
    /// JSON structured logging for production.
    Json,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if a numeric setting cannot be parsed.
    pub fn from_env() -> Self {
        let host = env_or("HOST", "0.0.0.0");

        let port = env_or("PORT", "8000")
            .parse::<u16>()
            .expect("PORT must be a valid u16");

        let log_level = env_or("LOG_LEVEL", "info");

        let log_format = match env_or("LOG_FORMAT", "pretty").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let client_id = env_or("SPOTIFY_CLIENT_ID", "");
        let client_secret = env_or("SPOTIFY_CLIENT_SECRET", "");
        let redirect_uri = env_or("SPOTIFY_REDIRECT_URI", "http://localhost:8000/callback");

        let frontend_url = env_or("FRONTEND_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();

        let cookie_domain = std::env::var("COOKIE_DOMAIN")
            .ok()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let api_base = env_or("SPOTIFY_API_BASE", "https://api.spotify.com/v1")
            .trim_end_matches('/')
            .to_string();
        let accounts_base = env_or("SPOTIFY_ACCOUNTS_BASE", "https://accounts.spotify.com")
            .trim_end_matches('/')
            .to_string();

        let refresh_on_unauthorized = parse_bool(&env_or("SPOTIFY_REFRESH_ON_401", "true"));

        let mosaic_path = PathBuf::from(env_or("MOSAIC_PATH", "static/mosaic_wild.png"));

        let mosaic_fetch_concurrency = env_or("MOSAIC_FETCH_CONCURRENCY", "8")
            .parse::<usize>()
            .expect("MOSAIC_FETCH_CONCURRENCY must be a valid integer")
            .max(1);

        let mosaic_seed = std::env::var("MOSAIC_SEED")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse::<u64>()
                    .expect("MOSAIC_SEED must be a valid u64")
            });

        Self {
            host,
            port,
            log_level,
            log_format,
            client_id,
            client_secret,
            redirect_uri,
            frontend_url,
            cookie_domain,
            api_base,
            accounts_base,
            refresh_on_unauthorized,
            mosaic_path,
            mosaic_fetch_concurrency,
            mosaic_seed,
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns an error if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.is_empty() {
            return Err(ConfigError::Missing("SPOTIFY_CLIENT_ID"));
        }

        if self.client_secret.is_empty() {
            return Err(ConfigError::Missing("SPOTIFY_CLIENT_SECRET"));
        }

        if !self.frontend_url.starts_with("http://") && !self.frontend_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidFrontendUrl(self.frontend_url.clone()));
        }

        if !self.redirect_uri.starts_with("http") {
            tracing::warn!(
                redirect_uri = %self.redirect_uri,
                "SPOTIFY_REDIRECT_URI has no scheme; Spotify will likely reject it"
            );
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("FRONTEND_URL must be an absolute http(s) URL, got '{0}'")]
    InvalidFrontendUrl(String),
}

/// Initialize the global configuration.
///
/// Should be called once at application startup.
pub fn init() -> &'static Config {
    CONFIG.get_or_init(|| {
        dotenvy::dotenv().ok();
        Config::from_env()
    })
}
