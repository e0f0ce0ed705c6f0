use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;

use crate::sources::{jiosaavn, spotify, youtube, Platform, PlatformSet};

/// Maximum per-provider page size accepted by every upstream API.
const MAX_SEARCH_LIMIT: usize = 50;

/// Upper bound for a single adapter call.
const MAX_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Config {
    // Credenciales (opcionales: sin ellas la plataforma queda deshabilitada)
    pub youtube_api_key: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,

    // Búsqueda
    pub enabled_platforms: PlatformSet,
    pub search_limit: usize,
    pub provider_timeout: Duration,
    pub http_timeout: Duration,

    // Caché de resultados
    pub result_cache_ttl: Duration,
    pub result_cache_capacity: usize,

    // Endpoints
    pub youtube_api_url: String,
    pub spotify_api_url: String,
    pub spotify_accounts_url: String,
    pub jiosaavn_api_url: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let config = Self {
            // Credenciales
            youtube_api_key: var("YOUTUBE_API_KEY"),
            spotify_client_id: var("SPOTIFY_CLIENT_ID"),
            spotify_client_secret: var("SPOTIFY_CLIENT_SECRET"),

            // Búsqueda
            enabled_platforms: match var("ENABLED_PLATFORMS") {
                Some(list) => PlatformSet::parse_list(&list).context("ENABLED_PLATFORMS")?,
                None => defaults.enabled_platforms,
            },
            search_limit: match var("SEARCH_LIMIT") {
                Some(val) => val.trim().parse::<usize>().context("SEARCH_LIMIT")?,
                None => defaults.search_limit,
            },
            provider_timeout: match var("PROVIDER_TIMEOUT") {
                Some(val) => humantime::parse_duration(val.trim()).context("PROVIDER_TIMEOUT")?,
                None => defaults.provider_timeout,
            },
            http_timeout: match var("HTTP_TIMEOUT") {
                Some(val) => humantime::parse_duration(val.trim()).context("HTTP_TIMEOUT")?,
                None => defaults.http_timeout,
            },

            // Caché
            result_cache_ttl: match var("RESULT_CACHE_TTL") {
                Some(val) => humantime::parse_duration(val.trim()).context("RESULT_CACHE_TTL")?,
                None => defaults.result_cache_ttl,
            },
            result_cache_capacity: match var("RESULT_CACHE_CAPACITY") {
                Some(val) => val.trim().parse::<usize>().context("RESULT_CACHE_CAPACITY")?,
                None => defaults.result_cache_capacity,
            },

            // Endpoints
            youtube_api_url: var("YOUTUBE_API_URL").unwrap_or(defaults.youtube_api_url),
            spotify_api_url: var("SPOTIFY_API_URL").unwrap_or(defaults.spotify_api_url),
            spotify_accounts_url: var("SPOTIFY_ACCOUNTS_URL").unwrap_or(defaults.spotify_accounts_url),
            jiosaavn_api_url: var("JIOSAAVN_API_URL").unwrap_or(defaults.jiosaavn_api_url),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Search limit must be between 1 and 50
    /// - Provider timeout must be non-zero and at most 30s
    /// - Cache capacity must be > 0 when the cache is enabled
    /// - Every base URL must parse
    pub fn validate(&self) -> Result<()> {
        if self.search_limit == 0 || self.search_limit > MAX_SEARCH_LIMIT {
            anyhow::bail!(
                "Search limit must be between 1 and {}, got: {}",
                MAX_SEARCH_LIMIT,
                self.search_limit
            );
        }

        if self.provider_timeout.is_zero() {
            anyhow::bail!("Provider timeout must be greater than 0");
        }

        if self.provider_timeout > MAX_PROVIDER_TIMEOUT {
            anyhow::bail!(
                "Provider timeout cannot exceed {:?}, got: {:?}",
                MAX_PROVIDER_TIMEOUT,
                self.provider_timeout
            );
        }

        if self.cache_enabled() && self.result_cache_capacity == 0 {
            anyhow::bail!("Result cache capacity must be greater than 0");
        }

        for (name, value) in [
            ("YOUTUBE_API_URL", &self.youtube_api_url),
            ("SPOTIFY_API_URL", &self.spotify_api_url),
            ("SPOTIFY_ACCOUNTS_URL", &self.spotify_accounts_url),
            ("JIOSAAVN_API_URL", &self.jiosaavn_api_url),
        ] {
            Url::parse(value).with_context(|| format!("{} is not a valid URL: {}", name, value))?;
        }

        Ok(())
    }

    pub fn cache_enabled(&self) -> bool {
        !self.result_cache_ttl.is_zero()
    }

    pub fn has_credentials(&self, platform: Platform) -> bool {
        match platform {
            Platform::YouTube => self.youtube_api_key.is_some(),
            Platform::Spotify => self.spotify_client_id.is_some() && self.spotify_client_secret.is_some(),
            Platform::JioSaavn => true,
        }
    }

    /// Enabled platforms that also have the credentials they need.
    pub fn active_platforms(&self) -> PlatformSet {
        self.enabled_platforms
            .iter()
            .filter(|p| self.has_credentials(*p))
            .collect()
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// Credentials are reported only as present or missing.
    pub fn summary(&self) -> String {
        let presence = |value: &Option<String>| if value.is_some() { "set" } else { "missing" };

        format!(
            "Config Summary:\n  \
            Platforms: enabled [{}], active [{}]\n  \
            Credentials: YouTube key {}, Spotify id {}, Spotify secret {}\n  \
            Search: limit {}, provider timeout {}, http timeout {}\n  \
            Cache: {}",
            self.enabled_platforms,
            self.active_platforms(),
            presence(&self.youtube_api_key),
            presence(&self.spotify_client_id),
            presence(&self.spotify_client_secret),
            self.search_limit,
            humantime::format_duration(self.provider_timeout),
            humantime::format_duration(self.http_timeout),
            if self.cache_enabled() {
                format!(
                    "ttl {}, capacity {}",
                    humantime::format_duration(self.result_cache_ttl),
                    self.result_cache_capacity
                )
            } else {
                "disabled".to_string()
            },
        )
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            spotify_client_id: None,
            spotify_client_secret: None,

            enabled_platforms: PlatformSet::all(),
            search_limit: 10,
            provider_timeout: Duration::from_secs(8),
            http_timeout: Duration::from_secs(10),

            result_cache_ttl: Duration::from_secs(60),
            result_cache_capacity: 256,

            youtube_api_url: youtube::DEFAULT_API_URL.to_string(),
            spotify_api_url: spotify::DEFAULT_API_URL.to_string(),
            spotify_accounts_url: spotify::DEFAULT_ACCOUNTS_URL.to_string(),
            jiosaavn_api_url: jiosaavn::DEFAULT_API_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.search_limit, 10);
        assert_eq!(config.provider_timeout, Duration::from_secs(8));
        assert_eq!(config.result_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.enabled_platforms, PlatformSet::all());
        // JioSaavn no necesita credenciales
        assert_eq!(config.active_platforms().iter().collect::<Vec<_>>(), vec![Platform::JioSaavn]);
    }

    #[test]
    fn test_credentials_activate_platforms() {
        let config = load(&[
            ("YOUTUBE_API_KEY", "yt-key"),
            ("SPOTIFY_CLIENT_ID", "id"),
            ("SPOTIFY_CLIENT_SECRET", "secret"),
        ])
        .unwrap();
        assert_eq!(config.active_platforms(), PlatformSet::all());

        let half_spotify = load(&[("SPOTIFY_CLIENT_ID", "id"), ("SPOTIFY_CLIENT_SECRET", " ")]).unwrap();
        assert!(!half_spotify.active_platforms().contains(Platform::Spotify));
    }

    #[test]
    fn test_parses_overrides() {
        let config = load(&[
            ("ENABLED_PLATFORMS", "spotify,jiosaavn"),
            ("SEARCH_LIMIT", "25"),
            ("PROVIDER_TIMEOUT", "9s 500ms"),
            ("RESULT_CACHE_TTL", "0s"),
            ("JIOSAAVN_API_URL", "http://127.0.0.1:8080"),
        ])
        .unwrap();

        assert!(!config.enabled_platforms.contains(Platform::YouTube));
        assert_eq!(config.search_limit, 25);
        assert_eq!(config.provider_timeout, Duration::from_millis(9500));
        assert!(!config.cache_enabled());
        assert_eq!(config.jiosaavn_api_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(load(&[("SEARCH_LIMIT", "0")]).is_err());
        assert!(load(&[("SEARCH_LIMIT", "51")]).is_err());
        assert!(load(&[("SEARCH_LIMIT", "many")]).is_err());
        assert!(load(&[("PROVIDER_TIMEOUT", "0s")]).is_err());
        assert!(load(&[("PROVIDER_TIMEOUT", "1m")]).is_err());
        assert!(load(&[("RESULT_CACHE_CAPACITY", "0")]).is_err());
        assert!(load(&[("ENABLED_PLATFORMS", "youtube,napster")]).is_err());
        assert!(load(&[("SPOTIFY_API_URL", "not a url")]).is_err());
    }

    #[test]
    fn test_zero_capacity_allowed_when_cache_disabled() {
        assert!(load(&[("RESULT_CACHE_TTL", "0s"), ("RESULT_CACHE_CAPACITY", "0")]).is_ok());
    }

    #[test]
    fn test_summary_hides_secrets() {
        let config = load(&[
            ("YOUTUBE_API_KEY", "super-secret-key"),
            ("SPOTIFY_CLIENT_ID", "id-123"),
            ("SPOTIFY_CLIENT_SECRET", "shh"),
        ])
        .unwrap();
        let summary = config.summary();

        assert!(!summary.contains("super-secret-key"));
        assert!(!summary.contains("shh"));
        assert!(summary.contains("YouTube key set"));
        assert!(summary.contains("ttl 1m"));
    }
}
