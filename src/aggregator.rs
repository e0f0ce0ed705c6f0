//! Fan-out search across every enabled platform.
//!
//! One call per adapter, all in flight at once, each bounded by its own
//! timeout. Results are concatenated in the fixed platform order (YouTube,
//! Spotify, JioSaavn) no matter which adapter answers first. A failing adapter
//! only removes its own songs; the search fails only when every adapter did.

use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheKey, ResultCache, DEFAULT_RECENT_LIMIT};
use crate::config::Config;
use crate::error::{ProviderError, ProviderErrorKind, SearchError};
use crate::sources::{
    build_http_client, endpoint, spotify, ClientCredentialsExchanger, JioSaavnClient, MusicSource, Platform,
    PlatformSet, Song, SpotifyClient, TokenCache, YouTubeClient,
};

/// Page size requested from each provider.
pub const DEFAULT_LIMIT: usize = 10;

/// Upper bound for each adapter call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(8);

/// Outcome of one aggregated search.
#[derive(Debug)]
pub struct SearchReport {
    /// Merged songs in platform order
    pub songs: Vec<Song>,
    /// Errors of this run's failed adapters; empty on a cache hit
    pub failures: Vec<ProviderError>,
    /// Platforms that failed, also when served from the cache
    pub failed: PlatformSet,
    /// Served from the result cache
    pub cached: bool,
}

impl SearchReport {
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn failed_platforms(&self) -> PlatformSet {
        self.failed
    }
}

pub struct Aggregator {
    sources: Vec<Arc<dyn MusicSource>>,
    limit: usize,
    provider_timeout: Duration,
    cache: Option<ResultCache>,
}

impl Aggregator {
    pub fn new(mut sources: Vec<Arc<dyn MusicSource>>) -> Self {
        sources.sort_by_key(|source| source.platform());
        Self {
            sources,
            limit: DEFAULT_LIMIT,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            cache: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Builds one adapter per active platform from the configuration.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config.http_timeout)?;
        let active = config.active_platforms();
        let mut sources: Vec<Arc<dyn MusicSource>> = Vec::new();

        for platform in active.iter() {
            match platform {
                Platform::YouTube => {
                    if let Some(api_key) = &config.youtube_api_key {
                        sources.push(Arc::new(YouTubeClient::with_api_url(
                            client.clone(),
                            api_key.clone(),
                            config.youtube_api_url.clone(),
                        )));
                    }
                }
                Platform::Spotify => {
                    if let (Some(id), Some(secret)) = (&config.spotify_client_id, &config.spotify_client_secret) {
                        let exchanger = ClientCredentialsExchanger::new(
                            client.clone(),
                            endpoint(&config.spotify_accounts_url, spotify::TOKEN_PATH),
                            id,
                            secret,
                        );
                        let tokens = Arc::new(TokenCache::new(Arc::new(exchanger)));
                        sources.push(Arc::new(SpotifyClient::with_api_url(
                            client.clone(),
                            tokens,
                            config.spotify_api_url.clone(),
                        )));
                    }
                }
                Platform::JioSaavn => {
                    sources.push(Arc::new(JioSaavnClient::with_api_url(
                        client.clone(),
                        config.jiosaavn_api_url.clone(),
                    )));
                }
            }
        }

        for skipped in config.enabled_platforms.iter().filter(|p| !active.contains(*p)) {
            warn!("⚠️ {} deshabilitado: faltan credenciales", skipped);
        }

        let mut aggregator = Self::new(sources)
            .with_limit(config.search_limit)
            .with_provider_timeout(config.provider_timeout);

        if config.cache_enabled() {
            aggregator = aggregator.with_cache(ResultCache::new(config.result_cache_ttl, config.result_cache_capacity));
        }

        info!("🎯 Agregador listo con plataformas [{}]", aggregator.enabled_platforms());
        Ok(aggregator)
    }

    pub fn enabled_platforms(&self) -> PlatformSet {
        self.sources.iter().map(|source| source.platform()).collect()
    }

    pub fn cache(&self) -> Option<&ResultCache> {
        self.cache.as_ref()
    }

    /// Searches every enabled platform and returns the merged songs.
    pub async fn aggregate(&self, query: &str) -> Result<Vec<Song>, SearchError> {
        self.aggregate_platforms(query, PlatformSet::all()).await
    }

    /// Like [`Aggregator::aggregate`], restricted to `platforms`.
    pub async fn aggregate_platforms(&self, query: &str, platforms: PlatformSet) -> Result<Vec<Song>, SearchError> {
        Ok(self.search(query, platforms).await?.songs)
    }

    /// Full report, including which adapters failed.
    pub async fn search(&self, query: &str, platforms: PlatformSet) -> Result<SearchReport, SearchError> {
        self.search_with_cancel(query, platforms, &CancellationToken::new()).await
    }

    /// Cancelling `cancel` aborts every adapter call still in flight.
    pub async fn search_with_cancel(
        &self,
        query: &str,
        platforms: PlatformSet,
        cancel: &CancellationToken,
    ) -> Result<SearchReport, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidQuery);
        }

        let selected: Vec<&Arc<dyn MusicSource>> = self
            .sources
            .iter()
            .filter(|source| platforms.contains(source.platform()))
            .collect();

        if selected.is_empty() {
            return Err(SearchError::NoPlatformsEnabled);
        }

        let searched: PlatformSet = selected.iter().map(|source| source.platform()).collect();
        let key = CacheKey::new(query, searched);

        if let Some(hit) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
            return Ok(SearchReport {
                songs: hit.songs,
                failures: Vec::new(),
                failed: hit.failed,
                cached: true,
            });
        }

        let started = Instant::now();
        info!("🎯 Buscando '{}' en [{}]", query, searched);

        // join_all preserves input order, which is already platform order.
        let outcomes = join_all(
            selected
                .iter()
                .map(|source| self.run_source(&***source, query, cancel)),
        )
        .await;

        let mut songs = Vec::new();
        let mut failures = Vec::new();

        for outcome in outcomes {
            match outcome {
                Ok(batch) => songs.extend(batch),
                Err(e) => {
                    warn!("❌ {}", e);
                    failures.push(e);
                }
            }
        }

        let elapsed = started.elapsed();

        if failures.len() == selected.len() {
            error!("❌ Todas las plataformas fallaron para '{}' después de {:?}", query, elapsed);
            return Err(SearchError::AllProvidersFailed { failures });
        }

        info!(
            "✅ '{}': {} canciones en {:?} ({} plataformas fallaron)",
            query,
            songs.len(),
            elapsed,
            failures.len()
        );

        let failed: PlatformSet = failures.iter().map(|f| f.platform).collect();

        if let Some(cache) = &self.cache {
            cache.put(key, songs.clone(), failed);
        }

        Ok(SearchReport {
            songs,
            failures,
            failed,
            cached: false,
        })
    }

    /// Songs from recently cached searches (empty when the cache is disabled).
    pub fn recent(&self, limit: Option<usize>) -> Vec<Song> {
        self.cache
            .as_ref()
            .map(|cache| cache.recent(limit.unwrap_or(DEFAULT_RECENT_LIMIT)))
            .unwrap_or_default()
    }

    async fn run_source(
        &self,
        source: &dyn MusicSource,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Song>, ProviderError> {
        let platform = source.platform();
        let started = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::new(platform, ProviderErrorKind::Cancelled)),
            result = tokio::time::timeout(self.provider_timeout, source.search(query, self.limit)) => {
                match result {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::new(platform, ProviderErrorKind::Timeout(self.provider_timeout))),
                }
            }
        };

        debug!("⏱️ {} respondió en {:?}", platform, started.elapsed());
        outcome
    }
}
