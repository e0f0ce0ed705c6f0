use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::format::{join_artists, millis_unpadded};
use super::{endpoint, read_json, MusicSource, Platform, Song, TokenCache};
use crate::error::ProviderError;

pub const DEFAULT_API_URL: &str = "https://api.spotify.com";
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// Ruta del endpoint de tokens relativa a `DEFAULT_ACCOUNTS_URL`.
pub const TOKEN_PATH: &str = "api/token";

#[derive(Debug, Deserialize)]
struct SpotifySearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    items: Option<Vec<SpotifyTrack>>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    id: String,
    name: String,
    artists: Option<Vec<SpotifyArtist>>,
    duration_ms: Option<u64>,
    album: Option<SpotifyAlbum>,
    external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpotifyAlbum {
    images: Option<Vec<SpotifyImage>>,
}

#[derive(Debug, Deserialize)]
struct SpotifyImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

/// Cliente de búsqueda de Spotify Web API (client credentials)
pub struct SpotifyClient {
    client: reqwest::Client,
    api_url: String,
    tokens: Arc<TokenCache>,
}

impl SpotifyClient {
    pub fn new(client: reqwest::Client, tokens: Arc<TokenCache>) -> Self {
        Self::with_api_url(client, tokens, DEFAULT_API_URL.to_string())
    }

    pub fn with_api_url(client: reqwest::Client, tokens: Arc<TokenCache>, api_url: String) -> Self {
        Self {
            client,
            api_url,
            tokens,
        }
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Song>, ProviderError> {
        debug!("🔍 Búsqueda Spotify: {}", query);

        let token = self
            .tokens
            .get_token()
            .await
            .map_err(|e| ProviderError::new(Platform::Spotify, e))?;

        let limit = limit.to_string();
        let response = self
            .client
            .get(endpoint(&self.api_url, "v1/search"))
            .bearer_auth(token)
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::new(Platform::Spotify, e))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // Token revocado antes de expirar: la próxima búsqueda pedirá otro.
            warn!("🔑 Spotify rechazó el token, invalidando caché");
            self.tokens.invalidate();
        }

        let api_response: SpotifySearchResponse = read_json(Platform::Spotify, response).await?;
        let songs = map_search_response(api_response);

        info!("✅ Spotify: {} resultados", songs.len());
        Ok(songs)
    }
}

fn map_search_response(response: SpotifySearchResponse) -> Vec<Song> {
    response
        .tracks
        .and_then(|page| page.items)
        .unwrap_or_default()
        .into_iter()
        .map(map_track)
        .collect()
}

fn map_track(track: SpotifyTrack) -> Song {
    let url = track
        .external_urls
        .and_then(|urls| urls.spotify)
        .unwrap_or_else(|| format!("https://open.spotify.com/track/{}", track.id));

    let thumbnail = track
        .album
        .and_then(|album| album.images)
        .and_then(|images| images.into_iter().next())
        .map(|image| image.url);

    let artists = track.artists.unwrap_or_default();

    let mut song = Song::new(Platform::Spotify, track.id, track.name, url)
        .with_artist(join_artists(artists.iter().map(|a| a.name.as_str())))
        .with_thumbnail(thumbnail);

    if let Some(millis) = track.duration_ms {
        song = song.with_duration(millis_unpadded(millis));
    }

    song
}

#[async_trait]
impl MusicSource for SpotifyClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Song>, ProviderError> {
        self.search(query, limit).await
    }

    fn platform(&self) -> Platform {
        Platform::Spotify
    }
}
