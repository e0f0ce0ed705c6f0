use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::{endpoint, read_json, MusicSource, Platform, Song};
use crate::error::ProviderError;

pub const DEFAULT_API_URL: &str = "https://www.googleapis.com";

#[derive(Debug, Deserialize)]
struct YouTubeSearchResponse {
    items: Option<Vec<YouTubeSearchItem>>,
}

#[derive(Debug, Deserialize)]
struct YouTubeSearchItem {
    id: VideoId,
    snippet: VideoSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    channel_title: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// Cliente de búsqueda de YouTube Data API v3
pub struct YouTubeClient {
    api_key: String,
    api_url: String,
    client: reqwest::Client,
}

impl YouTubeClient {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self::with_api_url(client, api_key, DEFAULT_API_URL.to_string())
    }

    pub fn with_api_url(client: reqwest::Client, api_key: String, api_url: String) -> Self {
        Self {
            api_key,
            api_url,
            client,
        }
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Song>, ProviderError> {
        debug!("🔍 Búsqueda YouTube API v3: {}", query);

        let max_results = limit.to_string();
        let response = self
            .client
            .get(endpoint(&self.api_url, "youtube/v3/search"))
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query),
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::new(Platform::YouTube, e))?;

        let api_response: YouTubeSearchResponse = read_json(Platform::YouTube, response).await?;
        let songs = map_search_response(api_response);

        info!("✅ YouTube: {} resultados", songs.len());
        Ok(songs)
    }
}

/// La búsqueda no devuelve duración; obtenerla exige otra llamada a `videos`,
/// así que queda como desconocida.
fn map_search_response(response: YouTubeSearchResponse) -> Vec<Song> {
    response
        .items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| {
            let video_id = item.id.video_id?;
            let url = format!("https://www.youtube.com/watch?v={}", video_id);

            let mut song = Song::new(Platform::YouTube, video_id, item.snippet.title, url)
                .with_thumbnail(item.snippet.thumbnails.and_then(|t| t.default).map(|t| t.url));

            if let Some(channel) = item.snippet.channel_title {
                song = song.with_artist(channel);
            }

            Some(song)
        })
        .collect()
}

#[async_trait]
impl MusicSource for YouTubeClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Song>, ProviderError> {
        self.search(query, limit).await
    }

    fn platform(&self) -> Platform {
        Platform::YouTube
    }
}
