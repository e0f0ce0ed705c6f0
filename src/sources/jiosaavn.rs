use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::format::{join_artists, non_blank, seconds_padded, upgrade_thumbnail, UNKNOWN_ARTIST};
use super::{endpoint, read_json, MusicSource, Platform, Song};
use crate::error::ProviderError;

pub const DEFAULT_API_URL: &str = "https://www.jiosaavn.com";

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    songs: Option<SongSection>,
}

#[derive(Debug, Deserialize)]
struct SongSection {
    data: Option<Vec<SaavnSong>>,
}

#[derive(Debug, Deserialize)]
struct SaavnSong {
    id: String,
    title: Option<String>,
    song: Option<String>,
    subtitle: Option<String>,
    image: Option<String>,
    perma_url: Option<String>,
    /// Segundos; la API lo manda como texto o como número según el endpoint.
    duration: Option<Value>,
    more_info: Option<MoreInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoreInfo {
    artist_map: Option<ArtistMap>,
    singers: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ArtistMap {
    primary_artists: Option<Vec<SaavnArtist>>,
}

#[derive(Debug, Deserialize)]
struct SaavnArtist {
    name: String,
}

/// Cliente del autocompletado de JioSaavn (sin API key)
pub struct JioSaavnClient {
    client: reqwest::Client,
    api_url: String,
}

impl JioSaavnClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_api_url(client, DEFAULT_API_URL.to_string())
    }

    pub fn with_api_url(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// El endpoint no acepta límite, así que se recorta localmente.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Song>, ProviderError> {
        debug!("🔍 Búsqueda JioSaavn: {}", query);

        let response = self
            .client
            .get(endpoint(&self.api_url, "api.php"))
            .query(&[
                ("__call", "autocomplete.get"),
                ("_format", "json"),
                ("_marker", "0"),
                ("cc", "in"),
                ("includeMetaTags", "1"),
                ("query", query),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::new(Platform::JioSaavn, e))?;

        let api_response: AutocompleteResponse = read_json(Platform::JioSaavn, response).await?;
        let songs = map_autocomplete(api_response, limit);

        info!("✅ JioSaavn: {} resultados", songs.len());
        Ok(songs)
    }
}

fn map_autocomplete(response: AutocompleteResponse, limit: usize) -> Vec<Song> {
    response
        .songs
        .and_then(|section| section.data)
        .unwrap_or_default()
        .into_iter()
        .take(limit)
        .map(map_song)
        .collect()
}

fn map_song(song: SaavnSong) -> Song {
    let artist = resolve_artist(&song);
    let title = non_blank(song.title.as_deref())
        .or(non_blank(song.song.as_deref()))
        .unwrap_or_default()
        .to_string();
    let url = non_blank(song.perma_url.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| format!("https://www.jiosaavn.com/song/{}", urlencoding::encode(&song.id)));
    let thumbnail = song.image.as_deref().map(upgrade_thumbnail);
    let duration = song.duration.as_ref().and_then(parse_seconds);

    let mut normalized = Song::new(Platform::JioSaavn, song.id, title, url)
        .with_artist(artist)
        .with_thumbnail(thumbnail);

    if let Some(seconds) = duration {
        normalized = normalized.with_duration(seconds_padded(seconds));
    }

    normalized
}

/// Artistas principales, luego `singers`, luego `subtitle`.
fn resolve_artist(song: &SaavnSong) -> String {
    let info = song.more_info.as_ref();

    let primary = info
        .and_then(|i| i.artist_map.as_ref())
        .and_then(|map| map.primary_artists.as_ref())
        .map(|artists| join_artists(artists.iter().map(|a| a.name.as_str())))
        .filter(|joined| !joined.is_empty());

    primary
        .or_else(|| non_blank(info.and_then(|i| i.singers.as_deref())).map(str::to_string))
        .or_else(|| non_blank(song.subtitle.as_deref()).map(str::to_string))
        .unwrap_or_else(|| UNKNOWN_ARTIST.to_string())
}

fn parse_seconds(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl MusicSource for JioSaavnClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Song>, ProviderError> {
        self.search(query, limit).await
    }

    fn platform(&self) -> Platform {
        Platform::JioSaavn
    }
}
