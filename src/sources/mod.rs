pub mod format;
pub mod jiosaavn;
pub mod spotify;
pub mod token;
pub mod youtube;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::error;

use crate::error::{ProviderError, ProviderErrorKind};

pub use jiosaavn::JioSaavnClient;
pub use spotify::SpotifyClient;
pub use token::{ClientCredentialsExchanger, ProviderToken, TokenCache, TokenExchanger, TokenGrant};
pub use youtube::YouTubeClient;

use format::{UNKNOWN_ARTIST, UNKNOWN_DURATION};

/// Trait común para todas las fuentes de música
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MusicSource: Send + Sync {
    /// Busca canciones en la plataforma y las devuelve ya normalizadas.
    ///
    /// Un resultado vacío no es un error. Cualquier fallo del upstream se
    /// devuelve como [`ProviderError`] para que el agregador lo aísle.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Song>, ProviderError>;

    /// Plataforma que atiende esta fuente
    fn platform(&self) -> Platform;
}

/// Plataformas soportadas, en el orden fijo en que se fusionan los resultados.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "YouTube")]
    YouTube,
    #[serde(rename = "spotify")]
    Spotify,
    #[serde(rename = "jiosaavn")]
    JioSaavn,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::YouTube, Platform::Spotify, Platform::JioSaavn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::Spotify => "spotify",
            Platform::JioSaavn => "jiosaavn",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPlatform(pub String);

impl fmt::Display for UnknownPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plataforma desconocida: {}", self.0)
    }
}

impl std::error::Error for UnknownPlatform {}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "youtube" | "yt" => Ok(Platform::YouTube),
            "spotify" => Ok(Platform::Spotify),
            "jiosaavn" | "saavn" => Ok(Platform::JioSaavn),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

/// Conjunto de plataformas. Se itera siempre en el orden de [`Platform::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlatformSet(u8);

impl PlatformSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Platform::ALL.into_iter().collect()
    }

    pub fn insert(&mut self, platform: Platform) {
        self.0 |= platform.bit();
    }

    pub fn contains(&self, platform: Platform) -> bool {
        self.0 & platform.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn intersection(self, other: PlatformSet) -> PlatformSet {
        PlatformSet(self.0 & other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = Platform> {
        Platform::ALL.into_iter().filter(move |p| self.contains(*p))
    }

    /// Parsea una lista separada por comas (`"youtube,spotify"`).
    pub fn parse_list(list: &str) -> Result<Self, UnknownPlatform> {
        list.split(',')
            .filter(|item| !item.trim().is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromIterator<Platform> for PlatformSet {
    fn from_iter<I: IntoIterator<Item = Platform>>(iter: I) -> Self {
        let mut set = PlatformSet::empty();
        for platform in iter {
            set.insert(platform);
        }
        set
    }
}

impl fmt::Display for PlatformSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|p| p.as_str()).collect();
        f.write_str(&names.join(","))
    }
}

/// Canción normalizada, independiente de la plataforma de origen.
///
/// `(platform, external_id)` identifica la canción dentro de su plataforma;
/// el mismo tema en dos plataformas son dos `Song` distintas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    #[serde(rename = "id")]
    pub external_id: String,
    pub title: String,
    pub artist: String,
    pub platform: Platform,
    #[serde(rename = "duration")]
    pub duration_display: String,
    #[serde(rename = "thumbnail", default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(rename = "url")]
    pub canonical_url: String,
}

impl Song {
    pub fn new(
        platform: Platform,
        external_id: impl Into<String>,
        title: impl Into<String>,
        canonical_url: impl Into<String>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            title: title.into(),
            artist: UNKNOWN_ARTIST.to_string(),
            platform,
            duration_display: UNKNOWN_DURATION.to_string(),
            thumbnail_url: None,
            canonical_url: canonical_url.into(),
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        let artist = artist.into();
        if !artist.trim().is_empty() {
            self.artist = artist;
        }
        self
    }

    pub fn with_duration(mut self, duration_display: impl Into<String>) -> Self {
        self.duration_display = duration_display.into();
        self
    }

    pub fn with_thumbnail(mut self, thumbnail_url: Option<String>) -> Self {
        self.thumbnail_url = thumbnail_url.filter(|url| !url.trim().is_empty());
        self
    }
}

/// Crea el cliente HTTP compartido por todas las fuentes.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("musichub/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Une una URL base configurable con la ruta de un endpoint.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Lee una respuesta del upstream: estado no-2xx, fallo de transporte y JSON
/// malformado se convierten en [`ProviderError`] de la plataforma indicada.
pub(crate) async fn read_json<T: DeserializeOwned>(
    platform: Platform,
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!("❌ {} API error: {} - {}", platform, status, body);
        return Err(ProviderError::new(
            platform,
            ProviderErrorKind::Status {
                status: status.as_u16(),
                body,
            },
        ));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ProviderError::new(platform, e))?;

    serde_json::from_slice(&bytes).map_err(|e| ProviderError::new(platform, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_platform_order_is_fixed() {
        let mut platforms = vec![Platform::JioSaavn, Platform::YouTube, Platform::Spotify];
        platforms.sort();
        assert_eq!(platforms, Platform::ALL.to_vec());
    }

    #[test]
    fn test_platform_parsing() {
        assert_eq!("YouTube".parse::<Platform>(), Ok(Platform::YouTube));
        assert_eq!(" spotify ".parse::<Platform>(), Ok(Platform::Spotify));
        assert_eq!("saavn".parse::<Platform>(), Ok(Platform::JioSaavn));
        assert!("deezer".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_set_iterates_in_fixed_order() {
        let set: PlatformSet = [Platform::JioSaavn, Platform::YouTube].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Platform::YouTube, Platform::JioSaavn]);
        assert_eq!(set.len(), 2);
        assert!(!set.contains(Platform::Spotify));
        assert_eq!(set.to_string(), "YouTube,jiosaavn");
    }

    #[test]
    fn test_platform_set_parse_list() {
        let set = PlatformSet::parse_list("spotify, jiosaavn,").unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Platform::Spotify, Platform::JioSaavn]);
        assert!(PlatformSet::parse_list("spotify,tidal").is_err());
        assert!(PlatformSet::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn test_intersection() {
        let enabled: PlatformSet = [Platform::YouTube, Platform::Spotify].into_iter().collect();
        let wanted: PlatformSet = [Platform::Spotify, Platform::JioSaavn].into_iter().collect();
        assert_eq!(enabled.intersection(wanted).iter().collect::<Vec<_>>(), vec![Platform::Spotify]);
    }

    #[test]
    fn test_song_defaults_to_sentinels() {
        let song = Song::new(Platform::YouTube, "abc", "Title", "https://www.youtube.com/watch?v=abc")
            .with_artist("   ")
            .with_thumbnail(Some(String::new()));
        assert_eq!(song.artist, "Unknown Artist");
        assert_eq!(song.duration_display, "Unknown");
        assert_eq!(song.thumbnail_url, None);
    }

    #[test]
    fn test_song_wire_format() {
        let song = Song::new(Platform::Spotify, "42", "One More Time", "https://open.spotify.com/track/42")
            .with_artist("Daft Punk")
            .with_duration("5:20")
            .with_thumbnail(Some("https://i.scdn.co/image/x".to_string()));

        let json = serde_json::to_value(&song).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "42",
                "title": "One More Time",
                "artist": "Daft Punk",
                "platform": "spotify",
                "duration": "5:20",
                "thumbnail": "https://i.scdn.co/image/x",
                "url": "https://open.spotify.com/track/42"
            })
        );
    }

    #[test]
    fn test_endpoint_join() {
        assert_eq!(endpoint("https://api.spotify.com/", "/v1/search"), "https://api.spotify.com/v1/search");
        assert_eq!(endpoint("http://127.0.0.1:9000", "api.php"), "http://127.0.0.1:9000/api.php");
    }
}
