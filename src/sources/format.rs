//! Normalización de campos comunes entre plataformas.

/// Valor usado cuando la plataforma no informa el artista.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Valor usado cuando la plataforma no informa la duración.
pub const UNKNOWN_DURATION: &str = "Unknown";

/// Formatea milisegundos como `M:S` sin rellenar los segundos (`125000` -> `2:5`).
///
/// Es el formato que expone Spotify; no rellenar.
pub fn millis_unpadded(millis: u64) -> String {
    format!("{}:{}", millis / 60_000, (millis % 60_000) / 1000)
}

/// Formatea segundos como `M:SS` (`125` -> `2:05`).
pub fn seconds_padded(total_seconds: u64) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Une nombres de artistas con `", "` respetando el orden recibido.
pub fn join_artists<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().collect::<Vec<_>>().join(", ")
}

/// Sube la miniatura de JioSaavn de 150x150 a 500x500 cuando la URL lo permite.
pub fn upgrade_thumbnail(url: &str) -> String {
    url.replace("150x150", "500x500")
}

/// Descarta cadenas vacías o con solo espacios.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
