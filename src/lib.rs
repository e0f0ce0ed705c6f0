//! Multi-platform music search.
//!
//! Queries YouTube, Spotify and JioSaavn concurrently and merges the answers
//! into one list of normalized [`Song`]s.

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod sources;

pub use aggregator::{Aggregator, SearchReport};
pub use cache::{CacheKey, ResultCache};
pub use config::Config;
pub use error::{ProviderError, ProviderErrorKind, SearchError, TokenError};
pub use sources::{MusicSource, Platform, PlatformSet, Song};
