//! Bearer tokens for providers that need a credential exchange (Spotify).
//!
//! One [`TokenCache`] per provider, shared by every search for the lifetime of
//! the process. The slot is refreshed lazily: on first use and whenever
//! `now >= expires_at_epoch_millis`. Refreshes are single-flight; callers that
//! arrive while a refresh is running wait for it and reuse its token.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use parking_lot::RwLock;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::TokenError;

/// Cached bearer token and its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderToken {
    pub value: String,
    pub expires_at_epoch_millis: i64,
}

impl ProviderToken {
    pub fn is_valid_at(&self, now_epoch_millis: i64) -> bool {
        now_epoch_millis < self.expires_at_epoch_millis
    }
}

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Seconds
    pub expires_in: i64,
}

/// Performs the actual credential exchange.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(&self) -> Result<TokenGrant, TokenError>;
}

/// OAuth client-credentials grant against a token endpoint.
pub struct ClientCredentialsExchanger {
    client: reqwest::Client,
    token_url: String,
    basic_auth: String,
}

impl ClientCredentialsExchanger {
    pub fn new(client: reqwest::Client, token_url: String, client_id: &str, client_secret: &str) -> Self {
        let credentials = STANDARD.encode(format!("{}:{}", client_id, client_secret));
        Self {
            client,
            token_url,
            basic_auth: format!("Basic {}", credentials),
        }
    }
}

#[async_trait]
impl TokenExchanger for ClientCredentialsExchanger {
    async fn exchange(&self) -> Result<TokenGrant, TokenError> {
        let response = self
            .client
            .post(&self.token_url)
            .header(AUTHORIZATION, &self.basic_auth)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

pub struct TokenCache {
    exchanger: Arc<dyn TokenExchanger>,
    slot: RwLock<Option<ProviderToken>>,
    refresh_gate: Mutex<()>,
}

impl TokenCache {
    pub fn new(exchanger: Arc<dyn TokenExchanger>) -> Self {
        Self {
            exchanger,
            slot: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Starts with a token already in the slot.
    pub fn with_token(exchanger: Arc<dyn TokenExchanger>, token: ProviderToken) -> Self {
        let cache = Self::new(exchanger);
        *cache.slot.write() = Some(token);
        cache
    }

    /// Returns a valid bearer token, exchanging credentials if the slot is
    /// empty or expired.
    pub async fn get_token(&self) -> Result<String, TokenError> {
        if let Some(value) = self.fresh_value() {
            return Ok(value);
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(value) = self.fresh_value() {
            debug!("🔑 Token renovado por otra petición");
            return Ok(value);
        }

        debug!("🔑 Solicitando nuevo token");
        let grant = self.exchanger.exchange().await?;
        let token = ProviderToken {
            value: grant.access_token,
            expires_at_epoch_millis: expiry_from_now(grant.expires_in),
        };
        info!("🔑 Token renovado, expira en {}s", grant.expires_in);

        let value = token.value.clone();
        *self.slot.write() = Some(token);
        Ok(value)
    }

    /// Drops the cached token so the next call exchanges again.
    pub fn invalidate(&self) {
        *self.slot.write() = None;
    }

    pub fn cached(&self) -> Option<ProviderToken> {
        self.slot.read().clone()
    }

    fn fresh_value(&self) -> Option<String> {
        let now = now_epoch_millis();
        self.slot
            .read()
            .as_ref()
            .filter(|token| token.is_valid_at(now))
            .map(|token| token.value.clone())
    }
}

fn now_epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// `expires_in` viene del upstream: negativos cuentan como 0 y nunca desborda.
fn expiry_from_now(expires_in_secs: i64) -> i64 {
    now_epoch_millis().saturating_add(expires_in_secs.max(0).saturating_mul(1000))
}
