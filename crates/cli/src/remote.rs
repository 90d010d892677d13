use std::time::Duration;

use chatdesk_core::config::BotConfig;
use chatdesk_core::domain::settings::SettingsPayload;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("bot.settings_url is not configured (set CHATDESK_BOT_SETTINGS_URL)")]
    NotConfigured,
    #[error("bot api token contains characters that cannot be sent in a header")]
    InvalidToken,
    #[error("request to `{url}` failed: {source}")]
    Request { url: String, source: reqwest::Error },
    #[error("`{url}` answered {status}: {body}")]
    Status { url: String, status: u16, body: String },
}

/// HTTP client for the bot's settings resource (`GET`/`PUT` of `{ promptSystem }`).
pub struct SettingsClient {
    http: reqwest::Client,
    url: String,
}

impl SettingsClient {
    pub fn from_config(config: &BotConfig) -> Result<Self, RemoteError> {
        let url = config.settings_url.clone().ok_or(RemoteError::NotConfigured)?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|_| RemoteError::InvalidToken)?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|source| RemoteError::Request { url: url.clone(), source })?;

        Ok(Self { http, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> Result<SettingsPayload, RemoteError> {
        debug!(event_name = "cli.remote.fetch", url = %self.url, "fetching bot settings");
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|source| RemoteError::Request { url: self.url.clone(), source })?;

        self.decode(response).await
    }

    pub async fn store(&self, prompt_system: &str) -> Result<SettingsPayload, RemoteError> {
        debug!(
            event_name = "cli.remote.store",
            url = %self.url,
            prompt_len = prompt_system.len(),
            "storing bot settings"
        );
        let response = self
            .http
            .put(&self.url)
            .json(&SettingsPayload::new(prompt_system))
            .send()
            .await
            .map_err(|source| RemoteError::Request { url: self.url.clone(), source })?;

        self.decode(response).await
    }

    async fn decode(&self, response: reqwest::Response) -> Result<SettingsPayload, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<SettingsPayload>()
            .await
            .map_err(|source| RemoteError::Request { url: self.url.clone(), source })
    }
}
