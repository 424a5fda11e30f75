use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::TranslationProvider;
use crate::config::TranslationConfig;
use crate::ProviderError;

/// Google Translate web endpoint client. A source of `auto` lets the service detect the language.
pub struct GoogleTranslateClient {
    client: Client,
    endpoint: String,
}

impl GoogleTranslateClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &TranslationConfig) -> Result<Self, ProviderError> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    async fn request(&self, source: &str, target: &str, text: &str) -> Result<Value, ProviderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("client", "gtx"), ("sl", source), ("tl", target), ("dt", "t")])
            .form(&[("q", text)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Network(format!("translation service returned HTTP {}", status)));
        }

        Ok(response.json().await?)
    }
}

/// Concatenate the translated sentence fragments of a response
fn translated_text(body: &Value) -> Result<String, ProviderError> {
    let fragments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::InvalidResponse("missing translation fragments".to_string()))?;

    let text: String = fragments
        .iter()
        .filter_map(|fragment| fragment.get(0).and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        return Err(ProviderError::InvalidResponse("empty translation".to_string()));
    }

    Ok(text)
}

#[async_trait]
impl TranslationProvider for GoogleTranslateClient {
    async fn translate(&self, source: &str, target: &str, text: &str) -> Result<String, ProviderError> {
        tracing::debug!("Translating {} chars {} -> {}", text.chars().count(), source, target);
        let body = self.request(source, target, text).await?;
        translated_text(&body)
    }
}
