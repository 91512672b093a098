//! Text provider backed by a Hugging Face style inference API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::assistant::{ProviderError, TextProvider};
use crate::config::AssistantSettings;

use super::error::InfraError;

const TARGET: &str = "faqbase::infra::summarizer";

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_length: u32,
    min_length: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    do_sample: bool,
}

impl InferenceParameters {
    fn summary() -> Self {
        Self {
            max_length: 150,
            min_length: 40,
            temperature: None,
            do_sample: false,
        }
    }

    fn generation() -> Self {
        Self {
            max_length: 300,
            min_length: 50,
            temperature: Some(0.7),
            do_sample: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SummaryItem {
    summary_text: String,
}

#[derive(Debug, Deserialize)]
struct GeneratedItem {
    generated_text: String,
}

#[derive(Clone)]
pub struct InferenceClient {
    client: Client,
    api_key: String,
    summary_url: String,
    generation_url: String,
}

impl InferenceClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        summary_model: &str,
        generation_model: &str,
        timeout: Duration,
    ) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(concat!("faqbase/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;
        let base = base_url.trim_end_matches('/');

        Ok(Self {
            client,
            api_key: api_key.into(),
            summary_url: format!("{base}/{summary_model}"),
            generation_url: format!("{base}/{generation_model}"),
        })
    }

    /// Build a client when an API key is configured; `Ok(None)` otherwise.
    pub fn from_settings(settings: &AssistantSettings) -> Result<Option<Self>, InfraError> {
        let Some(api_key) = settings.api_key.as_deref() else {
            return Ok(None);
        };
        Self::new(
            api_key,
            &settings.base_url,
            &settings.summary_model,
            &settings.generation_model,
            settings.request_timeout,
        )
        .map(Some)
    }

    async fn infer<T>(
        &self,
        url: &str,
        inputs: &str,
        parameters: InferenceParameters,
    ) -> Result<Vec<T>, ProviderError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&InferenceRequest { inputs, parameters })
            .send()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let items = response
            .json::<Vec<T>>()
            .await
            .map_err(|err| ProviderError::Decode(err.to_string()))?;
        debug!(target: TARGET, url, items = items.len(), "Inference call completed");
        Ok(items)
    }
}

fn first_text(texts: impl IntoIterator<Item = String>) -> Result<String, ProviderError> {
    texts
        .into_iter()
        .map(|text| text.trim().to_string())
        .find(|text| !text.is_empty())
        .ok_or(ProviderError::Empty)
}

#[async_trait]
impl TextProvider for InferenceClient {
    async fn summarize(&self, text: &str) -> Result<String, ProviderError> {
        let items: Vec<SummaryItem> = self
            .infer(&self.summary_url, text, InferenceParameters::summary())
            .await?;
        first_text(items.into_iter().map(|item| item.summary_text))
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let items: Vec<GeneratedItem> = self
            .infer(&self.generation_url, prompt, InferenceParameters::generation())
            .await?;
        first_text(items.into_iter().map(|item| item.generated_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_payload_matches_inference_contract() {
        let payload = serde_json::to_value(InferenceRequest {
            inputs: "text",
            parameters: InferenceParameters::summary(),
        })
        .expect("serialize");

        assert_eq!(
            payload,
            serde_json::json!({
                "inputs": "text",
                "parameters": {"max_length": 150, "min_length": 40, "do_sample": false}
            })
        );
    }

    #[test]
    fn generation_payload_carries_temperature() {
        let payload = serde_json::to_value(InferenceParameters::generation()).expect("serialize");
        assert_eq!(payload["temperature"], serde_json::json!(0.7));
        assert_eq!(payload["do_sample"], serde_json::json!(true));
    }

    #[test]
    fn blank_provider_text_is_empty() {
        assert!(matches!(
            first_text(vec!["   ".to_string()]),
            Err(ProviderError::Empty)
        ));
        assert_eq!(
            first_text(vec![" ".to_string(), " summary ".to_string()]).expect("text"),
            "summary"
        );
    }

    #[test]
    fn no_api_key_disables_provider() {
        let settings = AssistantSettings {
            api_key: None,
            base_url: "https://example.invalid/models".to_string(),
            summary_model: "s".to_string(),
            generation_model: "g".to_string(),
            request_timeout: Duration::from_secs(1),
        };
        assert!(
            InferenceClient::from_settings(&settings)
                .expect("settings")
                .is_none()
        );
    }

    #[test]
    fn model_urls_join_base_without_double_slash() {
        let client = InferenceClient::new(
            "key",
            "https://example.invalid/models/",
            "facebook/bart-large-cnn",
            "microsoft/DialoGPT-medium",
            Duration::from_secs(1),
        )
        .expect("client");
        assert_eq!(
            client.summary_url,
            "https://example.invalid/models/facebook/bart-large-cnn"
        );
        assert_eq!(
            client.generation_url,
            "https://example.invalid/models/microsoft/DialoGPT-medium"
        );
    }
}
