//! Ollama probe client.
//!
//! This module implements `ModelProbe` against Ollama's local HTTP API. Every
//! call carries its own timeout so an absent or hung server never stalls the
//! caller, and every failure is logged and folded into a plain result.

use async_trait::async_trait;
use hearth_abstraction::{LoadOutcome, ModelProbe, ProbeError, RawModelDescriptor};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{normalize_base_url, ProbeConfig};

/// Prompt sent by the residency probe.
const RESIDENCY_PROMPT: &str = "hi";

/// Ollama probe client.
#[derive(Debug)]
pub struct OllamaProbe {
    /// The base URL for the Ollama API (default: "http://localhost:11434").
    base_url: RwLock<String>,
    /// HTTP client for making requests.
    client: Client,
    liveness_timeout: Duration,
    residency_timeout: Duration,
    list_timeout: Duration,
    load_timeout: Duration,
}

impl OllamaProbe {
    /// Creates a new `OllamaProbe` from probe settings.
    #[must_use]
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            base_url: RwLock::new(normalize_base_url(&config.base_url)),
            client: Client::new(),
            liveness_timeout: config.liveness_timeout(),
            residency_timeout: config.residency_timeout(),
            list_timeout: config.list_timeout(),
            load_timeout: config.load_timeout(),
        }
    }

    /// Creates a new `OllamaProbe` with default timeouts and a custom base URL.
    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        Self::new(&ProbeConfig { base_url: base_url.to_string(), ..ProbeConfig::default() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }

    fn send_error(&self, e: &reqwest::Error, timeout: Duration) -> ProbeError {
        if e.is_timeout() {
            ProbeError::Timeout(timeout)
        } else if e.is_connect() {
            ProbeError::Unreachable(format!(
                "Ollama server not reachable at {}. Start it with 'ollama serve'.",
                self.base_url()
            ))
        } else {
            ProbeError::Unreachable(format!("Network error: {e}"))
        }
    }

    /// Turn a non-2xx response into `ProbeError::Http`, keeping Ollama's own message.
    async fn status_error(response: reqwest::Response) -> ProbeError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<OllamaError>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        ProbeError::Http { status, message }
    }

    async fn version(&self) -> Result<(), ProbeError> {
        let response = self
            .client
            .get(self.url("/api/version"))
            .timeout(self.liveness_timeout)
            .send()
            .await
            .map_err(|e| self.send_error(&e, self.liveness_timeout))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }

    async fn tags(&self) -> Result<Vec<RawModelDescriptor>, ProbeError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .timeout(self.list_timeout)
            .send()
            .await
            .map_err(|e| self.send_error(&e, self.list_timeout))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let tags: OllamaTagsResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout(self.list_timeout)
            } else {
                ProbeError::Decode(format!("Failed to parse model listing: {e}"))
            }
        })?;
        Ok(tags.models)
    }

    async fn generate(
        &self,
        name: &str,
        prompt: &str,
        num_predict: Option<u32>,
        timeout: Duration,
    ) -> Result<(), ProbeError> {
        let request_body = OllamaGenerateRequest {
            model: name.to_string(),
            prompt: prompt.to_string(),
            stream: false,
            options: num_predict.map(|n| OllamaOptions { num_predict: Some(n) }),
        };

        let response = self
            .client
            .post(self.url("/api/generate"))
            .timeout(timeout)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.send_error(&e, timeout))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }
}

// Ollama API request/response structures
#[derive(Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<RawModelDescriptor>,
}

#[derive(Deserialize)]
struct OllamaError {
    error: String,
}

#[async_trait]
impl ModelProbe for OllamaProbe {
    async fn is_running(&self) -> bool {
        match self.version().await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, base_url = %self.base_url(), "Ollama liveness check failed");
                false
            }
        }
    }

    async fn list_models(&self) -> Vec<RawModelDescriptor> {
        if !self.is_running().await {
            return Vec::new();
        }

        match self.tags().await {
            Ok(models) => {
                debug!(count = models.len(), "Listed Ollama models");
                models
            }
            Err(e) => {
                warn!(error = %e, base_url = %self.base_url(), "Failed to list Ollama models");
                Vec::new()
            }
        }
    }

    async fn load_model(&self, name: &str) -> LoadOutcome {
        let started = Instant::now();
        match self.generate(name, "", None, self.load_timeout).await {
            Ok(()) => {
                let elapsed = started.elapsed();
                info!(model = %name, elapsed = ?elapsed, "Loaded model");
                LoadOutcome::Loaded { elapsed }
            }
            Err(e) => {
                warn!(model = %name, error = %e, "Failed to load model");
                LoadOutcome::Failed { error: e.user_message() }
            }
        }
    }

    async fn check_model_loaded(&self, name: &str) -> Result<bool, ProbeError> {
        // No introspection endpoint exists; answering a 1-token generation in
        // time is taken as proof of residency.
        self.generate(name, RESIDENCY_PROMPT, Some(1), self.residency_timeout).await?;
        Ok(true)
    }

    fn base_url(&self) -> String {
        self.base_url.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_base_url(&self, base_url: &str) {
        let normalized = normalize_base_url(base_url);
        *self.base_url.write().unwrap_or_else(PoisonError::into_inner) = normalized;
    }
}
