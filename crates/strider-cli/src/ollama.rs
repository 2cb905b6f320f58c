//! Ollama reachability probe.
//!
//! Fetches the list of locally downloaded models from `/api/tags` so the CLI
//! can warn early when the server is down or the vision model is missing.

use std::time::Duration;

use serde::Deserialize;

/// A single model entry returned by Ollama's `/api/tags` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaModel {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

/// Ping the Ollama server and return the list of available models.
///
/// Blocking; call it before the async runtime starts.
pub fn fetch_models(base_url: &str, timeout: Duration) -> Result<Vec<OllamaModel>, String> {
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
    let response = client
        .get(&url)
        .send()
        .map_err(|e| format!("Ollama unreachable at {}: {}", url, e))?;

    if !response.status().is_success() {
        return Err(format!("Ollama returned HTTP {}", response.status()));
    }

    let tags: TagsResponse = response
        .json()
        .map_err(|e| format!("Failed to parse Ollama response: {}", e))?;
    Ok(tags.models)
}

/// `true` when `wanted` is among `models`.  An untagged name matches its
/// `:latest` tag.
pub fn has_model(models: &[OllamaModel], wanted: &str) -> bool {
    models.iter().any(|m| {
        m.name == wanted || (!wanted.contains(':') && m.name == format!("{wanted}:latest"))
    })
}
