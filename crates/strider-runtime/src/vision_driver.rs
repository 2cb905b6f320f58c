//! [`VisionDriver`] – camera-frame classification over Ollama.
//!
//! Frames are PNG-encoded, base64-wrapped and posted to the model server's
//! `/api/generate` endpoint together with a fixed system prompt.  The reply
//! text is returned trimmed; interpreting it is the caller's job (see
//! [`crate::decision`]).
//!
//! The [`Classifier`] trait is the seam the navigation loop depends on, so
//! tests can script responses without a model server.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use strider_runtime::vision_driver::{Classifier, VisionDriver, NAVIGATION_PROMPT};
//! use strider_types::CameraFrame;
//!
//! # async fn demo(frame: CameraFrame) -> Result<(), Box<dyn std::error::Error>> {
//! let driver = VisionDriver::new("http://localhost:11434", "qwen3-vl:4b", Duration::from_secs(60))?;
//! // Requires a running Ollama instance.
//! let reply = driver.classify(&frame, NAVIGATION_PROMPT).await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use serde::{Deserialize, Serialize};
use strider_types::{CameraFrame, StriderError};
use thiserror::Error;
use tracing::debug;

// ─────────────────────────────────────────────────────────────────────────────
// Prompts
// ─────────────────────────────────────────────────────────────────────────────

/// System prompt sent with every classification request.
pub const SYSTEM_PROMPT: &str = "You are a real-time robot vision system. Be extremely concise and fast. \
Do not be chatty. Output only the essential information requested.";

/// Instruction asking the model for one navigation label on its first line.
pub const NAVIGATION_PROMPT: &str = "\
You are a robot navigation assistant. Analyze the camera view and respond with ONLY one of these:
- FORWARD: if the path ahead is completely clear and safe to move
- SLOW: if there are potential obstacles or you need to be cautious
- OBSTACLE_LEFT: if there's an obstacle ahead but left side looks clear
- OBSTACLE_RIGHT: if there's an obstacle ahead but right side looks clear
- BLOCKED: if the path is completely blocked in all directions

Then briefly explain what you see.";

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise while classifying a frame.
#[derive(Error, Debug)]
pub enum VisionError {
    /// The HTTP request to the model server failed (includes client timeouts).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered, but not with a usable reply.
    #[error("Unexpected response: {0}")]
    BadResponse(String),
    /// The frame buffer does not match its dimensions.
    #[error("Malformed frame: {width}x{height} with {len} bytes")]
    MalformedFrame { width: u32, height: u32, len: usize },
    /// PNG encoding failed.
    #[error("Encode error: {0}")]
    Encode(#[from] image::ImageError),
    /// The classification did not finish within its deadline.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl From<VisionError> for StriderError {
    fn from(e: VisionError) -> Self {
        StriderError::ClassificationFailed(e.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classifier seam
// ─────────────────────────────────────────────────────────────────────────────

/// Anything that can turn a camera frame plus an instruction into text.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, frame: &CameraFrame, instruction: &str) -> Result<String, VisionError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire shapes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    images: [String; 1],
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// VisionDriver
// ─────────────────────────────────────────────────────────────────────────────

/// Async client for Ollama's `/api/generate` endpoint.
///
/// Construct once and reuse across navigation steps.
pub struct VisionDriver {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl VisionDriver {
    /// Create a driver for `model` at `base_url`.  Every request is bounded
    /// by `timeout`.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, VisionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&'a self, instruction: &'a str, image_b64: String) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt: instruction,
            system: SYSTEM_PROMPT,
            images: [image_b64],
            stream: false,
        }
    }
}

#[async_trait]
impl Classifier for VisionDriver {
    async fn classify(&self, frame: &CameraFrame, instruction: &str) -> Result<String, VisionError> {
        let png = encode_png(frame)?;
        let body = self.request_body(instruction, STANDARD.encode(&png));
        let url = format!("{}/api/generate", self.base_url);
        debug!(model = %self.model, png_bytes = png.len(), "querying vision model");

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(VisionError::BadResponse(format!(
                "vision model returned status {}: {}",
                status.as_u16(),
                text
            )));
        }

        let reply: GenerateResponse = response.json().await?;
        let text = reply.response.trim();
        if text.is_empty() {
            return Err(VisionError::BadResponse("empty response".into()));
        }
        Ok(text.to_string())
    }
}

/// Encode an RGBA frame as PNG.
pub fn encode_png(frame: &CameraFrame) -> Result<Vec<u8>, VisionError> {
    if !frame.is_well_formed() {
        return Err(VisionError::MalformedFrame {
            width: frame.width,
            height: frame.height,
            len: frame.data.len(),
        });
    }
    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(&frame.data, frame.width, frame.height, ColorType::Rgba8)?;
    Ok(png)
}
