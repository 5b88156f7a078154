use std::path::{Path, PathBuf};

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

/// Client for an OpenAI-compatible vision-language chat endpoint. The
/// pipeline treats it as opaque: keyframe images in, descriptive text out.
pub struct SceneDescriber {
    http: Client,
    endpoint: String,
    api_token: Option<String>,
    model: String,
}

/// Text produced for one scene's keyframes.
#[derive(Debug, Clone)]
pub struct SceneDescription {
    pub text: String,
    pub confidence: Option<f64>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

const PROMPT: &str = concat!(
    "These images are keyframes sampled in order from one scene of a video. ",
    "Describe what happens in the scene in two or three sentences. ",
    "Mention only what is visible; do not speculate beyond the frames."
);

impl SceneDescriber {
    pub fn new(endpoint: String, api_token: Option<String>, model: String) -> Self {
        Self {
            http: Client::new(),
            endpoint,
            api_token,
            model,
        }
    }

    /// Send the keyframes, in timeline order, and return the model's
    /// description of the scene.
    pub async fn describe(&self, keyframe_paths: &[PathBuf]) -> Result<SceneDescription, VlmError> {
        if keyframe_paths.is_empty() {
            return Err(VlmError::NoKeyframes);
        }

        let mut content = vec![serde_json::json!({ "type": "text", "text": PROMPT })];
        for path in keyframe_paths {
            let bytes = tokio::fs::read(path).await?;
            let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
            content.push(serde_json::json!({
                "type": "image_url",
                "image_url": { "url": format!("data:{};base64,{encoded}", mime_for(path)) }
            }));
        }

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": content }],
            "max_tokens": 256
        });

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response: ChatResponse = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(VlmError::EmptyResponse)?;

        Ok(SceneDescription {
            text,
            confidence: None,
        })
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read keyframe: {0}")]
    Io(#[from] std::io::Error),

    #[error("no keyframes to describe")]
    NoKeyframes,

    #[error("model returned no choices")]
    EmptyResponse,
}
