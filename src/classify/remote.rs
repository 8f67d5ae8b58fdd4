// Remote LLM classification backend
// Sends the twelve window features plus the previous activity to an
// OpenAI-compatible chat-completions endpoint and parses a strict JSON
// reply. Each tick is an independent attempt with no retry or backoff; a
// failed call degrades that tick and the next one starts fresh.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::classify::backend::{ClassifierBackend, ClassifierError};
use crate::classify::types::{ClassificationRequest, ClassificationResponse, UNKNOWN_GLYPH};

/// Configuration for the remote backend
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Chat-completions endpoint URL
    pub endpoint: String,

    /// Model identifier
    pub model: String,

    /// API key; read from `OPENAI_API_KEY` by default
    pub api_key: Option<String>,

    /// Per-request timeout. Should not exceed the orchestrator tick
    /// interval, or a hung call would starve subsequent ticks.
    pub timeout: Duration,

    /// Sampling temperature; low, the reply must be parseable JSON
    pub temperature: f32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            timeout: Duration::from_secs(2),
            temperature: 0.2,
        }
    }
}

/// Chat-completions request body
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat-completions response body (the parts we read)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// The JSON object the model is instructed to reply with
#[derive(Debug, Deserialize)]
struct ModelReply {
    activity: String,
    confidence: f64,
    #[serde(default)]
    glyph: Option<String>,
    #[serde(default)]
    rationale: Option<String>,
}

/// LLM-backed classifier.
///
/// The bias contract lives in the prompt: the previous activity is
/// presented as a soft prior the model must re-affirm unless the feature
/// pattern shows a strong, unambiguous shift.
pub struct RemoteClassifier {
    config: RemoteConfig,
    client: Client,
}

impl RemoteClassifier {
    /// Create with default settings (API key from the environment)
    pub fn new() -> Self {
        Self::with_config(RemoteConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(config: RemoteConfig) -> Self {
        RemoteClassifier {
            config,
            client: Client::new(),
        }
    }

    /// Check if an API key is available
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Build the classification prompt from a request
    fn build_prompt(&self, request: &ClassificationRequest) -> String {
        let f = &request.features;
        let mut prompt = String::from(
            "You label human activity from smartphone motion statistics.\n\
             Window features over the last few seconds (mean / standard deviation):\n",
        );
        let rows = [
            ("accel_x (g)", f.accel_x),
            ("accel_y (g)", f.accel_y),
            ("accel_z (g)", f.accel_z),
            ("rotation_x (rad/s)", f.rotation_x),
            ("rotation_y (rad/s)", f.rotation_y),
            ("rotation_z (rad/s)", f.rotation_z),
        ];
        for (name, stats) in rows {
            prompt.push_str(&format!(
                "  {}: {:.4} / {:.4}\n",
                name, stats.mean, stats.std_dev
            ));
        }

        match &request.previous_activity {
            Some(previous) => {
                prompt.push_str(&format!("Previous activity: {}\n", previous));
                prompt.push_str(
                    "Treat the previous activity as a soft prior: only depart from it when \
                     the feature pattern shows a strong, unambiguous shift; otherwise \
                     re-affirm it.\n",
                );
            }
            None => prompt.push_str("Previous activity: none (first classification)\n"),
        }

        prompt.push_str(
            "Reply with a single JSON object, nothing else: \
             {\"activity\": \"<name>\", \"confidence\": <0-100>, \
             \"glyph\": \"<one emoji>\", \"rationale\": \"<one short sentence>\"}",
        );
        prompt
    }
}

impl Default for RemoteClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierBackend for RemoteClassifier {
    fn classify(
        &self,
        request: ClassificationRequest,
    ) -> impl std::future::Future<Output = Result<ClassificationResponse, ClassifierError>> + Send
    {
        async move {
            let api_key = self.config.api_key.as_deref().ok_or_else(|| {
                ClassifierError::NotConfigured("no API key set".to_string())
            })?;

            let body = ChatRequest {
                model: self.config.model.clone(),
                temperature: self.config.temperature,
                response_format: ResponseFormat {
                    format_type: "json_object".to_string(),
                },
                messages: vec![ChatMessage {
                    role: "user".to_string(),
                    content: self.build_prompt(&request),
                }],
            };

            let response = self
                .client
                .post(&self.config.endpoint)
                .bearer_auth(api_key)
                .timeout(self.config.timeout)
                .json(&body)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        ClassifierError::Timeout
                    } else {
                        ClassifierError::Transport(e.to_string())
                    }
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(ClassifierError::Transport(format!("HTTP {}", status)));
            }

            let chat: ChatResponse = response
                .json()
                .await
                .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))?;

            let content = chat
                .choices
                .first()
                .map(|choice| choice.message.content.as_str())
                .ok_or_else(|| {
                    ClassifierError::MalformedResponse("response had no choices".to_string())
                })?;

            parse_reply(content)
        }
    }
}

/// Parse the model's reply text into a classification response.
///
/// Accepts a bare JSON object or one wrapped in a Markdown code fence;
/// anything else is a malformed response (the tick degrades, it does not
/// fail the session).
fn parse_reply(text: &str) -> Result<ClassificationResponse, ClassifierError> {
    let json = extract_json_object(text).ok_or_else(|| {
        ClassifierError::MalformedResponse("no JSON object in reply".to_string())
    })?;

    let reply: ModelReply = serde_json::from_str(json)
        .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))?;

    let activity = reply.activity.trim();
    if activity.is_empty() {
        return Err(ClassifierError::MalformedResponse(
            "empty activity name".to_string(),
        ));
    }

    Ok(ClassificationResponse {
        activity: activity.to_string(),
        confidence: reply.confidence.clamp(0.0, 100.0).round() as u8,
        glyph: reply
            .glyph
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_GLYPH.to_string()),
        rationale: reply.rationale.unwrap_or_default(),
    })
}

/// Slice out the outermost JSON object, tolerating code fences and prose
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
