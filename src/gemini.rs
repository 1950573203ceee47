//! HTTP client for the Gemini generateContent API

use crate::config::Config;
use crate::errors::{DashboardError, Result};
use crate::models::{Citation, RawSummary};
use crate::text_service::{TextService, parse_service_names};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error};

/// Text service backed by Gemini
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Default)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize, Default)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebChunk>,
}

#[derive(Deserialize, Default)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    fn citations(&self) -> Vec<Citation> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|meta| {
                meta.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .map(|web| Citation {
                        uri: web.uri.clone(),
                        title: web.title.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl GeminiClient {
    /// Create a new client from the dashboard configuration
    pub fn new(config: &Config) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(DashboardError::Configuration(
                "API key is required to initialize the Gemini client".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(format!("status-deck/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DashboardError::Http)?;

        Ok(Self {
            client,
            base_url: config.gemini_base_url.clone(),
            model: config.gemini_model.clone(),
            api_key: config.api_key.clone(),
            timeout: config.http_timeout,
        })
    }

    async fn generate(&self, prompt: &str, with_search: bool) -> Result<GenerateResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            tools: if with_search {
                vec![json!({ "google_search": {} })]
            } else {
                Vec::new()
            },
        };

        debug!("Requesting {} (search: {}, timeout: {:?})", url, with_search, self.timeout);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini request to model {} failed: {}", self.model, e);
                DashboardError::classify(e.status().map(|s| s.as_u16()), &e.to_string())
            })?;

        self.handle_response(response).await
    }

    async fn handle_response(&self, response: Response) -> Result<GenerateResponse> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DashboardError::Generic(format!("failed to read response body: {}", e)))?;

        if status.is_success() {
            return serde_json::from_str(&body)
                .map_err(|e| DashboardError::Generic(format!("unexpected response format: {}", e)));
        }

        let message = error_message(&body).unwrap_or_else(|| format!("HTTP {}: {}", status, body));
        error!("Gemini returned {}: {}", status, message);

        Err(DashboardError::classify(Some(status.as_u16()), &message))
    }
}

/// Pull `error.status` and `error.message` out of a Gemini error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let message = error["message"].as_str().unwrap_or("unknown error");
    Some(match error["status"].as_str() {
        Some(status) => format!("{} ({})", message, status),
        None => message.to_string(),
    })
}

const SUMMARY_PROMPT: &str = "Provide a brief, general summary of any major, widespread internet or \
    popular service outages currently being reported globally, as if you were synthesizing \
    information like Down Detector. Mention 2-3 fictional but realistic service disruptions if no \
    major real ones are immediately apparent or focus on general trends. Use Google Search for \
    current information if available. For example: 'Users are reporting widespread issues with \
    social media platform 'ConnectSphere', primarily affecting login and content loading. \
    Additionally, major ISP 'QuantumLink' seems to be experiencing DNS resolution problems in the \
    Pacific Northwest region.'";

fn outage_prompt(service_name: &str) -> String {
    format!(
        "The service \"{name}\" is experiencing a simulated outage. Briefly describe a plausible, \
         concise technical reason for this outage in one short sentence (max 15-20 words). \
         For example, 'A critical database cluster is unresponsive' or 'Authentication services \
         are failing due to a recent deployment misconfiguration.' Make the reason sound specific \
         to what might affect a large online service like {name}.",
        name = service_name
    )
}

#[async_trait]
impl TextService for GeminiClient {
    async fn list_related_names(&self, excluding: &[String], count: usize) -> Result<Vec<String>> {
        let prompt = format!(
            "List {} popular and critical online services or cloud platforms, different from {}, \
             that businesses and consumers rely on heavily. Provide just the names, comma-separated. \
             Ensure they are distinct and commonly recognized. Examples: GitHub, Zoom, Slack.",
            count,
            excluding.join(", ")
        );
        let response = self.generate(&prompt, false).await?;
        Ok(parse_service_names(&response.text(), excluding, count))
    }

    async fn describe_outage(&self, service_name: &str) -> Result<String> {
        Ok(self.generate(&outage_prompt(service_name), false).await?.text())
    }

    async fn summarize_global_outages(&self) -> Result<RawSummary> {
        let response = self.generate(SUMMARY_PROMPT, true).await?;
        Ok(RawSummary {
            text: response.text(),
            citations: response.citations(),
        })
    }
}
