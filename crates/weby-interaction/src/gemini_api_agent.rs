//! GeminiApiAgent - Direct REST API implementation for Gemini.
//!
//! Sends the conversation history plus the new user message to
//! `models/{model}:generateContent` and returns the first candidate's text.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use weby_core::chat::{GenerationClient, GenerationFailure, Speaker, Turn};
use weby_core::config::ChatConfig;
use weby_core::error::Result;
use weby_core::secret::SecretService;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Generation client that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiAgent {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    system_instruction: Option<String>,
}

impl GeminiApiAgent {
    /// Creates a new agent with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: Some(api_key.into()).filter(|key: &String| !key.trim().is_empty()),
            model: model.into(),
            base_url: BASE_URL.to_string(),
            system_instruction: None,
        }
    }

    /// Creates an agent without credentials.
    ///
    /// Every call fails with [`GenerationFailure::Unauthorized`].
    pub fn unauthenticated(model: impl Into<String>) -> Self {
        Self::new("", model)
    }

    /// Builds an agent from secret.json and the chat settings.
    ///
    /// A `model_name` in secret.json takes precedence over `chat.model`.
    /// A missing key is not an error: the agent is created unauthenticated.
    pub async fn from_secrets(secrets: &dyn SecretService, chat: &ChatConfig) -> Result<Self> {
        let gemini = secrets.load_secrets().await?.gemini;
        let model = gemini
            .as_ref()
            .and_then(|config| config.model_name.clone())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| chat.model.clone());

        match gemini.map(|config| config.api_key) {
            Some(api_key) if !api_key.trim().is_empty() => Ok(Self::new(api_key, model)),
            _ => {
                tracing::warn!("no Gemini API key configured; replies will use the fallback message");
                Ok(Self::unauthenticated(model))
            }
        }
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Adds a system instruction that will be sent alongside every request.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Points the agent at another endpoint root (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn build_request<'a>(&'a self, new_message: &'a str, history: &'a [Turn]) -> GenerateContentRequest<'a> {
        let mut contents: Vec<Content<'a>> = history
            .iter()
            .map(|turn| Content {
                role: gemini_role(turn.speaker),
                parts: vec![Part { text: &turn.text }],
            })
            .collect();
        contents.push(Content {
            role: gemini_role(Speaker::User),
            parts: vec![Part { text: new_message }],
        });

        GenerateContentRequest {
            contents,
            system_instruction: self.system_instruction.as_deref().map(|text| SystemInstruction {
                parts: vec![Part { text }],
            }),
        }
    }

    async fn send_request(&self, body: &GenerateContentRequest<'_>) -> std::result::Result<String, GenerationFailure> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            GenerationFailure::Unauthorized("Gemini API key is not configured".into())
        })?;
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        tracing::debug!(model = %self.model, contents = body.contents.len(), "sending Gemini request");

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| GenerationFailure::Transport(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| GenerationFailure::Malformed(format!("Failed to parse Gemini response: {err}")))?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl GenerationClient for GeminiApiAgent {
    async fn generate(
        &self,
        new_message: &str,
        history: &[Turn],
    ) -> std::result::Result<String, GenerationFailure> {
        let request = self.build_request(new_message, history);
        self.send_request(&request).await
    }
}

impl std::fmt::Debug for GeminiApiAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiApiAgent")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

fn gemini_role(speaker: Speaker) -> &'static str {
    match speaker {
        Speaker::User => "user",
        Speaker::Assistant => "model",
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Joins the text parts of the first candidate.
fn extract_text_response(
    response: GenerateContentResponse,
) -> std::result::Result<String, GenerationFailure> {
    let parts = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .ok_or(GenerationFailure::EmptyPayload)?;

    let texts: Vec<String> = parts.into_iter().filter_map(|part| part.text).collect();
    if texts.is_empty() {
        return Err(GenerationFailure::EmptyPayload);
    }
    Ok(texts.concat())
}

fn map_http_error(status: StatusCode, body: String) -> GenerationFailure {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    GenerationFailure::Http {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "gemini-test";

    fn agent_for(server: &MockServer) -> GeminiApiAgent {
        GeminiApiAgent::new("test-key", MODEL).with_base_url(format!("{}/v1beta/models", server.uri()))
    }

    fn endpoint() -> String {
        format!("/v1beta/models/{MODEL}:generateContent")
    }

    #[test]
    fn test_request_maps_roles_and_appends_new_message() {
        let agent = GeminiApiAgent::new("k", MODEL).with_system_instruction("be nice");
        let history = vec![Turn::assistant("Hi there!"), Turn::user("prices?"), Turn::assistant("₹4,999")];

        let request = agent.build_request("and delivery?", &history);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "contents": [
                    {"role": "model", "parts": [{"text": "Hi there!"}]},
                    {"role": "user", "parts": [{"text": "prices?"}]},
                    {"role": "model", "parts": [{"text": "₹4,999"}]},
                    {"role": "user", "parts": [{"text": "and delivery?"}]},
                ],
                "systemInstruction": {"parts": [{"text": "be nice"}]},
            })
        );
    }

    #[test]
    fn test_request_without_system_instruction_omits_field() {
        let agent = GeminiApiAgent::new("k", MODEL);
        let value = serde_json::to_value(agent.build_request("hi", &[])).unwrap();
        assert!(value.get("systemInstruction").is_none());
        assert_eq!(value["contents"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_extract_joins_parts_of_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "We build "}, {"text": "websites."}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(extract_text_response(response).unwrap(), "We build websites.");
    }

    #[test]
    fn test_extract_without_candidates_is_empty_payload() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(extract_text_response(response), Err(GenerationFailure::EmptyPayload));

        let response: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        assert_eq!(extract_text_response(response), Err(GenerationFailure::EmptyPayload));
    }

    #[test]
    fn test_map_http_error_uses_error_body() {
        let body = json!({"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}});
        let failure = map_http_error(StatusCode::BAD_REQUEST, body.to_string());
        assert_eq!(
            failure,
            GenerationFailure::Http {
                status: 400,
                message: "INVALID_ARGUMENT: API key not valid.".to_string(),
            }
        );

        let failure = map_http_error(StatusCode::BAD_GATEWAY, "upstream down".to_string());
        assert_eq!(
            failure,
            GenerationFailure::Http {
                status: 502,
                message: "upstream down".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_generate_happy_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoint()))
            .and(header(API_KEY_HEADER, "test-key"))
            .and(body_partial_json(json!({
                "contents": [
                    {"role": "model", "parts": [{"text": "Hi there!"}]},
                    {"role": "user", "parts": [{"text": "What services do you offer?"}]}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "We build websites."}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = agent_for(&server)
            .generate("What services do you offer?", &[Turn::assistant("Hi there!")])
            .await
            .unwrap();
        assert_eq!(reply, "We build websites.");
    }

    #[tokio::test]
    async fn test_generate_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoint()))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}
            })))
            .mount(&server)
            .await;

        let failure = agent_for(&server).generate("hi", &[]).await.unwrap_err();
        assert_eq!(
            failure,
            GenerationFailure::Http {
                status: 503,
                message: "UNAVAILABLE: The model is overloaded.".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_generate_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoint()))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html>", "text/html"))
            .mount(&server)
            .await;

        let failure = agent_for(&server).generate("hi", &[]).await.unwrap_err();
        assert!(matches!(failure, GenerationFailure::Malformed(_)));
    }

    #[tokio::test]
    async fn test_generate_without_key_does_not_send() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let agent = GeminiApiAgent::unauthenticated(MODEL)
            .with_base_url(format!("{}/v1beta/models", server.uri()));
        assert!(!agent.has_api_key());

        let failure = agent.generate("hi", &[]).await.unwrap_err();
        assert!(matches!(failure, GenerationFailure::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_generate_connection_refused_is_transport_failure() {
        let agent = GeminiApiAgent::new("test-key", MODEL).with_base_url("http://127.0.0.1:1/v1beta/models");
        let failure = agent.generate("hi", &[]).await.unwrap_err();
        assert!(matches!(failure, GenerationFailure::Transport(_)));
    }

    #[test]
    fn test_debug_hides_key() {
        let rendered = format!("{:?}", GeminiApiAgent::new("super-secret", MODEL));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("has_api_key: true"));
    }
}
