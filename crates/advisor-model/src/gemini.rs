//! Gemini model client
//!
//! Talks to the Generative Language API (`generateContent`). The client owns
//! the conversation history: every user turn, model turn, and tool-result
//! turn is appended to an internal `contents` list that is re-sent with each
//! request, which is what makes the provider an opaque history boundary for
//! the engine.

use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use advisor_core::{Error, Part, Result, ToolDefinition};

use crate::provider::{malformed_response, ModelProvider, ModelTurn, ToolCallRequest, TurnInput};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Gemini client implementing [`ModelProvider`]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    system_instruction: Option<String>,
    tools: Vec<ToolDefinition>,
    history: Mutex<Vec<Value>>,
}

impl GeminiClient {
    /// Create from an explicit API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("Gemini API key is empty"));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_instruction: None,
            tools: Vec::new(),
            history: Mutex::new(Vec::new()),
        })
    }

    /// Create from the `GEMINI_API_KEY` environment variable
    ///
    /// The credential is read once here; a missing key is a configuration
    /// error and no turn can start without it.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| Error::config("GEMINI_API_KEY not set"))?;
        Self::new(api_key)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Set the tool catalog advertised to the model
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Build the `contents` entry for one turn input
    fn content_for_input(input: &TurnInput) -> Value {
        match input {
            TurnInput::UserText(text) => json!({
                "role": "user",
                "parts": [{"text": text}],
            }),
            TurnInput::ToolResults(results) => {
                let parts: Vec<Value> = results
                    .iter()
                    .filter_map(|part| match part {
                        Part::ToolResult { name, response } => Some(json!({
                            "functionResponse": {
                                "name": name,
                                "response": response,
                            }
                        })),
                        _ => None,
                    })
                    .collect();
                json!({"role": "user", "parts": parts})
            }
        }
    }

    /// Build the full request body for the current history
    fn request_body(&self, contents: &[Value]) -> Value {
        let mut body = json!({"contents": contents});
        if !self.tools.is_empty() {
            let declarations: Vec<Value> = self
                .tools
                .iter()
                .map(|t| t.to_function_declaration())
                .collect();
            body["tools"] = json!([{"functionDeclarations": declarations}]);
        }
        if let Some(instruction) = &self.system_instruction {
            body["systemInstruction"] = json!({"parts": [{"text": instruction}]});
        }
        body
    }
}

/// Extract the model content and turn data from a `generateContent` response
fn parse_response(body: &Value) -> Result<(Value, ModelTurn)> {
    let content = body
        .pointer("/candidates/0/content")
        .ok_or_else(|| malformed_response("no candidates"))?;

    let mut turn = ModelTurn::default();
    let mut text = String::new();

    for part in content
        .get("parts")
        .and_then(|p| p.as_array())
        .map(|p| p.as_slice())
        .unwrap_or(&[])
    {
        if let Some(t) = part.get("text").and_then(|t| t.as_str()) {
            text.push_str(t);
        }
        if let Some(call) = part.get("functionCall") {
            let name = call
                .get("name")
                .and_then(|n| n.as_str())
                .ok_or_else(|| malformed_response("functionCall without name"))?;
            let args = call.get("args").cloned().unwrap_or_else(|| json!({}));
            turn.tool_calls.push(ToolCallRequest {
                name: name.to_string(),
                args,
            });
        }
    }

    if !text.is_empty() {
        turn.text = Some(text);
    }

    Ok((content.clone(), turn))
}

#[async_trait::async_trait]
impl ModelProvider for GeminiClient {
    async fn send_turn(&self, input: TurnInput) -> Result<ModelTurn> {
        let mut history = self.history.lock().await;

        // The new entry joins the history only after a successful round
        // trip; a failed turn must leave the history untouched so the user
        // can simply resend.
        let input_content = Self::content_for_input(&input);
        let mut contents = history.clone();
        contents.push(input_content.clone());

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = self.request_body(&contents);

        debug!(model = %self.model, turns = contents.len(), "Sending model turn");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::model(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(%status, "Gemini request rejected");
            return Err(Error::model(format!("HTTP {status}: {detail}")));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| Error::model(format!("invalid response body: {e}")))?;

        let (model_content, turn) = parse_response(&payload)?;
        history.push(input_content);
        history.push(model_content);

        debug!(
            tool_calls = turn.tool_calls.len(),
            has_text = turn.text.is_some(),
            "Model turn received"
        );

        Ok(turn)
    }
}
