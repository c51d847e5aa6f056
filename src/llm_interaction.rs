use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::config::LlmConfig;
use crate::constants::PLANNER_INSTRUCTIONS;
use crate::error::PlannerError;
use crate::preferences::TripPreferences;
use crate::prompt::build_itinerary_prompt;
use crate::session::Itinerary;

const SERVICE: &str = "itinerary";

/// A text-completion backend. Implementors provide `complete`; itinerary
/// generation and question answering are built on top of it.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// One round trip to the model. Returns the completion text.
    async fn complete(&self, prompt: &str) -> Result<String, PlannerError>;

    async fn generate_itinerary(&self, prefs: &TripPreferences) -> Result<Itinerary, PlannerError> {
        debug!(destination = %prefs.destination, days = prefs.trip_days(), "generating itinerary");
        let prompt = build_itinerary_prompt(prefs);
        let text = self.complete(&prompt).await?;
        Ok(Itinerary::new(text, prefs.clone()))
    }

    async fn answer_question(&self, prompt: &str) -> Result<String, PlannerError> {
        self.complete(prompt).await
    }
}

// Structures matching the OpenAI-compatible /chat/completions endpoint
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    stream: bool, // We want the full response, not a stream
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize, Debug)]
struct ApiErrorDetail {
    message: String,
}

/// Client for an OpenAI-compatible chat completion API (Groq by default).
pub struct ItineraryClient {
    http: Client,
    config: LlmConfig,
    instructions: String,
}

impl ItineraryClient {
    pub fn new(config: LlmConfig) -> Result<Self, PlannerError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PlannerError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            config,
            instructions: PLANNER_INSTRUCTIONS.join("\n"),
        })
    }
}

#[async_trait]
impl LanguageModel for ItineraryClient {
    #[instrument(skip_all, fields(prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String, PlannerError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let request_payload = ChatCompletionRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.instructions,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.config.api_key.expose())
            .json(&request_payload)
            .send()
            .await
            .map_err(|e| PlannerError::from_transport(SERVICE, self.config.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&error_body)
                .map(|b| b.error.message)
                .unwrap_or(error_body);
            error!(%status, "language model API request failed");
            return Err(PlannerError::upstream(SERVICE, format!("status {status}: {detail}")));
        }

        let completion = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| PlannerError::from_transport(SERVICE, self.config.timeout, e))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| normalize_completion(&c))
            .filter(|c| !c.is_empty())
            .ok_or_else(|| PlannerError::upstream(SERVICE, "response contained no completion text"))?;

        debug!(response_len = text.len(), "received completion");
        Ok(text)
    }
}

/// Models sometimes emit the fullwidth divider in markdown tables.
fn normalize_completion(text: &str) -> String {
    text.replace('∣', "|").trim().to_string()
}
