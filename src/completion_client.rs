use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(30);

/// Client for an OpenAI-compatible chat completion endpoint.
pub struct CompletionClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(serde::Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(serde::Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(thiserror::Error)]
pub enum CompletionError {
    #[error("Failed to reach the completion provider.")]
    Request(#[from] reqwest::Error),
    #[error("The completion provider returned no text.")]
    EmptyCompletion,
}

impl std::fmt::Debug for CompletionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)?;
        if let CompletionError::Request(err) = self {
            write!(f, "\n\t({})", err)?;
        }
        Ok(())
    }
}

impl CompletionClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        model: String,
        temperature: f32,
        max_tokens: u32,
        timeout: Option<time::Duration>,
    ) -> CompletionClient {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()
            .expect("Failed to build the completion HTTP client.");

        CompletionClient {
            http_client,
            base_url,
            api_key,
            model,
            temperature,
            max_tokens,
        }
    }

    /// Sends a single system + user exchange and returns the trimmed text of
    /// the first choice.
    #[tracing::instrument(
        name = "Requesting a completion",
        skip(self, system_prompt, user_prompt),
        fields(model = %self.model)
    )]
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, CompletionError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response: ChatCompletionResponse = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(CompletionError::EmptyCompletion)
    }
}
