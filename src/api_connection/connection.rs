use async_trait::async_trait;
use dotenv::dotenv;
use reqwest::Client;
use std::env;
use thiserror::Error;
use tracing::debug;

use super::endpoints::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Provider, OPENROUTER_BASE_URL,
    OPENROUTER_MODELS,
};
use super::CompletionClient;

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("API returned no usable content")]
    EmptyResponse,
}

impl Provider {
    pub fn openrouter(api_key_env_var_name: &str) -> Self {
        dotenv().ok();
        Self::OpenRouter {
            api_key: api_key_env_var_name.to_string(),
            base_url: OPENROUTER_BASE_URL.to_string(),
            model: OPENROUTER_MODELS[0].model_name.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(self, new_base_url: impl Into<String>) -> Self {
        match self {
            Provider::OpenRouter {
                api_key, model, http, ..
            } => Provider::OpenRouter {
                api_key,
                base_url: new_base_url.into(),
                model,
                http,
            },
        }
    }

    pub fn with_model(self, new_model: impl Into<String>) -> Self {
        match self {
            Provider::OpenRouter {
                api_key,
                base_url,
                http,
                ..
            } => Provider::OpenRouter {
                api_key,
                base_url,
                model: new_model.into(),
                http,
            },
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::OpenRouter { model, .. } => model,
        }
    }

    pub async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match self {
            Provider::OpenRouter {
                api_key: api_key_env_var_name,
                base_url,
                http,
                ..
            } => {
                dotenv().ok();
                let actual_api_key = env::var(api_key_env_var_name)
                    .map_err(|_| ApiConnectionError::MissingApiKey(api_key_env_var_name.clone()))?;

                let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
                let site_url =
                    env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
                let app_name =
                    env::var("APP_NAME").unwrap_or_else(|_| "RecipeFinder".to_string());

                let response = http
                    .post(&url)
                    .bearer_auth(actual_api_key)
                    .header("HTTP-Referer", site_url)
                    .header("X-Title", app_name)
                    .json(&request)
                    .send()
                    .await?;

                if response.status().is_success() {
                    let chat_response = response.json::<ChatCompletionResponse>().await?;
                    Ok(chat_response)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }
}

#[async_trait]
impl CompletionClient for Provider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, ApiConnectionError> {
        let request = ChatCompletionRequest {
            model: self.model().to_string(),
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)],
            temperature: Some(0.0),
            max_tokens: Some(200),
        };

        let response = self.call_chat_completion(request).await?;
        let choice = response
            .choices
            .first()
            .ok_or(ApiConnectionError::EmptyResponse)?;

        let content = strip_code_fences(&choice.message.content);
        debug!(model = %response.model, content = %content, "chat completion received");
        if content.is_empty() {
            return Err(ApiConnectionError::EmptyResponse);
        }
        Ok(content.to_string())
    }
}

/// Removes a surrounding markdown code fence (```` ```json ... ``` ````) if present.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !(trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() >= 6) {
        return trimmed;
    }
    let inner = &trimmed[3..trimmed.len() - 3];
    let inner = inner
        .strip_prefix("json")
        .or_else(|| inner.strip_prefix("text"))
        .unwrap_or(inner);
    inner.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(strip_code_fences("```\ncalories: 10\n```"), "calories: 10");
    }

    #[test]
    fn leaves_plain_text() {
        assert_eq!(strip_code_fences("  calories: 10 "), "calories: 10");
        assert_eq!(strip_code_fences("```"), "```");
    }

    #[test]
    fn builder_overrides_model_and_url() {
        let provider = Provider::openrouter("SOME_KEY_VAR")
            .with_model("test/model")
            .with_base_url("http://localhost:9");
        assert_eq!(provider.model(), "test/model");
        match provider {
            Provider::OpenRouter { base_url, api_key, .. } => {
                assert_eq!(base_url, "http://localhost:9");
                assert_eq!(api_key, "SOME_KEY_VAR");
            }
        }
    }
}
