use crate::error::{QueryMeError, Result};
use crate::llm::model::{Completion, CompletionRequest, ModelConfig};
use serde::Deserialize;
use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// connection settings for an openai compatible completions endpoint
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub model: ModelConfig,
}

impl ClientConfig {
    /// resolve settings from arguments, then environment, then defaults
    pub fn resolve(
        api_key: Option<String>,
        model: Option<String>,
        base_url: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let api_key = api_key
            .or_else(|| non_empty_var("OPENAI_API_KEY"))
            .ok_or_else(|| {
                QueryMeError::Config("no api key, set OPENAI_API_KEY or pass --api-key".to_string())
            })?;

        let mut model_config = ModelConfig::default();
        if let Some(model) = model.or_else(|| non_empty_var("QUERYME_MODEL")) {
            model_config.model = model;
        }

        let base_url = base_url
            .or_else(|| non_empty_var("QUERYME_API_BASE"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = match timeout_secs {
            Some(secs) => secs,
            None => match non_empty_var("QUERYME_TIMEOUT_SECS") {
                Some(v) => v.parse::<u64>().map_err(|e| {
                    QueryMeError::Config(format!("invalid QUERYME_TIMEOUT_SECS '{}': {}", v, e))
                })?,
                None => DEFAULT_TIMEOUT_SECS,
            },
        };

        Ok(Self {
            api_key,
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            model: model_config,
        })
    }

    pub fn completions_url(&self) -> String {
        format!("{}/completions", self.base_url.trim_end_matches('/'))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.is_empty())
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// blocking client for the hosted completion service
pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    config: ClientConfig,
}

impl OpenAiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { http, config })
    }
}

/// pull the first completion out of a response body, or the service's error message
fn parse_completion(status: reqwest::StatusCode, body: &str) -> Result<String> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());
        return Err(QueryMeError::Completion(format!("{}: {}", status, message)));
    }

    let response: CompletionResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.text)
        .ok_or_else(|| QueryMeError::Completion("response carried no choices".to_string()))
}

impl Completion for OpenAiClient {
    #[tracing::instrument(skip(self, prompt), fields(prompt_len = prompt.len(), model = %self.config.model.model))]
    fn complete(&self, prompt: &str) -> Result<String> {
        let request = CompletionRequest::new(&self.config.model, prompt);

        let response = self
            .http
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        let text = parse_completion(status, &body)?;

        tracing::debug!(completion_len = text.len(), "received completion");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_parse_completion() {
        let body = r#"{"id":"cmpl-1","choices":[{"text":" id, amount FROM orders","index":0}]}"#;
        let text = parse_completion(StatusCode::OK, body).unwrap();
        assert_eq!(text, " id, amount FROM orders");
    }

    #[test]
    fn test_parse_completion_without_choices() {
        let result = parse_completion(StatusCode::OK, r#"{"choices":[]}"#);
        assert!(matches!(result, Err(QueryMeError::Completion(_))));
    }

    #[test]
    fn test_parse_completion_error_status() {
        let body = r#"{"error":{"message":"You exceeded your current quota"}}"#;
        let err = parse_completion(StatusCode::TOO_MANY_REQUESTS, body).unwrap_err();
        assert!(err.to_string().contains("exceeded your current quota"));
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn test_resolve_prefers_arguments() {
        let config = ClientConfig::resolve(
            Some("sk-test".to_string()),
            Some("my-model".to_string()),
            Some("http://localhost:8080/v1/".to_string()),
            Some(5),
        )
        .unwrap();

        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model.model, "my-model");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.completions_url(), "http://localhost:8080/v1/completions");
    }
}
