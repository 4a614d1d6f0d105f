use crate::error::Result;
use serde::Serialize;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-instruct";

/// sampling parameters sent with every completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub stop: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: 150,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop: vec!["#".to_string(), ";".to_string()],
        }
    }
}

/// body of a text completion request
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub stop: &'a [String],
}

impl<'a> CompletionRequest<'a> {
    pub fn new(config: &'a ModelConfig, prompt: &'a str) -> Self {
        Self {
            model: &config.model,
            prompt,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            frequency_penalty: config.frequency_penalty,
            presence_penalty: config.presence_penalty,
            stop: &config.stop,
        }
    }
}

/// something that continues a prompt with generated text
pub trait Completion: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// returns the same continuation for every prompt, for offline runs and tests
#[derive(Debug, Clone)]
pub struct FixedCompletion {
    text: String,
}

impl FixedCompletion {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Completion for FixedCompletion {
    #[tracing::instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!("returning fixed completion");
        Ok(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_config_default() {
        let config = ModelConfig::default();
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_tokens, 150);
        assert_eq!(config.stop, vec!["#", ";"]);
    }

    #[test]
    fn test_request_body() {
        let config = ModelConfig::default();
        let request = CompletionRequest::new(&config, "### tables\nSELECT");
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body,
            json!({
                "model": DEFAULT_MODEL,
                "prompt": "### tables\nSELECT",
                "temperature": 0.0,
                "max_tokens": 150,
                "top_p": 1.0,
                "frequency_penalty": 0.0,
                "presence_penalty": 0.0,
                "stop": ["#", ";"]
            })
        );
    }

    #[test]
    fn test_fixed_completion() {
        let completion = FixedCompletion::new(" id FROM t");
        assert_eq!(completion.complete("anything").unwrap(), " id FROM t");
    }
}
