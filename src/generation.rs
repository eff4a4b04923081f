//! Description generation for accelerator records.
//!
//! Defines the [`DescriptionGenerator`] trait and its implementations:
//! - **[`DisabledGenerator`]**: returns an empty description; used when
//!   `generation.provider = "disabled"`.
//! - **[`OpenAIGenerator`]**: calls the OpenAI chat completions API once per
//!   record with a fixed model, token cap and temperature.
//!
//! Use [`create_generator`] to pick the implementation from config.
//!
//! # Failure Handling
//!
//! There is no retry and no backoff. Any non-success status, transport
//! error, or response without a first choice is returned as an error for
//! the caller to log against the record.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::GenerationConfig;
use crate::credentials::Credentials;

/// Produces a markdown description for one accelerator.
#[async_trait]
pub trait DescriptionGenerator: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4"`).
    fn model_name(&self) -> &str;

    /// Generate a description for the named accelerator.
    async fn describe(&self, name: &str, url: &str, category: Option<&str>) -> Result<String>;
}

/// Build the prompt sent for one accelerator.
///
/// A missing category renders as `None`. The result is already trimmed.
pub fn build_prompt(name: &str, url: &str, category: Option<&str>) -> String {
    format!(
        "You are a helpful assistant that generates detailed markdown descriptions for accelerators.\n\
         Please provide a comprehensive description for the accelerator below:\n\
         \n\
         **Name:** {name}\n\
         **URL:** {url}\n\
         **Category:** {category}\n\
         \n\
         The description should include key features, benefits, and any relevant information \
         to help someone understand what this accelerator offers.\n\
         \n\
         Please format the description in markdown.",
        name = name,
        url = url,
        category = category.unwrap_or("None"),
    )
}

/// Instantiate the generator selected by `config.provider`.
///
/// # Errors
///
/// Fails when the provider is `openai` and `OPENAI_API_KEY` is missing, so
/// the run aborts before any request is made.
pub fn create_generator(
    config: &GenerationConfig,
    credentials: &Credentials,
    client: reqwest::Client,
) -> Result<Box<dyn DescriptionGenerator>> {
    match config.provider.as_str() {
        "openai" => {
            let api_key = credentials.openai_api_key()?.to_string();
            Ok(Box::new(OpenAIGenerator::new(config, api_key, client)))
        }
        "disabled" => Ok(Box::new(DisabledGenerator)),
        other => bail!("Unknown generation provider: {}", other),
    }
}

// ============ Disabled Generator ============

pub struct DisabledGenerator;

#[async_trait]
impl DescriptionGenerator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn describe(&self, _name: &str, _url: &str, _category: Option<&str>) -> Result<String> {
        Ok(String::new())
    }
}

// ============ OpenAI Generator ============

/// Generator backed by `POST {base_url}/chat/completions`.
pub struct OpenAIGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl OpenAIGenerator {
    pub fn new(config: &GenerationConfig, api_key: String, client: reqwest::Client) -> Self {
        Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "max_tokens": self.max_tokens,
            "n": 1,
            "temperature": self.temperature,
        })
    }
}

#[async_trait]
impl DescriptionGenerator for OpenAIGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn describe(&self, name: &str, url: &str, category: Option<&str>) -> Result<String> {
        let prompt = build_prompt(name, url, category);
        let body = self.request_body(&prompt);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("OpenAI request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("OpenAI API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_chat_response(&json)
    }
}

/// Extract `choices[0].message.content`, trimmed.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    let content = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing choices[0].message.content"))?;

    Ok(content.trim().to_string())
}
