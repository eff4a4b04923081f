//! TOML configuration for non-secret settings.
//!
//! Credentials never live here; see [`crate::credentials`]. Every section
//! is optional and falls back to the defaults below, so running without a
//! config file is the common case.
//!
//! ```toml
//! [ticketing]
//! instance_url = "https://dev274800.service-now.com"
//! limit = 10
//!
//! [generation]
//! provider = "openai"
//! model = "gpt-4"
//! delay_ms = 1000
//!
//! [vector_store]
//! accelerator_class = "Accelerator"
//! ticket_class = "Ticket"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::logging::LoggingConfig;
use crate::vector_store::{QueryOptions, DEFAULT_PAGE_SIZE};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub ticketing: TicketingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TicketingConfig {
    /// Instance base URL. `SERVICENOW_INSTANCE_URL` takes precedence.
    #[serde(default)]
    pub instance_url: Option<String>,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
}

impl Default for TicketingConfig {
    fn default() -> Self {
        Self {
            instance_url: None,
            table: default_table(),
            limit: default_limit(),
            fields: default_fields(),
        }
    }
}

fn default_table() -> String {
    "incident".to_string()
}
fn default_limit() -> usize {
    10
}
fn default_fields() -> Vec<String> {
    ["number", "short_description", "priority", "state"]
        .iter()
        .map(|f| f.to_string())
        .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Flat pause after every accelerator record, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            base_url: default_base_url(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl GenerationConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4".to_string()
}
fn default_max_tokens() -> u32 {
    500
}
fn default_temperature() -> f64 {
    0.7
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VectorStoreConfig {
    /// Scheme prepended to `WEAVIATE_URL` when it has none.
    #[serde(default = "default_scheme")]
    pub default_scheme: String,
    #[serde(default = "default_accelerator_class")]
    pub accelerator_class: String,
    #[serde(default = "default_ticket_class")]
    pub ticket_class: String,
    #[serde(default = "default_id_property")]
    pub id_property: String,
    /// Objects per GraphQL page when listing a class.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Cap on objects listed per run; unset lists the whole class.
    #[serde(default)]
    pub query_limit: Option<usize>,
}

impl VectorStoreConfig {
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            page_size: self.page_size,
            limit: self.query_limit,
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            default_scheme: default_scheme(),
            accelerator_class: default_accelerator_class(),
            ticket_class: default_ticket_class(),
            id_property: default_id_property(),
            page_size: default_page_size(),
            query_limit: None,
        }
    }
}

fn default_scheme() -> String {
    "https".to_string()
}
fn default_accelerator_class() -> String {
    "Accelerator".to_string()
}
fn default_ticket_class() -> String {
    "Ticket".to_string()
}
fn default_id_property() -> String {
    "ID".to_string()
}
fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct HttpConfig {
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    /// Build the shared HTTP client for one command run.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        builder.build().context("Failed to build HTTP client")
    }
}

/// Read and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Validate a config, whether parsed from a file or built from defaults.
pub fn validate(config: &Config) -> Result<()> {
    if config.ticketing.limit == 0 {
        anyhow::bail!("ticketing.limit must be > 0");
    }
    if config.ticketing.fields.is_empty() {
        anyhow::bail!("ticketing.fields must not be empty");
    }
    if config.ticketing.table.trim().is_empty() {
        anyhow::bail!("ticketing.table must not be empty");
    }

    match config.generation.provider.as_str() {
        "openai" | "disabled" => {}
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be openai or disabled.",
            other
        ),
    }
    if config.generation.max_tokens == 0 {
        anyhow::bail!("generation.max_tokens must be > 0");
    }
    if !(0.0..=2.0).contains(&config.generation.temperature) {
        anyhow::bail!("generation.temperature must be in [0.0, 2.0]");
    }

    let store = &config.vector_store;
    match store.default_scheme.as_str() {
        "http" | "https" => {}
        other => anyhow::bail!(
            "vector_store.default_scheme must be http or https, got '{}'",
            other
        ),
    }
    for (key, value) in [
        ("vector_store.accelerator_class", &store.accelerator_class),
        ("vector_store.ticket_class", &store.ticket_class),
        ("vector_store.id_property", &store.id_property),
    ] {
        if value.trim().is_empty() {
            anyhow::bail!("{} must not be empty", key);
        }
    }
    if store.page_size == 0 {
        anyhow::bail!("vector_store.page_size must be > 0");
    }
    if store.query_limit == Some(0) {
        anyhow::bail!("vector_store.query_limit must be > 0 when set");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = write_config("");
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.ticketing.limit, 10);
        assert_eq!(
            cfg.ticketing.fields,
            vec!["number", "short_description", "priority", "state"]
        );
        assert_eq!(cfg.generation.model, "gpt-4");
        assert_eq!(cfg.generation.max_tokens, 500);
        assert_eq!(cfg.generation.delay_ms, 1000);
        assert_eq!(cfg.vector_store.accelerator_class, "Accelerator");
        assert_eq!(cfg.vector_store.id_property, "ID");
        assert_eq!(cfg.vector_store.query_options(), QueryOptions::default());
        assert!(cfg.http.timeout_secs.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let file = write_config(
            r#"
[generation]
model = "gpt-4o-mini"
delay_ms = 0

[vector_store]
ticket_class = "Incident"
"#,
        );
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.generation.model, "gpt-4o-mini");
        assert_eq!(cfg.generation.delay_ms, 0);
        assert_eq!(cfg.generation.max_tokens, 500);
        assert_eq!(cfg.vector_store.ticket_class, "Incident");
        assert_eq!(cfg.vector_store.accelerator_class, "Accelerator");
    }

    #[test]
    fn rejects_zero_limit() {
        let file = write_config("[ticketing]\nlimit = 0\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("ticketing.limit"));
    }

    #[test]
    fn rejects_unknown_provider() {
        let file = write_config("[generation]\nprovider = \"anthropic-local\"\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unknown generation provider"));
    }

    #[test]
    fn rejects_temperature_out_of_range() {
        let file = write_config("[generation]\ntemperature = 3.5\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn rejects_bad_scheme() {
        let file = write_config("[vector_store]\ndefault_scheme = \"ftp\"\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn rejects_zero_page_size() {
        let file = write_config("[vector_store]\npage_size = 0\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("vector_store.page_size"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_config(Path::new("/nonexistent/mimir.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn defaults_are_valid() {
        validate(&Config::default()).unwrap();
        assert!(Config::default().generation.is_enabled());
    }
}
