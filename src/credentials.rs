//! Credentials and endpoints read from the environment.
//!
//! # Environment Variables
//!
//! | Variable | Purpose |
//! |----------|---------|
//! | `OPENAI_API_KEY` | chat completions; also forwarded to the vector store |
//! | `WEAVIATE_URL` | vector store host or URL |
//! | `WEAVIATE_API_KEY` | vector store bearer token (optional) |
//! | `SERVICENOW_INSTANCE_URL` | helpdesk instance (overrides `[ticketing].instance_url`) |
//! | `SERVICENOW_USERNAME` | helpdesk basic auth user |
//! | `SERVICENOW_PASSWORD` | helpdesk basic auth password |
//!
//! Empty values count as unset. Accessors fail with a message naming the
//! missing variable, and commands resolve everything they need before
//! issuing the first request.

use anyhow::{anyhow, Result};
use std::fmt;

use crate::config::{TicketingConfig, VectorStoreConfig};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const WEAVIATE_URL: &str = "WEAVIATE_URL";
pub const WEAVIATE_API_KEY: &str = "WEAVIATE_API_KEY";
pub const SERVICENOW_INSTANCE_URL: &str = "SERVICENOW_INSTANCE_URL";
pub const SERVICENOW_USERNAME: &str = "SERVICENOW_USERNAME";
pub const SERVICENOW_PASSWORD: &str = "SERVICENOW_PASSWORD";

/// Every variable the tool knows about, in display order.
pub const ALL_VARIABLES: [&str; 6] = [
    OPENAI_API_KEY,
    WEAVIATE_URL,
    WEAVIATE_API_KEY,
    SERVICENOW_INSTANCE_URL,
    SERVICENOW_USERNAME,
    SERVICENOW_PASSWORD,
];

#[derive(Clone, Default)]
pub struct Credentials {
    openai_api_key: Option<String>,
    weaviate_url: Option<String>,
    weaviate_api_key: Option<String>,
    servicenow_instance_url: Option<String>,
    servicenow_username: Option<String>,
    servicenow_password: Option<String>,
}

/// Resolved vector store connection settings.
#[derive(Clone)]
pub struct VectorStoreSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

/// Resolved helpdesk connection settings.
#[derive(Clone)]
pub struct TicketingSettings {
    pub instance_url: String,
    pub username: String,
    pub password: String,
    pub table: String,
    pub limit: usize,
    pub fields: Vec<String>,
}

impl Credentials {
    /// Read all known variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read all known variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            openai_api_key: get(OPENAI_API_KEY),
            weaviate_url: get(WEAVIATE_URL),
            weaviate_api_key: get(WEAVIATE_API_KEY),
            servicenow_instance_url: get(SERVICENOW_INSTANCE_URL),
            servicenow_username: get(SERVICENOW_USERNAME),
            servicenow_password: get(SERVICENOW_PASSWORD),
        }
    }

    pub fn is_set(&self, variable: &str) -> bool {
        match variable {
            OPENAI_API_KEY => self.openai_api_key.is_some(),
            WEAVIATE_URL => self.weaviate_url.is_some(),
            WEAVIATE_API_KEY => self.weaviate_api_key.is_some(),
            SERVICENOW_INSTANCE_URL => self.servicenow_instance_url.is_some(),
            SERVICENOW_USERNAME => self.servicenow_username.is_some(),
            SERVICENOW_PASSWORD => self.servicenow_password.is_some(),
            _ => false,
        }
    }

    pub fn openai_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| missing(OPENAI_API_KEY))
    }

    /// Resolve the vector store endpoint. Requires `WEAVIATE_URL`.
    pub fn vector_store(&self, config: &VectorStoreConfig) -> Result<VectorStoreSettings> {
        let raw = self
            .weaviate_url
            .as_deref()
            .ok_or_else(|| missing(WEAVIATE_URL))?;
        Ok(VectorStoreSettings {
            base_url: normalize_endpoint(raw, &config.default_scheme),
            api_key: self.weaviate_api_key.clone(),
            openai_api_key: self.openai_api_key.clone(),
        })
    }

    /// Resolve helpdesk settings. The instance URL may come from the
    /// environment or the config file; the user and password only from the
    /// environment.
    pub fn ticketing(
        &self,
        config: &TicketingConfig,
        default_scheme: &str,
    ) -> Result<TicketingSettings> {
        let instance = self
            .servicenow_instance_url
            .as_deref()
            .or(config.instance_url.as_deref())
            .ok_or_else(|| missing(SERVICENOW_INSTANCE_URL))?;
        let username = self
            .servicenow_username
            .clone()
            .ok_or_else(|| missing(SERVICENOW_USERNAME))?;
        let password = self
            .servicenow_password
            .clone()
            .ok_or_else(|| missing(SERVICENOW_PASSWORD))?;

        Ok(TicketingSettings {
            instance_url: normalize_endpoint(instance, default_scheme),
            username,
            password,
            table: config.table.clone(),
            limit: config.limit,
            fields: config.fields.clone(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Credentials");
        for variable in ALL_VARIABLES {
            s.field(variable, &if self.is_set(variable) { "set" } else { "unset" });
        }
        s.finish()
    }
}

fn missing(variable: &str) -> anyhow::Error {
    anyhow!("Please set the {} environment variable.", variable)
}

/// Prefix `scheme://` when `raw` has no scheme and drop trailing slashes.
pub fn normalize_endpoint(raw: &str, scheme: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("{}://{}", scheme, trimmed)
    }
}
