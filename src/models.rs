//! Record shapes that flow between the helpdesk, the generator, and the
//! vector store.
//!
//! All records are flat key/value objects with no relationships between
//! them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One accelerator entry as read from the input file, before validation.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AcceleratorEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl AcceleratorEntry {
    /// Returns the name and URL when both are present and non-empty.
    pub fn required_fields(&self) -> Option<(&str, &str)> {
        let name = self.name.as_deref().filter(|s| !s.is_empty())?;
        let url = self.url.as_deref().filter(|s| !s.is_empty())?;
        Some((name, url))
    }
}

/// Accelerator object written to the vector store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Accelerator {
    pub name: String,
    pub url: String,
    pub category: Option<String>,
    pub description: String,
}

/// Incident as returned by the helpdesk Table API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Incident {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Ticket object written to the vector store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub number: Option<String>,
    pub short_description: Option<String>,
    pub priority: Option<String>,
    pub state: Option<String>,
}

impl From<&Incident> for Ticket {
    fn from(incident: &Incident) -> Self {
        Self {
            number: incident.number.clone(),
            short_description: incident.short_description.clone(),
            priority: incident.priority.clone(),
            state: incident.state.clone(),
        }
    }
}

impl Ticket {
    /// Label used in log lines; falls back when the number is missing.
    pub fn label(&self) -> &str {
        self.number.as_deref().unwrap_or("<no number>")
    }
}

/// An object as seen through the vector store, with its internal id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub id: String,
    pub class: String,
    pub properties: Map<String, Value>,
}

impl StoredObject {
    /// String property lookup; non-string and empty values read as `None`.
    pub fn text(&self, property: &str) -> Option<&str> {
        self.properties
            .get(property)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}
