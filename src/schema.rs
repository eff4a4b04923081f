//! Class definitions and create-if-absent helpers.
//!
//! Existing classes are never diffed against the wanted definition; a class
//! with the right name is accepted as-is.

use anyhow::{Context, Result};
use tracing::info;

use crate::vector_store::{ClassDefinition, PropertyDefinition, VectorStoreClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOutcome {
    Created,
    AlreadyPresent,
}

pub fn accelerator_class(name: &str) -> ClassDefinition {
    ClassDefinition {
        class: name.to_string(),
        description: "A class representing an accelerator with a description.".to_string(),
        properties: vec![
            PropertyDefinition::new("name", "text"),
            PropertyDefinition::new("url", "text"),
            PropertyDefinition::new("category", "text"),
            PropertyDefinition::new("description", "text"),
        ],
    }
}

pub fn ticket_class(name: &str) -> ClassDefinition {
    ClassDefinition {
        class: name.to_string(),
        description: "A ServiceNow incident ticket".to_string(),
        properties: vec![
            PropertyDefinition::new("number", "string").described("Incident number"),
            PropertyDefinition::new("shortDescription", "string")
                .described("Short description of the incident"),
            PropertyDefinition::new("priority", "string").described("Incident priority"),
            PropertyDefinition::new("state", "string")
                .described("Current state of the incident"),
        ],
    }
}

/// Create `definition` unless a class with the same name already exists.
///
/// A conflict from the create call counts as already present and is only
/// logged. Any other failure, including the introspection call, is fatal.
pub async fn ensure_class(
    store: &VectorStoreClient,
    definition: &ClassDefinition,
) -> Result<SchemaOutcome> {
    let existing = store
        .list_classes()
        .await
        .context("Failed to read vector store schema")?;

    if existing.iter().any(|c| c == &definition.class) {
        info!("Class '{}' already exists", definition.class);
        return Ok(SchemaOutcome::AlreadyPresent);
    }

    match store.create_class(definition).await {
        Ok(()) => {
            info!("Created class '{}'", definition.class);
            Ok(SchemaOutcome::Created)
        }
        Err(e) if e.is_conflict() => {
            info!("Schema already exists or an error occurred: {}", e);
            Ok(SchemaOutcome::AlreadyPresent)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to create class '{}'", definition.class)),
    }
}

/// Add `property` to `class`, tolerating "already exists".
pub async fn ensure_property(
    store: &VectorStoreClient,
    class: &str,
    property: &PropertyDefinition,
) -> Result<SchemaOutcome> {
    match store.add_property(class, property).await {
        Ok(()) => {
            info!("Added property '{}' to class '{}'", property.name, class);
            Ok(SchemaOutcome::Created)
        }
        Err(e) if e.is_conflict() => {
            info!(
                "Property '{}' already exists on class '{}': {}",
                property.name, class, e
            );
            Ok(SchemaOutcome::AlreadyPresent)
        }
        Err(e) => Err(e).with_context(|| {
            format!("Failed to add property '{}' to '{}'", property.name, class)
        }),
    }
}
