//! Accelerator commands.
//!
//! - `store`: file → per-record description generation → object create,
//!   with a flat pause after every processed record.
//! - `assign-ids`: add the identifier property, then give every stored
//!   object a fresh v4 UUID.
//! - `get` / `delete`: single-object operations by store id.
//!
//! # Identifier Reassignment
//!
//! [`assign_identifiers`] overwrites identifiers on every run unless
//! `skip_existing` is set, so two default runs leave an object with two
//! different values over time. The skip mode treats any non-empty existing
//! value as final.

use anyhow::{bail, Result};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::accelerator_file::load_accelerator_file;
use crate::config::Config;
use crate::credentials::Credentials;
use crate::generation::{create_generator, DescriptionGenerator};
use crate::models::{Accelerator, AcceleratorEntry};
use crate::schema::{accelerator_class, ensure_class, ensure_property};
use crate::vector_store::{PropertyDefinition, QueryOptions, VectorStoreClient};

/// Outcome of one `store` run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StoreReport {
    pub total: usize,
    pub skipped: usize,
    pub stored: usize,
    pub failed: usize,
}

/// Outcome of one `assign-ids` run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AssignReport {
    pub objects: usize,
    pub updated: usize,
    pub skipped_existing: usize,
    pub failed: usize,
}

impl AssignReport {
    /// One-line outcome for the run log.
    pub fn summary(&self) -> String {
        if self.objects > 0 && self.updated == self.objects {
            "All objects updated with new UUIDs!".to_string()
        } else {
            format!(
                "Updated {} of {} objects ({} already set, {} failed)",
                self.updated, self.objects, self.skipped_existing, self.failed
            )
        }
    }
}

/// Enrich and store each entry in order.
///
/// Entries without a name or URL are skipped and logged. A generation or
/// create failure is logged against the accelerator name and the loop moves
/// on. `delay` is applied after every entry that was attempted.
pub async fn store_accelerators(
    entries: &[AcceleratorEntry],
    generator: &dyn DescriptionGenerator,
    store: &VectorStoreClient,
    class: &str,
    delay: Duration,
) -> StoreReport {
    let mut report = StoreReport {
        total: entries.len(),
        ..Default::default()
    };

    for entry in entries {
        let Some((name, url)) = entry.required_fields() else {
            warn!(
                "Skipping accelerator due to missing 'url' or 'name': {}",
                serde_json::to_string(entry).unwrap_or_default()
            );
            report.skipped += 1;
            continue;
        };

        match store_one(entry, name, url, generator, store, class).await {
            Ok(id) => {
                info!("Successfully processed accelerator: {} ({})", name, id);
                report.stored += 1;
            }
            Err(e) => {
                error!("Error processing accelerator '{}': {:#}", name, e);
                report.failed += 1;
            }
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    report
}

async fn store_one(
    entry: &AcceleratorEntry,
    name: &str,
    url: &str,
    generator: &dyn DescriptionGenerator,
    store: &VectorStoreClient,
    class: &str,
) -> Result<String> {
    let description = generator
        .describe(name, url, entry.category.as_deref())
        .await?;

    let accelerator = Accelerator {
        name: name.to_string(),
        url: url.to_string(),
        category: entry.category.clone(),
        description,
    };
    Ok(store.create_object(class, &accelerator).await?)
}

/// Define the identifier property and assign a random UUID to each object.
///
/// The property is created unconditionally; "already exists" is tolerated.
/// Listing failures are fatal, per-object update failures are counted.
/// The listing pages through the whole class unless `options.limit` caps it.
pub async fn assign_identifiers(
    store: &VectorStoreClient,
    class: &str,
    id_property: &str,
    skip_existing: bool,
    options: QueryOptions,
) -> Result<AssignReport> {
    ensure_property(store, class, &PropertyDefinition::new(id_property, "string")).await?;

    let wanted: Vec<&str> = if skip_existing {
        vec![id_property]
    } else {
        Vec::new()
    };
    let objects = store.query_objects(class, &wanted, options).await?;

    let mut report = AssignReport {
        objects: objects.len(),
        ..Default::default()
    };

    for obj in &objects {
        if skip_existing && obj.text(id_property).is_some() {
            report.skipped_existing += 1;
            continue;
        }

        let new_id = Uuid::new_v4().to_string();
        let mut properties = Map::new();
        properties.insert(id_property.to_string(), Value::String(new_id.clone()));

        match store.update_object(class, &obj.id, &properties).await {
            Ok(()) => {
                info!("Assigned {} = {} to object {}", id_property, new_id, obj.id);
                report.updated += 1;
            }
            Err(e) => {
                error!("Failed to update object {}: {}", obj.id, e);
                report.failed += 1;
            }
        }
    }

    info!("{}", report.summary());
    Ok(report)
}

/// `accelerators store`.
pub async fn run_store_accelerators(
    config: &Config,
    credentials: &Credentials,
    file: &Path,
) -> Result<()> {
    let store_settings = credentials.vector_store(&config.vector_store)?;
    let client = config.http.build_client()?;
    let generator = create_generator(&config.generation, credentials, client.clone())?;
    let loaded = load_accelerator_file(file)?;

    let store = VectorStoreClient::new(&store_settings, client);
    let class = &config.vector_store.accelerator_class;
    ensure_class(&store, &accelerator_class(class)).await?;

    let report = store_accelerators(
        &loaded.entries,
        generator.as_ref(),
        &store,
        class,
        Duration::from_millis(config.generation.delay_ms),
    )
    .await;

    println!("store accelerators → {}", class);
    println!("  entries: {}", report.total + loaded.malformed);
    println!("  skipped: {}", report.skipped + loaded.malformed);
    println!("  stored: {}", report.stored);
    println!("  failed: {}", report.failed);
    println!("  model: {}", generator.model_name());
    println!("ok");
    Ok(())
}

/// `accelerators assign-ids`.
pub async fn run_assign_ids(
    config: &Config,
    credentials: &Credentials,
    skip_existing: bool,
) -> Result<()> {
    let store_settings = credentials.vector_store(&config.vector_store)?;
    let store = VectorStoreClient::new(&store_settings, config.http.build_client()?);
    let class = &config.vector_store.accelerator_class;

    let report = assign_identifiers(
        &store,
        class,
        &config.vector_store.id_property,
        skip_existing,
        config.vector_store.query_options(),
    )
    .await?;

    println!("assign ids → {}.{}", class, config.vector_store.id_property);
    println!("  objects: {}", report.objects);
    println!("  updated: {}", report.updated);
    if skip_existing {
        println!("  skipped (already set): {}", report.skipped_existing);
    }
    println!("  failed: {}", report.failed);
    println!("ok");
    Ok(())
}

/// `accelerators get <id>`.
pub async fn run_get_accelerator(
    config: &Config,
    credentials: &Credentials,
    id: &str,
) -> Result<()> {
    let store_settings = credentials.vector_store(&config.vector_store)?;
    let store = VectorStoreClient::new(&store_settings, config.http.build_client()?);
    let class = &config.vector_store.accelerator_class;

    let Some(obj) = store.get_object(class, id).await? else {
        bail!("accelerator not found: {}", id);
    };

    println!("id:          {}", obj.id);
    println!("name:        {}", obj.text("name").unwrap_or("-"));
    println!("url:         {}", obj.text("url").unwrap_or("-"));
    println!("category:    {}", obj.text("category").unwrap_or("-"));
    println!(
        "{:<12} {}",
        format!("{}:", config.vector_store.id_property),
        obj.text(&config.vector_store.id_property).unwrap_or("-")
    );
    if let Some(description) = obj.text("description") {
        println!("--- description ---");
        println!("{}", description);
    }
    Ok(())
}

/// `accelerators delete <id>`.
pub async fn run_delete_accelerator(
    config: &Config,
    credentials: &Credentials,
    id: &str,
) -> Result<()> {
    let store_settings = credentials.vector_store(&config.vector_store)?;
    let store = VectorStoreClient::new(&store_settings, config.http.build_client()?);
    let class = &config.vector_store.accelerator_class;

    if !store.delete_object(class, id).await? {
        bail!("accelerator not found: {}", id);
    }
    info!("Deleted accelerator with ID: {}", id);
    println!("deleted {}", id);
    Ok(())
}
