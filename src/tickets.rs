//! Ticket commands: fetch incidents, copy them into the vector store, and
//! list what is stored.
//!
//! Upload flow: helpdesk fetch → ensure ticket class → one create call per
//! incident. A failed fetch skips every write, including the schema step.

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::credentials::{Credentials, TicketingSettings};
use crate::models::{Incident, Ticket};
use crate::schema::{ensure_class, ticket_class};
use crate::servicenow::fetch_incidents;
use crate::vector_store::VectorStoreClient;

/// Properties read back by `tickets list`.
const TICKET_PROPERTIES: [&str; 4] = ["number", "shortDescription", "priority", "state"];

/// Outcome of one upload run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TicketUploadReport {
    pub fetched: usize,
    pub inserted: usize,
    pub failed: usize,
    /// Set when the helpdesk fetch failed and nothing was written.
    pub fetch_error: Option<String>,
}

/// Fetch incidents and insert one ticket object per incident.
///
/// Returns an error only when the schema step fails; helpdesk failures and
/// per-ticket insert failures are logged and reported in the counts.
pub async fn upload_tickets(
    client: &reqwest::Client,
    ticketing: &TicketingSettings,
    store: &VectorStoreClient,
    class: &str,
) -> Result<TicketUploadReport> {
    let mut report = TicketUploadReport::default();

    let incidents = match fetch_incidents(client, ticketing).await {
        Ok(incidents) => {
            info!("Incident data fetched successfully.");
            incidents
        }
        Err(e) => {
            error!("{}", e);
            info!("No incidents were retrieved, so nothing to insert.");
            report.fetch_error = Some(e.to_string());
            return Ok(report);
        }
    };
    report.fetched = incidents.len();

    ensure_class(store, &ticket_class(class)).await?;

    for incident in &incidents {
        let ticket = Ticket::from(incident);
        match store.create_object(class, &ticket).await {
            Ok(_) => {
                info!("Inserted ticket {} into {}.", ticket.label(), class);
                report.inserted += 1;
            }
            Err(e) => {
                warn!("Failed to insert ticket {}: {}", ticket.label(), e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// `tickets fetch`: print incidents without writing anywhere.
pub async fn run_fetch_tickets(config: &Config, credentials: &Credentials) -> Result<()> {
    let ticketing =
        credentials.ticketing(&config.ticketing, &config.vector_store.default_scheme)?;
    let client = config.http.build_client()?;

    match fetch_incidents(&client, &ticketing).await {
        Ok(incidents) => print_incidents(&incidents)?,
        Err(e) => error!("{}", e),
    }
    Ok(())
}

fn print_incidents(incidents: &[Incident]) -> Result<()> {
    let body = serde_json::json!({ "result": incidents });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// `tickets upload`.
pub async fn run_upload_tickets(config: &Config, credentials: &Credentials) -> Result<()> {
    let ticketing =
        credentials.ticketing(&config.ticketing, &config.vector_store.default_scheme)?;
    let store_settings = credentials.vector_store(&config.vector_store)?;
    let client = config.http.build_client()?;
    let store = VectorStoreClient::new(&store_settings, client.clone());
    let class = &config.vector_store.ticket_class;

    let report = upload_tickets(&client, &ticketing, &store, class).await?;

    println!("upload tickets → {}", class);
    match &report.fetch_error {
        Some(_) => println!("  fetch failed; nothing inserted"),
        None => {
            println!("  fetched: {}", report.fetched);
            println!("  inserted: {}", report.inserted);
            println!("  failed: {}", report.failed);
        }
    }
    println!("ok");
    Ok(())
}

/// `tickets list`: read stored tickets back from the vector store.
pub async fn run_list_tickets(config: &Config, credentials: &Credentials) -> Result<()> {
    let store_settings = credentials.vector_store(&config.vector_store)?;
    let store = VectorStoreClient::new(&store_settings, config.http.build_client()?);
    let class = &config.vector_store.ticket_class;

    let objects = store
        .query_objects(class, &TICKET_PROPERTIES, config.vector_store.query_options())
        .await?;

    println!(
        "{:<38} {:<12} {:<8} {:<6} SHORT DESCRIPTION",
        "ID", "NUMBER", "PRIORITY", "STATE"
    );
    for obj in &objects {
        println!(
            "{:<38} {:<12} {:<8} {:<6} {}",
            obj.id,
            obj.text("number").unwrap_or("-"),
            obj.text("priority").unwrap_or("-"),
            obj.text("state").unwrap_or("-"),
            obj.text("shortDescription").unwrap_or("")
        );
    }
    println!("{} ticket(s)", objects.len());
    Ok(())
}
