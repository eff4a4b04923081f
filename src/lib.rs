//! # mimir-sync
//!
//! Moves records between hosted services: helpdesk incidents and
//! LLM-enriched accelerator entries go into a Weaviate vector database.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Source       │──▶│ Enrichment   │──▶│ Sink         │
//! │ ServiceNow / │   │ OpenAI chat  │   │ Weaviate     │
//! │ JSON file    │   │ (optional)   │   │ REST+GraphQL │
//! └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! Everything runs sequentially: one request in flight, per-record failures
//! logged and skipped, no retries.
//!
//! ## Quick Start
//!
//! ```bash
//! export WEAVIATE_URL=my-cluster.weaviate.network OPENAI_API_KEY=sk-...
//! mimir-sync accelerators store --file accelerators.json
//! mimir-sync accelerators assign-ids
//! mimir-sync tickets upload
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`credentials`] | Environment credentials and endpoints |
//! | [`logging`] | Tracing subscriber setup |
//! | [`models`] | Record types |
//! | [`accelerator_file`] | Local accelerator JSON reader |
//! | [`servicenow`] | Helpdesk incident reader |
//! | [`generation`] | Description generator abstraction |
//! | [`vector_store`] | Weaviate client |
//! | [`schema`] | Class definitions and create-if-absent |
//! | [`tickets`] | Ticket commands |
//! | [`accelerators`] | Accelerator commands |
//! | [`status`] | `check` command |

pub mod accelerator_file;
pub mod accelerators;
pub mod config;
pub mod credentials;
pub mod generation;
pub mod logging;
pub mod models;
pub mod schema;
pub mod servicenow;
pub mod status;
pub mod tickets;
pub mod vector_store;
