//! Weaviate REST/GraphQL client.
//!
//! Covers only the calls the sync commands need:
//!
//! | Method | Call | Path |
//! |--------|------|------|
//! | [`list_classes`](VectorStoreClient::list_classes) | `GET` | `/v1/schema` |
//! | [`create_class`](VectorStoreClient::create_class) | `POST` | `/v1/schema` |
//! | [`add_property`](VectorStoreClient::add_property) | `POST` | `/v1/schema/{class}/properties` |
//! | [`query_objects`](VectorStoreClient::query_objects) | `POST` | `/v1/graphql` |
//! | [`create_object`](VectorStoreClient::create_object) | `POST` | `/v1/objects` |
//! | [`update_object`](VectorStoreClient::update_object) | `PATCH` | `/v1/objects/{class}/{id}` |
//! | [`get_object`](VectorStoreClient::get_object) | `GET` | `/v1/objects/{class}/{id}` |
//! | [`delete_object`](VectorStoreClient::delete_object) | `DELETE` | `/v1/objects/{class}/{id}` |
//!
//! Object ids must parse as UUIDs before they are placed in a path.
//! GraphQL listings walk the class with the `after` cursor, one page at a
//! time, until a short or empty page comes back.
//!
//! Requests carry `Authorization: Bearer <WEAVIATE_API_KEY>` when a key is
//! configured and `X-OpenAI-Api-Key` when an OpenAI key is available, so
//! server-side vectorizer modules can call out.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::credentials::VectorStoreSettings;
use crate::models::StoredObject;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vector store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("vector store returned unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("vector store GraphQL error: {0}")]
    GraphQl(String),

    #[error("invalid vector store response: {0}")]
    Decode(String),

    #[error("invalid object id {0:?}: expected a UUID")]
    InvalidId(String),
}

impl StoreError {
    /// True when the server refused because the class or property exists.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::UnexpectedStatus { status, .. } if *status == 409 || *status == 422)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::UnexpectedStatus { status: 404, .. })
    }
}

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Paging for GraphQL `Get` listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Objects requested per page.
    pub page_size: usize,
    /// Stop after this many objects in total. `None` walks the whole class.
    pub limit: Option<usize>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            limit: None,
        }
    }
}

/// Class (collection) definition.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassDefinition {
    pub class: String,
    pub description: String,
    pub properties: Vec<PropertyDefinition>,
}

/// Property definition within a class.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(rename = "dataType")]
    pub data_type: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertyDefinition {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: vec![data_type.to_string()],
            description: None,
        }
    }

    pub fn described(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

pub struct VectorStoreClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    openai_api_key: Option<String>,
}

impl VectorStoreClient {
    pub fn new(settings: &VectorStoreSettings, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            openai_api_key: settings.openai_api_key.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        if let Some(key) = &self.openai_api_key {
            builder = builder.header("X-OpenAI-Api-Key", key);
        }
        builder
    }

    /// Names of every class currently defined.
    pub async fn list_classes(&self) -> Result<Vec<String>, StoreError> {
        let response = self.request(reqwest::Method::GET, "/v1/schema").send().await?;
        let json = expect_json(response).await?;

        let classes = json
            .get("classes")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|c| c.get("class").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(classes)
    }

    pub async fn create_class(&self, definition: &ClassDefinition) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::POST, "/v1/schema")
            .json(definition)
            .send()
            .await?;
        expect_success(response).await.map(|_| ())
    }

    pub async fn add_property(
        &self,
        class: &str,
        property: &PropertyDefinition,
    ) -> Result<(), StoreError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/v1/schema/{}/properties", class),
            )
            .json(property)
            .send()
            .await?;
        expect_success(response).await.map(|_| ())
    }

    /// Run GraphQL `Get` over `class`, page by page, returning each object
    /// with its internal id and the requested properties.
    pub async fn query_objects(
        &self,
        class: &str,
        properties: &[&str],
        options: QueryOptions,
    ) -> Result<Vec<StoredObject>, StoreError> {
        let page_size = options.page_size.max(1);
        let mut objects: Vec<StoredObject> = Vec::new();

        loop {
            let wanted = match options.limit {
                Some(limit) => page_size.min(limit.saturating_sub(objects.len())),
                None => page_size,
            };
            if wanted == 0 {
                break;
            }

            let after = objects.last().map(|o| o.id.as_str());
            let query = build_get_query(class, properties, wanted, after);
            let response = self
                .request(reqwest::Method::POST, "/v1/graphql")
                .json(&serde_json::json!({ "query": query }))
                .send()
                .await?;
            let json = expect_json(response).await?;
            let page = parse_get_response(&json, class)?;

            let last_page = page.len() < wanted;
            objects.extend(page);
            if last_page {
                break;
            }
        }

        Ok(objects)
    }

    /// Create one object and return the id the store assigned.
    pub async fn create_object<T: Serialize + ?Sized>(
        &self,
        class: &str,
        properties: &T,
    ) -> Result<String, StoreError> {
        let properties =
            serde_json::to_value(properties).map_err(|e| StoreError::Decode(e.to_string()))?;
        let response = self
            .request(reqwest::Method::POST, "/v1/objects")
            .json(&serde_json::json!({ "class": class, "properties": properties }))
            .send()
            .await?;
        let json = expect_json(response).await?;
        json.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StoreError::Decode("created object has no id".to_string()))
    }

    /// Merge `properties` into an existing object.
    pub async fn update_object(
        &self,
        class: &str,
        id: &str,
        properties: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let path = object_path(class, id)?;
        let response = self
            .request(reqwest::Method::PATCH, &path)
            .json(&serde_json::json!({ "class": class, "id": id, "properties": properties }))
            .send()
            .await?;
        expect_success(response).await.map(|_| ())
    }

    /// Fetch one object. Returns `Ok(None)` on 404.
    pub async fn get_object(
        &self,
        class: &str,
        id: &str,
    ) -> Result<Option<StoredObject>, StoreError> {
        let path = object_path(class, id)?;
        let response = self
            .request(reqwest::Method::GET, &path)
            .send()
            .await?;
        match expect_json(response).await {
            Ok(json) => {
                let properties = json
                    .get("properties")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                Ok(Some(StoredObject {
                    id: json
                        .get("id")
                        .and_then(Value::as_str)
                        .unwrap_or(id)
                        .to_string(),
                    class: class.to_string(),
                    properties,
                }))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete one object. Returns `Ok(false)` on 404.
    pub async fn delete_object(&self, class: &str, id: &str) -> Result<bool, StoreError> {
        let path = object_path(class, id)?;
        let response = self
            .request(reqwest::Method::DELETE, &path)
            .send()
            .await?;
        match expect_success(response).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    })
}

async fn expect_json(response: reqwest::Response) -> Result<Value, StoreError> {
    let response = expect_success(response).await?;
    Ok(response.json().await?)
}

fn object_path(class: &str, id: &str) -> Result<String, StoreError> {
    let id = Uuid::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))?;
    Ok(format!("/v1/objects/{}/{}", class, id.hyphenated()))
}

fn build_get_query(class: &str, properties: &[&str], limit: usize, after: Option<&str>) -> String {
    let args = match after {
        Some(id) => format!("(limit: {}, after: {})", limit, Value::String(id.to_string())),
        None => format!("(limit: {})", limit),
    };
    let mut fields = vec!["_additional { id }".to_string()];
    fields.extend(properties.iter().map(|p| p.to_string()));
    format!("{{ Get {{ {}{} {{ {} }} }} }}", class, args, fields.join(" "))
}

fn parse_get_response(json: &Value, class: &str) -> Result<Vec<StoredObject>, StoreError> {
    if let Some(errors) = json.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect();
            return Err(StoreError::GraphQl(messages.join("; ")));
        }
    }

    let items = json
        .get("data")
        .and_then(|d| d.get("Get"))
        .and_then(|g| g.get(class))
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::Decode(format!("missing data.Get.{}", class)))?;

    items
        .iter()
        .map(|item| {
            let mut properties = item
                .as_object()
                .cloned()
                .ok_or_else(|| StoreError::Decode("object is not a map".to_string()))?;
            let id = properties
                .remove("_additional")
                .and_then(|a| a.get("id").and_then(Value::as_str).map(str::to_string))
                .ok_or_else(|| StoreError::Decode("object has no _additional.id".to_string()))?;
            Ok(StoredObject {
                id,
                class: class.to_string(),
                properties,
            })
        })
        .collect()
}
