//! In-process mock of the three hosted services (helpdesk, chat
//! completions, vector store), served by axum on an ephemeral port.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mimir_sync::credentials::VectorStoreSettings;
use mimir_sync::vector_store::VectorStoreClient;

#[derive(Debug, Clone)]
pub struct MockObject {
    pub id: String,
    pub class: String,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct IncidentRequest {
    pub authorization: Option<String>,
    pub query: HashMap<String, String>,
}

#[derive(Debug)]
pub struct MockState {
    pub classes: Vec<String>,
    /// Answer every class create with 422 regardless of what exists.
    pub class_create_conflict: bool,
    pub properties: HashMap<String, Vec<String>>,
    pub objects: Vec<MockObject>,
    /// `(property, value)`: object creates carrying this value fail with 500.
    pub fail_create_when: Option<(String, String)>,
    pub incidents_status: u16,
    pub incidents: Vec<Value>,
    pub incident_requests: Vec<IncidentRequest>,
    pub schema_create_calls: usize,
    pub object_create_calls: usize,
    pub graphql_queries: Vec<String>,
    pub chat_requests: Vec<Value>,
    /// Chat requests whose prompt contains this text fail with 500.
    pub chat_fail_for: Option<String>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            classes: Vec::new(),
            class_create_conflict: false,
            properties: HashMap::new(),
            objects: Vec::new(),
            fail_create_when: None,
            incidents_status: 200,
            incidents: Vec::new(),
            incident_requests: Vec::new(),
            schema_create_calls: 0,
            object_create_calls: 0,
            graphql_queries: Vec::new(),
            chat_requests: Vec::new(),
            chat_fail_for: None,
        }
    }
}

impl MockState {
    pub fn seed_object(&mut self, class: &str, properties: Value) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.objects.push(MockObject {
            id: id.clone(),
            class: class.to_string(),
            properties: properties.as_object().cloned().unwrap_or_default(),
        });
        id
    }
}

type Shared = Arc<Mutex<MockState>>;

pub struct MockServer {
    pub base_url: String,
    pub state: Shared,
}

impl MockServer {
    pub fn store_client(&self) -> VectorStoreClient {
        let settings = VectorStoreSettings {
            base_url: self.base_url.clone(),
            api_key: Some("wv-test-key".to_string()),
            openai_api_key: None,
        };
        VectorStoreClient::new(&settings, reqwest::Client::new())
    }

    pub fn objects_of(&self, class: &str) -> Vec<MockObject> {
        self.state
            .lock()
            .unwrap()
            .objects
            .iter()
            .filter(|o| o.class == class)
            .cloned()
            .collect()
    }

    pub fn object(&self, id: &str) -> MockObject {
        self.state
            .lock()
            .unwrap()
            .objects
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .unwrap_or_else(|| panic!("no object {}", id))
    }
}

pub async fn start(state: MockState) -> MockServer {
    let shared: Shared = Arc::new(Mutex::new(state));

    let app = Router::new()
        .route("/v1/schema", get(get_schema).post(create_class))
        .route("/v1/schema/{class}/properties", post(add_property))
        .route("/v1/objects", post(create_object))
        .route(
            "/v1/objects/{class}/{id}",
            get(get_object).patch(patch_object).delete(delete_object),
        )
        .route("/v1/graphql", post(graphql))
        .route("/api/now/table/incident", get(incidents))
        .route("/v1/chat/completions", post(chat))
        .with_state(shared.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockServer {
        base_url: format!("http://{}", addr),
        state: shared,
    }
}

fn conflict(message: String) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": [{ "message": message }] })),
    )
        .into_response()
}

async fn get_schema(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock().unwrap();
    let classes: Vec<Value> = state
        .classes
        .iter()
        .map(|c| json!({ "class": c, "properties": [] }))
        .collect();
    Json(json!({ "classes": classes }))
}

async fn create_class(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.schema_create_calls += 1;
    let class = body["class"].as_str().unwrap_or_default().to_string();
    if state.class_create_conflict || state.classes.contains(&class) {
        return conflict(format!("class name {:?} already exists", class));
    }
    state.classes.push(class);
    Json(body).into_response()
}

async fn add_property(
    State(state): State<Shared>,
    Path(class): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let props = state.properties.entry(class).or_default();
    if props.contains(&name) {
        return conflict(format!("property {:?} already exists", name));
    }
    props.push(name);
    Json(body).into_response()
}

async fn create_object(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.object_create_calls += 1;
    let class = body["class"].as_str().unwrap_or_default().to_string();
    let properties = body["properties"].as_object().cloned().unwrap_or_default();

    if let Some((key, value)) = &state.fail_create_when {
        if properties.get(key).and_then(Value::as_str) == Some(value.as_str()) {
            return (StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable").into_response();
        }
    }

    let id = uuid::Uuid::new_v4().to_string();
    state.objects.push(MockObject {
        id: id.clone(),
        class: class.clone(),
        properties: properties.clone(),
    });
    Json(json!({ "id": id, "class": class, "properties": properties })).into_response()
}

async fn get_object(
    State(state): State<Shared>,
    Path((class, id)): Path<(String, String)>,
) -> Response {
    let state = state.lock().unwrap();
    match state
        .objects
        .iter()
        .find(|o| o.class == class && o.id == id)
    {
        Some(obj) => Json(json!({
            "id": obj.id,
            "class": obj.class,
            "properties": obj.properties,
        }))
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn patch_object(
    State(state): State<Shared>,
    Path((class, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    let Some(obj) = state
        .objects
        .iter_mut()
        .find(|o| o.class == class && o.id == id)
    else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Some(props) = body["properties"].as_object() {
        for (k, v) in props {
            obj.properties.insert(k.clone(), v.clone());
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn delete_object(
    State(state): State<Shared>,
    Path((class, id)): Path<(String, String)>,
) -> StatusCode {
    let mut state = state.lock().unwrap();
    let before = state.objects.len();
    state.objects.retain(|o| !(o.class == class && o.id == id));
    if state.objects.len() < before {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Text following `key` in `query`, up to the first `,` or `)`.
fn query_arg<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    let rest = query.split(key).nth(1)?;
    let end = rest.find([',', ')'])?;
    Some(rest[..end].trim())
}

/// Honours `limit` and the `after` cursor; objects keep insertion order.
async fn graphql(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    let query = body["query"].as_str().unwrap_or_default().to_string();
    state.graphql_queries.push(query.clone());

    let class: String = query
        .split("Get {")
        .nth(1)
        .unwrap_or_default()
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    let limit = query_arg(&query, "limit:")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(usize::MAX);
    let after = query_arg(&query, "after:").map(|a| a.trim_matches('"').to_string());

    let in_class: Vec<&MockObject> = state.objects.iter().filter(|o| o.class == class).collect();
    let start = match &after {
        Some(id) => in_class
            .iter()
            .position(|o| &o.id == id)
            .map(|p| p + 1)
            .unwrap_or(in_class.len()),
        None => 0,
    };

    let items: Vec<Value> = in_class
        .into_iter()
        .skip(start)
        .take(limit)
        .map(|o| {
            let mut item = o.properties.clone();
            item.insert("_additional".to_string(), json!({ "id": o.id }));
            Value::Object(item)
        })
        .collect();

    Json(json!({ "data": { "Get": { class: items } } }))
}

async fn incidents(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.incident_requests.push(IncidentRequest {
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        query,
    });

    if state.incidents_status != 200 {
        let status = StatusCode::from_u16(state.incidents_status).unwrap();
        return (status, "Internal Server Error").into_response();
    }
    Json(json!({ "result": state.incidents })).into_response()
}

async fn chat(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.chat_requests.push(body.clone());

    let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
    if let Some(marker) = &state.chat_fail_for {
        if prompt.contains(marker.as_str()) {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": { "message": "model overloaded" } })),
            )
                .into_response();
        }
    }

    Json(json!({
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": "\n  Generated description  \n" } }
        ]
    }))
    .into_response()
}
