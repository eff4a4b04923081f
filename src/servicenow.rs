//! Helpdesk (ServiceNow Table API) reader.
//!
//! Issues a single `GET {instance}/api/now/table/{table}` with basic auth
//! and `sysparm_limit` / `sysparm_fields` query parameters. Anything other
//! than HTTP 200 is a terminal failure for the run; there is no retry.

use thiserror::Error;

use crate::credentials::TicketingSettings;
use crate::models::Incident;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to retrieve data. Status code: {status}, Response: {body}")]
    Status { status: u16, body: String },

    #[error("Request to ticketing API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid ticketing API response: {0}")]
    Decode(String),
}

/// Fetch incidents from the configured table.
///
/// # Errors
///
/// - [`FetchError::Status`] for any non-200 response, carrying the body text.
/// - [`FetchError::Transport`] when the request itself fails.
/// - [`FetchError::Decode`] when the body has no `result` array.
pub async fn fetch_incidents(
    client: &reqwest::Client,
    settings: &TicketingSettings,
) -> Result<Vec<Incident>, FetchError> {
    let url = table_url(settings);
    let fields = settings.fields.join(",");
    let limit = settings.limit.to_string();

    let response = client
        .get(&url)
        .basic_auth(&settings.username, Some(&settings.password))
        .header("Accept", "application/json")
        .header("Content-Type", "application/json")
        .query(&[
            ("sysparm_limit", limit.as_str()),
            ("sysparm_fields", fields.as_str()),
        ])
        .send()
        .await?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let json: serde_json::Value = response.json().await?;
    parse_incident_list(&json)
}

fn table_url(settings: &TicketingSettings) -> String {
    format!(
        "{}/api/now/table/{}",
        settings.instance_url.trim_end_matches('/'),
        settings.table
    )
}

fn parse_incident_list(json: &serde_json::Value) -> Result<Vec<Incident>, FetchError> {
    let result = json
        .get("result")
        .and_then(|r| r.as_array())
        .ok_or_else(|| FetchError::Decode("missing result array".to_string()))?;

    result
        .iter()
        .map(|item| {
            serde_json::from_value(item.clone()).map_err(|e| FetchError::Decode(e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(instance: &str) -> TicketingSettings {
        TicketingSettings {
            instance_url: instance.to_string(),
            username: "admin".to_string(),
            password: "pw".to_string(),
            table: "incident".to_string(),
            limit: 10,
            fields: vec!["number".to_string(), "state".to_string()],
        }
    }

    #[test]
    fn table_url_handles_trailing_slash() {
        assert_eq!(
            table_url(&settings("https://dev1.service-now.com/")),
            "https://dev1.service-now.com/api/now/table/incident"
        );
    }

    #[test]
    fn parses_result_array() {
        let incidents = parse_incident_list(&json!({
            "result": [
                {"number": "INC1", "short_description": "a", "priority": "1", "state": "1"},
                {"number": "INC2"}
            ]
        }))
        .unwrap();
        assert_eq!(incidents.len(), 2);
        assert_eq!(incidents[0].short_description.as_deref(), Some("a"));
        assert!(incidents[1].priority.is_none());
    }

    #[test]
    fn missing_result_is_decode_error() {
        let err = parse_incident_list(&json!({"error": "nope"})).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn status_error_message_includes_body() {
        let err = FetchError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to retrieve data. Status code: 500, Response: boom"
        );
    }
}
