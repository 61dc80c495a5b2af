//! Request envelope adapter.
//!
//! Turns an already-authenticated request into a use-case call and the
//! outcome into a status code with a JSON body. Query-string keys match
//! case-insensitively; bodies are camelCase JSON.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::identity::Identity;
use crate::models::{CreateAccountRequest, CreateEventRequest, EditEventRequest};
use crate::query::ListEventsInput;
use crate::services::{ServiceError, Services};

const CONTENT_TYPE: &str = "Content-Type";
const APPLICATION_JSON: &str = "application/json";
const INTERNAL_ERROR_BODY: &str = r#"{"message":"Internal server error"}"#;

/// Operations the core serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    CreateAccount,
    ListAccounts,
    CreateEvent,
    EditEvent,
    DeleteEvent,
    ListEvents,
    ListTags,
}

/// An authenticated request as delivered by the front door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    pub operation: Operation,
    #[serde(default)]
    pub identity: Identity,
    #[serde(default)]
    pub query: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl GatewayRequest {
    pub fn new(operation: Operation, identity: Identity) -> Self {
        Self {
            operation,
            identity,
            query: HashMap::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl GatewayResponse {
    fn json(status_code: u16, body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());
        Self {
            status_code,
            headers,
            body: Some(body),
        }
    }

    fn no_content() -> Self {
        Self {
            status_code: 204,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    fn ok<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self::json(200, body),
            Err(e) => {
                error!(error = %e, "Failed to serialize response");
                Self::json(500, INTERNAL_ERROR_BODY.to_string())
            }
        }
    }

    fn from_error(err: &ServiceError) -> Self {
        match err.field_errors() {
            Some(errors) => match serde_json::to_string(&errors) {
                Ok(body) => Self::json(err.status_code(), body),
                Err(e) => {
                    error!(error = %e, "Failed to serialize field errors");
                    Self::json(500, INTERNAL_ERROR_BODY.to_string())
                }
            },
            None => {
                error!(error = %err, "Request failed");
                Self::json(err.status_code(), INTERNAL_ERROR_BODY.to_string())
            }
        }
    }

    /// Parse the body as JSON.
    pub fn body_json<T: DeserializeOwned>(&self) -> Option<T> {
        self.body
            .as_deref()
            .and_then(|body| serde_json::from_str(body).ok())
    }
}

/// Query-string parameters with case-insensitive lookup.
struct QueryParams(HashMap<String, String>);

impl QueryParams {
    fn new(raw: &HashMap<String, String>) -> Self {
        Self(
            raw.iter()
                .map(|(key, value)| (key.to_lowercase(), value.clone()))
                .collect(),
        )
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&key.to_lowercase()).map(String::as_str)
    }
}

/// Parse a query-string date: RFC 3339, a naive date-time taken as UTC, or a
/// bare `YYYY-MM-DD` taken as midnight UTC.
pub fn parse_query_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(date.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

/// Build a listing request from query parameters.
///
/// Unparseable dates read as absent and an unparseable limit as zero, which
/// then fails validation.
pub fn list_events_input(query: &HashMap<String, String>) -> ListEventsInput {
    let params = QueryParams::new(query);
    ListEventsInput {
        account_id: params.get("accountId").unwrap_or_default().to_string(),
        from_date: params.get("fromDate").and_then(parse_query_date),
        to_date: params.get("toDate").and_then(parse_query_date),
        limit: params
            .get("limit")
            .and_then(|limit| limit.trim().parse().ok())
            .unwrap_or(0),
        tag: params.get("tag").map(str::to_string),
        pagination_token: params.get("paginationToken").map(str::to_string),
    }
}

fn parse_body<T: DeserializeOwned>(body: Option<&str>) -> Result<T, ServiceError> {
    let body = body
        .filter(|body| !body.trim().is_empty())
        .ok_or(ServiceError::InvalidRequest)?;
    serde_json::from_str(body).map_err(|_| ServiceError::InvalidRequest)
}

/// Run one request against the use cases.
pub async fn dispatch(services: &Services, request: GatewayRequest) -> GatewayResponse {
    info!(operation = ?request.operation, "Dispatching request");

    let identity = &request.identity;
    let body = request.body.as_deref();
    let params = QueryParams::new(&request.query);

    let outcome = match request.operation {
        Operation::CreateAccount => match parse_body::<CreateAccountRequest>(body) {
            Ok(input) => services
                .accounts
                .create(identity, input)
                .await
                .map(|dto| GatewayResponse::ok(&dto)),
            Err(e) => Err(e),
        },
        Operation::ListAccounts => services
            .accounts
            .list(identity)
            .await
            .map(|dtos| GatewayResponse::ok(&dtos)),
        Operation::CreateEvent => match parse_body::<CreateEventRequest>(body) {
            Ok(input) => services
                .events
                .create(identity, input)
                .await
                .map(|dto| GatewayResponse::ok(&dto)),
            Err(e) => Err(e),
        },
        Operation::EditEvent => match parse_body::<EditEventRequest>(body) {
            Ok(input) => services
                .events
                .edit(identity, input)
                .await
                .map(|dto| GatewayResponse::ok(&dto)),
            Err(e) => Err(e),
        },
        Operation::DeleteEvent => services
            .events
            .delete(identity, params.get("id"))
            .await
            .map(|()| GatewayResponse::no_content()),
        Operation::ListEvents => services
            .events
            .list(identity, &list_events_input(&request.query))
            .await
            .map(|result| GatewayResponse::ok(&result)),
        Operation::ListTags => services
            .tags
            .list(identity, params.get("accountId"))
            .await
            .map(|dtos| GatewayResponse::ok(&dtos)),
    };

    outcome.unwrap_or_else(|err| GatewayResponse::from_error(&err))
}
