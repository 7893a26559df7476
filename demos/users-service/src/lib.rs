//! users-service - Example busrpc handler
//!
//! Serves a small `/users` resource so the whole call path can be exercised
//! end to end:
//!
//! | Route | Response |
//! |---|---|
//! | `GET /users/{id}` | `{"id":"{id}"}` |
//! | `POST /users` | the request body, echoed |
//! | `PUT /users/{id}` | `{"id":"{id}", ...body}` |
//! | `DELETE /users/{id}` | `{"id":"{id}","deleted":true}` |
//! | `GET /sleep?ms=N` | `{"slept_ms":N}` after sleeping N milliseconds |

use async_trait::async_trait;
use busrpc_core::{Handler, Method, RpcError, RpcResult, StructuredRequest, StructuredResponse};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

// ============================================================================
// Message Types
// ============================================================================

/// Response for a single user lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserId {
    pub id: String,
}

/// Response for a deletion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedUser {
    pub id: String,
    pub deleted: bool,
}

/// Response from the sleep route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepResponse {
    /// Duration slept in milliseconds
    pub slept_ms: u64,
}

/// Longest sleep the sleep route accepts
pub const MAX_SLEEP_MS: u64 = 10_000;

// ============================================================================
// Handler Implementation
// ============================================================================

/// Handler for the `/users` routes
#[derive(Default)]
pub struct UsersHandler {
    /// Requests served, including failed ones
    served: AtomicU64,
}

enum Route<'a> {
    Users,
    User(&'a str),
    Sleep,
}

impl UsersHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests handled so far
    pub fn served(&self) -> u64 {
        self.served.load(Ordering::Relaxed)
    }

    fn route<'a>(&self, request: &'a StructuredRequest) -> RpcResult<Route<'a>> {
        let segments: Vec<&str> = request.segments().collect();
        match segments.as_slice() {
            ["users"] => Ok(Route::Users),
            ["users", id] => Ok(Route::User(id)),
            ["sleep"] => Ok(Route::Sleep),
            _ => Err(RpcError::handler(
                404,
                format!("no route for {}", request.path),
            )),
        }
    }

    fn handle_get_user(&self, id: &str) -> RpcResult<StructuredResponse> {
        tracing::debug!(id, "Looking up user");
        StructuredResponse::json(200, &UserId { id: id.to_string() })
    }

    fn handle_create_user(&self, request: &StructuredRequest) -> RpcResult<StructuredResponse> {
        let body = body_object(request)?;
        tracing::info!(fields = body.len(), "Creating user");
        StructuredResponse::json(200, &body)
    }

    fn handle_update_user(
        &self,
        id: &str,
        request: &StructuredRequest,
    ) -> RpcResult<StructuredResponse> {
        let mut merged = Map::new();
        merged.insert("id".to_string(), Value::String(id.to_string()));
        for (key, value) in body_object(request)? {
            if key != "id" {
                merged.insert(key, value);
            }
        }
        tracing::info!(id, "Updating user");
        StructuredResponse::json(200, &merged)
    }

    fn handle_delete_user(&self, id: &str) -> RpcResult<StructuredResponse> {
        tracing::info!(id, "Deleting user");
        StructuredResponse::json(
            200,
            &DeletedUser {
                id: id.to_string(),
                deleted: true,
            },
        )
    }

    /// Sleep route, useful for exercising timeouts and concurrency limits
    async fn handle_sleep(&self, request: &StructuredRequest) -> RpcResult<StructuredResponse> {
        let ms = match request.query.get("ms") {
            None => 0,
            Some(Value::Number(n)) => n.as_u64().unwrap_or(u64::MAX),
            Some(Value::String(s)) => s
                .parse()
                .map_err(|_| RpcError::handler(400, format!("invalid ms: {s}")))?,
            Some(other) => return Err(RpcError::handler(400, format!("invalid ms: {other}"))),
        };
        if ms > MAX_SLEEP_MS {
            return Err(RpcError::handler(400, format!("ms must be at most {MAX_SLEEP_MS}")));
        }
        tracing::debug!("Sleeping for {}ms", ms);
        tokio::time::sleep(Duration::from_millis(ms)).await;
        StructuredResponse::json(200, &SleepResponse { slept_ms: ms })
    }
}

/// The structured body as an object; a missing body or `[]` counts as empty
fn body_object(request: &StructuredRequest) -> RpcResult<Map<String, Value>> {
    match request.parsed_body.clone() {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Array(items)) if items.is_empty() => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(RpcError::handler(400, "request body must be a JSON object")),
    }
}

fn method_not_allowed(request: &StructuredRequest) -> RpcError {
    RpcError::handler(
        405,
        format!("{} not allowed on {}", request.method, request.path),
    )
}

#[async_trait]
impl Handler for UsersHandler {
    async fn handle(&self, request: StructuredRequest) -> RpcResult<StructuredResponse> {
        self.served.fetch_add(1, Ordering::Relaxed);

        match (request.method, self.route(&request)?) {
            (Method::Post, Route::Users) => self.handle_create_user(&request),
            (Method::Get, Route::User(id)) => self.handle_get_user(id),
            (Method::Put, Route::User(id)) => self.handle_update_user(id, &request),
            (Method::Delete, Route::User(id)) => self.handle_delete_user(id),
            (Method::Get, Route::Sleep) => self.handle_sleep(&request).await,
            _ => Err(method_not_allowed(&request)),
        }
    }

    fn name(&self) -> &str {
        "users-service"
    }
}
