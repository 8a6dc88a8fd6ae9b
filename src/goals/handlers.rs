// Copyright (c) 2025 - Cowboy AI, Inc.
//! Goal Request Handlers
//!
//! The five handlers behind the API's goal routes. Each one receives the
//! caller identity established by the authorizer and only ever addresses the
//! caller's own items.
//!
//! | Operation | Success | Failure |
//! |---|---|---|
//! | create | 200 stored goal | 400 missing title/content, 500 store failure |
//! | list | 200 caller's goals | 500 store failure |
//! | get | 200 goal | 404 absent or not owned |
//! | update | 200 merged goal | 404 absent, 400 no fields, 500 store failure |
//! | delete | 200 confirmation | 404 absent or not owned |
//!
//! Store failures are logged with detail and answered with a generic 500.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::store::{GoalStore, StoreError};
use super::{Goal, GoalOperation, GoalPatch, GOAL_ID_PARAMETER};

/// Source of timestamps for new goals
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Handler errors, each mapped onto one status and public message
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid request body")]
    InvalidBody,

    #[error("Missing required fields: title or content")]
    MissingFields,

    #[error("Missing goal id")]
    MissingGoalId,

    #[error("No fields to update")]
    NoFieldsToUpdate,

    #[error("Goal not found or not authorized")]
    NotFound,

    #[error("Route not found")]
    RouteNotFound,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl HandlerError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::InvalidBody | Self::MissingFields | Self::MissingGoalId | Self::NoFieldsToUpdate => 400,
            Self::NotFound | Self::RouteNotFound => 404,
            Self::Store(_) => 500,
        }
    }

    /// Message safe to return to the caller
    pub fn public_message(&self) -> String {
        match self {
            Self::Store(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn into_response(self) -> GoalResponse {
        GoalResponse::error(self.status_code(), &self.public_message())
    }
}

/// Incoming request, as delivered by the API proxy integration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "ProxyEvent")]
pub struct GoalRequest {
    pub method: String,
    pub path: String,
    pub path_parameters: HashMap<String, String>,
    pub body: Option<String>,
    /// Subject claim established by the authorizer
    pub caller: Option<String>,
}

impl GoalRequest {
    /// Request addressed to an operation's route
    pub fn for_operation(operation: GoalOperation) -> Self {
        let route = operation.route();
        Self {
            method: route.method.to_string(),
            path: route.path.to_string(),
            path_parameters: HashMap::new(),
            body: None,
            caller: None,
        }
    }

    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    pub fn with_goal_id(mut self, goal_id: impl Into<String>) -> Self {
        self.path_parameters
            .insert(GOAL_ID_PARAMETER.to_string(), goal_id.into());
        self
    }

    pub fn with_body(self, body: &Value) -> Self {
        self.with_raw_body(body.to_string())
    }

    pub fn with_raw_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    fn caller_id(&self) -> Result<&str, HandlerError> {
        self.caller
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(HandlerError::Unauthorized)
    }

    fn goal_id(&self) -> Result<&str, HandlerError> {
        self.path_parameters
            .get(GOAL_ID_PARAMETER)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
            .ok_or(HandlerError::MissingGoalId)
    }

    /// Body as a JSON object; an absent body reads as `{}`
    fn json_body(&self) -> Result<Map<String, Value>, HandlerError> {
        let raw = match self.body.as_deref() {
            None => return Ok(Map::new()),
            Some(raw) if raw.trim().is_empty() => return Ok(Map::new()),
            Some(raw) => raw,
        };
        match serde_json::from_str(raw) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(HandlerError::InvalidBody),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProxyEvent {
    http_method: String,
    resource: String,
    #[serde(default)]
    path_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    request_context: Option<RequestContext>,
}

#[derive(Deserialize)]
struct RequestContext {
    #[serde(default)]
    authorizer: Option<Authorizer>,
}

#[derive(Deserialize)]
struct Authorizer {
    #[serde(default)]
    claims: Option<Claims>,
}

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
}

impl From<ProxyEvent> for GoalRequest {
    fn from(event: ProxyEvent) -> Self {
        let caller = event
            .request_context
            .and_then(|ctx| ctx.authorizer)
            .and_then(|auth| auth.claims)
            .and_then(|claims| claims.sub);
        Self {
            method: event.http_method,
            path: event.resource,
            path_parameters: event.path_parameters.unwrap_or_default(),
            body: event.body,
            caller,
        }
    }
}

/// Response handed back to the API proxy integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl GoalResponse {
    pub fn json<T: Serialize>(status_code: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status_code,
                headers: Self::default_headers(),
                body,
            },
            Err(e) => {
                error!("Failed to serialize response body: {}", e);
                Self::error(500, "Internal server error")
            }
        }
    }

    pub fn error(status_code: u16, message: &str) -> Self {
        Self {
            status_code,
            headers: Self::default_headers(),
            body: json!({ "error": message }).to_string(),
        }
    }

    /// Parsed body
    pub fn body_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }

    fn default_headers() -> BTreeMap<String, String> {
        [
            ("Content-Type", "application/json"),
            ("Access-Control-Allow-Origin", "*"),
            (
                "Access-Control-Allow-Headers",
                "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token",
            ),
            ("Access-Control-Allow-Methods", "OPTIONS,GET,POST,PUT,DELETE"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }
}

/// The five goal handlers over an injected store and clock
pub struct GoalHandlers<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: GoalStore> GoalHandlers<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: GoalStore, C: Clock> GoalHandlers<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Route a request to its handler by method and resource path
    pub async fn dispatch(&self, request: &GoalRequest) -> GoalResponse {
        match GoalOperation::from_route(&request.method, &request.path) {
            Some(operation) => self.handle(operation, request).await,
            None => {
                debug!("No route for {} {}", request.method, request.path);
                HandlerError::RouteNotFound.into_response()
            }
        }
    }

    /// Run one operation and convert its outcome to a response
    pub async fn handle(&self, operation: GoalOperation, request: &GoalRequest) -> GoalResponse {
        let outcome = match operation {
            GoalOperation::CreateGoal => self.try_create(request).await,
            GoalOperation::GetAllGoals => self.try_list(request).await,
            GoalOperation::GetGoal => self.try_get(request).await,
            GoalOperation::UpdateGoal => self.try_update(request).await,
            GoalOperation::DeleteGoal => self.try_delete(request).await,
        };

        match outcome {
            Ok(response) => response,
            Err(HandlerError::Store(e)) => {
                error!("{} failed: {}", operation, e);
                HandlerError::Store(e).into_response()
            }
            Err(e) => {
                debug!("{} rejected: {}", operation, e);
                e.into_response()
            }
        }
    }

    pub async fn create(&self, request: &GoalRequest) -> GoalResponse {
        self.handle(GoalOperation::CreateGoal, request).await
    }

    pub async fn list(&self, request: &GoalRequest) -> GoalResponse {
        self.handle(GoalOperation::GetAllGoals, request).await
    }

    pub async fn get(&self, request: &GoalRequest) -> GoalResponse {
        self.handle(GoalOperation::GetGoal, request).await
    }

    pub async fn update(&self, request: &GoalRequest) -> GoalResponse {
        self.handle(GoalOperation::UpdateGoal, request).await
    }

    pub async fn delete(&self, request: &GoalRequest) -> GoalResponse {
        self.handle(GoalOperation::DeleteGoal, request).await
    }

    async fn try_create(&self, request: &GoalRequest) -> Result<GoalResponse, HandlerError> {
        let body = request.json_body()?;
        let title = non_empty_string(&body, "title");
        let content = non_empty_string(&body, "content");
        let (Some(title), Some(content)) = (title, content) else {
            return Err(HandlerError::MissingFields);
        };
        let user_id = request.caller_id()?;

        let goal = Goal {
            user_id: user_id.to_string(),
            goal_id: Uuid::new_v4().to_string(),
            title,
            content,
            created_at: self.clock.now(),
        };
        self.store.put(goal.clone()).await?;

        info!("Created goal {} for {}", goal.goal_id, goal.user_id);
        Ok(GoalResponse::json(200, &goal))
    }

    async fn try_list(&self, request: &GoalRequest) -> Result<GoalResponse, HandlerError> {
        let user_id = request.caller_id()?;
        let goals = self.store.query(user_id).await?;
        debug!("Listed {} goals for {}", goals.len(), user_id);
        Ok(GoalResponse::json(200, &goals))
    }

    async fn try_get(&self, request: &GoalRequest) -> Result<GoalResponse, HandlerError> {
        let user_id = request.caller_id()?;
        let goal_id = request.goal_id()?;
        let goal = self
            .store
            .get(user_id, goal_id)
            .await?
            .ok_or(HandlerError::NotFound)?;
        Ok(GoalResponse::json(200, &goal))
    }

    async fn try_update(&self, request: &GoalRequest) -> Result<GoalResponse, HandlerError> {
        let user_id = request.caller_id()?;
        let goal_id = request.goal_id()?;
        let body = request.json_body()?;

        if self.store.get(user_id, goal_id).await?.is_none() {
            return Err(HandlerError::NotFound);
        }

        let patch = GoalPatch {
            title: string_field(&body, "title")?,
            content: string_field(&body, "content")?,
        };
        if patch.is_empty() {
            return Err(HandlerError::NoFieldsToUpdate);
        }

        let goal = match self.store.update(user_id, goal_id, &patch).await {
            Ok(goal) => goal,
            Err(StoreError::NotFound { .. }) => return Err(HandlerError::NotFound),
            Err(e) => return Err(e.into()),
        };

        info!("Updated goal {} for {}", goal_id, user_id);
        Ok(GoalResponse::json(200, &goal))
    }

    async fn try_delete(&self, request: &GoalRequest) -> Result<GoalResponse, HandlerError> {
        let user_id = request.caller_id()?;
        let goal_id = request.goal_id()?;

        if !self.store.delete(user_id, goal_id).await? {
            return Err(HandlerError::NotFound);
        }

        info!("Deleted goal {} for {}", goal_id, user_id);
        Ok(GoalResponse::json(
            200,
            &json!({ "message": "Goal successfully deleted" }),
        ))
    }
}

fn non_empty_string(body: &Map<String, Value>, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Present string field; present but not a string is a malformed body
fn string_field(body: &Map<String, Value>, field: &str) -> Result<Option<String>, HandlerError> {
    match body.get(field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(HandlerError::InvalidBody),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_statuses() {
        assert_eq!(HandlerError::Unauthorized.status_code(), 401);
        assert_eq!(HandlerError::MissingFields.status_code(), 400);
        assert_eq!(HandlerError::NotFound.status_code(), 404);
        let store = HandlerError::Store(StoreError::Unavailable("disk on fire".into()));
        assert_eq!(store.status_code(), 500);
        assert_eq!(store.public_message(), "Internal server error");
    }

    #[test]
    fn test_request_from_proxy_event() {
        let event = json!({
            "httpMethod": "PUT",
            "resource": "/goals/{id}",
            "path": "/goals/42",
            "pathParameters": { "id": "42" },
            "body": "{\"title\":\"t\"}",
            "requestContext": { "authorizer": { "claims": { "sub": "user-1", "email": "x@example.com" } } }
        });

        let request: GoalRequest = serde_json::from_value(event).unwrap();
        assert_eq!(request.method, "PUT");
        assert_eq!(request.path, "/goals/{id}");
        assert_eq!(request.goal_id().unwrap(), "42");
        assert_eq!(request.caller.as_deref(), Some("user-1"));
        assert_eq!(request.json_body().unwrap()["title"], "t");
    }

    #[test]
    fn test_request_without_authorizer() {
        let event = json!({ "httpMethod": "GET", "resource": "/goals", "pathParameters": null });
        let request: GoalRequest = serde_json::from_value(event).unwrap();
        assert_eq!(request.caller_id(), Err(HandlerError::Unauthorized));
        assert_eq!(request.goal_id(), Err(HandlerError::MissingGoalId));
    }

    #[test]
    fn test_body_must_be_object() {
        let request = GoalRequest::for_operation(GoalOperation::CreateGoal).with_raw_body("[1,2]");
        assert_eq!(request.json_body(), Err(HandlerError::InvalidBody));

        let request = GoalRequest::for_operation(GoalOperation::CreateGoal).with_raw_body("not json");
        assert_eq!(request.json_body(), Err(HandlerError::InvalidBody));

        let request = GoalRequest::for_operation(GoalOperation::CreateGoal);
        assert!(request.json_body().unwrap().is_empty());
    }

    #[test]
    fn test_response_headers() {
        let response = GoalResponse::error(404, "Route not found");
        assert_eq!(response.headers["Content-Type"], "application/json");
        assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(response.body_json().unwrap(), json!({ "error": "Route not found" }));
    }
}
