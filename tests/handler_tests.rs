// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for the goal request handlers
//!
//! Every test drives the handlers through `dispatch`, the way the API proxy
//! integration does, against the in-memory store and a frozen clock.

mod fixtures;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use goals_infrastructure::goals::{
    GoalHandlers, GoalOperation, GoalRequest, GoalResponse, GoalStore, InMemoryGoalStore,
};

use fixtures::{FailingStore, FixedClock, ALICE, BOB, FIXED_TIMESTAMP};

type Handlers = GoalHandlers<InMemoryGoalStore, FixedClock>;

fn handlers() -> Handlers {
    GoalHandlers::with_clock(InMemoryGoalStore::new(), FixedClock)
}

fn request(operation: GoalOperation, caller: &str) -> GoalRequest {
    GoalRequest::for_operation(operation).with_caller(caller)
}

fn body(response: &GoalResponse) -> Value {
    response.body_json().unwrap()
}

async fn create(handlers: &Handlers, caller: &str, title: &str, content: &str) -> String {
    let response = handlers
        .dispatch(&request(GoalOperation::CreateGoal, caller).with_body(&json!({
            "title": title,
            "content": content,
        })))
        .await;
    assert_eq!(response.status_code, 200);
    body(&response)["goalId"].as_str().unwrap().to_string()
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_returns_stored_goal() {
    let handlers = handlers();
    let response = handlers
        .dispatch(&request(GoalOperation::CreateGoal, ALICE).with_body(&json!({
            "title": "Run",
            "content": "5k",
        })))
        .await;

    assert_eq!(response.status_code, 200);
    let goal = body(&response);
    assert_eq!(goal["userId"], ALICE);
    assert_eq!(goal["title"], "Run");
    assert_eq!(goal["content"], "5k");
    assert_eq!(goal["createdAt"], FIXED_TIMESTAMP);
    assert!(!goal["goalId"].as_str().unwrap().is_empty());
    assert_eq!(handlers.store().len().await, 1);
}

#[tokio::test]
async fn test_create_requires_title_and_content() {
    let handlers = handlers();
    let response = handlers
        .dispatch(&request(GoalOperation::CreateGoal, ALICE).with_body(&json!({ "title": "Run" })))
        .await;

    assert_eq!(response.status_code, 400);
    assert_eq!(
        body(&response),
        json!({ "error": "Missing required fields: title or content" })
    );
    assert!(handlers.store().is_empty().await);
}

#[tokio::test]
async fn test_create_rejects_non_object_body() {
    let handlers = handlers();
    let response = handlers
        .dispatch(&request(GoalOperation::CreateGoal, ALICE).with_raw_body("[\"Run\"]"))
        .await;
    assert_eq!(response.status_code, 400);
    assert_eq!(body(&response), json!({ "error": "Invalid request body" }));
}

#[tokio::test]
async fn test_create_without_caller_is_unauthorized() {
    let handlers = handlers();
    let response = handlers
        .dispatch(&GoalRequest::for_operation(GoalOperation::CreateGoal).with_body(&json!({
            "title": "Run",
            "content": "5k",
        })))
        .await;
    assert_eq!(response.status_code, 401);
    assert_eq!(body(&response), json!({ "error": "Unauthorized" }));
}

// ============================================================================
// List and get
// ============================================================================

#[tokio::test]
async fn test_list_returns_only_callers_goals() {
    let handlers = handlers();
    create(&handlers, ALICE, "Run", "5k").await;
    create(&handlers, ALICE, "Read", "a book").await;
    create(&handlers, BOB, "Swim", "1k").await;

    let response = handlers.dispatch(&request(GoalOperation::GetAllGoals, ALICE)).await;
    assert_eq!(response.status_code, 200);

    let goals = body(&response);
    let goals = goals.as_array().unwrap();
    assert_eq!(goals.len(), 2);
    assert!(goals.iter().all(|g| g["userId"] == ALICE));
}

#[tokio::test]
async fn test_list_empty() {
    let handlers = handlers();
    let response = handlers.dispatch(&request(GoalOperation::GetAllGoals, ALICE)).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(body(&response), json!([]));
}

#[tokio::test]
async fn test_get_own_goal() {
    let handlers = handlers();
    let goal_id = create(&handlers, ALICE, "Run", "5k").await;

    let response = handlers
        .dispatch(&request(GoalOperation::GetGoal, ALICE).with_goal_id(&goal_id))
        .await;
    assert_eq!(response.status_code, 200);
    assert_eq!(body(&response)["goalId"], goal_id.as_str());
}

#[tokio::test]
async fn test_get_other_callers_goal_is_not_found() {
    let handlers = handlers();
    let goal_id = create(&handlers, ALICE, "Run", "5k").await;

    let response = handlers
        .dispatch(&request(GoalOperation::GetGoal, BOB).with_goal_id(&goal_id))
        .await;
    assert_eq!(response.status_code, 404);
    assert_eq!(
        body(&response),
        json!({ "error": "Goal not found or not authorized" })
    );
}

#[tokio::test]
async fn test_get_without_id() {
    let handlers = handlers();
    let response = handlers.get(&request(GoalOperation::GetGoal, ALICE)).await;
    assert_eq!(response.status_code, 400);
    assert_eq!(body(&response), json!({ "error": "Missing goal id" }));
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_merges_fields() {
    let handlers = handlers();
    let goal_id = create(&handlers, ALICE, "Run", "5k").await;

    let response = handlers
        .dispatch(
            &request(GoalOperation::UpdateGoal, ALICE)
                .with_goal_id(&goal_id)
                .with_body(&json!({ "content": "10k" })),
        )
        .await;

    assert_eq!(response.status_code, 200);
    let goal = body(&response);
    assert_eq!(goal["title"], "Run");
    assert_eq!(goal["content"], "10k");
    assert_eq!(goal["createdAt"], FIXED_TIMESTAMP);
}

#[tokio::test]
async fn test_update_without_fields() {
    let handlers = handlers();
    let goal_id = create(&handlers, ALICE, "Run", "5k").await;

    let response = handlers
        .dispatch(
            &request(GoalOperation::UpdateGoal, ALICE)
                .with_goal_id(&goal_id)
                .with_body(&json!({ "owner": "bob" })),
        )
        .await;
    assert_eq!(response.status_code, 400);
    assert_eq!(body(&response), json!({ "error": "No fields to update" }));
}

#[tokio::test]
async fn test_update_missing_goal_is_not_found() {
    let handlers = handlers();
    let response = handlers
        .dispatch(
            &request(GoalOperation::UpdateGoal, ALICE)
                .with_goal_id("does-not-exist")
                .with_body(&json!({ "title": "Walk" })),
        )
        .await;
    assert_eq!(response.status_code, 404);
}

#[tokio::test]
async fn test_update_cannot_touch_other_callers_goal() {
    let handlers = handlers();
    let goal_id = create(&handlers, ALICE, "Run", "5k").await;

    let response = handlers
        .dispatch(
            &request(GoalOperation::UpdateGoal, BOB)
                .with_goal_id(&goal_id)
                .with_body(&json!({ "title": "Hijacked" })),
        )
        .await;
    assert_eq!(response.status_code, 404);

    let stored = handlers.store().get(ALICE, &goal_id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Run");
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_then_get() {
    let handlers = handlers();
    let goal_id = create(&handlers, ALICE, "Run", "5k").await;

    let response = handlers
        .dispatch(&request(GoalOperation::DeleteGoal, ALICE).with_goal_id(&goal_id))
        .await;
    assert_eq!(response.status_code, 200);
    assert_eq!(
        body(&response),
        json!({ "message": "Goal successfully deleted" })
    );

    let response = handlers
        .dispatch(&request(GoalOperation::GetGoal, ALICE).with_goal_id(&goal_id))
        .await;
    assert_eq!(response.status_code, 404);
}

#[tokio::test]
async fn test_delete_other_callers_goal_is_not_found() {
    let handlers = handlers();
    let goal_id = create(&handlers, ALICE, "Run", "5k").await;

    let response = handlers
        .dispatch(&request(GoalOperation::DeleteGoal, BOB).with_goal_id(&goal_id))
        .await;
    assert_eq!(response.status_code, 404);
    assert_eq!(handlers.store().len().await, 1);
}

// ============================================================================
// Routing and store failures
// ============================================================================

#[test]
fn test_unknown_route() {
    let handlers = handlers();
    let mut request = request(GoalOperation::GetAllGoals, ALICE);
    request.method = "PATCH".to_string();

    let response = tokio_test::block_on(handlers.dispatch(&request));
    assert_eq!(response.status_code, 404);
    assert_eq!(body(&response), json!({ "error": "Route not found" }));
}

#[tokio::test]
async fn test_proxy_event_round_trip() {
    let handlers = handlers();
    let event = json!({
        "httpMethod": "POST",
        "resource": "/goals",
        "path": "/goals",
        "pathParameters": null,
        "body": "{\"title\":\"Run\",\"content\":\"5k\"}",
        "requestContext": { "authorizer": { "claims": { "sub": ALICE } } }
    });
    let request: GoalRequest = serde_json::from_value(event).unwrap();

    let response = handlers.dispatch(&request).await;
    let wire = serde_json::to_value(&response).unwrap();
    assert_eq!(wire["statusCode"], 200);
    assert_eq!(wire["headers"]["Content-Type"], "application/json");
    assert_eq!(wire["headers"]["Access-Control-Allow-Origin"], "*");
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let handlers = GoalHandlers::with_clock(FailingStore, FixedClock);

    for operation in GoalOperation::ALL {
        let request = request(operation, ALICE)
            .with_goal_id("g-1")
            .with_body(&json!({ "title": "Run", "content": "5k" }));
        let response = handlers.dispatch(&request).await;

        assert_eq!(response.status_code, 500, "{}", operation);
        assert_eq!(body(&response), json!({ "error": "Internal server error" }));
    }
}
