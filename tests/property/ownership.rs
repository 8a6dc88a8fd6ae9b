// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Goal Ownership
//!
//! Whatever a caller creates, another caller can neither read, update nor
//! delete it, and the owner reads back exactly what was written.

use goals_infrastructure::goals::{GoalHandlers, GoalOperation, GoalRequest, InMemoryGoalStore};
use proptest::prelude::*;
use serde_json::json;

use crate::fixtures::{FixedClock, ALICE, BOB};

fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!?]{1,40}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_owner_reads_back_what_was_written(title in text(), content in text()) {
        let handlers = GoalHandlers::with_clock(InMemoryGoalStore::new(), FixedClock);

        let (created, fetched) = tokio_test::block_on(async {
            let created = handlers
                .dispatch(
                    &GoalRequest::for_operation(GoalOperation::CreateGoal)
                        .with_caller(ALICE)
                        .with_body(&json!({ "title": title, "content": content })),
                )
                .await;
            let goal_id = created.body_json().unwrap()["goalId"].as_str().unwrap().to_string();
            let fetched = handlers
                .dispatch(
                    &GoalRequest::for_operation(GoalOperation::GetGoal)
                        .with_caller(ALICE)
                        .with_goal_id(goal_id),
                )
                .await;
            (created, fetched)
        });

        prop_assert_eq!(created.status_code, 200);
        prop_assert_eq!(fetched.status_code, 200);
        prop_assert_eq!(created.body_json().unwrap(), fetched.body_json().unwrap());
    }

    #[test]
    fn prop_other_callers_never_reach_goal(title in text(), operation_index in 0usize..3) {
        let handlers = GoalHandlers::with_clock(InMemoryGoalStore::new(), FixedClock);
        let operation = [
            GoalOperation::GetGoal,
            GoalOperation::UpdateGoal,
            GoalOperation::DeleteGoal,
        ][operation_index];

        let (intruder, stored) = tokio_test::block_on(async {
            let created = handlers
                .dispatch(
                    &GoalRequest::for_operation(GoalOperation::CreateGoal)
                        .with_caller(ALICE)
                        .with_body(&json!({ "title": title, "content": "private" })),
                )
                .await;
            let goal_id = created.body_json().unwrap()["goalId"].as_str().unwrap().to_string();

            let intruder = handlers
                .dispatch(
                    &GoalRequest::for_operation(operation)
                        .with_caller(BOB)
                        .with_goal_id(goal_id.clone())
                        .with_body(&json!({ "title": "changed" })),
                )
                .await;
            let stored = handlers
                .dispatch(
                    &GoalRequest::for_operation(GoalOperation::GetGoal)
                        .with_caller(ALICE)
                        .with_goal_id(goal_id),
                )
                .await;
            (intruder, stored)
        });

        prop_assert_eq!(intruder.status_code, 404);
        prop_assert_eq!(stored.status_code, 200);
        prop_assert_eq!(&stored.body_json().unwrap()["title"], &json!(title));
    }
}
