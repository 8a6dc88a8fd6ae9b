// Copyright (c) 2025 - Cowboy AI, Inc.
//! Goals: the application the infrastructure serves
//!
//! - [`Goal`] - one stored item, keyed by (owner, goal id)
//! - [`GoalOperation`] - the five request handlers, their routes and the table
//!   actions each one needs
//! - [`GoalStore`] - key-value table seam
//! - [`GoalHandlers`] - request handling over an injected store and clock

pub mod handlers;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use handlers::{
    Clock, GoalHandlers, GoalRequest, GoalResponse, HandlerError, SystemClock,
};
pub use store::{GoalStore, InMemoryGoalStore, StoreError, StoreResult};

/// Table partition key attribute (goal owner)
pub const PARTITION_KEY: &str = "userId";

/// Table sort key attribute (goal identifier)
pub const SORT_KEY: &str = "goalId";

/// Environment variable the handler functions read the table name from
pub const TABLE_NAME_VARIABLE: &str = "GOALS_TABLE_NAME";

/// Stored goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub user_id: String,
    pub goal_id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Partial update of a goal's mutable fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl GoalPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }

    /// Merge into an existing goal
    pub fn apply(&self, goal: &mut Goal) {
        if let Some(title) = &self.title {
            goal.title = title.clone();
        }
        if let Some(content) = &self.content {
            goal.content = content.clone();
        }
    }
}

/// HTTP route bound to one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    pub method: &'static str,
    pub path: &'static str,
}

/// Collection path
pub const GOALS_PATH: &str = "/goals";

/// Item path; `id` is the path parameter carrying the goal identifier
pub const GOAL_PATH: &str = "/goals/{id}";

/// Path parameter holding the goal identifier
pub const GOAL_ID_PARAMETER: &str = "id";

/// The five goal request handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GoalOperation {
    GetAllGoals,
    CreateGoal,
    GetGoal,
    UpdateGoal,
    DeleteGoal,
}

impl GoalOperation {
    /// Every operation, in deployment order
    pub const ALL: [GoalOperation; 5] = [
        GoalOperation::GetAllGoals,
        GoalOperation::CreateGoal,
        GoalOperation::GetGoal,
        GoalOperation::UpdateGoal,
        GoalOperation::DeleteGoal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetAllGoals => "GetAllGoals",
            Self::CreateGoal => "CreateGoal",
            Self::GetGoal => "GetGoal",
            Self::UpdateGoal => "UpdateGoal",
            Self::DeleteGoal => "DeleteGoal",
        }
    }

    pub fn route(&self) -> Route {
        match self {
            Self::GetAllGoals => Route { method: "GET", path: GOALS_PATH },
            Self::CreateGoal => Route { method: "POST", path: GOALS_PATH },
            Self::GetGoal => Route { method: "GET", path: GOAL_PATH },
            Self::UpdateGoal => Route { method: "PUT", path: GOAL_PATH },
            Self::DeleteGoal => Route { method: "DELETE", path: GOAL_PATH },
        }
    }

    /// Operation bound to `method` on `path`, if any
    pub fn from_route(method: &str, path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| {
            let route = op.route();
            route.method.eq_ignore_ascii_case(method) && route.path == path
        })
    }

    /// Table actions the operation's role is granted, nothing more
    pub fn table_actions(&self) -> &'static [&'static str] {
        match self {
            Self::GetAllGoals => &["dynamodb:Query", "dynamodb:Scan"],
            Self::CreateGoal => &["dynamodb:PutItem", "dynamodb:GetItem"],
            Self::GetGoal => &["dynamodb:GetItem"],
            Self::UpdateGoal => &["dynamodb:UpdateItem", "dynamodb:GetItem"],
            Self::DeleteGoal => &["dynamodb:DeleteItem", "dynamodb:GetItem"],
        }
    }
}

impl fmt::Display for GoalOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
