// Copyright (c) 2025 - Cowboy AI, Inc.
//! Goal Store Abstraction
//!
//! Every operation is addressed by the composite key (owner, goal id), or by
//! owner alone for queries. A caller can therefore never reach another
//! caller's items through this interface.

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Goal, GoalPatch};

/// Store errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Goal {goal_id} not found for owner {user_id}")]
    NotFound { user_id: String, goal_id: String },

    #[error("Goal {goal_id} already exists for owner {user_id}")]
    AlreadyExists { user_id: String, goal_id: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value table holding goals
#[async_trait]
pub trait GoalStore: Send + Sync {
    /// Insert a new goal
    ///
    /// # Errors
    /// `AlreadyExists` if the composite key is taken.
    async fn put(&self, goal: Goal) -> StoreResult<()>;

    /// Read one goal
    async fn get(&self, user_id: &str, goal_id: &str) -> StoreResult<Option<Goal>>;

    /// Every goal owned by `user_id`
    async fn query(&self, user_id: &str) -> StoreResult<Vec<Goal>>;

    /// Merge `patch` into an existing goal and return the result
    ///
    /// # Errors
    /// `NotFound` if the composite key is absent.
    async fn update(&self, user_id: &str, goal_id: &str, patch: &GoalPatch) -> StoreResult<Goal>;

    /// Remove one goal; `false` when there was nothing to remove
    async fn delete(&self, user_id: &str, goal_id: &str) -> StoreResult<bool>;
}

type Key = (String, String);

/// In-memory store
#[derive(Debug, Default)]
pub struct InMemoryGoalStore {
    items: RwLock<BTreeMap<Key, Goal>>,
}

impl InMemoryGoalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored goals across all owners
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    fn key(user_id: &str, goal_id: &str) -> Key {
        (user_id.to_string(), goal_id.to_string())
    }
}

#[async_trait]
impl GoalStore for InMemoryGoalStore {
    async fn put(&self, goal: Goal) -> StoreResult<()> {
        let key = Self::key(&goal.user_id, &goal.goal_id);
        let mut items = self.items.write().await;
        if items.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                user_id: key.0,
                goal_id: key.1,
            });
        }
        debug!("Stored goal {} for {}", key.1, key.0);
        items.insert(key, goal);
        Ok(())
    }

    async fn get(&self, user_id: &str, goal_id: &str) -> StoreResult<Option<Goal>> {
        let items = self.items.read().await;
        Ok(items.get(&Self::key(user_id, goal_id)).cloned())
    }

    async fn query(&self, user_id: &str) -> StoreResult<Vec<Goal>> {
        let items = self.items.read().await;
        Ok(items
            .range(Self::key(user_id, "")..)
            .take_while(|((owner, _), _)| owner == user_id)
            .map(|(_, goal)| goal.clone())
            .collect())
    }

    async fn update(&self, user_id: &str, goal_id: &str, patch: &GoalPatch) -> StoreResult<Goal> {
        let mut items = self.items.write().await;
        let goal = items
            .get_mut(&Self::key(user_id, goal_id))
            .ok_or_else(|| StoreError::NotFound {
                user_id: user_id.to_string(),
                goal_id: goal_id.to_string(),
            })?;
        patch.apply(goal);
        Ok(goal.clone())
    }

    async fn delete(&self, user_id: &str, goal_id: &str) -> StoreResult<bool> {
        let mut items = self.items.write().await;
        Ok(items.remove(&Self::key(user_id, goal_id)).is_some())
    }
}
