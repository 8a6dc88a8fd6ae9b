// Copyright (c) 2025 - Cowboy AI, Inc.
//! Tagging Decorator
//!
//! One tag set, derived from configuration alone, applied identically to every
//! registered handle. Outputs and properties are never touched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::AppConfig;
use crate::resource::ResourceRegistry;

/// Tag keys
pub mod keys {
    pub const SERVICE: &str = "Service";
    pub const TEAM: &str = "Team";
    pub const BUDGET_ID: &str = "BudgetId";
    pub const ENVIRONMENT: &str = "Environment";
    pub const STACK: &str = "Stack";
    pub const MANAGED_BY: &str = "ManagedBy";
}

/// Uniform tag set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeMap<String, String>);

impl TagSet {
    pub fn from_config(config: &AppConfig) -> Self {
        let tags = [
            (keys::SERVICE, config.app_name.clone()),
            (keys::TEAM, config.team_name.clone()),
            (
                keys::BUDGET_ID,
                format!("{}-{}", config.environment.to_uppercase(), config.account_id),
            ),
            (keys::ENVIRONMENT, config.environment.clone()),
            (keys::STACK, config.qualified_stack_name()),
            (keys::MANAGED_BY, config.managed_by.clone()),
        ];
        Self(tags.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

/// Replace the tags of every registered handle with `tags`
pub fn apply_tags(registry: &mut ResourceRegistry, tags: &TagSet) {
    let mut count = 0usize;
    for handle in registry.iter_mut() {
        handle.set_tags(tags.0.clone());
        count += 1;
    }
    debug!("Applied {} tags to {} resources", tags.len(), count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LogicalName, ResourceKind};
    use crate::resource::ResourceHandle;
    use crate::test_support::sample_config;

    #[test]
    fn test_tag_values() {
        let tags = TagSet::from_config(&sample_config());

        assert_eq!(tags.len(), 6);
        assert_eq!(tags.get(keys::BUDGET_ID), Some("DEV-123456789012"));
        assert_eq!(tags.get(keys::STACK), Some("MainStack-dev"));
        assert_eq!(tags.get(keys::SERVICE), Some("goals"));
        assert_eq!(tags.get(keys::MANAGED_BY), Some("goals-synth"));
    }

    #[test]
    fn test_apply_replaces_tags_only() {
        let mut registry = ResourceRegistry::new();
        let handle = ResourceHandle::builder(LogicalName::new("topic").unwrap(), ResourceKind::Topic)
            .property("TopicName", "alarms")
            .deferred("arn")
            .build()
            .unwrap();
        registry.register(handle.clone()).unwrap();

        let tags = TagSet::from_config(&sample_config());
        apply_tags(&mut registry, &tags);
        apply_tags(&mut registry, &tags);

        let tagged = registry.lookup("topic").unwrap();
        assert_eq!(tagged.tags(), tags.as_map());
        assert_eq!(tagged.outputs(), handle.outputs());
        assert_eq!(tagged.properties(), handle.properties());
    }
}
