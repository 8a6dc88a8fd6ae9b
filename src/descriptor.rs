// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Descriptor
//!
//! Serialisable result of a synthesis run: stack identity, tag set, every
//! resource in registration order, and the named stack outputs. Consumed by
//! whatever deployment engine resolves the deferred tokens.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::assembler::Assembly;
use crate::config::AppConfig;
use crate::errors::SynthResult;
use crate::resource::ResourceHandle;
use crate::tags::TagSet;

/// Format version of the descriptor document
pub const DESCRIPTOR_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentDescriptor {
    pub version: u32,
    pub stack_name: String,
    pub environment: String,
    pub region: String,
    pub account_id: String,
    pub tags: TagSet,
    pub resources: Vec<ResourceHandle>,
    pub outputs: BTreeMap<String, String>,
}

impl DeploymentDescriptor {
    pub fn new(config: &AppConfig, tags: TagSet, assembly: Assembly) -> Self {
        Self {
            version: DESCRIPTOR_VERSION,
            stack_name: config.qualified_stack_name(),
            environment: config.environment.clone(),
            region: config.region.clone(),
            account_id: config.account_id.clone(),
            tags,
            resources: assembly.registry.into_handles(),
            outputs: assembly.outputs,
        }
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceHandle> {
        self.resources.iter().find(|r| r.name().as_str() == name)
    }

    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs.get(name).map(String::as_str)
    }

    pub fn to_json(&self) -> SynthResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> SynthResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{outputs, synthesize};
    use crate::test_support::sample_config;

    #[test]
    fn test_descriptor_contents() {
        let config = sample_config();
        let descriptor = synthesize(&config).unwrap();

        assert_eq!(descriptor.version, DESCRIPTOR_VERSION);
        assert_eq!(descriptor.stack_name, "MainStack-dev");
        assert_eq!(descriptor.output(outputs::WEBSITE_URL), Some("https://goals.example.com"));
        assert!(descriptor.resource("table-goals").is_some());

        let sequences: Vec<usize> = descriptor
            .resources
            .iter()
            .map(|r| r.sequence().unwrap())
            .collect();
        assert_eq!(sequences, (0..descriptor.resources.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_json_document() {
        let descriptor = synthesize(&sample_config()).unwrap();
        let json = descriptor.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["stackName"], "MainStack-dev");
        assert_eq!(value["tags"]["BudgetId"], "DEV-123456789012");
        assert_eq!(DeploymentDescriptor::from_json(&json).unwrap(), descriptor);
    }
}
