// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Handle
//!
//! A handle is the typed reference to one constructed resource. It carries an
//! explicit output mapping so downstream constructors never look up
//! attributes dynamically at use time.
//!
//! # Invariants
//! - Output attribute names are lowercase snake_case and unique per handle
//! - A handle never depends on itself
//! - Properties are a JSON object
//! - Outputs and properties are immutable once built; only the tagging
//!   decorator writes tags, and only the registry assigns the sequence number

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use super::token;
use crate::domain::{LogicalName, ResourceKind};

/// Handle construction and access errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandleError {
    #[error("Invalid output attribute name {attribute:?} on {resource}")]
    InvalidAttribute { resource: LogicalName, attribute: String },

    #[error("Output attribute {attribute:?} declared twice on {resource}")]
    DuplicateOutput { resource: LogicalName, attribute: String },

    #[error("Resource {0} cannot depend on itself")]
    SelfDependency(LogicalName),

    #[error("Properties of {0} must be a JSON object")]
    PropertiesNotObject(LogicalName),

    #[error("Resource {resource} exposes no output {attribute:?}")]
    MissingOutput { resource: LogicalName, attribute: String },
}

/// Reference to one constructed resource plus its outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceHandle {
    name: LogicalName,
    kind: ResourceKind,

    /// Registration order, assigned by the registry
    #[serde(skip_serializing_if = "Option::is_none", default)]
    sequence: Option<usize>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    depends_on: Vec<LogicalName>,

    #[serde(default)]
    properties: Map<String, Value>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    outputs: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    tags: BTreeMap<String, String>,
}

impl ResourceHandle {
    /// Start building a handle
    pub fn builder(name: LogicalName, kind: ResourceKind) -> ResourceHandleBuilder {
        ResourceHandleBuilder::new(name, kind)
    }

    pub fn name(&self) -> &LogicalName {
        &self.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Position in the registry, `None` until registered
    pub fn sequence(&self) -> Option<usize> {
        self.sequence
    }

    pub fn depends_on(&self) -> &[LogicalName] {
        &self.depends_on
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn outputs(&self) -> &BTreeMap<String, String> {
        &self.outputs
    }

    /// Value of an output attribute
    ///
    /// # Errors
    /// [`HandleError::MissingOutput`] when the handle does not expose `attribute`.
    pub fn output(&self, attribute: &str) -> Result<&str, HandleError> {
        self.outputs
            .get(attribute)
            .map(String::as_str)
            .ok_or_else(|| HandleError::MissingOutput {
                resource: self.name.clone(),
                attribute: attribute.to_string(),
            })
    }

    /// Deferred token for an output this handle exposes
    ///
    /// Validated now, so a typo fails at construction rather than at deploy time.
    pub fn reference(&self, attribute: &str) -> Result<String, HandleError> {
        self.output(attribute)?;
        Ok(token::reference(&self.name, attribute))
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub(crate) fn set_tags(&mut self, tags: BTreeMap<String, String>) {
        self.tags = tags;
    }

    pub(crate) fn assign_sequence(&mut self, sequence: usize) {
        self.sequence = Some(sequence);
    }

    fn is_valid_attribute(attribute: &str) -> bool {
        attribute.starts_with(|c: char| c.is_ascii_lowercase())
            && attribute
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }
}

/// Builder for ResourceHandle with fluent API
pub struct ResourceHandleBuilder {
    name: LogicalName,
    kind: ResourceKind,
    depends_on: Vec<LogicalName>,
    properties: Map<String, Value>,
    properties_malformed: bool,
    outputs: Vec<(String, String)>,
}

impl ResourceHandleBuilder {
    fn new(name: LogicalName, kind: ResourceKind) -> Self {
        Self {
            name,
            kind,
            depends_on: Vec::new(),
            properties: Map::new(),
            properties_malformed: false,
            outputs: Vec::new(),
        }
    }

    /// Declare a dependency on an upstream handle
    pub fn depends_on(self, upstream: &ResourceHandle) -> Self {
        self.depends_on_name(upstream.name().clone())
    }

    pub fn depends_on_name(mut self, name: LogicalName) -> Self {
        if !self.depends_on.contains(&name) {
            self.depends_on.push(name);
        }
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Merge a JSON object into the properties
    pub fn properties(mut self, document: Value) -> Self {
        match document {
            Value::Object(map) => self.properties.extend(map),
            _ => self.properties_malformed = true,
        }
        self
    }

    /// Output known at synth time
    pub fn output(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.outputs.push((attribute.into(), value.into()));
        self
    }

    /// Output only the deployment engine can resolve
    pub fn deferred(self, attribute: &str) -> Self {
        let value = token::reference(&self.name, attribute);
        self.output(attribute, value)
    }

    pub fn build(self) -> Result<ResourceHandle, HandleError> {
        if self.properties_malformed {
            return Err(HandleError::PropertiesNotObject(self.name));
        }

        if self.depends_on.contains(&self.name) {
            return Err(HandleError::SelfDependency(self.name));
        }

        let mut outputs = BTreeMap::new();
        for (attribute, value) in self.outputs {
            if !ResourceHandle::is_valid_attribute(&attribute) {
                return Err(HandleError::InvalidAttribute {
                    resource: self.name,
                    attribute,
                });
            }
            if outputs.contains_key(&attribute) {
                return Err(HandleError::DuplicateOutput {
                    resource: self.name,
                    attribute,
                });
            }
            outputs.insert(attribute, value);
        }

        Ok(ResourceHandle {
            name: self.name,
            kind: self.kind,
            sequence: None,
            depends_on: self.depends_on,
            properties: self.properties,
            outputs,
            tags: BTreeMap::new(),
        })
    }
}
