// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Registry
//!
//! Logical name → handle. Registration is a pure insertion and lookups never
//! construct anything, which lets the assembler detect ordering bugs instead
//! of papering over them.

use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use super::ResourceHandle;
use crate::domain::{LogicalName, ResourceKind};

/// Registry integrity errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Resource {0} is already registered")]
    DuplicateName(LogicalName),

    #[error("Resource {0} is not registered")]
    NotFound(String),
}

/// At most one handle per logical name, kept in registration order
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    handles: Vec<ResourceHandle>,
    index: HashMap<LogicalName, usize>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a handle under its logical name
    ///
    /// The handle receives the next sequence number.
    ///
    /// # Errors
    /// [`RegistryError::DuplicateName`] if the name is taken. The existing
    /// handle is left untouched.
    pub fn register(&mut self, mut handle: ResourceHandle) -> Result<&ResourceHandle, RegistryError> {
        if self.index.contains_key(handle.name()) {
            return Err(RegistryError::DuplicateName(handle.name().clone()));
        }

        let sequence = self.handles.len();
        handle.assign_sequence(sequence);
        debug!("Registered {} ({}) at #{}", handle.name(), handle.kind(), sequence);

        self.index.insert(handle.name().clone(), sequence);
        self.handles.push(handle);
        Ok(&self.handles[sequence])
    }

    /// Find an already-registered handle
    pub fn lookup(&self, name: &str) -> Result<&ResourceHandle, RegistryError> {
        self.index
            .get(name)
            .map(|&i| &self.handles[i])
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Handles in registration order
    pub fn iter(&self) -> std::slice::Iter<'_, ResourceHandle> {
        self.handles.iter()
    }

    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceHandle> {
        self.handles.iter().filter(move |h| h.kind() == kind)
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, ResourceHandle> {
        self.handles.iter_mut()
    }

    pub fn into_handles(self) -> Vec<ResourceHandle> {
        self.handles
    }
}

impl<'a> IntoIterator for &'a ResourceRegistry {
    type Item = &'a ResourceHandle;
    type IntoIter = std::slice::Iter<'a, ResourceHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
