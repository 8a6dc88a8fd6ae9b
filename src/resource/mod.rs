// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource handles and the registry that owns them during one assembly pass

pub mod handle;
pub mod registry;
pub mod token;

pub use handle::{HandleError, ResourceHandle, ResourceHandleBuilder};
pub use registry::{RegistryError, ResourceRegistry};
pub use token::TokenRef;
