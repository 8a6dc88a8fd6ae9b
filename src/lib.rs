// Copyright (c) 2025 - Cowboy AI, Inc.
//! Infrastructure for the goals application
//!
//! A resource-graph synthesizer plus the request handlers it deploys:
//!
//! - [`config`] - environment-scoped settings, loaded once and validated up front
//! - [`resource`] - typed handles, deferred tokens and the registry
//! - [`constructs`] - one constructor per resource group, in build plan order
//! - [`assembler`] - runs the build plan and verifies the graph
//! - [`tags`] - uniform tag set applied to every resource
//! - [`descriptor`] - serialisable output of a synthesis run
//! - [`goals`] - goal model, store abstraction and the five request handlers
//!
//! ```rust,ignore
//! use goals_infrastructure::{synthesize, AppConfig, EnvSource};
//!
//! let config = AppConfig::load("dev", &EnvSource)?;
//! let descriptor = synthesize(&config)?;
//! println!("{}", descriptor.to_json()?);
//! ```

pub mod assembler;
pub mod config;
pub mod constructs;
pub mod descriptor;
pub mod domain;
pub mod errors;
pub mod goals;
pub mod resource;
pub mod tags;

// Re-export commonly used types
pub use assembler::{assemble, synthesize, synthesize_environment, Assembly, BuildPlan, GraphError};
pub use config::{AppConfig, ConfigError, ConfigSource, EnvSource, FileSource, LayeredSource, MapSource};
pub use descriptor::DeploymentDescriptor;
pub use errors::{SynthError, SynthResult};
pub use resource::{ResourceHandle, ResourceRegistry};
pub use tags::{apply_tags, TagSet};
