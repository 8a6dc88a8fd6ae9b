// Copyright (c) 2025 - Cowboy AI, Inc.
//! Graph Assembler
//!
//! Runs a build plan against one configuration and produces the fully linked
//! resource graph:
//!
//! 1. Resolve each constructor's declared dependencies from the registry
//! 2. Construct
//! 3. Reject a public entry point whose construction lacks the HTTPS redirect
//! 4. Register every handle, checking its dependencies are already registered
//! 5. After the last constructor, verify every deferred token
//! 6. Collect the stack outputs
//!
//! Assembly is all-or-nothing: the first error aborts it and no partial graph
//! is returned.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{AppConfig, ConfigSource};
use crate::constructs::gateway::is_secure_redirect;
use crate::constructs::{names, standard_constructors, Constructor, Stage, Upstream};
use crate::descriptor::DeploymentDescriptor;
use crate::errors::SynthResult;
use crate::domain::{LogicalName, NameError, NetworkError, ValidationError};
use crate::resource::token::{self, TokenRef};
use crate::resource::{HandleError, RegistryError, ResourceHandle, ResourceRegistry};
use crate::tags::{apply_tags, TagSet};

/// Stack output names
pub mod outputs {
    /// Goals endpoint of the API
    pub const API_URL: &str = "ApiUrl";
    pub const USER_POOL_ID: &str = "UserPoolId";
    pub const USER_POOL_CLIENT_ID: &str = "UserPoolClientId";
    pub const WEBSITE_URL: &str = "WebsiteUrl";
}

/// Graph assembly errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("Constructor {constructor} depends on {dependency}, which is not registered")]
    MissingDependency { constructor: String, dependency: String },

    #[error("Constructor {constructor} read {dependency} without declaring it")]
    UndeclaredDependency { constructor: String, dependency: String },

    #[error("Resource {resource} depends on {dependency}, which is not registered before it")]
    OrderingViolation { resource: String, dependency: String },

    #[error("Resource {resource} references {token}, which no registered resource exposes")]
    DanglingReference { resource: String, token: String },

    #[error("Constructor {constructor} at stage {stage} runs after stage {previous}")]
    PlanOutOfOrder {
        constructor: String,
        stage: Stage,
        previous: Stage,
    },

    #[error("Constructor {constructor} produced {count} primary handles")]
    PrimaryCount { constructor: String, count: usize },

    #[error("Public entry point {resource} has no HTTP to HTTPS redirect")]
    InsecureEntryPoint { resource: String },

    #[error("Invalid resource {resource}: {reason}")]
    Invalid { resource: String, reason: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Handle(#[from] HandleError),

    #[error(transparent)]
    Name(#[from] NameError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// What one constructor call registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionRecord {
    pub constructor: String,
    pub stage: Stage,
    pub primary: LogicalName,
    pub handles: Vec<LogicalName>,
}

/// Fully linked resource graph
#[derive(Debug, Clone)]
pub struct Assembly {
    pub registry: ResourceRegistry,
    pub outputs: BTreeMap<String, String>,
    pub trace: Vec<ConstructionRecord>,
}

/// Ordered constructors; stages never decrease
pub struct BuildPlan {
    constructors: Vec<Box<dyn Constructor>>,
}

impl BuildPlan {
    /// network → identity → compute → gateway → table → alarm
    pub fn standard() -> Self {
        Self {
            constructors: standard_constructors(),
        }
    }

    /// # Errors
    /// [`GraphError::PlanOutOfOrder`] for the first constructor whose stage
    /// precedes the one before it.
    pub fn new(constructors: Vec<Box<dyn Constructor>>) -> Result<Self, GraphError> {
        for pair in constructors.windows(2) {
            if pair[1].stage() < pair[0].stage() {
                return Err(GraphError::PlanOutOfOrder {
                    constructor: pair[1].name().to_string(),
                    stage: pair[1].stage(),
                    previous: pair[0].stage(),
                });
            }
        }
        Ok(Self { constructors })
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Run every constructor and verify the resulting graph
    pub fn assemble(&self, config: &AppConfig) -> Result<Assembly, GraphError> {
        info!(
            "Assembling {} constructors for environment {}",
            self.constructors.len(),
            config.environment
        );

        let mut registry = ResourceRegistry::new();
        let mut trace = Vec::with_capacity(self.constructors.len());

        for constructor in &self.constructors {
            trace.push(run(constructor.as_ref(), config, &mut registry)?);
        }

        verify_references(&registry)?;
        let outputs = stack_outputs(&registry)?;

        info!(
            "Assembled {} resources for stack {}",
            registry.len(),
            config.qualified_stack_name()
        );

        Ok(Assembly {
            registry,
            outputs,
            trace,
        })
    }
}

fn run(
    constructor: &dyn Constructor,
    config: &AppConfig,
    registry: &mut ResourceRegistry,
) -> Result<ConstructionRecord, GraphError> {
    debug!("Running {} constructor {}", constructor.stage(), constructor.name());

    let construction = {
        let upstream = Upstream::resolve(constructor.name(), &constructor.dependencies(), registry)?;
        debug!("{} resolved {} upstream handles", constructor.name(), upstream.len());
        constructor.construct(config, &upstream)?
    };

    for handle in construction.handles() {
        if handle.kind().is_public_entry_point()
            && !construction.handles().iter().any(is_secure_redirect)
        {
            return Err(GraphError::InsecureEntryPoint {
                resource: handle.name().to_string(),
            });
        }
    }

    let primary = construction.primary().name().clone();
    let mut handles = Vec::with_capacity(construction.handles().len());
    for handle in construction.into_handles() {
        for dependency in handle.depends_on() {
            if !registry.contains(dependency.as_str()) {
                return Err(GraphError::OrderingViolation {
                    resource: handle.name().to_string(),
                    dependency: dependency.to_string(),
                });
            }
        }
        debug!("Registering {} ({})", handle.name(), handle.kind().category());
        handles.push(handle.name().clone());
        registry.register(handle)?;
    }

    Ok(ConstructionRecord {
        constructor: constructor.name().to_string(),
        stage: constructor.stage(),
        primary,
        handles,
    })
}

/// Every token in a handle's properties and outputs
fn tokens_of(handle: &ResourceHandle) -> Vec<TokenRef> {
    let mut found = Vec::new();
    for (key, value) in handle.properties() {
        found.extend(token::scan(key));
        found.extend(token::scan_value(value));
    }
    for value in handle.outputs().values() {
        found.extend(token::scan(value));
    }
    found
}

/// Every deferred token must name a registered handle exposing that output
fn verify_references(registry: &ResourceRegistry) -> Result<(), GraphError> {
    let mut checked = 0usize;
    for handle in registry {
        for reference in tokens_of(handle) {
            let resolves = registry
                .lookup(&reference.resource)
                .map(|target| target.outputs().contains_key(&reference.attribute))
                .unwrap_or(false);
            if !resolves {
                return Err(GraphError::DanglingReference {
                    resource: handle.name().to_string(),
                    token: token::reference(&reference.resource, &reference.attribute),
                });
            }
            checked += 1;
        }
    }
    debug!("Verified {} deferred references", checked);
    Ok(())
}

fn stack_outputs(registry: &ResourceRegistry) -> Result<BTreeMap<String, String>, GraphError> {
    let api = registry.lookup(names::API)?;
    let dns = registry.lookup(names::DNS_RECORD)?;

    let mut outputs = BTreeMap::new();
    outputs.insert(outputs::API_URL.to_string(), api.output("goals_url")?.to_string());
    outputs.insert(outputs::USER_POOL_ID.to_string(), api.output("user_pool_id")?.to_string());
    outputs.insert(
        outputs::USER_POOL_CLIENT_ID.to_string(),
        api.output("user_pool_client_id")?.to_string(),
    );
    outputs.insert(outputs::WEBSITE_URL.to_string(), dns.output("url")?.to_string());
    Ok(outputs)
}

/// Assemble the standard build plan
pub fn assemble(config: &AppConfig) -> Result<Assembly, GraphError> {
    BuildPlan::standard().assemble(config)
}

/// Assemble, tag every handle and produce the deployment descriptor
pub fn synthesize(config: &AppConfig) -> Result<DeploymentDescriptor, GraphError> {
    let mut assembly = assemble(config)?;
    let tags = TagSet::from_config(config);
    apply_tags(&mut assembly.registry, &tags);
    Ok(DeploymentDescriptor::new(config, tags, assembly))
}

/// Load the configuration for `environment` from `source` and synthesize it
///
/// # Errors
/// [`SynthError::Config`](crate::SynthError::Config) when loading fails,
/// [`SynthError::Graph`](crate::SynthError::Graph) when assembly aborts.
pub fn synthesize_environment<S>(environment: &str, source: &S) -> SynthResult<DeploymentDescriptor>
where
    S: ConfigSource + ?Sized,
{
    let config = AppConfig::load(environment, source)?;
    Ok(synthesize(&config)?)
}
