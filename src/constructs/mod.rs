// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Constructors
//!
//! Every constructor implements one flat capability: given the configuration
//! and the upstream handles it declared, produce a [`Construction`] (exactly one
//! primary handle plus auxiliary handles, in registration order).
//!
//! Constructors never look anything up from ambient state. They read upstream
//! handles through [`Upstream`], which only exposes declared dependencies, and
//! they cannot mutate them.
//!
//! # Stages
//!
//! ```text
//! Network → Identity → Compute → Gateway → Table → Alarm
//! ```

pub mod alarm;
pub mod compute;
pub mod gateway;
pub mod identity;
pub mod network;
pub mod table;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::assembler::GraphError;
use crate::config::AppConfig;
use crate::domain::{LogicalName, ResourceKind};
use crate::goals::GoalOperation;
use crate::resource::{RegistryError, ResourceHandle, ResourceRegistry};

pub use alarm::MonitoringConstructor;
pub use compute::{ContainerServiceConstructor, FunctionConstructor};
pub use gateway::{ApiConstructor, FirewallConstructor, LoadBalancerConstructor};
pub use identity::{ExecutionRoleConstructor, FunctionRoleConstructor};
pub use network::NetworkConstructor;
pub use table::TableConstructor;

/// Build plan stage; a plan's stages never decrease
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Network,
    Identity,
    Compute,
    Gateway,
    Table,
    Alarm,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Identity => "identity",
            Self::Compute => "compute",
            Self::Gateway => "gateway",
            Self::Table => "table",
            Self::Alarm => "alarm",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// "Produce handles from configuration and upstream handles"
pub trait Constructor {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    fn stage(&self) -> Stage;

    /// Logical names of the upstream handles this constructor reads
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    fn construct(&self, config: &AppConfig, upstream: &Upstream<'_>) -> Result<Construction, GraphError>;
}

/// Read-only view of the declared upstream handles
#[derive(Debug)]
pub struct Upstream<'a> {
    constructor: String,
    handles: BTreeMap<String, &'a ResourceHandle>,
}

impl<'a> Upstream<'a> {
    /// Resolve every declared dependency from the registry
    ///
    /// # Errors
    /// [`GraphError::MissingDependency`] for the first dependency that is not
    /// registered yet. Lookup never constructs.
    pub fn resolve(
        constructor: &str,
        dependencies: &[String],
        registry: &'a ResourceRegistry,
    ) -> Result<Self, GraphError> {
        let mut handles = BTreeMap::new();
        for dependency in dependencies {
            let handle = registry
                .lookup(dependency)
                .map_err(|_| GraphError::MissingDependency {
                    constructor: constructor.to_string(),
                    dependency: dependency.clone(),
                })?;
            handles.insert(dependency.clone(), handle);
        }
        Ok(Self {
            constructor: constructor.to_string(),
            handles,
        })
    }

    /// View with no dependencies
    pub fn none(constructor: &str) -> Self {
        Self {
            constructor: constructor.to_string(),
            handles: BTreeMap::new(),
        }
    }

    /// A declared upstream handle
    ///
    /// # Errors
    /// [`GraphError::UndeclaredDependency`] when `name` was not declared.
    pub fn get(&self, name: &str) -> Result<&'a ResourceHandle, GraphError> {
        self.handles
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UndeclaredDependency {
                constructor: self.constructor.clone(),
                dependency: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Output of one constructor call
#[derive(Debug, Clone, PartialEq)]
pub struct Construction {
    primary: usize,
    handles: Vec<ResourceHandle>,
}

impl Construction {
    pub fn builder(constructor: &str) -> ConstructionBuilder {
        ConstructionBuilder {
            constructor: constructor.to_string(),
            handles: Vec::new(),
            primaries: Vec::new(),
        }
    }

    /// Construction made of one handle
    pub fn single(handle: ResourceHandle) -> Self {
        Self {
            primary: 0,
            handles: vec![handle],
        }
    }

    pub fn primary(&self) -> &ResourceHandle {
        &self.handles[self.primary]
    }

    pub fn auxiliary(&self) -> impl Iterator<Item = &ResourceHandle> {
        let primary = self.primary;
        self.handles
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != primary)
            .map(|(_, h)| h)
    }

    /// Every handle, in registration order
    pub fn handles(&self) -> &[ResourceHandle] {
        &self.handles
    }

    pub fn contains_kind(&self, kind: ResourceKind) -> bool {
        self.handles.iter().any(|h| h.kind() == kind)
    }

    pub fn into_handles(self) -> Vec<ResourceHandle> {
        self.handles
    }
}

/// Accumulates handles in registration order
#[derive(Debug)]
pub struct ConstructionBuilder {
    constructor: String,
    handles: Vec<ResourceHandle>,
    primaries: Vec<usize>,
}

impl ConstructionBuilder {
    pub fn add(&mut self, handle: ResourceHandle) {
        self.handles.push(handle);
    }

    pub fn add_primary(&mut self, handle: ResourceHandle) {
        self.primaries.push(self.handles.len());
        self.handles.push(handle);
    }

    /// A handle added earlier in this construction
    pub fn handle(&self, name: &str) -> Result<&ResourceHandle, GraphError> {
        self.handles
            .iter()
            .find(|h| h.name().as_str() == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()).into())
    }

    /// Finish the construction
    ///
    /// # Errors
    /// [`GraphError::PrimaryCount`] unless exactly one primary was added.
    pub fn build(self) -> Result<Construction, GraphError> {
        match self.primaries.as_slice() {
            [primary] => Ok(Construction {
                primary: *primary,
                handles: self.handles,
            }),
            other => Err(GraphError::PrimaryCount {
                constructor: self.constructor,
                count: other.len(),
            }),
        }
    }
}

/// Validated logical name
pub(crate) fn logical(name: impl Into<String>) -> Result<LogicalName, GraphError> {
    Ok(LogicalName::new(name)?)
}

/// Well-known logical names shared between constructors
pub mod names {
    use crate::goals::GoalOperation;

    pub const VPC: &str = "network-vpc";
    pub const INTERNET_GATEWAY: &str = "network-igw";
    pub const NAT_ADDRESS: &str = "network-nat-eip";
    pub const NAT_GATEWAY: &str = "network-nat";
    pub const PUBLIC_ACL: &str = "network-public-acl";
    pub const PRIVATE_ACL: &str = "network-private-acl";
    pub const SERVICE_SECURITY_GROUP: &str = "network-service-sg";
    pub const LOAD_BALANCER_SECURITY_GROUP: &str = "network-lb-sg";

    pub const EXECUTION_ROLE: &str = "identity-execution-role";

    pub const CLUSTER: &str = "compute-cluster";
    pub const SERVICE_LOGS: &str = "compute-service-logs";
    pub const TASK_DEFINITION: &str = "compute-task";
    pub const SERVICE: &str = "compute-service";
    pub const SCALING_POLICY: &str = "compute-service-scaling";

    pub const USER_POOL: &str = "gateway-user-pool";
    pub const USER_POOL_CLIENT: &str = "gateway-user-pool-client";
    pub const API_LOGS: &str = "gateway-api-logs";
    pub const API: &str = "gateway-api";
    pub const AUTHORIZER: &str = "gateway-authorizer";
    pub const LOAD_BALANCER: &str = "gateway-lb";
    pub const HTTPS_LISTENER: &str = "gateway-lb-https";
    pub const REDIRECT_LISTENER: &str = "gateway-lb-redirect";
    pub const DNS_RECORD: &str = "gateway-dns";
    pub const IP_SET: &str = "gateway-allowed-ips";
    pub const WEB_ACL: &str = "gateway-web-acl";
    pub const WEB_ACL_ASSOCIATION: &str = "gateway-web-acl-association";

    pub const TABLE: &str = "table-goals";

    pub const ALARM_TOPIC: &str = "alarm-topic";
    pub const DASHBOARD: &str = "alarm-dashboard";

    pub fn public_subnet(index: usize) -> String {
        format!("network-public-subnet-{}", index + 1)
    }

    pub fn private_subnet(index: usize) -> String {
        format!("network-private-subnet-{}", index + 1)
    }

    pub fn public_route_table(index: usize) -> String {
        format!("network-public-routes-{}", index + 1)
    }

    pub fn private_route_table(index: usize) -> String {
        format!("network-private-routes-{}", index + 1)
    }

    fn slug(operation: GoalOperation) -> String {
        operation.as_str().to_ascii_lowercase()
    }

    pub fn function_role(operation: GoalOperation) -> String {
        format!("identity-{}-role", slug(operation))
    }

    pub fn function(operation: GoalOperation) -> String {
        format!("compute-{}", slug(operation))
    }

    pub fn function_logs(operation: GoalOperation) -> String {
        format!("compute-{}-logs", slug(operation))
    }
}

/// Standard constructors in build plan order
pub fn standard_constructors() -> Vec<Box<dyn Constructor>> {
    let mut constructors: Vec<Box<dyn Constructor>> = vec![Box::new(NetworkConstructor)];

    constructors.extend(
        GoalOperation::ALL
            .into_iter()
            .map(|op| Box::new(FunctionRoleConstructor::new(op)) as Box<dyn Constructor>),
    );
    constructors.push(Box::new(ExecutionRoleConstructor));

    constructors.extend(
        GoalOperation::ALL
            .into_iter()
            .map(|op| Box::new(FunctionConstructor::new(op)) as Box<dyn Constructor>),
    );
    constructors.push(Box::new(ContainerServiceConstructor));

    constructors.push(Box::new(ApiConstructor));
    constructors.push(Box::new(LoadBalancerConstructor));
    constructors.push(Box::new(FirewallConstructor));

    constructors.push(Box::new(TableConstructor));
    constructors.push(Box::new(MonitoringConstructor));

    constructors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(name: &str) -> ResourceHandle {
        ResourceHandle::builder(LogicalName::new(name).unwrap(), ResourceKind::Topic)
            .build()
            .unwrap()
    }

    #[test]
    fn test_stage_order() {
        assert!(Stage::Network < Stage::Identity);
        assert!(Stage::Identity < Stage::Compute);
        assert!(Stage::Compute < Stage::Gateway);
        assert!(Stage::Gateway < Stage::Table);
        assert!(Stage::Table < Stage::Alarm);
    }

    #[test]
    fn test_upstream_exposes_declared_only() {
        let mut registry = ResourceRegistry::new();
        registry.register(handle("a")).unwrap();
        registry.register(handle("b")).unwrap();

        let upstream = Upstream::resolve("test", &["a".to_string()], &registry).unwrap();
        assert!(upstream.get("a").is_ok());
        assert!(matches!(
            upstream.get("b"),
            Err(GraphError::UndeclaredDependency { .. })
        ));
    }

    #[test]
    fn test_upstream_missing_dependency() {
        let registry = ResourceRegistry::new();
        let err = Upstream::resolve("test", &["a".to_string()], &registry).unwrap_err();
        assert_eq!(
            err,
            GraphError::MissingDependency {
                constructor: "test".to_string(),
                dependency: "a".to_string(),
            }
        );
    }

    #[test]
    fn test_construction_requires_one_primary() {
        let mut builder = Construction::builder("test");
        builder.add(handle("a"));
        assert!(matches!(
            builder.build(),
            Err(GraphError::PrimaryCount { count: 0, .. })
        ));

        let mut builder = Construction::builder("test");
        builder.add(handle("a"));
        builder.add_primary(handle("b"));
        builder.add(handle("c"));
        let construction = builder.build().unwrap();
        assert_eq!(construction.primary().name().as_str(), "b");
        assert_eq!(construction.auxiliary().count(), 2);
        assert_eq!(construction.handles()[0].name().as_str(), "a");
    }

    #[test]
    fn test_standard_constructor_stages_non_decreasing() {
        let constructors = standard_constructors();
        assert!(constructors
            .windows(2)
            .all(|pair| pair[0].stage() <= pair[1].stage()));
        assert_eq!(constructors.first().map(|c| c.stage()), Some(Stage::Network));
        assert_eq!(constructors.last().map(|c| c.stage()), Some(Stage::Alarm));
    }

    #[test]
    fn test_well_known_names_are_valid() {
        for op in GoalOperation::ALL {
            assert!(LogicalName::new(names::function(op)).is_ok());
            assert!(LogicalName::new(names::function_role(op)).is_ok());
            assert!(LogicalName::new(names::function_logs(op)).is_ok());
        }
        assert!(LogicalName::new(names::public_subnet(0)).is_ok());
    }
}
