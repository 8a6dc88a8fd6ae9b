// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Kind Taxonomy
//!
//! The closed vocabulary of resource kinds a build plan can emit. Kinds are
//! backend-neutral: the descriptor consumer maps each one onto its own resource
//! schema.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind tag carried by every resource handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    // Network
    /// Virtual network
    Vpc,
    /// Internet gateway plus its attachment to the network
    InternetGateway,
    /// Static public address
    ElasticIp,
    /// NAT gateway for private egress
    NatGateway,
    /// Subnet inside the network
    Subnet,
    /// Route table with its routes and subnet association
    RouteTable,
    /// Stateless traffic filter with its entries and associations
    NetworkAcl,
    /// Stateful traffic filter attached to workloads
    SecurityGroup,

    // Identity
    /// Execution role with permission statements
    Role,

    // Compute
    /// Request handler function
    Function,
    /// Container cluster
    Cluster,
    /// Container task definition
    TaskDefinition,
    /// Long-running container service
    ContainerService,
    /// Scaling policy bounding a service's instance count
    ScalingPolicy,

    // Gateway
    /// Authentication user pool
    UserPool,
    /// Authentication client registered with a user pool
    UserPoolClient,
    /// HTTP API with routes and method bindings
    RestApi,
    /// Token authorizer guarding API methods
    Authorizer,
    /// Public load balancer
    LoadBalancer,
    /// Load balancer listener
    Listener,
    /// DNS alias record
    DnsRecord,

    // Security
    /// Allow-listed address set
    IpSet,
    /// Web application firewall rule set
    WebAcl,
    /// Binding of a firewall rule set to an entry point
    WebAclAssociation,

    // Storage
    /// Key-value table
    Table,

    // Monitoring
    /// Log group
    LogGroup,
    /// Metric derived from log lines
    MetricFilter,
    /// Threshold alarm over a metric
    Alarm,
    /// Notification topic for alarms
    Topic,
    /// Dashboard of metric widgets
    Dashboard,
}

impl ResourceKind {
    /// Get the canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vpc => "vpc",
            Self::InternetGateway => "internet_gateway",
            Self::ElasticIp => "elastic_ip",
            Self::NatGateway => "nat_gateway",
            Self::Subnet => "subnet",
            Self::RouteTable => "route_table",
            Self::NetworkAcl => "network_acl",
            Self::SecurityGroup => "security_group",
            Self::Role => "role",
            Self::Function => "function",
            Self::Cluster => "cluster",
            Self::TaskDefinition => "task_definition",
            Self::ContainerService => "container_service",
            Self::ScalingPolicy => "scaling_policy",
            Self::UserPool => "user_pool",
            Self::UserPoolClient => "user_pool_client",
            Self::RestApi => "rest_api",
            Self::Authorizer => "authorizer",
            Self::LoadBalancer => "load_balancer",
            Self::Listener => "listener",
            Self::DnsRecord => "dns_record",
            Self::IpSet => "ip_set",
            Self::WebAcl => "web_acl",
            Self::WebAclAssociation => "web_acl_association",
            Self::Table => "table",
            Self::LogGroup => "log_group",
            Self::MetricFilter => "metric_filter",
            Self::Alarm => "alarm",
            Self::Topic => "topic",
            Self::Dashboard => "dashboard",
        }
    }

    /// Get the primary category for this kind
    pub fn category(&self) -> ResourceCategory {
        match self {
            Self::Vpc
            | Self::InternetGateway
            | Self::ElasticIp
            | Self::NatGateway
            | Self::Subnet
            | Self::RouteTable
            | Self::NetworkAcl
            | Self::SecurityGroup => ResourceCategory::Network,

            Self::Role => ResourceCategory::Identity,

            Self::Function
            | Self::Cluster
            | Self::TaskDefinition
            | Self::ContainerService
            | Self::ScalingPolicy => ResourceCategory::Compute,

            Self::UserPool
            | Self::UserPoolClient
            | Self::RestApi
            | Self::Authorizer
            | Self::LoadBalancer
            | Self::Listener
            | Self::DnsRecord => ResourceCategory::Gateway,

            Self::IpSet | Self::WebAcl | Self::WebAclAssociation => ResourceCategory::Security,

            Self::Table => ResourceCategory::Storage,

            Self::LogGroup
            | Self::MetricFilter
            | Self::Alarm
            | Self::Topic
            | Self::Dashboard => ResourceCategory::Monitoring,
        }
    }

    /// Check if this kind accepts traffic from the internet
    ///
    /// Public entry points must never reach the registry without an insecure to
    /// secure scheme redirect.
    pub fn is_public_entry_point(&self) -> bool {
        matches!(self, Self::LoadBalancer)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource category (high-level grouping)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceCategory {
    Network,
    Identity,
    Compute,
    Gateway,
    Security,
    Storage,
    Monitoring,
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "Network"),
            Self::Identity => write!(f, "Identity"),
            Self::Compute => write!(f, "Compute"),
            Self::Gateway => write!(f, "Gateway"),
            Self::Security => write!(f, "Security"),
            Self::Storage => write!(f, "Storage"),
            Self::Monitoring => write!(f, "Monitoring"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(ResourceKind::Subnet.category(), ResourceCategory::Network);
        assert_eq!(ResourceKind::Role.category(), ResourceCategory::Identity);
        assert_eq!(ResourceKind::ScalingPolicy.category(), ResourceCategory::Compute);
        assert_eq!(ResourceKind::Listener.category(), ResourceCategory::Gateway);
        assert_eq!(ResourceKind::WebAcl.category(), ResourceCategory::Security);
        assert_eq!(ResourceKind::Table.category(), ResourceCategory::Storage);
        assert_eq!(ResourceKind::Alarm.category(), ResourceCategory::Monitoring);
    }

    #[test]
    fn test_serde_matches_as_str() {
        for kind in [
            ResourceKind::Vpc,
            ResourceKind::InternetGateway,
            ResourceKind::UserPoolClient,
            ResourceKind::WebAclAssociation,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_public_entry_points() {
        assert!(ResourceKind::LoadBalancer.is_public_entry_point());
        assert!(!ResourceKind::RestApi.is_public_entry_point());
        assert!(!ResourceKind::Listener.is_public_entry_point());
    }
}
