// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compute Constructors
//!
//! - [`FunctionConstructor`] - one handler function per goal operation, with
//!   its own log group
//! - [`ContainerServiceConstructor`] - the web front end: cluster, task
//!   definition, service and a CPU target-tracking scaling policy
//!
//! The front end needs the API URL and authentication identifiers, which only
//! exist once the gateway stage has run. The task definition carries them as
//! deferred tokens that the assembler verifies after every stage completed.

use serde_json::json;

use super::{logical, names, Construction, Constructor, Stage, Upstream};
use crate::assembler::GraphError;
use crate::config::{AppConfig, ZONE_COUNT};
use crate::domain::invariants::validate_capacity;
use crate::domain::ResourceKind;
use crate::goals::{GoalOperation, TABLE_NAME_VARIABLE};
use crate::resource::{token, ResourceHandle};

/// Handler function timeout
pub const FUNCTION_TIMEOUT_SECONDS: u32 = 5;

/// Retention of every log group
pub const LOG_RETENTION_DAYS: u32 = 7;

/// Port the front-end container listens on
pub const CONTAINER_PORT: u16 = 80;

/// Service instance bounds
pub const MIN_CAPACITY: u32 = 1;
pub const DESIRED_COUNT: u32 = 2;
pub const MAX_CAPACITY: u32 = 3;

/// CPU utilisation the scaling policy tracks
pub const CPU_TARGET_PERCENT: u32 = 70;

/// Cooldown after scaling in either direction
pub const SCALING_COOLDOWN_SECONDS: u32 = 60;

/// Log group with one-week retention, removed with the stack
pub(crate) fn log_group(
    name: &str,
    log_group_name: String,
    redact_email: bool,
) -> Result<ResourceHandle, GraphError> {
    let mut builder = ResourceHandle::builder(logical(name)?, ResourceKind::LogGroup)
        .properties(json!({
            "LogGroupName": log_group_name,
            "RetentionDays": LOG_RETENTION_DAYS,
            "RemovalPolicy": "destroy",
        }))
        .output("name", log_group_name)
        .deferred("arn");
    if redact_email {
        builder = builder.property(
            "DataProtectionPolicy",
            json!({
                "Name": "EmailRedactionPolicy",
                "Description": "Mask email addresses in logs",
                "Identifiers": ["EmailAddress"],
            }),
        );
    }
    Ok(builder.build()?)
}

/// Handler function for one goal operation
#[derive(Debug, Clone)]
pub struct FunctionConstructor {
    operation: GoalOperation,
    name: String,
}

impl FunctionConstructor {
    pub fn new(operation: GoalOperation) -> Self {
        Self {
            operation,
            name: names::function(operation),
        }
    }
}

impl Constructor for FunctionConstructor {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&self) -> Stage {
        Stage::Compute
    }

    fn dependencies(&self) -> Vec<String> {
        vec![names::function_role(self.operation)]
    }

    fn construct(&self, config: &AppConfig, upstream: &Upstream<'_>) -> Result<Construction, GraphError> {
        let role = upstream.get(&names::function_role(self.operation))?;

        let logs = log_group(
            &names::function_logs(self.operation),
            config.physical_name(&format!("{}-logs", self.operation)),
            true,
        )?;

        let function_name = config.physical_name(self.operation.as_str());
        let function = ResourceHandle::builder(logical(&self.name)?, ResourceKind::Function)
            .depends_on(role)
            .depends_on(&logs)
            .properties(json!({
                "FunctionName": function_name,
                "Runtime": "provided.al2023",
                "Handler": "bootstrap",
                "TimeoutSeconds": FUNCTION_TIMEOUT_SECONDS,
                "Role": role.output("arn")?,
                "LogGroup": logs.output("name")?,
                "Environment": {
                    TABLE_NAME_VARIABLE: config.full_table_name,
                    "GOAL_OPERATION": self.operation,
                },
            }))
            .output(
                "arn",
                format!(
                    "arn:aws:lambda:{}:{}:function:{}",
                    config.region, config.account_id, function_name
                ),
            )
            .output("name", function_name)
            .build()?;

        let mut out = Construction::builder(&self.name);
        out.add(logs);
        out.add_primary(function);
        out.build()
    }
}

/// Load-balanced container service for the web front end
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerServiceConstructor;

impl ContainerServiceConstructor {
    fn private_subnets() -> Vec<String> {
        (0..ZONE_COUNT).map(names::private_subnet).collect()
    }

    fn image_uri(config: &AppConfig) -> String {
        format!(
            "{}.dkr.ecr.{}.amazonaws.com/{}:{}",
            config.account_id, config.region, config.frontend_docker_image, config.docker_image_tag
        )
    }
}

impl Constructor for ContainerServiceConstructor {
    fn name(&self) -> &str {
        names::SERVICE
    }

    fn stage(&self) -> Stage {
        Stage::Compute
    }

    fn dependencies(&self) -> Vec<String> {
        let mut deps = vec![
            names::VPC.to_string(),
            names::SERVICE_SECURITY_GROUP.to_string(),
            names::EXECUTION_ROLE.to_string(),
        ];
        deps.extend(Self::private_subnets());
        deps
    }

    fn construct(&self, config: &AppConfig, upstream: &Upstream<'_>) -> Result<Construction, GraphError> {
        validate_capacity(MIN_CAPACITY, DESIRED_COUNT, MAX_CAPACITY)?;

        let vpc = upstream.get(names::VPC)?;
        let security_group = upstream.get(names::SERVICE_SECURITY_GROUP)?;
        let execution_role = upstream.get(names::EXECUTION_ROLE)?;
        let subnets = Self::private_subnets()
            .iter()
            .map(|name| upstream.get(name))
            .collect::<Result<Vec<_>, _>>()?;

        let cluster_name = config.physical_name("frontend-cluster");
        let cluster = ResourceHandle::builder(logical(names::CLUSTER)?, ResourceKind::Cluster)
            .depends_on(vpc)
            .properties(json!({
                "ClusterName": cluster_name,
                "VpcId": vpc.reference("id")?,
            }))
            .output("name", cluster_name)
            .deferred("arn")
            .build()?;

        let logs = log_group(
            names::SERVICE_LOGS,
            config.physical_name("frontend-logs"),
            false,
        )?;

        let container_environment = json!({
            config.api_url_env.as_str(): token::reference(names::API, "url"),
            config.user_pool_id_env.as_str(): token::reference(names::USER_POOL, "id"),
            config.app_client_id_env.as_str(): token::reference(names::USER_POOL_CLIENT, "id"),
        });

        let task = ResourceHandle::builder(logical(names::TASK_DEFINITION)?, ResourceKind::TaskDefinition)
            .depends_on(execution_role)
            .depends_on(&logs)
            .properties(json!({
                "Family": config.physical_name("frontend-task"),
                "Cpu": config.ecs_cpu_limit,
                "MemoryMiB": config.ecs_memory_limit,
                "NetworkMode": "awsvpc",
                "ExecutionRoleArn": execution_role.output("arn")?,
                "Container": {
                    "Name": config.physical_name("frontend-container"),
                    "Image": Self::image_uri(config),
                    "PortMappings": [{
                        "ContainerPort": CONTAINER_PORT,
                        "HostPort": CONTAINER_PORT,
                        "Protocol": "tcp",
                    }],
                    "Environment": container_environment,
                    "Logging": {
                        "LogGroup": logs.output("name")?,
                        "StreamPrefix": config.app_name,
                    },
                },
            }))
            .deferred("arn")
            .build()?;

        let subnet_ids = subnets
            .iter()
            .map(|s| s.reference("id"))
            .collect::<Result<Vec<_>, _>>()?;

        let service_name = config.physical_name("frontend-service");
        let mut service = ResourceHandle::builder(logical(names::SERVICE)?, ResourceKind::ContainerService)
            .depends_on(&cluster)
            .depends_on(&task)
            .depends_on(security_group)
            .properties(json!({
                "ServiceName": service_name,
                "Cluster": cluster.reference("arn")?,
                "TaskDefinition": task.reference("arn")?,
                "LaunchType": "FARGATE",
                "DesiredCount": DESIRED_COUNT,
                "Subnets": subnet_ids,
                "SecurityGroups": [security_group.reference("id")?],
                "CircuitBreaker": { "Enable": true, "Rollback": true },
                "ContainerPort": CONTAINER_PORT,
            }))
            .output("name", service_name)
            .output("cluster_name", cluster.output("name")?)
            .deferred("arn");
        for subnet in &subnets {
            service = service.depends_on(subnet);
        }
        let service = service.build()?;

        let scaling = ResourceHandle::builder(logical(names::SCALING_POLICY)?, ResourceKind::ScalingPolicy)
            .depends_on(&service)
            .properties(json!({
                "Service": service.output("name")?,
                "MinCapacity": MIN_CAPACITY,
                "MaxCapacity": MAX_CAPACITY,
                "Metric": "CPUUtilization",
                "TargetPercent": CPU_TARGET_PERCENT,
                "ScaleInCooldownSeconds": SCALING_COOLDOWN_SECONDS,
                "ScaleOutCooldownSeconds": SCALING_COOLDOWN_SECONDS,
            }))
            .build()?;

        let mut out = Construction::builder(self.name());
        out.add(cluster);
        out.add(logs);
        out.add(task);
        out.add_primary(service);
        out.add(scaling);
        out.build()
    }
}
