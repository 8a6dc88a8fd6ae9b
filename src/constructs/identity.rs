// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identity Constructors
//!
//! Execution roles with least-privilege permission statements. Every
//! statement is scoped to exactly one resource ARN.

use serde::Serialize;
use serde_json::json;

use super::{logical, names, Construction, Constructor, Stage, Upstream};
use crate::assembler::GraphError;
use crate::config::AppConfig;
use crate::domain::invariants::{validate_non_empty, validate_single_resource_scope};
use crate::domain::ResourceKind;
use crate::goals::GoalOperation;
use crate::resource::ResourceHandle;

/// Managed policy granting a function permission to write its logs
pub const BASIC_EXECUTION_POLICY: &str = "service-role/AWSLambdaBasicExecutionRole";

/// Actions the container execution role needs to pull its image and ship logs
pub const CONTAINER_PULL_ACTIONS: &[&str] = &[
    "ecr:GetAuthorizationToken",
    "ecr:BatchCheckLayerAvailability",
    "ecr:GetDownloadUrlForLayer",
    "ecr:BatchGetImage",
    "logs:CreateLogStream",
    "logs:PutLogEvents",
];

/// Allow statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: &'static str,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

impl PolicyStatement {
    /// Allow `actions` on a single resource
    pub fn allow(actions: &[&str], resource: &str) -> Result<Self, GraphError> {
        let statement = Self {
            effect: "Allow",
            actions: actions.iter().map(|a| a.to_string()).collect(),
            resources: vec![validate_non_empty(resource)?],
        };
        statement.validate()?;
        Ok(statement)
    }

    pub fn validate(&self) -> Result<(), GraphError> {
        validate_single_resource_scope(&self.resources)?;
        if self.actions.is_empty() {
            return Err(GraphError::Invalid {
                resource: "policy statement".to_string(),
                reason: "no actions granted".to_string(),
            });
        }
        Ok(())
    }
}

fn role_arn(config: &AppConfig, role_name: &str) -> String {
    format!("arn:aws:iam::{}:role/{}", config.account_id, role_name)
}

fn role(
    config: &AppConfig,
    name: &str,
    role_name: String,
    trusted_service: &str,
    managed_policies: &[&str],
    statement: PolicyStatement,
) -> Result<ResourceHandle, GraphError> {
    let handle = ResourceHandle::builder(logical(name)?, ResourceKind::Role)
        .properties(json!({
            "RoleName": role_name,
            "AssumedBy": trusted_service,
            "ManagedPolicies": managed_policies,
            "Statements": [statement],
        }))
        .output("arn", role_arn(config, &role_name))
        .output("name", role_name)
        .build()?;
    Ok(handle)
}

/// Role for one goal handler function
#[derive(Debug, Clone)]
pub struct FunctionRoleConstructor {
    operation: GoalOperation,
    name: String,
}

impl FunctionRoleConstructor {
    pub fn new(operation: GoalOperation) -> Self {
        Self {
            operation,
            name: names::function_role(operation),
        }
    }
}

impl Constructor for FunctionRoleConstructor {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&self) -> Stage {
        Stage::Identity
    }

    fn construct(&self, config: &AppConfig, _upstream: &Upstream<'_>) -> Result<Construction, GraphError> {
        let statement = PolicyStatement::allow(self.operation.table_actions(), &config.table_arn)?;
        let handle = role(
            config,
            &self.name,
            format!("{}LambdaRole-{}", self.operation, config.environment),
            "lambda.amazonaws.com",
            &[BASIC_EXECUTION_POLICY],
            statement,
        )?;
        Ok(Construction::single(handle))
    }
}

/// Role the container tasks run under
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionRoleConstructor;

impl Constructor for ExecutionRoleConstructor {
    fn name(&self) -> &str {
        names::EXECUTION_ROLE
    }

    fn stage(&self) -> Stage {
        Stage::Identity
    }

    fn construct(&self, config: &AppConfig, _upstream: &Upstream<'_>) -> Result<Construction, GraphError> {
        let statement = PolicyStatement::allow(CONTAINER_PULL_ACTIONS, &config.ecr_repository_arn)?;
        let handle = role(
            config,
            names::EXECUTION_ROLE,
            config.physical_name("frontend-execution-role"),
            "ecs-tasks.amazonaws.com",
            &[],
            statement,
        )?;
        Ok(Construction::single(handle))
    }
}
