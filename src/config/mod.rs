// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration Loader
//!
//! Resolves environment-scoped settings into one immutable [`AppConfig`].
//! Loading is fail-fast: fields are read in schema order and the first missing
//! or malformed one stops the load. No partial configuration is ever returned.
//!
//! ```rust,ignore
//! use goals_infrastructure::config::{AppConfig, EnvSource, FileSource, LayeredSource};
//!
//! let source = LayeredSource::new()
//!     .layer(EnvSource)
//!     .layer(FileSource::for_environment("config", "dev")?);
//! let config = AppConfig::load("dev", &source)?;
//! ```

pub mod source;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::domain::invariants::{
    validate_account_id, validate_distinct, validate_environment, validate_non_empty,
    validate_positive_integer,
};
use crate::domain::{DomainName, Ipv4Cidr};

pub use source::{ConfigSource, EnvSource, FileSource, LayeredSource, MapSource};

/// Setting keys, in the order they are validated
pub mod keys {
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
    pub const REGION: &str = "REGION";
    pub const ACCOUNT_ID: &str = "ACCOUNT_ID";
    pub const TABLE_NAME: &str = "TABLE_NAME";
    pub const APP_NAME: &str = "APP_NAME";
    pub const FRONTEND_DOCKER_IMAGE: &str = "FRONTEND_DOCKER_IMAGE";
    pub const DOCKER_IMAGE_TAG: &str = "DOCKER_IMAGE_TAG";
    pub const ECS_CPU_LIMIT: &str = "ECS_CPU_LIMIT";
    pub const ECS_MEMORY_LIMIT: &str = "ECS_MEMORY_LIMIT";
    pub const SSL_CERTIFICATE_ID: &str = "SSL_CERTIFICATE_ID";
    pub const DOMAIN_NAME: &str = "DOMAIN_NAME";
    pub const WEBSITE_SUBDOMAIN: &str = "WEBSITE_SUBDOMAIN";
    pub const VPC_CIDR_BLOCK: &str = "VPC_CIDR_BLOCK";
    pub const AVAILABILITY_ZONE_1: &str = "AVAILABILITY_ZONE_1";
    pub const AVAILABILITY_ZONE_2: &str = "AVAILABILITY_ZONE_2";
    pub const TEAM_NAME: &str = "TEAM_NAME";
    pub const MANAGED_BY: &str = "MANAGED_BY";
    pub const STACK_NAME: &str = "STACK_NAME";
    pub const ALLOWED_NETWORK_CIDR: &str = "ALLOWED_NETWORK_CIDR";
    pub const API_URL_ENV: &str = "API_URL_ENV";
    pub const USER_POOL_ID_ENV: &str = "USER_POOL_ID_ENV";
    pub const APP_CLIENT_ID_ENV: &str = "APP_CLIENT_ID_ENV";
    pub const HOSTED_ZONE_ID: &str = "HOSTED_ZONE_ID";
    pub const ALARM_NOTIFICATION_EMAIL: &str = "ALARM_NOTIFICATION_EMAIL";

    /// Every key a source must define, in validation order
    ///
    /// `ENVIRONMENT` is not listed: it defaults to the requested environment id.
    pub const REQUIRED: &[&str] = &[
        REGION,
        ACCOUNT_ID,
        TABLE_NAME,
        APP_NAME,
        FRONTEND_DOCKER_IMAGE,
        DOCKER_IMAGE_TAG,
        ECS_CPU_LIMIT,
        ECS_MEMORY_LIMIT,
        SSL_CERTIFICATE_ID,
        DOMAIN_NAME,
        WEBSITE_SUBDOMAIN,
        VPC_CIDR_BLOCK,
        AVAILABILITY_ZONE_1,
        AVAILABILITY_ZONE_2,
        TEAM_NAME,
        MANAGED_BY,
        STACK_NAME,
        ALLOWED_NETWORK_CIDR,
        API_URL_ENV,
        USER_POOL_ID_ENV,
        APP_CLIENT_ID_ENV,
    ];
}

/// Prefix length of every subnet carved from the network block
pub const SUBNET_PREFIX: u8 = 24;

/// Availability zones the network spans
pub const ZONE_COUNT: usize = 2;

/// Subnets carved from the network block (public and private per zone)
pub const SUBNET_COUNT: u32 = 2 * ZONE_COUNT as u32;

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required field absent from every source
    #[error("Missing required configuration field: {field}")]
    Missing { field: String },

    /// Field present but malformed
    #[error("Invalid configuration field {field}: {reason}")]
    Invalid { field: String, reason: String },

    /// Settings source describes a different environment than requested
    #[error("Requested environment {requested:?} but the settings source defines {configured:?}")]
    EnvironmentMismatch { requested: String, configured: String },

    /// Settings source could not be read
    #[error("Cannot read configuration source {source_name}: {reason}")]
    Source { source_name: String, reason: String },
}

impl ConfigError {
    /// Name of the offending field, when the error concerns one
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Missing { field } | Self::Invalid { field, .. } => Some(field),
            Self::EnvironmentMismatch { .. } => Some(keys::ENVIRONMENT),
            Self::Source { .. } => None,
        }
    }
}

/// Immutable, fully validated application configuration
///
/// Created once per run by [`AppConfig::load`] and only ever shared by
/// reference afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub region: String,
    pub account_id: String,
    pub table_name: String,
    pub app_name: String,
    pub frontend_docker_image: String,
    pub docker_image_tag: String,
    pub ecs_cpu_limit: u32,
    pub ecs_memory_limit: u32,
    pub ssl_certificate_id: String,
    pub domain_name: DomainName,
    pub website_subdomain: String,
    pub vpc_cidr: Ipv4Cidr,
    pub availability_zones: [String; ZONE_COUNT],
    pub team_name: String,
    pub managed_by: String,
    pub stack_name: String,
    pub allowed_network: Ipv4Cidr,
    pub api_url_env: String,
    pub user_pool_id_env: String,
    pub app_client_id_env: String,
    pub hosted_zone_id: Option<String>,
    pub alarm_email: Option<String>,

    // Derived once during load
    pub full_table_name: String,
    pub website_fqdn: DomainName,
    pub table_arn: String,
    pub certificate_arn: String,
    pub ecr_repository_arn: String,
}

/// Reads raw values and maps validation failures onto the field name
struct FieldReader<'a, S: ConfigSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: ConfigSource + ?Sized> FieldReader<'a, S> {
    fn raw(&self, field: &str) -> Result<String, ConfigError> {
        self.source.get(field).ok_or_else(|| ConfigError::Missing {
            field: field.to_string(),
        })
    }

    fn parse<T, E, F>(&self, field: &str, parser: F) -> Result<T, ConfigError>
    where
        E: std::fmt::Display,
        F: FnOnce(&str) -> Result<T, E>,
    {
        let raw = self.raw(field)?;
        if raw.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: field.to_string(),
            });
        }
        parser(&raw).map_err(|e| invalid(field, e))
    }

    fn string(&self, field: &str) -> Result<String, ConfigError> {
        self.parse(field, validate_non_empty)
    }

    fn optional(&self, field: &str) -> Option<String> {
        self.source
            .get(field)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

fn invalid(field: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

impl AppConfig {
    /// Load and validate the configuration for one environment
    ///
    /// # Errors
    /// The first missing or malformed field, in [`keys::REQUIRED`] order.
    pub fn load<S>(environment_id: &str, source: &S) -> Result<Self, ConfigError>
    where
        S: ConfigSource + ?Sized,
    {
        let reader = FieldReader { source };

        let requested =
            validate_environment(environment_id).map_err(|e| invalid(keys::ENVIRONMENT, e))?;
        let environment = match reader.optional(keys::ENVIRONMENT) {
            Some(configured) => {
                let configured = validate_environment(&configured)
                    .map_err(|e| invalid(keys::ENVIRONMENT, e))?;
                if configured != requested {
                    return Err(ConfigError::EnvironmentMismatch {
                        requested,
                        configured,
                    });
                }
                configured
            }
            None => requested,
        };

        let region = reader.string(keys::REGION)?;
        let account_id = reader.parse(keys::ACCOUNT_ID, validate_account_id)?;
        let table_name = reader.string(keys::TABLE_NAME)?;
        let app_name = reader.string(keys::APP_NAME)?;
        let frontend_docker_image = reader.string(keys::FRONTEND_DOCKER_IMAGE)?;
        let docker_image_tag = reader.string(keys::DOCKER_IMAGE_TAG)?;
        let ecs_cpu_limit = reader.parse(keys::ECS_CPU_LIMIT, validate_positive_integer)?;
        let ecs_memory_limit = reader.parse(keys::ECS_MEMORY_LIMIT, validate_positive_integer)?;
        let ssl_certificate_id = reader.string(keys::SSL_CERTIFICATE_ID)?;
        let domain_name = reader.parse(keys::DOMAIN_NAME, |v| DomainName::new(v.trim()))?;

        let website_subdomain = reader.string(keys::WEBSITE_SUBDOMAIN)?;
        let website_fqdn = domain_name
            .subdomain(&website_subdomain)
            .map_err(|e| invalid(keys::WEBSITE_SUBDOMAIN, e))?;

        let vpc_cidr = reader.parse(keys::VPC_CIDR_BLOCK, |v| Ipv4Cidr::new(v))?;
        vpc_cidr
            .subnet(SUBNET_PREFIX, SUBNET_COUNT - 1)
            .map_err(|_| {
                invalid(
                    keys::VPC_CIDR_BLOCK,
                    format!(
                        "{} cannot hold {} /{} subnets",
                        vpc_cidr, SUBNET_COUNT, SUBNET_PREFIX
                    ),
                )
            })?;

        let zone_1 = reader.string(keys::AVAILABILITY_ZONE_1)?;
        let zone_2 = reader.string(keys::AVAILABILITY_ZONE_2)?;
        validate_distinct(&zone_1, &zone_2).map_err(|e| invalid(keys::AVAILABILITY_ZONE_2, e))?;

        let team_name = reader.string(keys::TEAM_NAME)?;
        let managed_by = reader.string(keys::MANAGED_BY)?;
        let stack_name = reader.string(keys::STACK_NAME)?;
        let allowed_network = reader.parse(keys::ALLOWED_NETWORK_CIDR, |v| Ipv4Cidr::new(v))?;
        let api_url_env = reader.string(keys::API_URL_ENV)?;
        let user_pool_id_env = reader.string(keys::USER_POOL_ID_ENV)?;
        let app_client_id_env = reader.string(keys::APP_CLIENT_ID_ENV)?;
        let hosted_zone_id = reader.optional(keys::HOSTED_ZONE_ID);
        let alarm_email = reader.optional(keys::ALARM_NOTIFICATION_EMAIL);

        let full_table_name = format!("{}-{}", table_name, environment);
        let arn = |service: &str, resource: String| {
            format!("arn:aws:{}:{}:{}:{}", service, region, account_id, resource)
        };
        let table_arn = arn("dynamodb", format!("table/{}", full_table_name));
        let certificate_arn = arn("acm", format!("certificate/{}", ssl_certificate_id));
        let ecr_repository_arn = arn("ecr", format!("repository/{}", frontend_docker_image));

        info!(
            "Loaded configuration for environment {} from {}",
            environment,
            source.describe()
        );

        Ok(Self {
            environment,
            region,
            account_id,
            table_name,
            app_name,
            frontend_docker_image,
            docker_image_tag,
            ecs_cpu_limit,
            ecs_memory_limit,
            ssl_certificate_id,
            domain_name,
            website_subdomain,
            vpc_cidr,
            availability_zones: [zone_1, zone_2],
            team_name,
            managed_by,
            stack_name,
            allowed_network,
            api_url_env,
            user_pool_id_env,
            app_client_id_env,
            hosted_zone_id,
            alarm_email,
            full_table_name,
            website_fqdn,
            table_arn,
            certificate_arn,
            ecr_repository_arn,
        })
    }

    /// Physical name following the `<component>-<environment>-<app>` convention
    pub fn physical_name(&self, component: &str) -> String {
        format!("{}-{}-{}", component, self.environment, self.app_name)
    }

    /// Prefix shared by application-scoped names (`<app>-<environment>`)
    pub fn resource_prefix(&self) -> String {
        format!("{}-{}", self.app_name, self.environment)
    }

    /// Name of the deployed stack (`<stack_name>-<environment>`)
    pub fn qualified_stack_name(&self) -> String {
        format!("{}-{}", self.stack_name, self.environment)
    }

    /// Public URL of the website entry point
    pub fn website_url(&self) -> String {
        format!("https://{}", self.website_fqdn)
    }
}
