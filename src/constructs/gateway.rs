// Copyright (c) 2025 - Cowboy AI, Inc.
//! Gateway Constructors
//!
//! - [`ApiConstructor`] - authenticated HTTP API: user pool, client, token
//!   authorizer, access logs, and one method binding per goal operation with
//!   CORS preflight on each route
//! - [`LoadBalancerConstructor`] - public entry point for the front end. The
//!   HTTPS listener and the HTTP → HTTPS redirect listener are produced by the
//!   same call, so a plaintext-only entry point can never be registered
//! - [`FirewallConstructor`] - blocks sign-up requests from outside the
//!   allow-listed network

use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::compute::{log_group, CONTAINER_PORT};
use super::{logical, names, Construction, Constructor, Stage, Upstream};
use crate::assembler::GraphError;
use crate::config::{AppConfig, ZONE_COUNT};
use crate::domain::ResourceKind;
use crate::goals::{GoalOperation, GOALS_PATH};
use crate::resource::{token, ResourceHandle};

/// Deployment stage the API is published under
pub const API_STAGE: &str = "prod";

/// Request headers the API accepts from browsers
pub const CORS_ALLOW_HEADERS: &[&str] = &[
    "Content-Type",
    "X-Amz-Date",
    "Authorization",
    "X-Api-Key",
    "X-Amz-Security-Token",
];

/// Path prefix only allow-listed networks may reach
pub const SIGNUP_PATH: &str = "/signup";

/// Whether `handle` is a listener redirecting plaintext traffic to HTTPS
pub fn is_secure_redirect(handle: &ResourceHandle) -> bool {
    let action = handle.property("DefaultAction");
    handle.kind() == ResourceKind::Listener
        && handle.property("Protocol").and_then(Value::as_str) == Some("HTTP")
        && action.and_then(|a| a["Type"].as_str()) == Some("redirect")
        && action.and_then(|a| a["Redirect"]["Protocol"].as_str()) == Some("HTTPS")
}

/// Authenticated HTTP API in front of the handler functions
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiConstructor;

impl ApiConstructor {
    /// Route bindings grouped by resource path, with their CORS policy
    fn resources(
        upstream: &Upstream<'_>,
        authorizer: &ResourceHandle,
    ) -> Result<Vec<Value>, GraphError> {
        let mut by_path: BTreeMap<&'static str, Vec<Value>> = BTreeMap::new();
        let mut allowed: BTreeMap<&'static str, Vec<&'static str>> = BTreeMap::new();

        for operation in GoalOperation::ALL {
            let route = operation.route();
            let function = upstream.get(&names::function(operation))?;
            by_path.entry(route.path).or_default().push(json!({
                "HttpMethod": route.method,
                "Operation": operation,
                "Integration": { "Type": "proxy", "FunctionArn": function.output("arn")? },
                "AuthorizationType": "COGNITO_USER_POOLS",
                "AuthorizerId": authorizer.reference("id")?,
            }));
            allowed.entry(route.path).or_insert_with(|| vec!["OPTIONS"]).push(route.method);
        }

        Ok(by_path
            .into_iter()
            .map(|(path, methods)| {
                json!({
                    "Path": path,
                    "Cors": {
                        "AllowOrigins": ["*"],
                        "AllowMethods": allowed.get(path),
                        "AllowHeaders": CORS_ALLOW_HEADERS,
                        "AllowCredentials": true,
                    },
                    "Methods": methods,
                })
            })
            .collect())
    }
}

impl Constructor for ApiConstructor {
    fn name(&self) -> &str {
        names::API
    }

    fn stage(&self) -> Stage {
        Stage::Gateway
    }

    fn dependencies(&self) -> Vec<String> {
        GoalOperation::ALL.into_iter().map(names::function).collect()
    }

    fn construct(&self, config: &AppConfig, upstream: &Upstream<'_>) -> Result<Construction, GraphError> {
        let env = &config.environment;

        let pool = ResourceHandle::builder(logical(names::USER_POOL)?, ResourceKind::UserPool)
            .properties(json!({
                "UserPoolName": format!("CognitoGoal-User-Pool-{}", env),
                "SelfSignUpEnabled": true,
                "SignInAliases": ["email"],
                "AutoVerifiedAttributes": ["email"],
                "PasswordPolicy": {
                    "MinLength": 8,
                    "RequireUppercase": true,
                    "RequireLowercase": true,
                    "RequireDigits": true,
                    "RequireSymbols": false,
                },
                "AccountRecovery": "email_only",
                "RemovalPolicy": "destroy",
            }))
            .deferred("id")
            .deferred("arn")
            .build()?;

        let client = ResourceHandle::builder(logical(names::USER_POOL_CLIENT)?, ResourceKind::UserPoolClient)
            .depends_on(&pool)
            .properties(json!({
                "ClientName": format!("CognitoGoal-Client-{}", env),
                "UserPoolId": pool.reference("id")?,
                "GenerateSecret": false,
                "AuthFlows": ["user_password", "user_srp"],
                "PreventUserExistenceErrors": true,
                "RemovalPolicy": "destroy",
            }))
            .deferred("id")
            .build()?;

        let authorizer = ResourceHandle::builder(logical(names::AUTHORIZER)?, ResourceKind::Authorizer)
            .depends_on(&pool)
            .properties(json!({
                "Name": format!("GoalAuthorizer-{}", env),
                "Type": "COGNITO_USER_POOLS",
                "ProviderArns": [pool.reference("arn")?],
                "IdentitySource": "method.request.header.Authorization",
            }))
            .deferred("id")
            .build()?;

        let logs = log_group(names::API_LOGS, config.physical_name("api-access-logs"), false)?;

        let api_id = token::reference(names::API, "id");
        let url = format!(
            "https://{}.execute-api.{}.amazonaws.com/{}",
            api_id, config.region, API_STAGE
        );

        let mut api = ResourceHandle::builder(logical(names::API)?, ResourceKind::RestApi)
            .depends_on(&authorizer)
            .depends_on(&client)
            .depends_on(&logs)
            .properties(json!({
                "Name": format!("ApiGoal-{}", env),
                "Description": "This service manages goals",
                "CloudWatchRole": true,
                "Stage": {
                    "Name": API_STAGE,
                    "LoggingLevel": "INFO",
                    "DataTraceEnabled": true,
                    "AccessLogDestination": logs.reference("arn")?,
                    "AccessLogFormat": "json_with_standard_fields",
                },
                "Resources": Self::resources(upstream, &authorizer)?,
            }))
            .deferred("id")
            .output("name", format!("ApiGoal-{}", env))
            .output("stage", API_STAGE)
            .output("goals_url", format!("{}{}", url, GOALS_PATH))
            .output("url", url)
            .output("user_pool_id", pool.reference("id")?)
            .output("user_pool_client_id", client.reference("id")?);
        for operation in GoalOperation::ALL {
            api = api.depends_on(upstream.get(&names::function(operation))?);
        }
        let api = api.build()?;

        let mut out = Construction::builder(self.name());
        out.add(pool);
        out.add(client);
        out.add(authorizer);
        out.add(logs);
        out.add_primary(api);
        out.build()
    }
}

/// Internet-facing load balancer for the container service
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadBalancerConstructor;

impl LoadBalancerConstructor {
    fn public_subnets() -> Vec<String> {
        (0..ZONE_COUNT).map(names::public_subnet).collect()
    }
}

impl Constructor for LoadBalancerConstructor {
    fn name(&self) -> &str {
        names::LOAD_BALANCER
    }

    fn stage(&self) -> Stage {
        Stage::Gateway
    }

    fn dependencies(&self) -> Vec<String> {
        let mut deps = vec![
            names::LOAD_BALANCER_SECURITY_GROUP.to_string(),
            names::SERVICE.to_string(),
        ];
        deps.extend(Self::public_subnets());
        deps
    }

    fn construct(&self, config: &AppConfig, upstream: &Upstream<'_>) -> Result<Construction, GraphError> {
        let security_group = upstream.get(names::LOAD_BALANCER_SECURITY_GROUP)?;
        let service = upstream.get(names::SERVICE)?;
        let subnets = Self::public_subnets()
            .iter()
            .map(|name| upstream.get(name))
            .collect::<Result<Vec<_>, _>>()?;
        let subnet_ids = subnets
            .iter()
            .map(|s| s.reference("id"))
            .collect::<Result<Vec<_>, _>>()?;

        let mut lb = ResourceHandle::builder(logical(names::LOAD_BALANCER)?, ResourceKind::LoadBalancer)
            .depends_on(security_group)
            .properties(json!({
                "Name": config.physical_name("alb"),
                "Type": "application",
                "Scheme": "internet-facing",
                "Subnets": subnet_ids,
                "SecurityGroups": [security_group.reference("id")?],
            }))
            .deferred("arn")
            .deferred("dns_name")
            .deferred("hosted_zone_id")
            .deferred("full_name")
            .output("name", config.physical_name("alb"));
        for subnet in &subnets {
            lb = lb.depends_on(subnet);
        }
        let lb = lb.build()?;

        let https = ResourceHandle::builder(logical(names::HTTPS_LISTENER)?, ResourceKind::Listener)
            .depends_on(&lb)
            .depends_on(service)
            .properties(json!({
                "LoadBalancerArn": lb.reference("arn")?,
                "Port": 443,
                "Protocol": "HTTPS",
                "Certificates": [config.certificate_arn],
                "DefaultAction": {
                    "Type": "forward",
                    "Target": {
                        "Service": service.output("name")?,
                        "Port": CONTAINER_PORT,
                        "Protocol": "HTTP",
                    },
                },
            }))
            .deferred("arn")
            .build()?;

        let redirect = ResourceHandle::builder(logical(names::REDIRECT_LISTENER)?, ResourceKind::Listener)
            .depends_on(&lb)
            .properties(json!({
                "LoadBalancerArn": lb.reference("arn")?,
                "Port": 80,
                "Protocol": "HTTP",
                "DefaultAction": {
                    "Type": "redirect",
                    "Redirect": { "Protocol": "HTTPS", "Port": "443", "Permanent": true },
                },
            }))
            .deferred("arn")
            .build()?;

        let zone = match &config.hosted_zone_id {
            Some(id) => json!({ "HostedZoneId": id }),
            None => json!({ "LookupDomain": config.domain_name }),
        };
        let dns = ResourceHandle::builder(logical(names::DNS_RECORD)?, ResourceKind::DnsRecord)
            .depends_on(&lb)
            .properties(json!({
                "Zone": zone,
                "RecordName": config.website_fqdn,
                "Type": "A",
                "AliasTarget": {
                    "DnsName": lb.reference("dns_name")?,
                    "HostedZoneId": lb.reference("hosted_zone_id")?,
                },
            }))
            .output("fqdn", config.website_fqdn.as_str())
            .output("url", config.website_url())
            .build()?;

        let mut out = Construction::builder(self.name());
        out.add_primary(lb);
        out.add(https);
        out.add(redirect);
        out.add(dns);
        out.build()
    }
}

/// Web application firewall guarding the load balancer
#[derive(Debug, Clone, Copy, Default)]
pub struct FirewallConstructor;

impl Constructor for FirewallConstructor {
    fn name(&self) -> &str {
        names::WEB_ACL
    }

    fn stage(&self) -> Stage {
        Stage::Gateway
    }

    fn dependencies(&self) -> Vec<String> {
        vec![names::LOAD_BALANCER.to_string()]
    }

    fn construct(&self, config: &AppConfig, upstream: &Upstream<'_>) -> Result<Construction, GraphError> {
        let lb = upstream.get(names::LOAD_BALANCER)?;
        let env = &config.environment;

        let ip_set = ResourceHandle::builder(logical(names::IP_SET)?, ResourceKind::IpSet)
            .properties(json!({
                "Name": format!("AllowedSignupNetworks-{}", env),
                "Addresses": [config.allowed_network],
                "IpAddressVersion": "IPV4",
                "Scope": "REGIONAL",
            }))
            .deferred("arn")
            .build()?;

        let rule_name = format!("BlockSignupOutsideAllowList-{}", env);
        let acl_name = config.physical_name("web-acl");
        let acl = ResourceHandle::builder(logical(names::WEB_ACL)?, ResourceKind::WebAcl)
            .depends_on(&ip_set)
            .properties(json!({
                "Name": acl_name,
                "Scope": "REGIONAL",
                "DefaultAction": "allow",
                "Visibility": { "MetricName": acl_name, "SampledRequests": true },
                "Rules": [{
                    "Name": rule_name,
                    "Priority": 0,
                    "Action": "block",
                    "Visibility": { "MetricName": rule_name, "SampledRequests": true },
                    "Statement": {
                        "And": [
                            {
                                "ByteMatch": {
                                    "Field": "uri_path",
                                    "PositionalConstraint": "STARTS_WITH",
                                    "SearchString": SIGNUP_PATH,
                                },
                            },
                            { "Not": { "IpSetReference": ip_set.reference("arn")? } },
                        ],
                    },
                }],
            }))
            .deferred("arn")
            .build()?;

        let association = ResourceHandle::builder(logical(names::WEB_ACL_ASSOCIATION)?, ResourceKind::WebAclAssociation)
            .depends_on(&acl)
            .depends_on(lb)
            .properties(json!({
                "ResourceArn": lb.reference("arn")?,
                "WebAclArn": acl.reference("arn")?,
            }))
            .build()?;

        let mut out = Construction::builder(self.name());
        out.add(ip_set);
        out.add_primary(acl);
        out.add(association);
        out.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{registry_through, sample_config};

    fn run(constructor: &dyn Constructor, through: Stage) -> Construction {
        let config = sample_config();
        let mut registry = registry_through(&config, through);
        if constructor.name() == names::WEB_ACL {
            let lb = LoadBalancerConstructor;
            let upstream = Upstream::resolve(lb.name(), &lb.dependencies(), &registry).unwrap();
            let construction = lb.construct(&config, &upstream).unwrap();
            for handle in construction.into_handles() {
                registry.register(handle).unwrap();
            }
        }
        let upstream = Upstream::resolve(constructor.name(), &constructor.dependencies(), &registry).unwrap();
        constructor.construct(&config, &upstream).unwrap()
    }

    #[test]
    fn test_load_balancer_includes_redirect() {
        let construction = run(&LoadBalancerConstructor, Stage::Compute);
        assert!(construction.primary().kind().is_public_entry_point());
        assert_eq!(
            construction.handles().iter().filter(|h| is_secure_redirect(h)).count(),
            1
        );
    }

    #[test]
    fn test_https_listener_is_not_a_redirect() {
        let construction = run(&LoadBalancerConstructor, Stage::Compute);
        let https = construction
            .handles()
            .iter()
            .find(|h| h.name().as_str() == names::HTTPS_LISTENER)
            .unwrap();
        assert!(!is_secure_redirect(https));
        assert_eq!(https.property("Port").unwrap(), &json!(443));
    }

    #[test]
    fn test_api_binds_every_operation() {
        let construction = run(&ApiConstructor, Stage::Compute);
        let api = construction.primary();
        let resources = api.property("Resources").unwrap().as_array().unwrap();

        let bound: usize = resources
            .iter()
            .map(|r| r["Methods"].as_array().unwrap().len())
            .sum();
        assert_eq!(bound, GoalOperation::ALL.len());

        let item = resources.iter().find(|r| r["Path"] == "/goals/{id}").unwrap();
        assert_eq!(
            item["Cors"]["AllowMethods"],
            json!(["OPTIONS", "GET", "PUT", "DELETE"])
        );
        assert!(api.output("goals_url").unwrap().ends_with("/prod/goals"));
        assert_eq!(api.output("user_pool_id").unwrap(), "${gateway-user-pool.id}");
    }

    #[test]
    fn test_firewall_blocks_signup() {
        let construction = run(&FirewallConstructor, Stage::Compute);
        let acl = construction.primary();
        let rule = &acl.property("Rules").unwrap()[0];
        assert_eq!(rule["Action"], "block");
        assert_eq!(
            rule["Statement"]["And"][0]["ByteMatch"]["SearchString"],
            SIGNUP_PATH
        );
        assert!(construction.contains_kind(ResourceKind::WebAclAssociation));
    }
}
