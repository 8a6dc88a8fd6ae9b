// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Graph Synthesis
//!
//! For any valid configuration, synthesis must be a pure function of it:
//! identical inputs give identical descriptors, every resource carries the
//! same tag set, and the network layout stays inside the configured block.

use goals_infrastructure::config::{keys, AppConfig};
use goals_infrastructure::domain::{Ipv4Cidr, ResourceKind};
use goals_infrastructure::{synthesize, TagSet};
use proptest::prelude::*;

use crate::fixtures::settings;

// ============================================================================
// Strategies
// ============================================================================

fn environment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,11}"
}

fn account_id() -> impl Strategy<Value = String> {
    "[0-9]{12}"
}

/// Network blocks with room for four /24 subnets
fn vpc_cidr() -> impl Strategy<Value = String> {
    (0u8..=255, 16u8..=22).prop_map(|(octet, prefix)| format!("10.{}.0.0/{}", octet, prefix))
}

fn config_for(env: &str, account: &str, cidr: &str) -> AppConfig {
    let source = settings()
        .with(keys::ACCOUNT_ID, account)
        .with(keys::VPC_CIDR_BLOCK, cidr);
    AppConfig::load(env, &source).unwrap()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Same configuration, same descriptor
    #[test]
    fn prop_synthesis_deterministic(env in environment(), account in account_id(), cidr in vpc_cidr()) {
        let config = config_for(&env, &account, &cidr);
        let first = synthesize(&config).unwrap();
        let second = synthesize(&config).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Every resource carries exactly the configuration's tag set
    #[test]
    fn prop_tags_uniform(env in environment(), account in account_id()) {
        let config = config_for(&env, &account, "10.0.0.0/16");
        let tags = TagSet::from_config(&config);
        let descriptor = synthesize(&config).unwrap();

        let expected_budget = format!("{}-{}", env.to_uppercase(), account);
        prop_assert_eq!(tags.get("BudgetId"), Some(expected_budget.as_str()));
        for resource in &descriptor.resources {
            prop_assert_eq!(resource.tags(), tags.as_map());
        }
    }

    /// Subnets lie inside the network block and never overlap
    #[test]
    fn prop_subnets_partition_network(cidr in vpc_cidr()) {
        let config = config_for("dev", "123456789012", &cidr);
        let descriptor = synthesize(&config).unwrap();
        let subnets: Vec<Ipv4Cidr> = descriptor
            .resources
            .iter()
            .filter(|r| r.kind() == ResourceKind::Subnet)
            .map(|r| Ipv4Cidr::new(r.output("cidr").unwrap()).unwrap())
            .collect();

        prop_assert_eq!(subnets.len(), 4);
        for (i, subnet) in subnets.iter().enumerate() {
            prop_assert!(config.vpc_cidr.contains(subnet));
            for other in &subnets[i + 1..] {
                prop_assert!(!subnet.overlaps(other));
            }
        }
    }

    /// The resource set does not depend on naming inputs
    #[test]
    fn prop_resource_count_stable(env in environment()) {
        let baseline = synthesize(&config_for("dev", "123456789012", "10.0.0.0/16")).unwrap();
        let other = synthesize(&config_for(&env, "123456789012", "10.0.0.0/16")).unwrap();

        let names = |d: &goals_infrastructure::DeploymentDescriptor| {
            d.resources.iter().map(|r| r.name().to_string()).collect::<Vec<_>>()
        };
        prop_assert_eq!(names(&baseline), names(&other));
    }
}
