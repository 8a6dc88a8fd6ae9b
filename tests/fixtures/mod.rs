// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for goals-infrastructure
//!
//! Deterministic settings, clock and stores shared by the integration suites.
//! Timestamps are fixed constants so responses are reproducible.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use goals_infrastructure::config::{keys, AppConfig, ConfigSource, MapSource};
use goals_infrastructure::goals::{
    Clock, Goal, GoalPatch, GoalStore, StoreError, StoreResult,
};

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

pub const ALICE: &str = "alice-sub";
pub const BOB: &str = "bob-sub";

/// Every required setting for the `dev` environment
pub fn settings() -> MapSource {
    MapSource::new()
        .with(keys::REGION, "eu-central-1")
        .with(keys::ACCOUNT_ID, "123456789012")
        .with(keys::TABLE_NAME, "Goals")
        .with(keys::APP_NAME, "goals")
        .with(keys::FRONTEND_DOCKER_IMAGE, "goals-frontend")
        .with(keys::DOCKER_IMAGE_TAG, "latest")
        .with(keys::ECS_CPU_LIMIT, "256")
        .with(keys::ECS_MEMORY_LIMIT, "512")
        .with(keys::SSL_CERTIFICATE_ID, "cert-1")
        .with(keys::DOMAIN_NAME, "example.com")
        .with(keys::WEBSITE_SUBDOMAIN, "goals")
        .with(keys::VPC_CIDR_BLOCK, "10.0.0.0/16")
        .with(keys::AVAILABILITY_ZONE_1, "eu-central-1a")
        .with(keys::AVAILABILITY_ZONE_2, "eu-central-1b")
        .with(keys::TEAM_NAME, "platform")
        .with(keys::MANAGED_BY, "goals-synth")
        .with(keys::STACK_NAME, "MainStack")
        .with(keys::ALLOWED_NETWORK_CIDR, "203.0.113.0/24")
        .with(keys::API_URL_ENV, "REACT_APP_API_URL")
        .with(keys::USER_POOL_ID_ENV, "REACT_APP_USER_POOL_ID")
        .with(keys::APP_CLIENT_ID_ENV, "REACT_APP_CLIENT_ID")
}

pub fn config() -> AppConfig {
    AppConfig::load("dev", &settings()).expect("Invalid fixture settings")
}

/// Render settings as a dotenv file body
pub fn dotenv(source: &MapSource) -> String {
    keys::REQUIRED
        .iter()
        .filter_map(|key| source.get(key).map(|value| format!("{}={}\n", key, value)))
        .collect()
}

pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

/// Clock frozen at [`FIXED_TIMESTAMP`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        fixed_timestamp()
    }
}

/// Store whose every call fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

fn unavailable<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("connection reset".to_string()))
}

#[async_trait]
impl GoalStore for FailingStore {
    async fn put(&self, _goal: Goal) -> StoreResult<()> {
        unavailable()
    }

    async fn get(&self, _user_id: &str, _goal_id: &str) -> StoreResult<Option<Goal>> {
        unavailable()
    }

    async fn query(&self, _user_id: &str) -> StoreResult<Vec<Goal>> {
        unavailable()
    }

    async fn update(&self, _user_id: &str, _goal_id: &str, _patch: &GoalPatch) -> StoreResult<Goal> {
        unavailable()
    }

    async fn delete(&self, _user_id: &str, _goal_id: &str) -> StoreResult<bool> {
        unavailable()
    }
}
