// Copyright (c) 2025 - Cowboy AI, Inc.
//! Table Constructor
//!
//! Goals table keyed by owner and goal identifier, billed per request.

use serde_json::json;

use super::{logical, names, Construction, Constructor, Stage, Upstream};
use crate::assembler::GraphError;
use crate::config::AppConfig;
use crate::domain::ResourceKind;
use crate::goals::{PARTITION_KEY, SORT_KEY};
use crate::resource::ResourceHandle;

#[derive(Debug, Clone, Copy, Default)]
pub struct TableConstructor;

impl Constructor for TableConstructor {
    fn name(&self) -> &str {
        names::TABLE
    }

    fn stage(&self) -> Stage {
        Stage::Table
    }

    fn construct(&self, config: &AppConfig, _upstream: &Upstream<'_>) -> Result<Construction, GraphError> {
        let handle = ResourceHandle::builder(logical(names::TABLE)?, ResourceKind::Table)
            .properties(json!({
                "TableName": config.full_table_name,
                "PartitionKey": { "Name": PARTITION_KEY, "Type": "S" },
                "SortKey": { "Name": SORT_KEY, "Type": "S" },
                "BillingMode": "PAY_PER_REQUEST",
                "Encryption": "AWS_MANAGED",
                "RemovalPolicy": "destroy",
            }))
            .output("name", config.full_table_name.as_str())
            .output("arn", config.table_arn.as_str())
            .build()?;
        Ok(Construction::single(handle))
    }
}
