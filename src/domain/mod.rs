// Copyright (c) 2025 - Cowboy AI, Inc.
//! Domain Value Objects
//!
//! Validated building blocks shared by the configuration loader, the resource
//! constructors and the graph assembler.
//!
//! - [`LogicalName`] - graph-unique resource name
//! - [`DomainName`] - DNS name (RFC 1123)
//! - [`Ipv4Cidr`] - IPv4 network block with subnet carving
//! - [`ResourceKind`] - resource taxonomy

pub mod invariants;
pub mod names;
pub mod network;
pub mod resource_kind;

pub use invariants::{ValidationError, ValidationResult};
pub use names::{DomainName, LogicalName, NameError};
pub use network::{Ipv4Cidr, NetworkError, PortRange};
pub use resource_kind::{ResourceCategory, ResourceKind};
