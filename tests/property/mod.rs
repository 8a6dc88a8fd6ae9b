// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! - `synthesis` - determinism, tag uniformity and network layout of the graph
//! - `ownership` - callers never observe each other's goals

mod ownership;
mod synthesis;
