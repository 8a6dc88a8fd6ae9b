// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Domain Invariants
//!
//! Shared rules checked by the configuration loader and the resource
//! constructors. All functions are pure and return detailed validation results.

/// Validation result with detailed error information
pub type ValidationResult<T = ()> = Result<T, ValidationError>;

/// Validation error with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Value is empty or whitespace
    #[error("value must not be empty")]
    Empty,

    /// Value is not a positive integer
    #[error("expected a positive integer, got {0:?}")]
    NotPositiveInteger(String),

    /// Account identifier is malformed
    #[error("expected a 12-digit account identifier, got {0:?}")]
    InvalidAccountId(String),

    /// Environment name is malformed
    #[error("environment names use lowercase letters, digits and hyphens, got {0:?}")]
    InvalidEnvironment(String),

    /// Two values that must differ are equal
    #[error("{0:?} is used twice")]
    NotDistinct(String),

    /// Capacity bounds are inconsistent
    #[error("capacity bounds must satisfy 1 <= min <= desired <= max, got min={min} desired={desired} max={max}")]
    InvalidCapacity { min: u32, desired: u32, max: u32 },

    /// Permission statement is not scoped to a single resource
    #[error("permission statements must be scoped to exactly one resource, got {0}")]
    UnscopedPermission(usize),
}

/// Validate a required string setting and return it trimmed
pub fn validate_non_empty(value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    Ok(trimmed.to_string())
}

/// Validate a strictly positive integer setting
pub fn validate_positive_integer(value: &str) -> ValidationResult<u32> {
    let trimmed = validate_non_empty(value)?;
    match trimmed.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ValidationError::NotPositiveInteger(trimmed)),
    }
}

/// Validate a cloud account identifier
///
/// # Rules
/// - Exactly 12 ASCII digits
pub fn validate_account_id(value: &str) -> ValidationResult<String> {
    let trimmed = validate_non_empty(value)?;
    if trimmed.len() != 12 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidAccountId(trimmed));
    }
    Ok(trimmed)
}

/// Validate an environment name
///
/// # Rules
/// - Non-empty
/// - Lowercase ASCII letters, digits and hyphens
/// - Starts with a letter
pub fn validate_environment(value: &str) -> ValidationResult<String> {
    let trimmed = validate_non_empty(value)?;
    let well_formed = trimmed.starts_with(|c: char| c.is_ascii_lowercase())
        && trimmed
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !well_formed {
        return Err(ValidationError::InvalidEnvironment(trimmed));
    }
    Ok(trimmed)
}

/// Validate that two values differ
pub fn validate_distinct(first: &str, second: &str) -> ValidationResult {
    if first == second {
        return Err(ValidationError::NotDistinct(second.to_string()));
    }
    Ok(())
}

/// Validate scaling bounds
///
/// # Rules
/// - `1 <= min <= desired <= max`
pub fn validate_capacity(min: u32, desired: u32, max: u32) -> ValidationResult {
    if min == 0 || min > desired || desired > max {
        return Err(ValidationError::InvalidCapacity { min, desired, max });
    }
    Ok(())
}

/// Validate least-privilege scoping of a permission statement
///
/// # Rules
/// - Exactly one resource pattern per statement
pub fn validate_single_resource_scope(resources: &[String]) -> ValidationResult {
    if resources.len() != 1 {
        return Err(ValidationError::UnscopedPermission(resources.len()));
    }
    Ok(())
}
