// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ApiErrorCode {
    InvalidQueryParameter,
    ValidationFailed,
    InvalidCredentials,
    Unauthorized,
    NotFound,
    Conflict,
    PayloadTooLarge,
    Internal,
}

/// The error envelope every non-2xx API response carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    #[must_use]
    pub fn new(code: ApiErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub fn invalid_param(name: &str, value: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidQueryParameter,
            format!("invalid query parameter: {name}"),
            json!({"parameter": name, "value": value}),
        )
    }

    #[must_use]
    pub fn validation_failed(field_errors: Value) -> Self {
        Self::new(
            ApiErrorCode::ValidationFailed,
            "validation failed",
            json!({"field_errors": field_errors}),
        )
    }

    /// Deliberately identical for unknown account and wrong password.
    #[must_use]
    pub fn invalid_credentials() -> Self {
        Self::new(
            ApiErrorCode::InvalidCredentials,
            "Invalid credentials",
            json!({}),
        )
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(ApiErrorCode::Unauthorized, "authentication required", json!({}))
    }

    #[must_use]
    pub fn not_found(what: &str) -> Self {
        Self::new(
            ApiErrorCode::NotFound,
            format!("{what} not found"),
            json!({"resource": what}),
        )
    }

    #[must_use]
    pub fn conflict(what: &str) -> Self {
        Self::new(
            ApiErrorCode::Conflict,
            format!("{what} already exists"),
            json!({"resource": what}),
        )
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::new(ApiErrorCode::Internal, "internal error", json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_param_details_schema_stable() {
        let e = ApiError::invalid_param("level", "high");
        assert_eq!(e.code, ApiErrorCode::InvalidQueryParameter);
        assert!(e.details.get("parameter").is_some());
        assert!(e.details.get("value").is_some());
    }

    #[test]
    fn credential_failures_share_one_message() {
        assert_eq!(ApiError::invalid_credentials().message, "Invalid credentials");
    }
}
