//! Field-level validation errors.
//!
//! Validation failures are reported as a list of [`FieldError`]s rather than
//! raised, so every broken field of a request is reported at once.

use serde::{Deserialize, Serialize};

/// Bounds for validated fields.
pub mod limits {
    /// Smallest page size a caller may request.
    pub const MIN_LIMIT: i32 = 1;
    /// Largest page size a caller may request.
    pub const MAX_LIMIT: i32 = 200;
}

/// Machine-readable error codes.
pub mod codes {
    pub const NOT_EMPTY: &str = "NotEmpty";
    pub const INVALID_INPUT: &str = "InvalidInput";
    pub const INVALID_REQUEST: &str = "InvalidRequest";
    pub const UNAUTHORIZED_REQUEST: &str = "UnauthorizedRequest";
}

/// Error messages for validation failures.
pub mod errmsg {
    pub const LIMIT_OUT_OF_RANGE: &str = "Limit must be greater than zero and less than 200";
    pub const FROM_DATE_REQUIRED: &str = "FromDate must have a value if ToDate is set";
    pub const TO_DATE_REQUIRED: &str = "ToDate must have a value if FromDate is set";
    pub const TO_DATE_BEFORE_FROM_DATE: &str = "ToDate cannot be less than FromDate";
    pub const INVALID_REQUEST: &str = "Invalid request";
    pub const UNAUTHORIZED: &str = "User not authorized to perform this request";
}

/// One validation failure, serialized as
/// `{"propertyName": .., "message": .., "errorCode": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub property_name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl FieldError {
    pub fn new(
        property_name: impl Into<String>,
        message: impl Into<String>,
        error_code: &str,
    ) -> Self {
        Self {
            property_name: property_name.into(),
            message: message.into(),
            error_code: Some(error_code.to_string()),
        }
    }

    /// A required field that was missing or blank.
    pub fn not_empty(property_name: &str) -> Self {
        Self::new(
            property_name,
            format!("'{}' must not be empty.", property_name),
            codes::NOT_EMPTY,
        )
    }

    /// The request as a whole could not be understood.
    pub fn invalid_request(property_name: &str) -> Self {
        Self::new(property_name, errmsg::INVALID_REQUEST, codes::INVALID_REQUEST)
    }

    /// The caller lacks the scope the operation needs.
    pub fn unauthorized() -> Self {
        Self::new("Request", errmsg::UNAUTHORIZED, codes::UNAUTHORIZED_REQUEST)
    }
}

/// Record a `NotEmpty` error when `value` is absent or blank.
pub fn require(errors: &mut Vec<FieldError>, property_name: &str, value: Option<&str>) {
    if value.is_none_or(|v| v.trim().is_empty()) {
        errors.push(FieldError::not_empty(property_name));
    }
}

/// Whether a page size is within bounds.
pub fn limit_in_range(limit: i32) -> bool {
    (limits::MIN_LIMIT..=limits::MAX_LIMIT).contains(&limit)
}
