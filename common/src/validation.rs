//! Delivery request validation
//!
//! Blocking problems are [`FieldError`]s. A missing geolocation is only a
//! [`ValidationWarning`]: the request can still be sent once the user accepts it.

use crate::types::DeliveryRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A required field that is missing or blank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationWarning {
    /// No latitude/longitude; nearby-store matching falls back to the address
    MissingCoordinates,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::MissingCoordinates => {
                write!(f, "location not captured; stores will be matched by address only")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// True when at least one field error prevents submission
    pub fn is_blocking(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warning(&self, warning: ValidationWarning) -> bool {
        self.warnings.contains(&warning)
    }

    pub fn error_for(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "ok");
        }
        let messages: Vec<_> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Check a request before submission
pub fn validate(request: &DeliveryRequest) -> ValidationReport {
    let mut report = ValidationReport::default();

    if request.items.is_empty() {
        report.errors.push(FieldError::new("items", "at least one medicine is required"));
    }

    let recipient = &request.delivery;
    let required = [
        ("name", recipient.name.as_str(), "name is required"),
        ("phone", recipient.phone.as_str(), "phone number is required"),
        ("address", recipient.address.as_str(), "delivery address is required"),
        ("pincode", recipient.pincode.as_str(), "pincode is required"),
    ];
    for (field, value, message) in required {
        if value.trim().is_empty() {
            report.errors.push(FieldError::new(field, message));
        }
    }

    if recipient.coordinates().is_none() {
        report.warnings.push(ValidationWarning::MissingCoordinates);
    }

    report
}
