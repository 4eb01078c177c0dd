//! Raw registration payload as submitted by a caller.

use serde::{Deserialize, Serialize};

/// A proposed registration before validation.
///
/// Every field is optional and untyped so that the validation service can
/// report every problem with the payload in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationRequest {
    pub student_id: Option<String>,
    pub registration_type: Option<String>,
    pub class_id: Option<String>,
    pub instructor_id: Option<String>,
    pub instrument: Option<String>,
    pub day: Option<String>,
    pub start_time: Option<String>,
    pub length: Option<u32>,
    pub transportation_type: Option<String>,
    pub room_id: Option<String>,
    pub notes: Option<String>,
    pub school_year: Option<String>,
    pub trimester: Option<String>,
}

impl RegistrationRequest {
    /// Parses a JSON API payload.
    pub fn from_api_payload(payload: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(payload.clone())
    }
}

/// Returns the trimmed value when present and non-blank.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
