//! Registration lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle status of a registration.
///
/// `Pending` and `Approved` registrations occupy their slot; `Cancelled`
/// and `Completed` are terminal and free it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Cancelled,
    Completed,
}

impl RegistrationStatus {
    pub const ALL: [RegistrationStatus; 4] = [
        RegistrationStatus::Pending,
        RegistrationStatus::Approved,
        RegistrationStatus::Cancelled,
        RegistrationStatus::Completed,
    ];

    /// Whether a registration in this status holds its slot.
    pub fn is_active(&self) -> bool {
        matches!(self, RegistrationStatus::Pending | RegistrationStatus::Approved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::Completed => "completed",
        }
    }
}

impl StateMachine for RegistrationStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        use RegistrationStatus::*;
        match self {
            Pending => vec![Approved, Cancelled],
            Approved => vec![Cancelled, Completed],
            Cancelled | Completed => vec![],
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        // Legacy rows wrote "active" for approved registrations.
        if lowered == "active" {
            return Ok(RegistrationStatus::Approved);
        }
        RegistrationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == lowered)
            .ok_or_else(|| {
                ValidationError::invalid_format("status", format!("'{}' is not a status", s))
            })
    }
}
