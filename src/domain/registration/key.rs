//! Storage identity of a registration.
//!
//! A derived [`RegistrationId`] is only unique inside its partition: the
//! same student keeps the same private slot, or the same class seat, term
//! after term. Rows and ledger entries are therefore keyed by both.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::values::Partition;
use crate::domain::foundation::{RegistrationId, StorageRow, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationKey {
    #[serde(flatten)]
    pub partition: Partition,
    #[serde(rename = "registrationId")]
    pub id: RegistrationId,
}

impl RegistrationKey {
    pub fn new(partition: Partition, id: RegistrationId) -> Self {
        Self { partition, id }
    }

    /// Reads the key columns of a registration row.
    pub fn from_row(row: &StorageRow) -> Result<Self, ValidationError> {
        Ok(Self::new(
            Partition::new(row.parse("schoolYear")?, row.parse("trimester")?),
            RegistrationId::new(row.required("id")?)?,
        ))
    }
}

impl fmt::Display for RegistrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.partition.school_year, self.partition.trimester, self.id
        )
    }
}
