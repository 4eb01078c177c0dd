//! Parent or guardian contact record.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EntityKind, ParentId, StorageRow, StoredEntity, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parent {
    pub id: ParentId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Parent {
    pub fn new(id: ParentId, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            phone: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// True when the parent can be reached by email or phone.
    pub fn has_contact(&self) -> bool {
        self.email.is_some() || self.phone.is_some()
    }
}

impl StoredEntity for Parent {
    type Key = ParentId;
    const KIND: EntityKind = EntityKind::Parent;

    fn key(&self) -> ParentId {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        true
    }

    fn from_storage_row(row: &StorageRow) -> Result<Self, ValidationError> {
        Ok(Self {
            id: ParentId::new(row.required("id")?)?,
            first_name: row.optional("firstName").unwrap_or_default().to_string(),
            last_name: row.optional("lastName").unwrap_or_default().to_string(),
            email: row.optional("email").map(str::to_string),
            phone: row.optional("phone").map(str::to_string),
        })
    }

    fn to_storage_row(&self) -> StorageRow {
        let mut row = StorageRow::new()
            .with("id", self.id.as_str())
            .with("firstName", &self.first_name)
            .with("lastName", &self.last_name);
        row.set_opt("email", self.email.clone());
        row.set_opt("phone", self.phone.clone());
        row
    }
}
