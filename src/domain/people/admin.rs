//! Administrator account.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AdminId, EntityKind, StorageRow, StoredEntity, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: AdminId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
}

impl Admin {
    pub fn new(id: AdminId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            first_name: String::new(),
            last_name: String::new(),
            is_active: true,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

impl StoredEntity for Admin {
    type Key = AdminId;
    const KIND: EntityKind = EntityKind::Admin;

    fn key(&self) -> AdminId {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn from_storage_row(row: &StorageRow) -> Result<Self, ValidationError> {
        Ok(Self {
            id: AdminId::new(row.required("id")?)?,
            email: row.required("email")?.to_string(),
            first_name: row.optional("firstName").unwrap_or_default().to_string(),
            last_name: row.optional("lastName").unwrap_or_default().to_string(),
            is_active: row.flag("isActive", true)?,
        })
    }

    fn to_storage_row(&self) -> StorageRow {
        StorageRow::new()
            .with("id", self.id.as_str())
            .with("email", &self.email)
            .with("firstName", &self.first_name)
            .with("lastName", &self.last_name)
            .with("isActive", self.is_active.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_requires_email() {
        let row = StorageRow::new().with("id", "A1");
        assert!(Admin::from_storage_row(&row).is_err());
    }
}
