//! Teaching room.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EntityKind, RoomId, StorageRow, StoredEntity, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub capacity: Option<u32>,
    pub is_active: bool,
}

impl Room {
    pub fn new(id: RoomId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            capacity: None,
            is_active: true,
        }
    }
}

impl StoredEntity for Room {
    type Key = RoomId;
    const KIND: EntityKind = EntityKind::Room;

    fn key(&self) -> RoomId {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn from_storage_row(row: &StorageRow) -> Result<Self, ValidationError> {
        Ok(Self {
            id: RoomId::new(row.required("id")?)?,
            name: row.optional("name").unwrap_or_default().to_string(),
            capacity: row.parse_opt("capacity")?,
            is_active: row.flag("isActive", true)?,
        })
    }

    fn to_storage_row(&self) -> StorageRow {
        let mut row = StorageRow::new()
            .with("id", self.id.as_str())
            .with("name", &self.name)
            .with("isActive", self.is_active.to_string());
        row.set_opt("capacity", self.capacity.map(|c| c.to_string()));
        row
    }
}
