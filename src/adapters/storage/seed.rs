//! Seed snapshots for the in-memory store.
//!
//! A snapshot is a JSON or YAML document with one list of rows per table:
//!
//! ```yaml
//! students:
//!   - { id: S1, firstName: Ada, lastName: Lovelace, grade: 4, parent1Id: P1 }
//! instructors:
//!   - { id: I1, firstName: Clara, lastName: Schumann, instruments: [Piano] }
//! ```
//!
//! Cells may be strings, numbers, booleans, or lists; everything is stored
//! as text, exactly like a sheet export.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::InMemoryStore;
use crate::domain::foundation::{DomainError, EntityKind, StorageRow, StoredEntity};
use crate::domain::people::{Admin, Instructor, LessonClass, Parent, Room, Student};
use crate::domain::registration::Registration;
use crate::ports::EntityStores;

/// Errors loading a seed snapshot.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON seed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML seed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported seed format '{0}' (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error("Invalid seed table: {0}")]
    Table(String),
}

impl From<DomainError> for SeedError {
    fn from(err: DomainError) -> Self {
        SeedError::Table(err.message)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Cell {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
    List(Vec<Cell>),
}

impl Cell {
    fn into_text(self) -> String {
        match self {
            Cell::Text(s) => s,
            Cell::Integer(n) => n.to_string(),
            Cell::Float(n) => n.to_string(),
            Cell::Flag(b) => b.to_string(),
            Cell::List(items) => items
                .into_iter()
                .map(Cell::into_text)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

type SeedTable = Vec<BTreeMap<String, Option<Cell>>>;

/// Rows for every table, as loaded from a snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
    students: SeedTable,
    parents: SeedTable,
    instructors: SeedTable,
    admins: SeedTable,
    classes: SeedTable,
    rooms: SeedTable,
    registrations: SeedTable,
}

impl SeedData {
    /// Load a snapshot, choosing the parser from the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let seed = match extension.as_str() {
            "json" => Self::from_json(&raw)?,
            "yaml" | "yml" => Self::from_yaml(&raw)?,
            other => return Err(SeedError::UnsupportedFormat(other.to_string())),
        };
        info!(path = %path.display(), rows = seed.row_count(), "Loaded seed snapshot");
        Ok(seed)
    }

    pub fn from_json(raw: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Raw rows of one table.
    pub fn rows(&self, kind: EntityKind) -> Vec<StorageRow> {
        let table = match kind {
            EntityKind::Student => &self.students,
            EntityKind::Parent => &self.parents,
            EntityKind::Instructor => &self.instructors,
            EntityKind::Admin => &self.admins,
            EntityKind::Class => &self.classes,
            EntityKind::Room => &self.rooms,
            EntityKind::Registration => &self.registrations,
        };
        table
            .iter()
            .map(|cells| {
                cells
                    .iter()
                    .filter_map(|(column, cell)| {
                        cell.clone().map(|c| (column.clone(), c.into_text()))
                    })
                    .collect()
            })
            .collect()
    }

    pub fn row_count(&self) -> usize {
        EntityKind::ALL.iter().map(|k| self.rows(*k).len()).sum()
    }

    /// Build one in-memory store per table.
    pub fn into_stores(self) -> Result<EntityStores, SeedError> {
        Ok(EntityStores {
            students: Arc::new(self.store::<Student>()?),
            parents: Arc::new(self.store::<Parent>()?),
            instructors: Arc::new(self.store::<Instructor>()?),
            admins: Arc::new(self.store::<Admin>()?),
            classes: Arc::new(self.store::<LessonClass>()?),
            rooms: Arc::new(self.store::<Room>()?),
            registrations: Arc::new(self.store::<Registration>()?),
        })
    }

    fn store<T: StoredEntity>(&self) -> Result<InMemoryStore<T>, SeedError> {
        Ok(InMemoryStore::from_rows(self.rows(T::KIND))?)
    }
}

/// Empty in-memory stores for every table.
pub fn in_memory_stores() -> EntityStores {
    EntityStores {
        students: Arc::new(InMemoryStore::<Student>::new()),
        parents: Arc::new(InMemoryStore::<Parent>::new()),
        instructors: Arc::new(InMemoryStore::<Instructor>::new()),
        admins: Arc::new(InMemoryStore::<Admin>::new()),
        classes: Arc::new(InMemoryStore::<LessonClass>::new()),
        rooms: Arc::new(InMemoryStore::<Room>::new()),
        registrations: Arc::new(InMemoryStore::<Registration>::new()),
    }
}
