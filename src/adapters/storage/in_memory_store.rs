//! In-Memory Entity Store Adapter
//!
//! Keeps one table of `StorageRow`s in memory, keyed by the entity's key. Entities are
//! converted through their row factories on every read and write, the
//! same way a spreadsheet-backed adapter would.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::foundation::{DomainError, StorageRow, StoredEntity};
use crate::ports::EntityStore;

/// In-memory table for one entity kind.
pub struct InMemoryStore<T> {
    rows: Arc<RwLock<BTreeMap<String, StorageRow>>>,
    failure: Arc<RwLock<Option<String>>>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for InMemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            failure: Arc::clone(&self.failure),
            _entity: PhantomData,
        }
    }
}

impl<T: StoredEntity> InMemoryStore<T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(BTreeMap::new())),
            failure: Arc::new(RwLock::new(None)),
            _entity: PhantomData,
        }
    }

    /// Create a table holding the given entities.
    pub fn with_entities(entities: impl IntoIterator<Item = T>) -> Self {
        let rows = entities
            .into_iter()
            .map(|e| (e.key().to_string(), e.to_storage_row()))
            .collect();
        Self {
            rows: Arc::new(RwLock::new(rows)),
            failure: Arc::new(RwLock::new(None)),
            _entity: PhantomData,
        }
    }

    /// Create a table from raw rows. Rows are keyed by their key cells and
    /// are not parsed until read.
    pub fn from_rows(rows: impl IntoIterator<Item = StorageRow>) -> Result<Self, DomainError> {
        let mut table = BTreeMap::new();
        for (index, row) in rows.into_iter().enumerate() {
            let key = T::row_key(&row).map_err(|e| {
                DomainError::storage(format!(
                    "{} row {} has no usable key: {}",
                    T::KIND.table_name(),
                    index + 1,
                    e
                ))
            })?;
            table.insert(key, row);
        }
        Ok(Self {
            rows: Arc::new(RwLock::new(table)),
            failure: Arc::new(RwLock::new(None)),
            _entity: PhantomData,
        })
    }

    /// Write a raw row, bypassing entity conversion (useful for tests).
    pub async fn put_row(&self, key: impl Into<String>, row: StorageRow) {
        self.rows.write().await.insert(key.into(), row);
    }

    /// Make every subsequent call fail with a storage error until cleared.
    pub async fn fail_with(&self, message: Option<&str>) {
        *self.failure.write().await = message.map(str::to_string);
    }

    /// Number of stored rows, without failure injection.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    async fn check_failure(&self) -> Result<(), DomainError> {
        match self.failure.read().await.as_ref() {
            Some(message) => Err(DomainError::storage(message.clone())),
            None => Ok(()),
        }
    }

    fn parse(id: &str, row: &StorageRow) -> Result<T, DomainError> {
        T::from_storage_row(row).map_err(|e| {
            DomainError::storage(format!(
                "malformed {} row {}: {}",
                T::KIND.table_name(),
                id,
                e
            ))
            .with_detail("id", id)
        })
    }
}

impl<T: StoredEntity> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: StoredEntity> EntityStore<T> for InMemoryStore<T> {
    async fn find_all(&self) -> Result<Vec<T>, DomainError> {
        self.check_failure().await?;
        let rows = self.rows.read().await;
        let mut entities = Vec::with_capacity(rows.len());
        for (id, row) in rows.iter() {
            match Self::parse(id, row) {
                Ok(entity) => entities.push(entity),
                Err(err) => warn!(table = T::KIND.table_name(), row_id = %id, error = %err, "Skipping malformed row"),
            }
        }
        Ok(entities)
    }

    async fn find_by_id(&self, key: &T::Key) -> Result<Option<T>, DomainError> {
        self.check_failure().await?;
        let key = key.to_string();
        let rows = self.rows.read().await;
        rows.get(&key).map(|row| Self::parse(&key, row)).transpose()
    }

    async fn insert(&self, entity: &T) -> Result<(), DomainError> {
        self.check_failure().await?;
        let key = entity.key().to_string();
        let mut rows = self.rows.write().await;
        if rows.contains_key(&key) {
            return Err(DomainError::storage(format!(
                "{} row {} already exists",
                T::KIND.table_name(),
                key
            ))
            .with_detail("id", key));
        }
        rows.insert(key, entity.to_storage_row());
        Ok(())
    }

    async fn update(&self, entity: &T) -> Result<(), DomainError> {
        self.check_failure().await?;
        let key = entity.key().to_string();
        let mut rows = self.rows.write().await;
        match rows.get_mut(&key) {
            Some(row) => {
                *row = entity.to_storage_row();
                Ok(())
            }
            None => Err(DomainError::new(
                T::KIND.not_found_code(),
                format!("{} not found", T::KIND),
            )
            .with_detail("id", key)),
        }
    }

    async fn delete(&self, key: &T::Key) -> Result<bool, DomainError> {
        self.check_failure().await?;
        Ok(self.rows.write().await.remove(&key.to_string()).is_some())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        self.check_failure().await?;
        Ok(self.rows.read().await.len())
    }
}
