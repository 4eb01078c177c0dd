//! EntityRepository - Cached CRUD over one entity table.
//!
//! Reads go through the repository's [`EntityCache`]; writes go straight to
//! the store and invalidate the cache.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::cache::EntityCache;
use crate::domain::foundation::{DomainError, InstructorId, ParentId, StoredEntity};
use crate::domain::people::{Admin, Grade, Instructor, LessonClass, Parent, Student};
use crate::domain::registration::Weekday;
use crate::ports::EntityStore;

/// Repository for a read-mostly entity kind.
pub struct EntityRepository<T: StoredEntity> {
    store: Arc<dyn EntityStore<T>>,
    cache: EntityCache<T>,
}

impl<T: StoredEntity> EntityRepository<T> {
    pub fn new(store: Arc<dyn EntityStore<T>>, cache_ttl: Duration) -> Self {
        Self {
            store,
            cache: EntityCache::new(cache_ttl),
        }
    }

    /// Every entity in the table, served from cache when fresh.
    pub async fn find_all(&self) -> Result<Arc<Vec<T>>, DomainError> {
        self.cache.get_or_load(|| self.store.find_all()).await
    }

    /// Reloads the table, bypassing the cache.
    pub async fn refresh(&self) -> Result<Arc<Vec<T>>, DomainError> {
        self.cache.invalidate().await;
        debug!(table = T::KIND.table_name(), "Refreshing cache");
        self.find_all().await
    }

    pub async fn clear_cache(&self) {
        self.cache.invalidate().await;
    }

    pub async fn cache_version(&self) -> u64 {
        self.cache.version().await
    }

    pub async fn find_by_id(&self, id: &T::Key) -> Result<Option<T>, DomainError> {
        if let Some(rows) = self.cache.peek().await {
            return Ok(rows.iter().find(|e| e.key() == *id).cloned());
        }
        self.store.find_by_id(id).await
    }

    /// Like [`find_by_id`](Self::find_by_id) but a missing entity is an error.
    ///
    /// # Errors
    ///
    /// - The kind's `*NotFound` code, with the id in `details["id"]`
    pub async fn get(&self, id: &T::Key) -> Result<T, DomainError> {
        self.find_by_id(id).await?.ok_or_else(|| {
            DomainError::new(T::KIND.not_found_code(), format!("{} not found", T::KIND))
                .with_detail("id", id.to_string())
        })
    }

    pub async fn find_where<P>(&self, predicate: P) -> Result<Vec<T>, DomainError>
    where
        P: Fn(&T) -> bool,
    {
        Ok(self
            .find_all()
            .await?
            .iter()
            .filter(|e| predicate(e))
            .cloned()
            .collect())
    }

    /// Row count straight from the store; used by health probes.
    pub async fn count(&self) -> Result<usize, DomainError> {
        self.store.count().await
    }

    pub async fn count_active(&self) -> Result<usize, DomainError> {
        Ok(self.find_all().await?.iter().filter(|e| e.is_active()).count())
    }

    pub async fn create(&self, entity: &T) -> Result<(), DomainError> {
        self.store.insert(entity).await?;
        self.cache.invalidate().await;
        Ok(())
    }

    pub async fn update(&self, entity: &T) -> Result<(), DomainError> {
        self.store.update(entity).await?;
        self.cache.invalidate().await;
        Ok(())
    }

    pub async fn delete(&self, id: &T::Key) -> Result<bool, DomainError> {
        let removed = self.store.delete(id).await?;
        self.cache.invalidate().await;
        Ok(removed)
    }
}

fn same_email(stored: Option<&str>, wanted: &str) -> bool {
    stored.is_some_and(|s| s.trim().eq_ignore_ascii_case(wanted.trim()))
}

impl EntityRepository<Admin> {
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, DomainError> {
        Ok(self
            .find_where(|a| same_email(Some(&a.email), email))
            .await?
            .into_iter()
            .next())
    }
}

impl EntityRepository<Instructor> {
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Instructor>, DomainError> {
        Ok(self
            .find_where(|i| same_email(i.email.as_deref(), email))
            .await?
            .into_iter()
            .next())
    }

    /// Active instructors covering `grade`, optionally filtered by
    /// instrument and weekday.
    pub async fn find_available(
        &self,
        grade: Grade,
        instrument: Option<&str>,
        day: Option<Weekday>,
    ) -> Result<Vec<Instructor>, DomainError> {
        self.find_where(|i| {
            i.is_active
                && i.covers_grade(grade)
                && instrument.map_or(true, |wanted| i.teaches(wanted))
                && day.map_or(true, |d| i.available_on(d))
        })
        .await
    }
}

impl EntityRepository<LessonClass> {
    pub async fn find_by_instructor(
        &self,
        instructor_id: &InstructorId,
    ) -> Result<Vec<LessonClass>, DomainError> {
        self.find_where(|c| &c.instructor_id == instructor_id).await
    }
}

impl EntityRepository<Student> {
    pub async fn find_by_parent(
        &self,
        parent_id: &ParentId,
    ) -> Result<Vec<Student>, DomainError> {
        self.find_where(|s| {
            s.parent1_id.as_ref() == Some(parent_id) || s.parent2_id.as_ref() == Some(parent_id)
        })
        .await
    }
}

impl EntityRepository<Parent> {
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Parent>, DomainError> {
        Ok(self
            .find_where(|p| same_email(p.email.as_deref(), email))
            .await?
            .into_iter()
            .next())
    }
}
