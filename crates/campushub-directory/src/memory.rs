//! In-memory directory store for tests and development.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use campushub_core::types::id::{CourseId, PrincipalId};
use campushub_core::{AppError, AppResult};
use campushub_entity::Principal;

use super::store::{DirectoryStore, MembershipSnapshot};

/// A course record as the portal store would hold it.
#[derive(Debug, Clone)]
pub struct CourseRecord {
    /// Course identifier.
    pub id: CourseId,
    /// Display label, e.g. "PHYS 201 — Classical Mechanics".
    pub label: String,
}

/// Seedable in-memory [`DirectoryStore`].
///
/// Mutating a seeded principal between calls models enrollment changes in
/// the external store; `set_unavailable(true)` models a store outage.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    principals: DashMap<PrincipalId, Principal>,
    courses: DashMap<CourseId, CourseRecord>,
    unavailable: AtomicBool,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a principal record.
    pub fn upsert_principal(&self, principal: Principal) {
        self.principals.insert(principal.id, principal);
    }

    /// Insert or replace a course record.
    pub fn upsert_course(&self, course: CourseRecord) {
        self.courses.insert(course.id, course);
    }

    /// Remove a course, simulating deletion in the portal store.
    pub fn remove_course(&self, id: CourseId) {
        self.courses.remove(&id);
    }

    /// Add a course membership to an existing principal.
    pub fn enroll(&self, principal: PrincipalId, course: CourseId) {
        if let Some(mut record) = self.principals.get_mut(&principal) {
            record.courses.insert(course);
        }
    }

    /// Drop a course membership from an existing principal.
    pub fn withdraw(&self, principal: PrincipalId, course: CourseId) {
        if let Some(mut record) = self.principals.get_mut(&principal) {
            record.courses.remove(&course);
        }
    }

    /// Toggle simulated store outage. While unavailable, every query
    /// returns `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::store_unavailable("directory store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectory {
    async fn fetch_principal(&self, id: PrincipalId) -> AppResult<Principal> {
        self.check_available()?;
        self.principals
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Principal not found: {id}")))
    }

    async fn membership_snapshot(&self, id: PrincipalId) -> AppResult<MembershipSnapshot> {
        self.check_available()?;
        let principal = self
            .principals
            .get(&id)
            .ok_or_else(|| AppError::not_found(format!("Principal not found: {id}")))?;

        // Memberships may reference courses the store has since deleted.
        let courses: HashSet<CourseId> = principal
            .courses
            .iter()
            .filter(|c| self.courses.contains_key(c))
            .copied()
            .collect();

        Ok(MembershipSnapshot {
            department: principal.department.clone(),
            courses,
        })
    }

    async fn course_exists(&self, id: CourseId) -> AppResult<bool> {
        self.check_available()?;
        Ok(self.courses.contains_key(&id))
    }

    async fn course_label(&self, id: CourseId) -> AppResult<Option<String>> {
        self.check_available()?;
        Ok(self.courses.get(&id).map(|c| c.label.clone()))
    }

    async fn all_course_ids(&self) -> AppResult<Vec<CourseId>> {
        self.check_available()?;
        Ok(self.courses.iter().map(|entry| *entry.key()).collect())
    }
}
