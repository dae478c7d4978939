//! The directory store trait — the realtime core's only view of the
//! external portal store.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use campushub_core::AppResult;
use campushub_core::types::id::{CourseId, PrincipalId};
use campushub_entity::Principal;

/// Fresh membership data for one principal.
///
/// Queried once at connect time for default channel resolution, and again
/// on every explicit join; the resolver never trusts a stale snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipSnapshot {
    /// Department the principal currently belongs to.
    pub department: String,
    /// Courses the principal is currently enrolled in or teaches.
    pub courses: HashSet<CourseId>,
}

/// Read-only queries against the external portal store.
///
/// Errors: a missing entity is `NotFound`; a store outage is
/// `StoreUnavailable` (retryable, see `AppError::is_retryable`).
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Fetch the full principal record.
    async fn fetch_principal(&self, id: PrincipalId) -> AppResult<Principal>;

    /// Fetch the principal's current department and course memberships.
    async fn membership_snapshot(&self, id: PrincipalId) -> AppResult<MembershipSnapshot>;

    /// Whether a course still exists.
    async fn course_exists(&self, id: CourseId) -> AppResult<bool>;

    /// Human-readable label of a course, `None` if the course is gone.
    async fn course_label(&self, id: CourseId) -> AppResult<Option<String>>;

    /// All existing course ids (admin connections subscribe to all of them).
    async fn all_course_ids(&self) -> AppResult<Vec<CourseId>>;
}
