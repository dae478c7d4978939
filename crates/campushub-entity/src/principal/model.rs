//! Principal entity model.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use campushub_core::types::id::{CourseId, PrincipalId};

use super::role::Role;

/// An authenticated identity in the portal.
///
/// Supplied by the identity verifier once per connection and treated as a
/// snapshot for that connection's lifetime. Membership-sensitive actions
/// re-query the directory store instead of trusting this copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Unique principal identifier.
    pub id: PrincipalId,
    /// Human-readable display name.
    pub display_name: String,
    /// Role at snapshot time.
    pub role: Role,
    /// Department the principal belongs to.
    pub department: String,
    /// Courses the principal is enrolled in or teaches.
    pub courses: HashSet<CourseId>,
    /// Whether the account is active. Inactive principals cannot connect.
    pub active: bool,
}

impl Principal {
    /// Check if this principal has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Check membership (enrollment or teaching) of a course.
    pub fn member_of_course(&self, course: CourseId) -> bool {
        self.courses.contains(&course)
    }

    /// Check membership of a department.
    pub fn member_of_department(&self, department: &str) -> bool {
        self.department == department
    }
}
