//! The access guard — one pure authorization predicate for every
//! join/signal decision.
//!
//! All role checks live here, not in handlers. The guard holds no state
//! and performs no I/O; callers supply a principal snapshot (fresh from
//! the store for membership-sensitive actions).

use campushub_core::types::id::PrincipalId;
use campushub_core::{AppError, AppResult};
use campushub_entity::Principal;

use crate::channel::types::ChannelId;

/// What the principal is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessAction {
    /// Subscribe to a channel.
    Join,
    /// Originate a signal into a scope.
    Publish,
}

/// What the action is aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessTarget<'a> {
    /// A broadcast channel.
    Channel(&'a ChannelId),
    /// A single principal (direct signal).
    Principal(PrincipalId),
}

/// Decides whether `principal` may perform `action` on `target`.
///
/// - Course channel: member (enrolled or teaching) or admin.
/// - Department channel: same department or admin.
/// - Personal channel / direct signal: the owning principal only; admin
///   does NOT bypass identity-targeted checks.
/// - Global channel: anyone may join; only admins may publish.
pub fn authorize(principal: &Principal, action: AccessAction, target: &AccessTarget<'_>) -> bool {
    match target {
        AccessTarget::Principal(target_id) => *target_id == principal.id,
        AccessTarget::Channel(channel) => match channel {
            ChannelId::Personal(owner) => *owner == principal.id,
            ChannelId::Course(course) => {
                principal.is_admin() || principal.member_of_course(*course)
            }
            ChannelId::Department(name) => {
                principal.is_admin() || principal.member_of_department(name)
            }
            ChannelId::Global => match action {
                AccessAction::Join => true,
                AccessAction::Publish => principal.is_admin(),
            },
        },
    }
}

/// [`authorize`], as a `Result` carrying a forbidden error on denial.
pub fn ensure(
    principal: &Principal,
    action: AccessAction,
    target: &AccessTarget<'_>,
) -> AppResult<()> {
    if authorize(principal, action, target) {
        Ok(())
    } else {
        let described = match target {
            AccessTarget::Channel(channel) => format!("channel {channel}"),
            AccessTarget::Principal(id) => format!("principal {id}"),
        };
        Err(AppError::forbidden(format!(
            "Principal {} may not act on {described}",
            principal.id
        )))
    }
}
