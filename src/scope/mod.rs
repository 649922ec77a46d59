//! Access scoping for member data.
//!
//! Every member read and write goes through a [`ScopeFilter`] resolved from
//! the acting user. Admins are unrestricted, Leaders see their own camp,
//! Shepherds see exactly the members assigned to them. A Leader without a
//! camp and a Shepherd without assignments see nothing; absence of an
//! assignment never widens visibility.

use std::collections::HashSet;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{ActingUser, Member, UserRole};

/// The subset of members an acting user may read or write.
#[derive(Debug, Clone)]
pub enum ScopeFilter {
    Unrestricted,
    Camp(String),
    MemberIds(HashSet<String>),
}

impl ScopeFilter {
    /// Whether a member identified by id and camp falls inside this scope.
    pub fn allows_ids(&self, member_id: &str, camp_id: Option<&str>) -> bool {
        match self {
            ScopeFilter::Unrestricted => true,
            ScopeFilter::Camp(camp) => camp_id == Some(camp.as_str()),
            ScopeFilter::MemberIds(ids) => ids.contains(member_id),
        }
    }

    /// Whether a member record falls inside this scope.
    pub fn allows(&self, member: &Member) -> bool {
        self.allows_ids(&member.id, member.camp_id.as_deref())
    }
}

/// Resolve the acting user's scope filter.
pub async fn resolve_scope(
    repo: &Repository,
    acting: &ActingUser,
) -> Result<ScopeFilter, AppError> {
    match acting.role {
        UserRole::Admin => Ok(ScopeFilter::Unrestricted),
        UserRole::Leader => match &acting.camp_id {
            Some(camp_id) => Ok(ScopeFilter::Camp(camp_id.clone())),
            // A leader without a camp assignment sees nothing
            None => Ok(ScopeFilter::MemberIds(HashSet::new())),
        },
        UserRole::Shepherd => {
            let ids = repo.list_assigned_member_ids(&acting.user_id).await?;
            Ok(ScopeFilter::MemberIds(ids))
        }
    }
}

/// Whether the acting user may edit this member. Computed from the resolved
/// scope so the answer is identical wherever member data is returned.
pub fn can_edit(scope: &ScopeFilter, member: &Member) -> bool {
    scope.allows(member)
}
