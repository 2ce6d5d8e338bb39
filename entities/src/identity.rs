use serde::{Deserialize, Serialize};

use crate::{BranchId, Role, User, UserId};

/// The authenticated caller of a request.
///
/// Built by the authenticator from a verified bearer token and never taken
/// from request input. Immutable for the lifetime of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub id: UserId,
    pub role: Role,
    pub branch_id: Option<BranchId>,
}

impl CallerIdentity {
    pub fn new(id: UserId, role: Role, branch_id: Option<BranchId>) -> Self {
        Self {
            id,
            role,
            branch_id,
        }
    }
}

impl From<&User> for CallerIdentity {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role.clone(), user.branch_id)
    }
}
