//! Role and branch scoping engine for the LMS administration backend.
//!
//! Authorization here is a fixed three-tier hierarchy rather than per-record
//! ACLs:
//!
//! - **SuperAdmin** works globally. It creates admins for a branch it names
//!   and lists everything without a filter.
//! - **Admin** works inside its own branch. Teachers, groups and students it
//!   creates are stamped with that branch, and its lists are filtered to it.
//! - **Teacher** only reads its own groups and the students in them.
//!
//! Each role maps to exactly one scope rule per action, so a decision is a
//! constant-time `match` with no I/O. Anything not listed is denied,
//! including roles the engine does not recognise.
//!
//! # Example
//!
//! ```rust
//! use authz::{AuthzEngine, types::{AccessRequest, EntityKind, ScopeDecision}};
//! use entities::{CallerIdentity, Role};
//!
//! let engine = AuthzEngine::new();
//! let admin = CallerIdentity::new(2, Role::Admin, Some(5));
//!
//! // The admin's branch wins over whatever the request body said.
//! let decision = engine
//!     .decide(&admin, &AccessRequest::create(EntityKind::Group, Some(7)))
//!     .unwrap();
//! assert_eq!(decision, ScopeDecision::Stamp { branch_id: 5 });
//! ```

pub mod error;
pub mod types;

use entities::{BranchId, CallerIdentity, Role};
use error::{AuthzError, Result};
use tracing::{debug, warn};
use types::{AccessRequest, Action, EntityKind, ReadFilter, ScopeDecision};

/// The scoping engine.
///
/// Stateless and `Copy`: hand it to every request handler and call it from
/// as many tasks as you like.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthzEngine;

impl AuthzEngine {
    pub fn new() -> Self {
        Self
    }

    /// Decide whether `caller` may perform `request`, and with what scope.
    ///
    /// # Returns
    ///
    /// - `Ok(ScopeDecision::Stamp { .. })` for an allowed create
    /// - `Ok(ScopeDecision::Filter(..))` for an allowed read
    /// - `Err(AuthzError::Forbidden { .. })` naming the role that would be allowed
    /// - `Err(AuthzError::NotPermitted { .. })` when no role is allowed
    /// - `Err(AuthzError::MissingBranch { .. })` when a SuperAdmin creates an
    ///   admin without naming a branch
    pub fn decide(
        &self,
        caller: &CallerIdentity,
        request: &AccessRequest,
    ) -> Result<ScopeDecision> {
        let allowed = match &caller.role {
            Role::SuperAdmin => super_admin_scope(request)?,
            Role::Admin => admin_scope(caller.branch_id, request),
            Role::Teacher => teacher_scope(caller, request),
            Role::Unrecognized(_) => None,
        };

        match allowed {
            Some(decision) => {
                debug!(
                    caller = caller.id,
                    role = %caller.role,
                    action = %request.action,
                    kind = %request.kind,
                    "Access allowed: {:?}",
                    decision
                );
                Ok(decision)
            }
            None => {
                warn!(
                    caller = caller.id,
                    role = %caller.role,
                    action = %request.action,
                    kind = %request.kind,
                    "Access denied"
                );
                Err(denial(request.action, request.kind))
            }
        }
    }

    /// Authorize a create and return the branch to stamp onto the new record.
    pub fn authorize_create(
        &self,
        caller: &CallerIdentity,
        kind: EntityKind,
        supplied_branch_id: Option<BranchId>,
    ) -> Result<BranchId> {
        match self.decide(caller, &AccessRequest::create(kind, supplied_branch_id))? {
            ScopeDecision::Stamp { branch_id } => Ok(branch_id),
            other => Err(AuthzError::Internal(format!(
                "expected a stamp for create {}, got {:?}",
                kind, other
            ))),
        }
    }

    /// Authorize a read (`List` or `ListOwn`) and return its filter.
    pub fn authorize_read(
        &self,
        caller: &CallerIdentity,
        action: Action,
        kind: EntityKind,
    ) -> Result<ReadFilter> {
        let request = match action {
            Action::List => AccessRequest::list(kind),
            Action::ListOwn => AccessRequest::list_own(kind),
            Action::Create => {
                return Err(AuthzError::Internal(format!(
                    "create {} is not a read",
                    kind
                )))
            }
        };

        match self.decide(caller, &request)? {
            ScopeDecision::Filter(filter) => Ok(filter),
            other => Err(AuthzError::Internal(format!(
                "expected a filter for {} {}, got {:?}",
                action, kind, other
            ))),
        }
    }
}

fn super_admin_scope(request: &AccessRequest) -> Result<Option<ScopeDecision>> {
    let decision = match (request.action, request.kind) {
        // The only place a caller chooses the branch.
        (Action::Create, EntityKind::Admin) => {
            let branch_id = request.supplied_branch_id.ok_or(AuthzError::MissingBranch {
                action: request.action,
                kind: request.kind,
            })?;
            Some(ScopeDecision::Stamp { branch_id })
        }
        (
            Action::List,
            EntityKind::Branch | EntityKind::Teacher | EntityKind::Group | EntityKind::Student,
        ) => Some(ScopeDecision::Filter(ReadFilter::Unrestricted)),
        _ => None,
    };
    Ok(decision)
}

fn admin_scope(branch_id: Option<BranchId>, request: &AccessRequest) -> Option<ScopeDecision> {
    // An admin without a branch has nothing to stamp or filter by.
    let branch_id = branch_id?;

    match (request.action, request.kind) {
        (Action::Create, EntityKind::Teacher | EntityKind::Group | EntityKind::Student) => {
            Some(ScopeDecision::Stamp { branch_id })
        }
        (Action::List, EntityKind::Teacher | EntityKind::Group | EntityKind::Student) => {
            Some(ScopeDecision::Filter(ReadFilter::Branch(branch_id)))
        }
        _ => None,
    }
}

fn teacher_scope(caller: &CallerIdentity, request: &AccessRequest) -> Option<ScopeDecision> {
    match (request.action, request.kind) {
        // No branch filter: a teacher's groups are theirs wherever they live.
        (Action::ListOwn, EntityKind::Group | EntityKind::Student) => {
            Some(ScopeDecision::Filter(ReadFilter::Teacher(caller.id)))
        }
        _ => None,
    }
}

/// The role a denied caller would have needed, for the error message.
pub fn required_role(action: Action, kind: EntityKind) -> Option<&'static str> {
    match (action, kind) {
        (Action::Create, EntityKind::Admin) => Some(Role::SUPER_ADMIN),
        (Action::Create, EntityKind::Teacher | EntityKind::Group | EntityKind::Student) => {
            Some(Role::ADMIN)
        }
        (Action::List, EntityKind::Branch) => Some(Role::SUPER_ADMIN),
        (Action::List, EntityKind::Teacher | EntityKind::Group | EntityKind::Student) => {
            Some("SuperAdmin or Admin")
        }
        (Action::ListOwn, EntityKind::Group | EntityKind::Student) => Some(Role::TEACHER),
        _ => None,
    }
}

fn denial(action: Action, kind: EntityKind) -> AuthzError {
    match required_role(action, kind) {
        Some(required) => AuthzError::Forbidden {
            required,
            action,
            kind,
        },
        None => AuthzError::NotPermitted { action, kind },
    }
}
