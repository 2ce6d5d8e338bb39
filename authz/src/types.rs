//! Request and decision types for the scoping engine.
//!
//! A request names what the caller wants to do ([`Action`]) to which kind of
//! record ([`EntityKind`]). An allowed request yields a [`ScopeDecision`]:
//! either the branch to stamp onto a new record, or the filter that bounds a
//! read.

use entities::{BranchId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the caller intends to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Insert a new record.
    Create,
    /// List every record the caller's role can see (all, or own branch).
    List,
    /// List the records the caller personally owns.
    ListOwn,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::List => write!(f, "list"),
            Action::ListOwn => write!(f, "list own"),
        }
    }
}

/// The kind of record an action targets.
///
/// `Admin` and `Teacher` are both users; they are separate kinds because the
/// rules for creating them differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Admin,
    Teacher,
    Branch,
    Group,
    Student,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Admin => write!(f, "admins"),
            EntityKind::Teacher => write!(f, "teachers"),
            EntityKind::Branch => write!(f, "branches"),
            EntityKind::Group => write!(f, "groups"),
            EntityKind::Student => write!(f, "students"),
        }
    }
}

/// One authorization question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    pub action: Action,
    pub kind: EntityKind,
    /// Branch named in the request body, if any. Only honoured where the
    /// rules say the caller chooses the branch.
    pub supplied_branch_id: Option<BranchId>,
}

impl AccessRequest {
    pub fn create(kind: EntityKind, supplied_branch_id: Option<BranchId>) -> Self {
        Self {
            action: Action::Create,
            kind,
            supplied_branch_id,
        }
    }

    pub fn list(kind: EntityKind) -> Self {
        Self {
            action: Action::List,
            kind,
            supplied_branch_id: None,
        }
    }

    pub fn list_own(kind: EntityKind) -> Self {
        Self {
            action: Action::ListOwn,
            kind,
            supplied_branch_id: None,
        }
    }
}

/// Bounds on the rows a read may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadFilter {
    /// Every row.
    Unrestricted,
    /// Rows whose `branch_id` equals the given branch.
    Branch(BranchId),
    /// Rows owned by the given teacher: their groups, or students in those groups.
    Teacher(UserId),
}

/// The outcome of an allowed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeDecision {
    /// Write the record with this `branch_id`, whatever the request said.
    Stamp { branch_id: BranchId },
    /// Read only rows matching this filter.
    Filter(ReadFilter),
}
