//! Error types for the authorization engine.
//!
//! A denial is always an error value, never an empty result, so a caller can
//! tell "you may not look" apart from "there is nothing to see".

use thiserror::Error;

use crate::types::{Action, EntityKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthzError {
    /// The caller's role does not grant this action on this kind.
    #[error("Only {required} may {action} {kind}")]
    Forbidden {
        required: &'static str,
        action: Action,
        kind: EntityKind,
    },

    /// No role is granted this action on this kind.
    #[error("No role may {action} {kind}")]
    NotPermitted { action: Action, kind: EntityKind },

    /// The request must name the branch to assign but did not.
    #[error("A branch_id is required to {action} {kind}")]
    MissingBranch { action: Action, kind: EntityKind },

    /// The decision did not have the shape the caller asked for.
    #[error("Internal authorization error: {0}")]
    Internal(String),
}

impl AuthzError {
    /// True for the two denial variants.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            AuthzError::Forbidden { .. } | AuthzError::NotPermitted { .. }
        )
    }
}

/// A specialized Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthzError>;
