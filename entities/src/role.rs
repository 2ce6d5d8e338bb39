use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of roles a user can hold.
///
/// Stored values outside the three known spellings decode into
/// [`Role::Unrecognized`] instead of failing, so the authorization engine can
/// deny them explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    SuperAdmin,
    Admin,
    Teacher,
    Unrecognized(String),
}

impl Role {
    pub const SUPER_ADMIN: &'static str = "SuperAdmin";
    pub const ADMIN: &'static str = "Admin";
    pub const TEACHER: &'static str = "Teacher";

    /// The canonical storage spelling of this role.
    pub fn as_str(&self) -> &str {
        match self {
            Role::SuperAdmin => Self::SUPER_ADMIN,
            Role::Admin => Self::ADMIN,
            Role::Teacher => Self::TEACHER,
            Role::Unrecognized(raw) => raw.as_str(),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        // Exact match only; "admin" or " Admin" are not Admin.
        match value {
            Self::SUPER_ADMIN => Role::SuperAdmin,
            Self::ADMIN => Role::Admin,
            Self::TEACHER => Role::Teacher,
            other => Role::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
