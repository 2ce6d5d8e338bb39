//! Domain records shared by every crate in the workspace.
//!
//! Nothing in here performs I/O. The `database` crate decodes rows into these
//! types, the `authz` crate reasons about [`CallerIdentity`] and [`Role`], and
//! the `api` crate shapes them into responses.

pub mod identity;
pub mod records;
pub mod role;

pub use identity::CallerIdentity;
pub use records::{Branch, Group, NewGroup, NewStudent, NewUser, Student, User};
pub use role::Role;

/// Identifier of a [`User`] row.
pub type UserId = i64;
/// Identifier of a [`Branch`] row.
pub type BranchId = i64;
/// Identifier of a [`Group`] row.
pub type GroupId = i64;
/// Identifier of a [`Student`] row.
pub type StudentId = i64;
