use serde::Serialize;
use sqlx::FromRow;

use crate::{BranchId, GroupId, Role, StudentId, UserId};

/// A persisted user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub branch_id: Option<BranchId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
}

/// A teaching group. `branch_id` is stamped from the creating admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub teacher_id: UserId,
    pub branch_id: BranchId,
}

/// A student enrolled in one group. `branch_id` is stamped from the creating admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub group_id: GroupId,
    pub branch_id: BranchId,
}

/// Column values for a user insert; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub branch_id: Option<BranchId>,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub teacher_id: UserId,
    pub branch_id: BranchId,
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub group_id: GroupId,
    pub branch_id: BranchId,
}
