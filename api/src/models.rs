use chrono::{DateTime, Utc};
use entities::{Branch, BranchId, Group, GroupId, Student, StudentId, User, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    extract::{require_text, Validate},
};

/// Request to create a branch admin
#[derive(Deserialize, ToSchema)]
pub struct CreateAdminRequest {
    pub username: String,
    pub password: String,
    /// Branch the new admin will manage
    pub branch_id: BranchId,
}

impl Validate for CreateAdminRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require_text("username", &self.username)?;
        require_text("password", &self.password)
    }
}

/// Request to create a teacher in the caller's branch
#[derive(Deserialize, ToSchema)]
pub struct CreateTeacherRequest {
    pub username: String,
    pub password: String,
    /// Accepted for compatibility and ignored; the caller's branch is used
    #[serde(default)]
    pub branch_id: Option<BranchId>,
}

impl Validate for CreateTeacherRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require_text("username", &self.username)?;
        require_text("password", &self.password)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    pub teacher_id: UserId,
}

impl Validate for CreateGroupRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStudentRequest {
    pub name: String,
    pub group_id: GroupId,
}

impl Validate for CreateStudentRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require_text("name", &self.name)
    }
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require_text("username", &self.username)?;
        require_text("password", &self.password)
    }
}

/// Issued bearer token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

/// A user without its password hash
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub role: String,
    pub branch_id: Option<BranchId>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role.to_string(),
            branch_id: user.branch_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BranchResponse {
    pub id: BranchId,
    pub name: String,
}

impl From<Branch> for BranchResponse {
    fn from(branch: Branch) -> Self {
        Self {
            id: branch.id,
            name: branch.name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupResponse {
    pub id: GroupId,
    pub name: String,
    pub teacher_id: UserId,
    pub branch_id: BranchId,
}

impl From<Group> for GroupResponse {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            name: group.name,
            teacher_id: group.teacher_id,
            branch_id: group.branch_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StudentResponse {
    pub id: StudentId,
    pub name: String,
    pub group_id: GroupId,
    pub branch_id: BranchId,
}

impl From<Student> for StudentResponse {
    fn from(student: Student) -> Self {
        Self {
            id: student.id,
            name: student.name,
            group_id: student.group_id,
            branch_id: student.branch_id,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub message: String,
}
