//! Entity Service: authorize, then touch the store.
//!
//! Every operation asks the [`AuthzEngine`] first and only opens an
//! [`IdentityStore`](database::IdentityStore) session once the caller is
//! allowed. Role and branch rules live in the engine; this module only
//! applies the decision it gets back.

use authz::{
    types::{Action, EntityKind, ReadFilter},
    AuthzEngine,
};
use database::{Database, DatabaseError};
use entities::{
    Branch, BranchId, CallerIdentity, Group, NewGroup, NewStudent, NewUser, Role, Student, User,
    UserId,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    error::{ApiError, ApiResult},
    models::{CreateAdminRequest, CreateGroupRequest, CreateStudentRequest, CreateTeacherRequest},
};

/// Scoped create and list operations over users, groups and students
#[derive(Debug, Clone)]
pub struct EntityService {
    db: Arc<Database>,
    engine: AuthzEngine,
}

impl EntityService {
    pub fn new(db: Arc<Database>, engine: AuthzEngine) -> Self {
        Self { db, engine }
    }

    /// Create a branch admin. The branch is the one named in the request.
    pub async fn create_admin(
        &self,
        caller: &CallerIdentity,
        request: CreateAdminRequest,
    ) -> ApiResult<User> {
        let branch_id =
            self.engine
                .authorize_create(caller, EntityKind::Admin, Some(request.branch_id))?;
        let password_hash = hash_password(request.password).await?;

        let mut store = self.db.session().await?;
        if store.find_branch(branch_id).await?.is_none() {
            return Err(ApiError::ReferenceNotFound(format!(
                "Branch {} does not exist",
                branch_id
            )));
        }

        let user = store
            .insert_user(&NewUser {
                username: request.username,
                password_hash,
                role: Role::Admin,
                branch_id: Some(branch_id),
            })
            .await
            .map_err(username_conflict)?;

        info!(
            "User {} created admin {} ({}) for branch {}",
            caller.id, user.id, user.username, branch_id
        );
        Ok(user)
    }

    /// Create a teacher in the caller's branch.
    pub async fn create_teacher(
        &self,
        caller: &CallerIdentity,
        request: CreateTeacherRequest,
    ) -> ApiResult<User> {
        let branch_id =
            self.engine
                .authorize_create(caller, EntityKind::Teacher, request.branch_id)?;
        if let Some(supplied) = request.branch_id.filter(|b| *b != branch_id) {
            debug!(
                "Ignoring branch {} in teacher request, using {}",
                supplied, branch_id
            );
        }
        let password_hash = hash_password(request.password).await?;

        let mut store = self.db.session().await?;
        let user = store
            .insert_user(&NewUser {
                username: request.username,
                password_hash,
                role: Role::Teacher,
                branch_id: Some(branch_id),
            })
            .await
            .map_err(username_conflict)?;

        info!(
            "User {} created teacher {} ({}) in branch {}",
            caller.id, user.id, user.username, branch_id
        );
        Ok(user)
    }

    /// Create a group in the caller's branch, owned by an existing teacher.
    pub async fn create_group(
        &self,
        caller: &CallerIdentity,
        request: CreateGroupRequest,
    ) -> ApiResult<Group> {
        let branch_id = self
            .engine
            .authorize_create(caller, EntityKind::Group, None)?;

        let mut store = self.db.session().await?;
        let teacher = match store.find_user(request.teacher_id).await? {
            Some(user) if user.role == Role::Teacher => user,
            Some(user) => {
                return Err(ApiError::ReferenceNotFound(format!(
                    "User {} is not a teacher (role {})",
                    user.id, user.role
                )))
            }
            None => {
                return Err(ApiError::ReferenceNotFound(format!(
                    "Teacher {} does not exist",
                    request.teacher_id
                )))
            }
        };

        if teacher.branch_id != Some(branch_id) {
            warn!(
                "Assigning teacher {} from branch {:?} to a group in branch {}",
                teacher.id, teacher.branch_id, branch_id
            );
        }

        let group = store
            .insert_group(&NewGroup {
                name: request.name,
                teacher_id: teacher.id,
                branch_id,
            })
            .await?;

        info!(
            "User {} created group {} ({}) in branch {}",
            caller.id, group.id, group.name, branch_id
        );
        Ok(group)
    }

    /// Enroll a student into an existing group, in the caller's branch.
    pub async fn create_student(
        &self,
        caller: &CallerIdentity,
        request: CreateStudentRequest,
    ) -> ApiResult<Student> {
        let branch_id = self
            .engine
            .authorize_create(caller, EntityKind::Student, None)?;

        let mut store = self.db.session().await?;
        let group = store.find_group(request.group_id).await?.ok_or_else(|| {
            ApiError::ReferenceNotFound(format!("Group {} does not exist", request.group_id))
        })?;

        if group.branch_id != branch_id {
            warn!(
                "Enrolling student into group {} of branch {} from branch {}",
                group.id, group.branch_id, branch_id
            );
        }

        let student = store
            .insert_student(&NewStudent {
                name: request.name,
                group_id: group.id,
                branch_id,
            })
            .await?;

        info!(
            "User {} created student {} in group {}",
            caller.id, student.id, group.id
        );
        Ok(student)
    }

    pub async fn list_branches(&self, caller: &CallerIdentity) -> ApiResult<Vec<Branch>> {
        let filter = self
            .engine
            .authorize_read(caller, Action::List, EntityKind::Branch)?;
        if filter != ReadFilter::Unrestricted {
            return Err(unsupported_filter(filter, EntityKind::Branch));
        }

        let mut store = self.db.session().await?;
        Ok(store.list_branches().await?)
    }

    pub async fn list_teachers(&self, caller: &CallerIdentity) -> ApiResult<Vec<User>> {
        let branch = self.branch_scope(caller, EntityKind::Teacher)?;
        let mut store = self.db.session().await?;
        Ok(store.list_teachers(branch).await?)
    }

    pub async fn list_groups(&self, caller: &CallerIdentity) -> ApiResult<Vec<Group>> {
        let branch = self.branch_scope(caller, EntityKind::Group)?;
        let mut store = self.db.session().await?;
        Ok(store.list_groups(branch).await?)
    }

    pub async fn list_students(&self, caller: &CallerIdentity) -> ApiResult<Vec<Student>> {
        let branch = self.branch_scope(caller, EntityKind::Student)?;
        let mut store = self.db.session().await?;
        Ok(store.list_students(branch).await?)
    }

    /// Groups taught by the caller, across every branch.
    pub async fn list_my_groups(&self, caller: &CallerIdentity) -> ApiResult<Vec<Group>> {
        let teacher_id = self.teacher_scope(caller, EntityKind::Group)?;
        let mut store = self.db.session().await?;
        Ok(store.list_groups_by_teacher(teacher_id).await?)
    }

    /// Students in any group taught by the caller.
    pub async fn list_my_students(&self, caller: &CallerIdentity) -> ApiResult<Vec<Student>> {
        let teacher_id = self.teacher_scope(caller, EntityKind::Student)?;
        let mut store = self.db.session().await?;

        let group_ids: Vec<_> = store
            .list_groups_by_teacher(teacher_id)
            .await?
            .into_iter()
            .map(|group| group.id)
            .collect();
        debug!("Teacher {} owns {} groups", teacher_id, group_ids.len());

        Ok(store.list_students_in_groups(&group_ids).await?)
    }

    /// The caller's own user record.
    pub async fn current_user(&self, caller: &CallerIdentity) -> ApiResult<User> {
        let mut store = self.db.session().await?;
        store
            .find_user(caller.id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("user no longer exists".to_string()))
    }

    /// `None` means every branch.
    fn branch_scope(
        &self,
        caller: &CallerIdentity,
        kind: EntityKind,
    ) -> ApiResult<Option<BranchId>> {
        match self.engine.authorize_read(caller, Action::List, kind)? {
            ReadFilter::Unrestricted => Ok(None),
            ReadFilter::Branch(branch_id) => Ok(Some(branch_id)),
            other => Err(unsupported_filter(other, kind)),
        }
    }

    fn teacher_scope(&self, caller: &CallerIdentity, kind: EntityKind) -> ApiResult<UserId> {
        match self.engine.authorize_read(caller, Action::ListOwn, kind)? {
            ReadFilter::Teacher(teacher_id) => Ok(teacher_id),
            other => Err(unsupported_filter(other, kind)),
        }
    }
}

/// Hash on the blocking pool; Argon2 is deliberately slow.
async fn hash_password(password: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || user::hash_password(&password))
        .await
        .map_err(|e| ApiError::InternalError(format!("password hashing task failed: {}", e)))?
        .map_err(ApiError::from)
}

fn username_conflict(err: DatabaseError) -> ApiError {
    match err {
        DatabaseError::UniqueViolation(_) => {
            ApiError::Conflict("Username is already taken".to_string())
        }
        other => other.into(),
    }
}

fn unsupported_filter(filter: ReadFilter, kind: EntityKind) -> ApiError {
    ApiError::InternalError(format!("unsupported filter {:?} for {}", filter, kind))
}
