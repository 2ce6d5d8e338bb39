use entities::{
    Branch, BranchId, Group, GroupId, NewGroup, NewStudent, NewUser, Role, Student, User, UserId,
};
use sqlx::{pool::PoolConnection, QueryBuilder, Sqlite};
use tracing::{debug, info};

use crate::Result;

const USER_COLUMNS: &str = "id, username, password_hash, role, branch_id";
const GROUP_COLUMNS: &str = "id, name, teacher_id, branch_id";
const STUDENT_COLUMNS: &str = "id, name, group_id, branch_id";

/// A connection-scoped session over the identity tables.
///
/// Pure data access: every method does exactly what its name says, with the
/// filters it is given, and applies no role or ownership policy of its own.
/// Each insert is a single statement, so it is either fully applied or not at
/// all.
pub struct IdentityStore {
    conn: PoolConnection<Sqlite>,
}

impl IdentityStore {
    pub(crate) fn new(conn: PoolConnection<Sqlite>) -> Self {
        Self { conn }
    }

    // ----- branches -------------------------------------------------------

    pub async fn insert_branch(&mut self, name: &str) -> Result<Branch> {
        let branch = sqlx::query_as::<_, Branch>(
            "INSERT INTO branches (name) VALUES (?) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&mut *self.conn)
        .await?;

        info!("Created branch {} ({})", branch.id, branch.name);
        Ok(branch)
    }

    pub async fn find_branch(&mut self, id: BranchId) -> Result<Option<Branch>> {
        let branch = sqlx::query_as::<_, Branch>("SELECT id, name FROM branches WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(branch)
    }

    pub async fn list_branches(&mut self) -> Result<Vec<Branch>> {
        let branches = sqlx::query_as::<_, Branch>("SELECT id, name FROM branches ORDER BY id")
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(branches)
    }

    // ----- users ----------------------------------------------------------

    /// Insert a user. A taken username surfaces as
    /// [`DatabaseError::UniqueViolation`](crate::DatabaseError::UniqueViolation).
    pub async fn insert_user(&mut self, user: &NewUser) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (username, password_hash, role, branch_id) VALUES (?, ?, ?, ?) RETURNING {}",
            USER_COLUMNS
        );

        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.branch_id)
            .fetch_one(&mut *self.conn)
            .await?;

        info!(
            "Created user {} ({}) with role {}",
            created.id, created.username, created.role
        );
        Ok(created)
    }

    pub async fn find_user(&mut self, id: UserId) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(user)
    }

    pub async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(user)
    }

    /// Users with role Teacher, optionally restricted to one branch.
    pub async fn list_teachers(&mut self, branch_id: Option<BranchId>) -> Result<Vec<User>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM users WHERE role = ",
            USER_COLUMNS
        ));
        query.push_bind(Role::TEACHER);
        if let Some(branch_id) = branch_id {
            query.push(" AND branch_id = ").push_bind(branch_id);
        }
        query.push(" ORDER BY id");

        debug!("Listing teachers, branch filter: {:?}", branch_id);

        let teachers = query
            .build_query_as::<User>()
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(teachers)
    }

    // ----- groups ---------------------------------------------------------

    pub async fn insert_group(&mut self, group: &NewGroup) -> Result<Group> {
        let sql = format!(
            "INSERT INTO study_groups (name, teacher_id, branch_id) VALUES (?, ?, ?) RETURNING {}",
            GROUP_COLUMNS
        );

        let created = sqlx::query_as::<_, Group>(&sql)
            .bind(&group.name)
            .bind(group.teacher_id)
            .bind(group.branch_id)
            .fetch_one(&mut *self.conn)
            .await?;

        info!(
            "Created group {} ({}) in branch {}",
            created.id, created.name, created.branch_id
        );
        Ok(created)
    }

    pub async fn find_group(&mut self, id: GroupId) -> Result<Option<Group>> {
        let sql = format!("SELECT {} FROM study_groups WHERE id = ?", GROUP_COLUMNS);
        let group = sqlx::query_as::<_, Group>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(group)
    }

    /// All groups, optionally restricted to one branch.
    pub async fn list_groups(&mut self, branch_id: Option<BranchId>) -> Result<Vec<Group>> {
        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM study_groups", GROUP_COLUMNS));
        if let Some(branch_id) = branch_id {
            query.push(" WHERE branch_id = ").push_bind(branch_id);
        }
        query.push(" ORDER BY id");

        let groups = query
            .build_query_as::<Group>()
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(groups)
    }

    /// Groups whose teacher is `teacher_id`, in any branch.
    pub async fn list_groups_by_teacher(&mut self, teacher_id: UserId) -> Result<Vec<Group>> {
        let sql = format!(
            "SELECT {} FROM study_groups WHERE teacher_id = ? ORDER BY id",
            GROUP_COLUMNS
        );
        let groups = sqlx::query_as::<_, Group>(&sql)
            .bind(teacher_id)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(groups)
    }

    // ----- students -------------------------------------------------------

    pub async fn insert_student(&mut self, student: &NewStudent) -> Result<Student> {
        let sql = format!(
            "INSERT INTO students (name, group_id, branch_id) VALUES (?, ?, ?) RETURNING {}",
            STUDENT_COLUMNS
        );

        let created = sqlx::query_as::<_, Student>(&sql)
            .bind(&student.name)
            .bind(student.group_id)
            .bind(student.branch_id)
            .fetch_one(&mut *self.conn)
            .await?;

        info!(
            "Created student {} ({}) in group {}",
            created.id, created.name, created.group_id
        );
        Ok(created)
    }

    /// All students, optionally restricted to one branch.
    pub async fn list_students(&mut self, branch_id: Option<BranchId>) -> Result<Vec<Student>> {
        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM students", STUDENT_COLUMNS));
        if let Some(branch_id) = branch_id {
            query.push(" WHERE branch_id = ").push_bind(branch_id);
        }
        query.push(" ORDER BY id");

        let students = query
            .build_query_as::<Student>()
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(students)
    }

    /// Students whose group is one of `group_ids`. An empty set matches nothing.
    pub async fn list_students_in_groups(&mut self, group_ids: &[GroupId]) -> Result<Vec<Student>> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM students WHERE group_id IN (",
            STUDENT_COLUMNS
        ));
        let mut ids = query.separated(", ");
        for id in group_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY id");

        let students = query
            .build_query_as::<Student>()
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(students)
    }
}
