pub mod auth;
pub mod branches;
pub mod groups;
pub mod health;
pub mod students;
pub mod users;
