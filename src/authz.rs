//! Authorization predicates. Pure functions over already-loaded rows;
//! all role comparisons go through [`UserRole`] so no string-literal
//! role checks leak into the handlers.

use crate::models::{Comment, Project};

/// Closed set of roles. Unknown role names degrade to `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn from_name(name: &str) -> Self {
        match name {
            "admin" => UserRole::Admin,
            _ => UserRole::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

/// The owner counts as a member even if the membership row were missing.
pub fn is_project_member(project: &Project, member_ids: &[i64], user_id: i64) -> bool {
    project.owner_id == user_id || member_ids.contains(&user_id)
}

pub fn is_project_owner_or_admin(project: &Project, user_id: i64, role: UserRole) -> bool {
    project.owner_id == user_id || role == UserRole::Admin
}

pub fn is_comment_author(comment: &Comment, user_id: i64) -> bool {
    comment.user_id == user_id
}
