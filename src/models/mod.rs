pub mod comment;
pub mod project;
pub mod role;
pub mod tag;
pub mod task;
pub mod user;

pub use comment::{Comment, CommentWithAuthor};
pub use project::{MemberInfo, Project, ProjectBrief, ProjectDetail, ProjectSummary, TaskWithAssignees};
pub use role::Role;
pub use tag::Tag;
pub use task::{Task, TaskDetail, TaskPriority, TaskStatus, TaskSummary};
pub use user::{User, UserProfile, UserPublic};
