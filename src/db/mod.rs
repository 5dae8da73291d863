pub mod comments;
pub mod members;
pub mod projects;
pub mod roles;
pub mod tags;
pub mod tasks;
pub mod users;
