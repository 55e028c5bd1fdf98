mod handler;
mod model;

pub use handler::{approve_user, delete_user, list_users, reject_user};
