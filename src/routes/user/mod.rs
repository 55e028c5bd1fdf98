mod handler;
mod model;

pub use handler::{login, logout, me, register};
pub use model::{UserProfile, validate_email, validate_password};
