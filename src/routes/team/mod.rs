mod handler;
mod model;

pub use handler::{list_members, set_labels};
