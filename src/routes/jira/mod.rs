mod handler;
mod model;

pub use handler::{connect, disconnect, list_boards, list_projects};
