mod handler;
mod model;

pub use handler::{list_tracked, save_tracked};
