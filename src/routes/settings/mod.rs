mod handler;
mod model;

pub use handler::{ignore_ticket, ignored_tickets, ignored_types, set_ignored_types, unignore_ticket};
