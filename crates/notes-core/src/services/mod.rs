//! Async service handles shared by the HTTP layer

mod database;

pub use database::{DatabaseService, NotePage};
