//! Route handlers, one module per resource.

pub mod attachments;
pub mod auth;
pub mod categories;
pub mod notes;
pub mod search;
pub mod sync;

use std::str::FromStr;

use notes_core::Resource;

use crate::error::AppError;

/// Parse a path id; anything that is not a valid id cannot name an owned record.
fn parse_id<T: FromStr>(raw: &str, resource: Resource) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::not_found(resource))
}
