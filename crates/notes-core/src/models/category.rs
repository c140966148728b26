//! Category model

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::id::uuid_id;
use super::user::UserId;
use crate::error::{Error, Result};

pub const CATEGORY_NAME_MAX_CHARS: usize = 50;
pub const CATEGORY_COLOR_MAX_CHARS: usize = 7;

uuid_id!(
    /// A unique identifier for a category
    CategoryId
);

/// A named, optionally colored grouping owned by a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub user_id: UserId,
    pub name: String,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a validated category owned by `user_id`
    pub fn new(user_id: UserId, name: impl Into<String>, color: Option<String>) -> Result<Self> {
        let name = name.into();
        validate(&name, color.as_deref())?;
        let now = crate::util::now();
        Ok(Self {
            id: CategoryId::new(),
            user_id,
            name,
            color,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Names are required and capped at 50 characters; colors at 7 (`#rrggbb`).
pub fn validate(name: &str, color: Option<&str>) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput(
            "Category name cannot be empty".to_string(),
        ));
    }
    if name.chars().count() > CATEGORY_NAME_MAX_CHARS {
        return Err(Error::InvalidInput(format!(
            "Category name must be at most {CATEGORY_NAME_MAX_CHARS} characters"
        )));
    }
    if color.is_some_and(|color| color.chars().count() > CATEGORY_COLOR_MAX_CHARS) {
        return Err(Error::InvalidInput(format!(
            "Category color must be at most {CATEGORY_COLOR_MAX_CHARS} characters"
        )));
    }
    Ok(())
}
