//! User repository implementation

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::row;
use crate::error::{Error, Result};
use crate::models::User;

/// Trait for credential storage operations
pub trait UserRepository {
    /// Persist a new user; fails with `DuplicateEmail` if the email is taken
    fn create(&self, user: &User) -> Result<()>;

    /// Find a user by exact (case-sensitive) email
    fn find_by_email(&self, email: &str) -> Result<Option<User>>;
}

/// `SQLite` implementation of `UserRepository`
pub struct SqliteUserRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteUserRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row::id(row, 0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            created_at: row::timestamp(row, 4)?,
            updated_at: row::timestamp(row, 5)?,
        })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create(&self, user: &User) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id.as_str(),
                user.name,
                user.email,
                user.password_hash,
                user.created_at.timestamp_millis(),
                user.updated_at.timestamp_millis(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(Error::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, name, email, password_hash, created_at, updated_at
                 FROM users WHERE email = ?1",
                params![email],
                Self::parse_user,
            )
            .optional()?;
        Ok(user)
    }
}
