//! Category repository implementation

use rusqlite::{params, Connection};

use super::row;
use crate::error::{Error, Resource, Result};
use crate::models::{validate_category, Category, CategoryId, UserId};
use crate::util::now;

/// Trait for owner-scoped category storage operations
pub trait CategoryRepository {
    /// Persist a new category
    fn create(&self, category: &Category) -> Result<()>;

    /// Persist several categories in one transaction
    fn create_many(&self, categories: &[Category]) -> Result<()>;

    /// List categories, most recently updated first
    fn list(&self, owner: &UserId) -> Result<Vec<Category>>;

    /// Most recently updated categories, capped at `limit`
    fn recently_updated(&self, owner: &UserId, limit: usize) -> Result<Vec<Category>>;

    /// Rename and/or recolor a category
    fn update(
        &self,
        owner: &UserId,
        id: &CategoryId,
        name: &str,
        color: Option<&str>,
    ) -> Result<Category>;

    /// Permanently remove a category
    fn delete(&self, owner: &UserId, id: &CategoryId) -> Result<()>;
}

/// `SQLite` implementation of `CategoryRepository`
pub struct SqliteCategoryRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCategoryRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn insert(conn: &Connection, category: &Category) -> Result<()> {
        conn.execute(
            "INSERT INTO categories (id, user_id, name, color, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                category.id.as_str(),
                category.user_id.as_str(),
                category.name,
                category.color,
                category.created_at.timestamp_millis(),
                category.updated_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn parse_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
        Ok(Category {
            id: row::id(row, 0)?,
            user_id: row::id(row, 1)?,
            name: row.get(2)?,
            color: row.get(3)?,
            created_at: row::timestamp(row, 4)?,
            updated_at: row::timestamp(row, 5)?,
        })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn create(&self, category: &Category) -> Result<()> {
        Self::insert(self.conn, category)
    }

    fn create_many(&self, categories: &[Category]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for category in categories {
            Self::insert(&tx, category)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn list(&self, owner: &UserId) -> Result<Vec<Category>> {
        self.recently_updated(owner, usize::MAX)
    }

    fn recently_updated(&self, owner: &UserId, limit: usize) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, color, created_at, updated_at
             FROM categories WHERE user_id = ?1
             ORDER BY updated_at DESC, rowid DESC
             LIMIT ?2",
        )?;
        let categories = stmt
            .query_map(params![owner.as_str(), row::sql_int(limit)], Self::parse_category)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    fn update(
        &self,
        owner: &UserId,
        id: &CategoryId,
        name: &str,
        color: Option<&str>,
    ) -> Result<Category> {
        validate_category(name, color)?;

        let rows = self.conn.execute(
            "UPDATE categories SET name = ?1, color = ?2, updated_at = ?3
             WHERE id = ?4 AND user_id = ?5",
            params![
                name,
                color,
                now().timestamp_millis(),
                id.as_str(),
                owner.as_str()
            ],
        )?;
        if rows == 0 {
            return Err(Error::not_found(Resource::Category, id));
        }

        let category = self.conn.query_row(
            "SELECT id, user_id, name, color, created_at, updated_at
             FROM categories WHERE id = ?1",
            params![id.as_str()],
            Self::parse_category,
        )?;
        Ok(category)
    }

    fn delete(&self, owner: &UserId, id: &CategoryId) -> Result<()> {
        let rows = self.conn.execute(
            "DELETE FROM categories WHERE id = ?1 AND user_id = ?2",
            params![id.as_str(), owner.as_str()],
        )?;
        if rows == 0 {
            return Err(Error::not_found(Resource::Category, id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, SqliteUserRepository, UserRepository};
    use crate::models::User;
    use pretty_assertions::assert_eq;

    fn setup() -> (Database, UserId) {
        let db = Database::open_in_memory().unwrap();
        let user = User::new("Owner", "owner@example.com", "hash");
        SqliteUserRepository::new(db.connection())
            .create(&user)
            .unwrap();
        (db, user.id)
    }

    #[test]
    fn test_create_and_list() {
        let (db, owner) = setup();
        let repo = SqliteCategoryRepository::new(db.connection());

        let work = Category::new(owner, "Work", Some("#ff0000".to_string())).unwrap();
        let home = Category::new(owner, "Home", None).unwrap();
        repo.create(&work).unwrap();
        repo.create(&home).unwrap();

        let listed = repo.list(&owner).unwrap();
        assert_eq!(listed, vec![home, work]);
    }

    #[test]
    fn test_list_is_owner_scoped() {
        let (db, owner) = setup();
        let stranger = User::new("Other", "other@example.com", "hash");
        SqliteUserRepository::new(db.connection())
            .create(&stranger)
            .unwrap();
        let repo = SqliteCategoryRepository::new(db.connection());

        repo.create(&Category::new(owner, "Mine", None).unwrap())
            .unwrap();

        assert!(repo.list(&stranger.id).unwrap().is_empty());
    }

    #[test]
    fn test_update() {
        let (db, owner) = setup();
        let repo = SqliteCategoryRepository::new(db.connection());

        let category = Category::new(owner, "Work", None).unwrap();
        repo.create(&category).unwrap();

        let updated = repo
            .update(&owner, &category.id, "Projects", Some("#00ff00"))
            .unwrap();
        assert_eq!(updated.name, "Projects");
        assert_eq!(updated.color.as_deref(), Some("#00ff00"));
        assert_eq!(updated.created_at, category.created_at);
    }

    #[test]
    fn test_update_validates_and_reports_missing() {
        let (db, owner) = setup();
        let repo = SqliteCategoryRepository::new(db.connection());

        let category = Category::new(owner, "Work", None).unwrap();
        repo.create(&category).unwrap();

        assert!(matches!(
            repo.update(&owner, &category.id, "", None),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            repo.update(&owner, &CategoryId::new(), "Other", None),
            Err(Error::NotFound(Resource::Category, _))
        ));
    }

    #[test]
    fn test_delete_is_permanent() {
        let (db, owner) = setup();
        let repo = SqliteCategoryRepository::new(db.connection());

        let category = Category::new(owner, "Temp", None).unwrap();
        repo.create(&category).unwrap();
        repo.delete(&owner, &category.id).unwrap();

        assert!(repo.list(&owner).unwrap().is_empty());
        assert!(repo.delete(&owner, &category.id).is_err());
    }

    #[test]
    fn test_recently_updated_limit() {
        let (db, owner) = setup();
        let repo = SqliteCategoryRepository::new(db.connection());

        let categories: Vec<_> = (0..4)
            .map(|i| Category::new(owner, format!("c{i}"), None).unwrap())
            .collect();
        repo.create_many(&categories).unwrap();

        let recent = repo.recently_updated(&owner, 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].name, "c3");
    }
}
