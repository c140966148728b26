//! Pull/push sync protocol.
//!
//! Pull hands out a snapshot of the owner's most recently updated notes and
//! categories. Push applies client-originated note creates and reports the
//! server ids assigned to client-local ids. There is no cursor, tombstone
//! propagation or conflict detection.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Category, Note, UserId};
use crate::services::DatabaseService;
use crate::util::now;
use crate::Result;

/// Maximum number of notes and of categories returned by a pull.
pub const PULL_LIMIT: usize = 100;

/// Client-submitted batch, keyed by entity kind then operation kind.
///
/// Entity kinds other than `notes` and `categories` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SyncBatch {
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: EntityChanges<NotePayload>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: EntityChanges<CategoryPayload>,
}

/// Ordered payloads per operation kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct EntityChanges<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub create: Vec<T>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub update: Vec<T>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub delete: Vec<T>,
}

impl<T> Default for EntityChanges<T> {
    fn default() -> Self {
        Self {
            create: Vec::new(),
            update: Vec::new(),
            delete: Vec::new(),
        }
    }
}

/// Note fields a client may push; anything that is not a string is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NotePayload {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: Option<String>,
}

/// Category fields a client may push. Accepted but not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CategoryPayload {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub color: Option<String>,
}

/// Per-kind change lists returned by a pull.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeSet<T> {
    pub created: Vec<T>,
    pub updated: Vec<T>,
    pub deleted: Vec<String>,
}

impl<T> ChangeSet<T> {
    fn created(items: Vec<T>) -> Self {
        Self {
            created: items,
            updated: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

/// Snapshot returned by a pull.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullSnapshot {
    pub notes: ChangeSet<Note>,
    pub categories: ChangeSet<Category>,
    /// Server time of the snapshot; opaque, not a cursor
    pub sync_timestamp: DateTime<Utc>,
}

/// Client-local id to server id mappings produced by a push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreatedIds {
    pub notes: BTreeMap<String, String>,
    pub categories: BTreeMap<String, String>,
}

/// Result of applying a push batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushOutcome {
    /// Always empty; conflicts are not detected
    pub conflicts: Vec<String>,
    pub created_ids: CreatedIds,
    pub sync_timestamp: DateTime<Utc>,
}

/// Applies pull and push requests against the store.
#[derive(Clone)]
pub struct SyncService {
    db: DatabaseService,
}

impl SyncService {
    pub const fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Up to [`PULL_LIMIT`] most recently updated notes and categories.
    pub async fn pull(&self, owner: &UserId) -> Result<PullSnapshot> {
        let (notes, categories) = self.db.recent_changes(owner, PULL_LIMIT).await?;
        Ok(PullSnapshot {
            notes: ChangeSet::created(notes),
            categories: ChangeSet::created(categories),
            sync_timestamp: now(),
        })
    }

    /// Create a note for every `notes.create` entry; other operations are ignored.
    pub async fn push(&self, owner: &UserId, batch: SyncBatch) -> Result<PushOutcome> {
        let mut created_ids = CreatedIds::default();
        let mut notes = Vec::with_capacity(batch.notes.create.len());

        for payload in batch.notes.create {
            let note = Note::new(
                *owner,
                payload.title.unwrap_or_default(),
                payload.content.unwrap_or_default(),
            );
            if let Some(local_id) = payload.id.filter(|id| !id.is_empty()) {
                created_ids.notes.insert(local_id, note.id.to_string());
            }
            notes.push(note);
        }

        let ignored = batch.notes.update.len()
            + batch.notes.delete.len()
            + batch.categories.create.len()
            + batch.categories.update.len()
            + batch.categories.delete.len();
        if ignored > 0 {
            tracing::debug!(ignored, "Skipping sync operations that are not applied");
        }

        self.db.import_notes(&notes).await?;
        tracing::debug!(created = notes.len(), "Persisted pushed notes");

        Ok(PushOutcome {
            conflicts: Vec::new(),
            created_ids,
            sync_timestamp: now(),
        })
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(value) => Ok(Some(value)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NoteDraft, NoteFilter, User};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn setup() -> (SyncService, DatabaseService, UserId) {
        let db = DatabaseService::open_in_memory().await.unwrap();
        let user = User::new("Ada", "ada@example.com", "hash");
        db.create_user(&user).await.unwrap();
        (SyncService::new(db.clone()), db, user.id)
    }

    fn batch(value: serde_json::Value) -> SyncBatch {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn batch_parsing_is_lenient() {
        let parsed = batch(json!({
            "notes": {
                "create": [{"id": "local1", "title": 42, "content": null}],
                "update": null
            },
            "tags": {"create": []}
        }));

        assert_eq!(parsed.notes.create.len(), 1);
        assert_eq!(parsed.notes.create[0].id.as_deref(), Some("local1"));
        assert_eq!(parsed.notes.create[0].title, None);
        assert!(parsed.notes.update.is_empty());
        assert!(parsed.categories.create.is_empty());
    }

    #[test]
    fn batch_rejects_wrong_shape() {
        assert!(serde_json::from_value::<SyncBatch>(json!({"notes": {"create": "x"}})).is_err());
        assert!(serde_json::from_value::<SyncBatch>(json!({"notes": [1, 2]})).is_err());
    }

    #[tokio::test]
    async fn push_creates_notes_and_maps_local_ids() {
        let (sync, db, owner) = setup().await;

        let outcome = sync
            .push(
                &owner,
                batch(json!({"notes": {"create": [{"id": "local1", "title": "T", "content": "C"}]}})),
            )
            .await
            .unwrap();

        assert!(outcome.conflicts.is_empty());
        let server_id = outcome.created_ids.notes.get("local1").unwrap();
        assert_ne!(server_id, "local1");

        let note = db
            .get_note(&owner, &server_id.parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(note.title, "T");
        assert_eq!(note.content, "C");
    }

    #[tokio::test]
    async fn push_defaults_missing_fields_and_skips_blank_ids() {
        let (sync, db, owner) = setup().await;

        let outcome = sync
            .push(
                &owner,
                batch(json!({"notes": {"create": [{"id": ""}, {"title": ["x"]}]}})),
            )
            .await
            .unwrap();
        assert!(outcome.created_ids.notes.is_empty());

        let page = db
            .list_notes(&owner, &NoteFilter::default(), 10, 0)
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert!(page.notes.iter().all(|note| note.title.is_empty()));
    }

    #[tokio::test]
    async fn push_ignores_updates_deletes_and_categories() {
        let (sync, db, owner) = setup().await;

        let outcome = sync
            .push(
                &owner,
                batch(json!({
                    "notes": {"update": [{"id": "a", "title": "x"}], "delete": [{"id": "b"}]},
                    "categories": {"create": [{"id": "c1", "name": "Work"}]}
                })),
            )
            .await
            .unwrap();

        assert_eq!(outcome.created_ids, CreatedIds::default());
        let (notes, categories) = db.recent_changes(&owner, PULL_LIMIT).await.unwrap();
        assert!(notes.is_empty());
        assert!(categories.is_empty());
    }

    #[tokio::test]
    async fn pull_returns_created_snapshot() {
        let (sync, db, owner) = setup().await;

        let empty = sync.pull(&owner).await.unwrap();
        assert!(empty.notes.created.is_empty());
        assert!(empty.categories.created.is_empty());

        let note = db
            .create_note(
                &owner,
                NoteDraft {
                    title: "Hello".to_string(),
                    ..NoteDraft::default()
                },
            )
            .await
            .unwrap();

        let snapshot = sync.pull(&owner).await.unwrap();
        assert_eq!(snapshot.notes.created, vec![note]);
        assert!(snapshot.notes.updated.is_empty());
        assert!(snapshot.notes.deleted.is_empty());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["categories"]["updated"], json!([]));
        assert!(json["sync_timestamp"].is_string());
    }

    #[tokio::test]
    async fn pull_is_capped_and_owner_scoped() {
        let (sync, db, owner) = setup().await;
        let other = User::new("Bob", "bob@example.com", "hash");
        db.create_user(&other).await.unwrap();

        let notes: Vec<_> = (0..PULL_LIMIT + 5)
            .map(|i| Note::new(owner, format!("n{i}"), ""))
            .collect();
        db.import_notes(&notes).await.unwrap();
        db.import_notes(&[Note::new(other.id, "theirs", "")])
            .await
            .unwrap();

        let snapshot = sync.pull(&owner).await.unwrap();
        assert_eq!(snapshot.notes.created.len(), PULL_LIMIT);
        assert!(snapshot
            .notes
            .created
            .iter()
            .all(|note| note.user_id == owner));
        assert_eq!(sync.pull(&other.id).await.unwrap().notes.created.len(), 1);
    }

    #[tokio::test]
    async fn pull_caps_categories_per_owner() {
        let (sync, db, owner) = setup().await;
        let other = User::new("Bob", "bob@example.com", "hash");
        db.create_user(&other).await.unwrap();

        for i in 0..PULL_LIMIT + 5 {
            db.create_category(&owner, &format!("c{i}"), None)
                .await
                .unwrap();
        }
        db.create_category(&other.id, "theirs", None)
            .await
            .unwrap();

        let snapshot = sync.pull(&owner).await.unwrap();
        assert_eq!(snapshot.categories.created.len(), PULL_LIMIT);
        assert!(snapshot
            .categories
            .created
            .iter()
            .all(|category| category.user_id == owner));

        let theirs = sync.pull(&other.id).await.unwrap();
        assert_eq!(theirs.categories.created.len(), 1);
        assert_eq!(theirs.categories.created[0].name, "theirs");
    }
}
