use crate::models::Database;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::{fs, sync::Mutex};
use tracing::error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A single opaque document, read and replaced as a whole.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// `Ok(None)` when nothing has been written yet.
    async fn read(&self) -> Result<Option<Vec<u8>>, StoreError>;
    async fn write(&self, bytes: &[u8]) -> Result<(), StoreError>;
}

/// JSON file on disk. Writes land in a sibling temp file first and are then
/// renamed over the target.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn read(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let temp = self.temp_path();
        fs::write(&temp, bytes).await?;
        fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

/// In-process store, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Mutex::new(Some(bytes.into())),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.bytes.lock().await.clone())
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), StoreError> {
        *self.bytes.lock().await = Some(bytes.to_vec());
        Ok(())
    }
}

/// Never fails: a missing document is a first run, and an unreadable or
/// unparsable one is logged and treated the same way.
pub async fn load_database(store: &dyn DocumentStore) -> Database {
    match store.read().await {
        Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
            Ok(db) => db,
            Err(err) => {
                error!("store corrupt, starting from an empty database: {err}");
                Database::default()
            }
        },
        Ok(None) => Database::default(),
        Err(err) => {
            error!("failed to read store, starting from an empty database: {err}");
            Database::default()
        }
    }
}

pub async fn persist_database(store: &dyn DocumentStore, db: &Database) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(db)?;
    store.write(&payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyReport, User, UserProgress};
    use crate::service::PlannerService;
    use crate::widgets::{reset_day, starter_day};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn sample_database() -> Database {
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut db = Database::default();
        for (id, email) in [("u1", "a@example.com"), ("u2", "b@example.com")] {
            db.users.push(User {
                id: id.to_string(),
                name: id.to_uppercase(),
                email: email.to_string(),
                credential: "secret".to_string(),
                is_logged_in: id == "u1",
            });
        }

        let mut archived = starter_day(day);
        archived.report = Some(DailyReport {
            summary: "Solid day.".to_string(),
            score: 72,
            tips: vec!["a".into(), "b".into(), "c".into()],
        });
        let current = reset_day(&archived, day.succ_opt().unwrap());
        db.user_progress.insert(
            "u1".to_string(),
            UserProgress {
                current_day: current,
                history: vec![archived],
            },
        );
        db.user_progress.insert(
            "u2".to_string(),
            UserProgress {
                current_day: starter_day(day),
                history: Vec::new(),
            },
        );
        db
    }

    #[tokio::test]
    async fn empty_store_loads_empty_database() {
        let store = MemoryStore::new();
        assert_eq!(load_database(&store).await, Database::default());
    }

    #[tokio::test]
    async fn corrupt_store_loads_empty_database() {
        let store = MemoryStore::with_contents(b"{ not json".to_vec());
        assert_eq!(load_database(&store).await, Database::default());

        let wrong_shape = MemoryStore::with_contents(br#"{"users": 42}"#.to_vec());
        assert_eq!(load_database(&wrong_shape).await, Database::default());
    }

    #[tokio::test]
    async fn database_round_trips_through_store() {
        let store = MemoryStore::new();

        persist_database(&store, &Database::default()).await.unwrap();
        assert_eq!(load_database(&store).await, Database::default());

        let db = sample_database();
        persist_database(&store, &db).await.unwrap();
        assert_eq!(load_database(&store).await, db);
    }

    #[tokio::test]
    async fn file_store_creates_parent_and_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("db.json"));

        assert!(store.read().await.unwrap().is_none());

        persist_database(&store, &sample_database()).await.unwrap();
        persist_database(&store, &Database::default()).await.unwrap();

        assert_eq!(load_database(&store).await, Database::default());
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn original_document_with_fractional_score_loads() {
        let document = br#"{
            "users": [
                { "id": "1738000000000", "name": "Ada", "email": "ada@example.com", "password": "pw", "isLoggedIn": true }
            ],
            "userProgress": {
                "1738000000000": {
                    "currentDay": {
                        "date": "2026-03-02",
                        "widgets": [
                            { "id": "w1", "type": "water", "title": "Water Intake", "data": { "glasses": 0, "goal": 8 } }
                        ]
                    },
                    "history": [
                        {
                            "date": "2026-03-01",
                            "widgets": [
                                { "id": "w1", "type": "water", "title": "Water Intake", "data": { "glasses": 6, "goal": 8 } },
                                { "id": "w2", "type": "diet", "title": "Diet", "data": { "meals": [{ "id": 1738000000001, "name": "Oats", "calories": 300 }] } }
                            ],
                            "report": { "summary": "Good.", "score": 85.5, "tips": ["a", "b", "c"] }
                        }
                    ]
                }
            }
        }"#;
        let store = Arc::new(MemoryStore::with_contents(document.to_vec()));

        let db = load_database(store.as_ref()).await;
        assert_eq!(db.users.len(), 1);
        let history = &db.user_progress["1738000000000"].history;
        assert_eq!(history[0].report.as_ref().map(|r| r.score), Some(86));

        let service = PlannerService::new(store);
        let user = service.authenticate("ada@example.com", "pw").await.unwrap();
        assert_eq!(user.id, "1738000000000");
        assert_eq!(service.load().await.user_progress["1738000000000"].history.len(), 1);
    }
}
