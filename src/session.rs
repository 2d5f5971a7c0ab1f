//! Remembers who is signed in across restarts.

use crate::models::UserProfile;
use crate::storage::{DocumentStore, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Session {
    pub user: Option<UserProfile>,
}

pub struct SessionStore {
    store: Arc<dyn DocumentStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// An unreadable session document is treated as signed out.
    pub async fn load(&self) -> Session {
        match self.store.read().await {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!("discarding unreadable session: {err}");
                Session::default()
            }),
            Ok(None) => Session::default(),
            Err(err) => {
                warn!("failed to read session: {err}");
                Session::default()
            }
        }
    }

    pub async fn save(&self, user: UserProfile) -> Result<(), StoreError> {
        let session = Session { user: Some(user) };
        self.store.write(&serde_json::to_vec(&session)?).await
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store
            .write(&serde_json::to_vec(&Session::default())?)
            .await
    }

    /// Clears the session only if it belongs to `user_id`. Returns whether
    /// anything was cleared.
    pub async fn clear_for(&self, user_id: &str) -> Result<bool, StoreError> {
        let remembered = self.load().await;
        if !remembered.user.is_some_and(|user| user.id == user_id) {
            return Ok(false);
        }
        self.clear().await?;
        Ok(true)
    }
}
