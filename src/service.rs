//! The persistence service: sole owner of the application database.
//!
//! Every operation reads the whole document, changes it, and writes the whole
//! document back. Within one process those read-modify-write cycles are
//! serialized by `write_lock`. Two processes sharing the same store are not
//! coordinated: the last write wins, per operation.

use crate::errors::ServiceError;
use crate::models::{
    DailyRecord, DailyReport, Database, HistorySummary, User, UserProgress, Widget, WidgetKind,
    WidgetPayload,
};
use crate::stats::build_history_summary;
use crate::storage::{load_database, persist_database, DocumentStore};
use crate::widgets;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct PlannerService {
    store: Arc<dyn DocumentStore>,
    write_lock: Mutex<()>,
}

impl PlannerService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn load(&self) -> Database {
        load_database(self.store.as_ref()).await
    }

    pub async fn persist(&self, db: &Database) -> Result<(), ServiceError> {
        persist_database(self.store.as_ref(), db).await?;
        Ok(())
    }

    /// Loads the database, applies `change`, and persists the result. Nothing
    /// is written when `change` fails.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Database) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut db = self.load().await;
        let result = change(&mut db)?;
        self.persist(&db).await?;
        Ok(result)
    }

    pub async fn create_account(
        &self,
        name: &str,
        email: &str,
        credential: &str,
    ) -> Result<User, ServiceError> {
        self.create_account_on(name, email, credential, today())
            .await
    }

    pub async fn create_account_on(
        &self,
        name: &str,
        email: &str,
        credential: &str,
        date: NaiveDate,
    ) -> Result<User, ServiceError> {
        let user = self
            .mutate(|db| {
                if db.users.iter().any(|user| user.email == email) {
                    return Err(ServiceError::DuplicateAccount);
                }

                let user = User {
                    id: Uuid::new_v4().to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                    credential: credential.to_string(),
                    is_logged_in: true,
                };
                db.users.push(user.clone());
                db.user_progress
                    .insert(user.id.clone(), empty_progress(date));
                Ok(user)
            })
            .await?;

        info!(user_id = %user.id, "account created");
        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, credential: &str) -> Result<User, ServiceError> {
        let user = self
            .mutate(|db| {
                let user = db
                    .users
                    .iter_mut()
                    .find(|user| user.email == email && user.credential == credential)
                    .ok_or(ServiceError::InvalidCredentials)?;
                user.is_logged_in = true;
                Ok(user.clone())
            })
            .await?;

        info!(user_id = %user.id, "user signed in");
        Ok(user)
    }

    pub async fn logout(&self, user_id: &str) -> Result<(), ServiceError> {
        self.mutate(|db| {
            let user = db
                .users
                .iter_mut()
                .find(|user| user.id == user_id)
                .ok_or_else(|| ServiceError::UnknownUser(user_id.to_string()))?;
            user.is_logged_in = false;
            Ok(())
        })
        .await?;

        info!(user_id, "user signed out");
        Ok(())
    }

    /// Returns the user's progress, creating and persisting a starter board
    /// if none exists yet.
    pub async fn get_progress(&self, user_id: &str) -> Result<UserProgress, ServiceError> {
        self.get_progress_on(user_id, today()).await
    }

    pub async fn get_progress_on(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<UserProgress, ServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut db = self.load().await;
        if let Some(progress) = db.user_progress.get(user_id) {
            return Ok(progress.clone());
        }

        warn!(user_id, "no progress found, initializing a starter board");
        let progress = empty_progress(date);
        db.user_progress
            .insert(user_id.to_string(), progress.clone());
        self.persist(&db).await?;
        Ok(progress)
    }

    /// Replaces the current day only. History is left exactly as stored.
    pub async fn save_current_day(
        &self,
        user_id: &str,
        record: DailyRecord,
    ) -> Result<(), ServiceError> {
        if record.report.as_ref().is_some_and(|report| !report.is_valid()) {
            return Err(ServiceError::InvalidReport);
        }

        self.mutate(|db| {
            let progress = progress_mut(db, user_id)?;
            widgets::validate_board(&progress.current_day, &record)?;
            progress.current_day = record;
            Ok(())
        })
        .await?;

        debug!(user_id, "current day saved");
        Ok(())
    }

    /// The user's current day, without creating anything for unknown users.
    pub async fn current_day(&self, user_id: &str) -> Result<DailyRecord, ServiceError> {
        let db = self.load().await;
        db.user_progress
            .get(user_id)
            .map(|progress| progress.current_day.clone())
            .ok_or_else(|| ServiceError::UnknownUser(user_id.to_string()))
    }

    /// Stores `report` on the current day, provided that day is still the one
    /// the report was built from: same date, same widgets.
    pub async fn attach_report(
        &self,
        user_id: &str,
        basis: &DailyRecord,
        report: DailyReport,
    ) -> Result<(), ServiceError> {
        if !report.is_valid() {
            return Err(ServiceError::InvalidReport);
        }

        self.mutate(|db| {
            let current = &mut progress_mut(db, user_id)?.current_day;
            if current.date != basis.date || !same_widget_ids(&current.widgets, &basis.widgets) {
                return Err(ServiceError::DayChanged);
            }
            current.report = Some(report);
            Ok(())
        })
        .await
    }

    pub async fn add_widget(&self, user_id: &str, kind: WidgetKind) -> Result<Widget, ServiceError> {
        self.mutate(|db| {
            let progress = progress_mut(db, user_id)?;
            Ok(widgets::add_widget(&mut progress.current_day, kind))
        })
        .await
    }

    pub async fn remove_widget(&self, user_id: &str, widget_id: &str) -> Result<Widget, ServiceError> {
        self.mutate(|db| {
            let progress = progress_mut(db, user_id)?;
            Ok(widgets::remove_widget(&mut progress.current_day, widget_id)?)
        })
        .await
    }

    pub async fn update_widget(
        &self,
        user_id: &str,
        widget_id: &str,
        payload: WidgetPayload,
    ) -> Result<Widget, ServiceError> {
        self.mutate(|db| {
            let progress = progress_mut(db, user_id)?;
            Ok(widgets::update_widget(
                &mut progress.current_day,
                widget_id,
                payload,
            )?)
        })
        .await
    }

    /// Moves the current day into history and starts a fresh day with the
    /// same widgets at their default state. An empty board is refused.
    pub async fn archive_day(&self, user_id: &str) -> Result<UserProgress, ServiceError> {
        self.archive_day_on(user_id, today()).await
    }

    pub async fn archive_day_on(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<UserProgress, ServiceError> {
        let progress = self
            .mutate(|db| {
                let progress = progress_mut(db, user_id)?;
                if progress.current_day.widgets.is_empty() {
                    return Err(ServiceError::EmptyBoard);
                }
                let snapshot = progress.current_day.clone();
                progress.current_day = widgets::reset_day(&snapshot, date);
                progress.history.push(snapshot);
                Ok(progress.clone())
            })
            .await?;

        info!(
            user_id,
            history_len = progress.history.len(),
            "day archived"
        );
        Ok(progress)
    }

    pub async fn history_summary(&self, user_id: &str) -> Result<HistorySummary, ServiceError> {
        let db = self.load().await;
        let progress = db
            .user_progress
            .get(user_id)
            .ok_or_else(|| ServiceError::UnknownUser(user_id.to_string()))?;
        Ok(build_history_summary(&progress.history))
    }
}

fn progress_mut<'a>(db: &'a mut Database, user_id: &str) -> Result<&'a mut UserProgress, ServiceError> {
    db.user_progress
        .get_mut(user_id)
        .ok_or_else(|| ServiceError::UnknownUser(user_id.to_string()))
}

fn same_widget_ids(left: &[Widget], right: &[Widget]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(a, b)| a.id == b.id)
}

fn empty_progress(date: NaiveDate) -> UserProgress {
    UserProgress {
        current_day: widgets::starter_day(date),
        history: Vec::new(),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
