use crate::errors::AppError;
use crate::models::{
    AddWidgetRequest, DailyRecord, DailyReport, HistorySummary, LoginRequest, LogoutRequest,
    SignupRequest, UserProfile, UserProgress, Widget, WidgetPayload, WidgetTypeInfo,
};
use crate::report::generate_daily_report;
use crate::state::AppState;
use crate::widgets::catalog;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() || email.is_empty() || payload.credential.is_empty() {
        return Err(AppError::bad_request("name, email and password are required"));
    }

    let user = state
        .service
        .create_account(name, email, &payload.credential)
        .await?;
    let profile = user.profile();
    state.sessions.save(profile.clone()).await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let user = state
        .service
        .authenticate(payload.email.trim(), &payload.credential)
        .await?;
    let profile = user.profile();
    state.sessions.save(profile.clone()).await?;

    Ok(Json(profile))
}

pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<LogoutRequest>,
) -> Result<StatusCode, AppError> {
    state.service.logout(&payload.user_id).await?;
    state.sessions.clear_for(&payload.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_session(State(state): State<AppState>) -> Response {
    match state.sessions.load().await.user {
        Some(profile) => Json(profile).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

pub async fn widget_types() -> Json<Vec<WidgetTypeInfo>> {
    Json(catalog())
}

pub async fn get_progress(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProgress>, AppError> {
    Ok(Json(state.service.get_progress(&user_id).await?))
}

pub async fn save_current_day(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(record): Json<DailyRecord>,
) -> Result<StatusCode, AppError> {
    state.service.save_current_day(&user_id, record).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Held off while a report for the same board is being generated, so the
/// report can't land on the freshly reset day.
pub async fn archive_day(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProgress>, AppError> {
    let _slot = state
        .begin_report(&user_id)
        .ok_or_else(|| AppError::conflict("a report is being generated for this board"))?;

    Ok(Json(state.service.archive_day(&user_id).await?))
}

pub async fn add_widget(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<AddWidgetRequest>,
) -> Result<(StatusCode, Json<Widget>), AppError> {
    let widget = state.service.add_widget(&user_id, payload.kind).await?;
    Ok((StatusCode::CREATED, Json(widget)))
}

pub async fn update_widget(
    State(state): State<AppState>,
    Path((user_id, widget_id)): Path<(String, String)>,
    Json(payload): Json<WidgetPayload>,
) -> Result<Json<Widget>, AppError> {
    let widget = state
        .service
        .update_widget(&user_id, &widget_id, payload)
        .await?;
    Ok(Json(widget))
}

pub async fn remove_widget(
    State(state): State<AppState>,
    Path((user_id, widget_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    state.service.remove_widget(&user_id, &widget_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn generate_report(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DailyReport>, AppError> {
    let _slot = state
        .begin_report(&user_id)
        .ok_or_else(|| AppError::conflict("a report is already being generated for this board"))?;

    let day = state.service.current_day(&user_id).await?;
    let report = generate_daily_report(state.reports.as_ref(), &day.widgets).await;
    state
        .service
        .attach_report(&user_id, &day, report.clone())
        .await?;

    info!(user_id = %user_id, score = report.score, "daily report attached");
    Ok(Json(report))
}

pub async fn history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<HistorySummary>, AppError> {
    Ok(Json(state.service.history_summary(&user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportError, ReportGenerator};
    use crate::service::PlannerService;
    use crate::session::SessionStore;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Signals when generation starts, then waits to be released.
    struct Gated {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl ReportGenerator for Gated {
        async fn generate(&self, widgets: &[Widget]) -> Result<DailyReport, ReportError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(DailyReport {
                summary: format!("{} widgets tracked", widgets.len()),
                score: 70,
                tips: vec!["a".into(), "b".into(), "c".into()],
            })
        }
    }

    fn state(reports: Arc<dyn ReportGenerator>) -> AppState {
        AppState::new(
            PlannerService::new(Arc::new(MemoryStore::new())),
            SessionStore::new(Arc::new(MemoryStore::new())),
            reports,
        )
    }

    fn signup_request(email: &str) -> SignupRequest {
        SignupRequest {
            name: "Ada".to_string(),
            email: email.to_string(),
            credential: "pw".to_string(),
        }
    }

    #[tokio::test]
    async fn archive_waits_for_running_report() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let state = state(Arc::new(Gated {
            started: started.clone(),
            release: release.clone(),
        }));
        let (_, Json(user)) = signup(State(state.clone()), Json(signup_request("ada@example.com")))
            .await
            .unwrap();

        let pending = tokio::spawn(generate_report(State(state.clone()), Path(user.id.clone())));
        started.notified().await;

        let err = archive_day(State(state.clone()), Path(user.id.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        release.notify_one();
        let Json(report) = pending.await.unwrap().unwrap();

        let progress = state.service.get_progress(&user.id).await.unwrap();
        assert!(progress.history.is_empty());
        assert_eq!(progress.current_day.report, Some(report.clone()));

        let Json(archived) = archive_day(State(state.clone()), Path(user.id.clone()))
            .await
            .unwrap();
        assert_eq!(archived.history[0].report, Some(report));
        assert!(archived.current_day.report.is_none());
    }

    #[tokio::test]
    async fn report_for_unknown_user_is_not_found() {
        let state = state(Arc::new(Gated {
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }));

        let err = generate_report(State(state.clone()), Path("ghost".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(!state.service.load().await.user_progress.contains_key("ghost"));
    }

    #[tokio::test]
    async fn logout_keeps_another_users_session() {
        let state = state(Arc::new(Gated {
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }));
        let (_, Json(first)) = signup(State(state.clone()), Json(signup_request("ada@example.com")))
            .await
            .unwrap();
        let (_, Json(second)) = signup(State(state.clone()), Json(signup_request("bob@example.com")))
            .await
            .unwrap();

        let request = LogoutRequest { user_id: first.id.clone() };
        logout(State(state.clone()), Json(request)).await.unwrap();
        assert_eq!(state.sessions.load().await.user.map(|u| u.id), Some(second.id.clone()));

        let request = LogoutRequest { user_id: second.id };
        logout(State(state.clone()), Json(request)).await.unwrap();
        assert!(state.sessions.load().await.user.is_none());
    }
}
