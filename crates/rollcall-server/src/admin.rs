//! Admin endpoints: the externally-triggered scheduler entry points
//! (publish/reconcile/sync) plus roster management and the JSON report.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::error;

use rollcall_engine::{AttendanceSheet, DATE_FORMAT, EngineError, ReconcileOutcome};
use rollcall_types::{Member, MemberInfo};

use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PublishRequest {
    /// DD/MM/YY. Omitted: the date is derived from the post timestamp.
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub post_id: String,
}

pub async fn publish(
    State(state): State<AppState>,
    body: Option<Json<PublishRequest>>,
) -> Result<Json<PublishResponse>, StatusCode> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let date = match req.date {
        Some(text) => Some(
            NaiveDate::parse_from_str(&text, DATE_FORMAT)
                .map_err(|_| StatusCode::BAD_REQUEST)?,
        ),
        None => None,
    };

    let engine = state.engine.clone();
    let post_id = crate::run_blocking(move || engine.publish(date))
        .await
        .map_err(status)?;
    Ok(Json(PublishResponse { post_id }))
}

pub async fn reconcile(
    State(state): State<AppState>,
) -> Result<Json<ReconcileOutcome>, StatusCode> {
    let engine = state.engine.clone();
    let outcome = crate::run_blocking(move || engine.reconcile())
        .await
        .map_err(status)?;
    Ok(Json(outcome))
}

pub async fn sync(State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    let engine = state.engine.clone();
    crate::run_blocking(move || engine.sync())
        .await
        .map_err(status)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct IgnoreRequest {
    pub member_id: String,
    pub ignored: bool,
}

pub async fn set_ignore(
    State(state): State<AppState>,
    Json(req): Json<IgnoreRequest>,
) -> Result<StatusCode, StatusCode> {
    let engine = state.engine.clone();
    crate::run_blocking(move || engine.set_ignore(&req.member_id, req.ignored))
        .await
        .map_err(status)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub window: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub window: u32,
    pub absent: Vec<String>,
}

pub async fn report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportResponse>, StatusCode> {
    let window = query.window.unwrap_or(state.report_window);
    let engine = state.engine.clone();
    let absent = crate::run_blocking(move || engine.absent_streak(Some(window)))
        .await
        .map_err(status)?;
    Ok(Json(ReportResponse { window, absent }))
}

pub async fn roster(State(state): State<AppState>) -> Result<Json<Vec<Member>>, StatusCode> {
    let engine = state.engine.clone();
    let members = crate::run_blocking(move || engine.roster())
        .await
        .map_err(status)?;
    Ok(Json(members))
}

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    /// DD/MM/YY. Omitted: the latest occurrence.
    pub date: Option<String>,
}

pub async fn attendance(
    State(state): State<AppState>,
    Query(query): Query<AttendanceQuery>,
) -> Result<Json<AttendanceSheet>, StatusCode> {
    let date = match query.date {
        Some(text) => Some(
            NaiveDate::parse_from_str(&text, DATE_FORMAT)
                .map_err(|_| StatusCode::BAD_REQUEST)?,
        ),
        None => None,
    };

    let engine = state.engine.clone();
    let sheet = crate::run_blocking(move || engine.attendance(date))
        .await
        .map_err(status)?;
    sheet.map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn member_info(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> Result<Json<MemberInfo>, StatusCode> {
    let engine = state.engine.clone();
    let info = crate::run_blocking(move || engine.member_info(&member_id))
        .await
        .map_err(status)?;
    Ok(Json(info))
}

fn status(err: EngineError) -> StatusCode {
    match &err {
        EngineError::MemberNotFound(_) | EngineError::OccurrenceNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        EngineError::AmbiguousName(_) | EngineError::AttendanceNotRecorded { .. } => {
            StatusCode::CONFLICT
        }
        EngineError::DirectoryFetch(_) | EngineError::Transport(_) => {
            error!(%err, "transport failure");
            StatusCode::BAD_GATEWAY
        }
        EngineError::Db(_) => {
            error!(%err, "store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
