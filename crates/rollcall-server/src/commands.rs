//! Slash-command endpoints. This layer only parses "Name, DD/MM/YY" text,
//! calls into the engine, and renders human-readable replies — all
//! attendance semantics live in rollcall-engine.

use axum::{Form, Json, extract::State, http::StatusCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use rollcall_engine::{DATE_FORMAT, EngineError};

use crate::AppState;

pub const HELP_TEXT: &str = "I am the attendance bot! :robot_face::memo:\n\
    Type /here or /absent followed by full name and date as DD/MM/YY, \
    separated by a comma. e.g.:\n\
    /here Ada Lovelace, 31/10/16\n\
    /absent Grace Hopper, 02/01/17\n\
    Type /attendance report for the absence report.";

/// Form payload of a slash command. Only the verification token and the
/// free text matter; the rest of Slack's fields are ignored.
#[derive(Debug, Deserialize)]
pub struct SlashPayload {
    pub token: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SlashReply {
    pub response_type: &'static str,
    pub text: String,
}

impl SlashReply {
    fn ephemeral(text: impl Into<String>) -> Json<Self> {
        Json(Self {
            response_type: "ephemeral",
            text: text.into(),
        })
    }
}

pub async fn here(
    State(state): State<AppState>,
    Form(payload): Form<SlashPayload>,
) -> Result<Json<SlashReply>, StatusCode> {
    record(state, payload, true).await
}

pub async fn absent(
    State(state): State<AppState>,
    Form(payload): Form<SlashPayload>,
) -> Result<Json<SlashReply>, StatusCode> {
    record(state, payload, false).await
}

pub async fn attendance(
    State(state): State<AppState>,
    Form(payload): Form<SlashPayload>,
) -> Result<Json<SlashReply>, StatusCode> {
    check_token(&state, &payload)?;
    if !payload.text.contains("report") {
        return Ok(SlashReply::ephemeral(HELP_TEXT));
    }

    let engine = state.engine.clone();
    let names = crate::run_blocking(move || engine.absent_streak(None))
        .await
        .map_err(internal)?;
    Ok(SlashReply::ephemeral(format_absence_report(
        &names,
        state.report_window,
    )))
}

async fn record(
    state: AppState,
    payload: SlashPayload,
    present: bool,
) -> Result<Json<SlashReply>, StatusCode> {
    check_token(&state, &payload)?;

    if payload.text.trim().is_empty() || payload.text.contains("help") {
        return Ok(SlashReply::ephemeral(HELP_TEXT));
    }
    let Some((name, date)) = parse_attendance_text(&payload.text) else {
        return Ok(SlashReply::ephemeral(HELP_TEXT));
    };

    let engine = state.engine.clone();
    let reply_name = name.clone();
    let result = crate::run_blocking(move || engine.record_attendance(&name, date, present)).await;

    match result {
        Ok(()) => Ok(SlashReply::ephemeral(format!(
            "Thanks! I have updated attendance for {} on {}. :thumbsup:",
            reply_name,
            date.format(DATE_FORMAT)
        ))),
        Err(err) => match user_message(&err) {
            Some(text) => Ok(SlashReply::ephemeral(text)),
            None => Err(internal(err)),
        },
    }
}

fn check_token(state: &AppState, payload: &SlashPayload) -> Result<(), StatusCode> {
    if payload.token != state.slash_token {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(())
}

fn internal(err: EngineError) -> StatusCode {
    warn!(%err, "command failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

/// "Ada Lovelace, 31/10/16" → (name, date). None on any malformed input;
/// the caller answers with the help text.
pub fn parse_attendance_text(text: &str) -> Option<(String, NaiveDate)> {
    let (name, date) = text.split_once(',')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).ok()?;
    Some((name.to_string(), date))
}

/// User-facing rendering for errors the member themselves can act on.
/// Anything else is an internal failure.
fn user_message(err: &EngineError) -> Option<String> {
    match err {
        EngineError::MemberNotFound(_) => {
            Some("Sorry, I couldn't find anyone with that name. :confused:".into())
        }
        EngineError::AmbiguousName(name) => Some(format!(
            "More than one member is called {name} — please ask an admin to record this one."
        )),
        EngineError::OccurrenceNotFound(date) => {
            Some(format!("I don't have a rehearsal recorded for {date}."))
        }
        EngineError::AttendanceNotRecorded { name, date } => Some(format!(
            "{name} wasn't on the roster when the {date} prompt went out."
        )),
        _ => None,
    }
}

pub fn format_absence_report(names: &[String], window: u32) -> String {
    if names.is_empty() {
        return format!(
            "Everyone has reacted to at least one of the last {window} rehearsal prompts. :tada:"
        );
    }
    let mut out = format!(
        "The following members have been absent for the last {window} rehearsals:"
    );
    for name in names {
        out.push('\n');
        out.push_str(name);
    }
    out
}
