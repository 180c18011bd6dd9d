mod admin;
mod commands;
mod config;
mod middleware;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::info;

use rollcall_engine::{Engine, EngineError};
use rollcall_slack::SlackTransport;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub slash_token: String,
    pub report_window: u32,
}

/// The engine and its transport are blocking; keep them off the runtime.
pub async fn run_blocking<T: Send + 'static>(
    f: impl FnOnce() -> Result<T, EngineError> + Send + 'static,
) -> Result<T, EngineError> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| EngineError::Db(anyhow::anyhow!("blocking task failed: {e}")))?
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "rollcall_server=debug,rollcall_engine=debug,rollcall_db=info,tower_http=debug"
                        .into()
                }),
        )
        .init();

    let config = Config::from_env()?;

    // Init database and transport. The blocking HTTP client cannot be
    // created on a runtime thread, so build it off-runtime.
    let db = Arc::new(rollcall_db::Database::open(&config.db_path)?);
    let transport = {
        let (token, name, icon) = (
            config.bot_token.clone(),
            config.bot_name.clone(),
            config.bot_icon.clone(),
        );
        Arc::new(tokio::task::spawn_blocking(move || SlackTransport::new(token, name, icon)).await??)
    };

    let engine = Arc::new(Engine::new(db, transport, config.engine_config()));
    let state = AppState {
        engine,
        slash_token: config.slash_token.clone(),
        report_window: config.report_window,
    };

    // Slash commands carry their own verification token in the form body.
    let command_routes = Router::new()
        .route("/commands/here", post(commands::here))
        .route("/commands/absent", post(commands::absent))
        .route("/commands/attendance", post(commands::attendance))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/admin/publish", post(admin::publish))
        .route("/admin/reconcile", post(admin::reconcile))
        .route("/admin/sync", post(admin::sync))
        .route("/admin/ignore", post(admin::set_ignore))
        .route("/admin/report", get(admin::report))
        .route("/admin/roster", get(admin::roster))
        .route("/admin/attendance", get(admin::attendance))
        .route("/admin/members/{member_id}", get(admin::member_info))
        .layer(from_fn_with_state(state.clone(), middleware::require_admin_token))
        .with_state(state);

    let app = Router::new()
        .route("/", get(|| async { "Attendance bot is running and ready." }))
        .merge(command_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Rollcall server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
