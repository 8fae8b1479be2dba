//! HTTP dashboard for hclaudit.
//!
//! Serves the embedded single-page dashboard and the JSON API behind it:
//! data-file status, the DTI diagram, a matrix preview and the chat.
//!
//! Built on Axum. One chat session per process.

pub mod api;
pub mod frontend;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::response::Json;
use axum::routing::get;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use hclaudit_assistant::{Assistant, ChatSession};
use hclaudit_config::AppConfig;
use hclaudit_matrix::MatrixStore;

/// Whether the chat may be used.
#[derive(Clone)]
pub enum ChatGate {
    Ready(Arc<Assistant>),
    /// Chat refused; the message is shown to the engineer.
    Blocked(String),
}

impl ChatGate {
    pub fn assistant(&self) -> Option<&Arc<Assistant>> {
        match self {
            Self::Ready(assistant) => Some(assistant),
            Self::Blocked(_) => None,
        }
    }

    pub fn blocked_reason(&self) -> Option<&str> {
        match self {
            Self::Ready(_) => None,
            Self::Blocked(reason) => Some(reason),
        }
    }

    /// Run the startup gate against the current files and credentials.
    async fn evaluate(config: &AppConfig, store: Arc<MatrixStore>) -> Self {
        match Assistant::from_config(config, store).await {
            Ok(assistant) => Self::Ready(Arc::new(assistant)),
            Err(e) => Self::Blocked(e.to_string()),
        }
    }
}

/// Shared application state for the dashboard.
pub struct DashboardState {
    pub config: AppConfig,
    pub store: Arc<MatrixStore>,
    gate: RwLock<ChatGate>,
    /// Held for the whole turn, so concurrent submissions queue in order.
    pub session: Mutex<ChatSession>,
}

pub type SharedState = Arc<DashboardState>;

impl DashboardState {
    pub fn new(config: AppConfig, store: Arc<MatrixStore>, gate: ChatGate) -> Self {
        Self {
            config,
            store,
            gate: RwLock::new(gate),
            session: Mutex::new(ChatSession::new()),
        }
    }

    /// Build the store and run the startup gate.
    ///
    /// A failed gate still yields a state: the dashboard serves the file
    /// status and the reason, and refuses chat.
    pub async fn from_config(config: AppConfig) -> Self {
        let store = Arc::new(MatrixStore::from_config(&config.data));
        let gate = ChatGate::evaluate(&config, store.clone()).await;
        if let Some(reason) = gate.blocked_reason() {
            warn!(reason, "Chat disabled");
        }
        Self::new(config, store, gate)
    }

    /// The current gate.
    ///
    /// A blocked gate is evaluated again on every call, so matrices placed
    /// in the data directory after startup unlock the chat without a
    /// restart. Once ready, the gate stays ready.
    pub async fn gate(&self) -> ChatGate {
        {
            let gate = self.gate.read().await;
            if let ChatGate::Ready(_) = *gate {
                return gate.clone();
            }
        }

        let mut gate = self.gate.write().await;
        if let ChatGate::Blocked(_) = *gate {
            *gate = ChatGate::evaluate(&self.config, self.store.clone()).await;
            match gate.blocked_reason() {
                Some(reason) => debug!(reason, "Chat still disabled"),
                None => info!("Chat enabled"),
            }
        }
        gate.clone()
    }
}

/// Build the full router: dashboard assets, JSON API and health check.
///
/// Layers applied:
/// - CORS limited to the dashboard's own origin
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api::api_router(state))
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origin = format!("http://{}:{}", config.gateway.host, config.gateway.port);
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!(origin = %origin, "Invalid dashboard origin, CORS left closed");
            cors
        }
    }
}

/// Start the dashboard HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = Arc::new(DashboardState::from_config(config).await);
    let ready = state.gate().await.assistant().is_some();
    let app = build_router(state);

    info!(addr = %addr, chat_ready = ready, "Dashboard starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
