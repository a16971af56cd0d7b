//! HTTP facade.
//!
//! # Endpoints
//!
//! | Method | Path | Request | Response |
//! |--------|------|---------|----------|
//! | `POST` | `/ask` | `{"question": string}` | `{"answer": string}` |
//! | `POST` | `/add_context` | `{"mia_context": string\|null, "luna_context": string\|null}` | `{"message": string}` |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "backend_unavailable", "message": "..." } }
//! ```
//!
//! Error codes: `bad_request` (400/415/422, malformed body),
//! `backend_unavailable` (503), `backend_error` (502), `internal` (500).
//!
//! # Middleware
//!
//! Every request is logged (method, path, client address and optionally
//! all headers) before it reaches a handler. CORS permits all origins,
//! methods and headers; this is a development policy.

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use pediatrician_core::context::ProfileContext;

use crate::app::AppContext;
use crate::config::ServerConfig;
use crate::error::PediatricianError;
use crate::ingest::AddContextOutcome;

/// Body of `POST /ask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionInput {
    pub question: String,
}

/// Response of `POST /ask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOutput {
    pub answer: String,
}

/// Body of `POST /add_context`. Missing fields are treated as null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextInput {
    pub mia_context: Option<String>,
    pub luna_context: Option<String>,
}

impl ContextInput {
    /// The request fields as named profiles, Mia first.
    pub fn profiles(&self) -> Vec<ProfileContext> {
        vec![
            ProfileContext::new("Mia", self.mia_context.clone()),
            ProfileContext::new("Luna", self.luna_context.clone()),
        ]
    }
}

/// Response of `POST /add_context`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageOutput {
    pub message: String,
}

/// Request-logging settings carried into the middleware.
#[derive(Debug, Clone, Copy)]
struct LogSettings {
    proxy_headers: bool,
    log_headers: bool,
}

/// Build the router with CORS and request logging applied.
pub fn router(ctx: Arc<AppContext>, server: &ServerConfig) -> Router {
    let settings = LogSettings {
        proxy_headers: server.proxy_headers,
        log_headers: server.log_headers,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ask", post(handle_ask))
        .route("/add_context", post(handle_add_context))
        .layer(cors)
        .layer(middleware::from_fn_with_state(settings, log_requests))
        .with_state(ctx)
}

/// Bind to `[server]` host and port and serve until the process exits.
pub async fn run_server(ctx: AppContext, server: &ServerConfig) -> anyhow::Result<()> {
    let bind_addr = server.bind_addr();
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("AI Pediatrician listening on http://{}", bind_addr);
    serve(listener, router(Arc::new(ctx), server)).await
}

/// Serve `app` on an already bound listener, exposing peer addresses to
/// the logging middleware.
pub async fn serve(listener: TcpListener, app: Router) -> anyhow::Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

// ============ Middleware ============

async fn log_requests(State(settings): State<LogSettings>, req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_address(req.headers(), peer, settings.proxy_headers)
        .unwrap_or_else(|| "-".to_string());

    tracing::info!(
        method = %req.method(),
        path = %req.uri().path(),
        client = %client,
        "incoming request"
    );
    if settings.log_headers {
        for (name, value) in req.headers() {
            tracing::info!(
                header = %name,
                value = %String::from_utf8_lossy(value.as_bytes()),
                "request header"
            );
        }
    }

    next.run(req).await
}

/// Resolve the client address, preferring the first `X-Forwarded-For`
/// hop when proxy headers are trusted.
fn client_address(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    proxy_headers: bool,
) -> Option<String> {
    if proxy_headers {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(addr) = forwarded {
            return Some(addr.to_string());
        }
    }
    peer.map(|p| p.to_string())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Error type that converts into a JSON HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError {
            status: rejection.status(),
            code: "bad_request",
            message: rejection.body_text(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        let (status, code) = match err.downcast_ref::<PediatricianError>() {
            Some(PediatricianError::BackendUnavailable { .. }) => {
                (StatusCode::SERVICE_UNAVAILABLE, "backend_unavailable")
            }
            Some(PediatricianError::BackendResponse { .. }) => {
                (StatusCode::BAD_GATEWAY, "backend_error")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        tracing::error!(error = %format!("{:#}", err), code, "request failed");
        AppError {
            status,
            code,
            message: format!("{:#}", err),
        }
    }
}

// ============ POST /ask ============

async fn handle_ask(
    State(ctx): State<Arc<AppContext>>,
    payload: Result<Json<QuestionInput>, JsonRejection>,
) -> Result<Json<AnswerOutput>, AppError> {
    let Json(input) = payload?;
    let answer = ctx.answer(&input.question).await?;
    Ok(Json(AnswerOutput { answer }))
}

// ============ POST /add_context ============

async fn handle_add_context(
    State(ctx): State<Arc<AppContext>>,
    payload: Result<Json<ContextInput>, JsonRejection>,
) -> Result<Json<MessageOutput>, AppError> {
    let Json(input) = payload?;
    let outcome = ctx.add_context(&input.profiles()).await?;
    if let AddContextOutcome::Added(texts) = &outcome {
        tracing::debug!(added = texts.len(), "context entries appended");
    }
    Ok(Json(MessageOutput {
        message: outcome.message().to_string(),
    }))
}
