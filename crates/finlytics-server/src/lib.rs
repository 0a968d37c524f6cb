//! Finlytics Web Server
//!
//! Axum-based REST API for the Finlytics personal finance application.
//!
//! - First-party bearer sessions: sign-up/sign-in issue opaque tokens, a
//!   middleware resolves the owner once per request and threads it through
//!   as an explicit `Extension<User>` (never ambient global state)
//! - Restrictive CORS policy and standard security headers
//! - Sanitized error responses: validation and auth failures carry a
//!   user-facing message, everything else is logged and returned generic

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use finlytics_core::db::Database;

mod handlers;

/// Authorization header for bearer session tokens
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
}

/// The session token a request authenticated with, kept around so sign-out
/// can revoke it.
#[derive(Clone)]
pub struct SessionToken(pub String);

/// Authentication middleware - resolves the bearer token to its owner.
///
/// On success the owner and token are inserted into the request extensions;
/// handlers receive them as `Extension<User>` / `Extension<SessionToken>`.
/// Anything else is a 401 before the handler runs.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let token = match token {
        Some(token) => token.to_string(),
        None => {
            warn!(path = %request.uri().path(), "Unauthorized request - missing bearer token");
            return unauthorized_response();
        }
    };

    match state.db.current_session(&token) {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
            request.extensions_mut().insert(SessionToken(token));
            next.run(request).await
        }
        Ok(None) => {
            warn!(path = %request.uri().path(), "Unauthorized request - invalid or expired session");
            unauthorized_response()
        }
        Err(e) => {
            error!(error = %e, "Session lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "An internal error occurred" })),
            )
                .into_response()
        }
    }
}

fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "Authentication required" })),
    )
        .into_response()
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(db: Database, static_dir: Option<&str>, config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    // Sign-up and sign-in are the only unauthenticated endpoints.
    let public_routes = Router::new()
        .route("/auth/signup", post(handlers::sign_up))
        .route("/auth/signin", post(handlers::sign_in));

    let protected_routes = Router::new()
        // Auth / profile
        .route("/auth/signout", post(handlers::sign_out))
        .route("/me", get(handlers::get_me).delete(handlers::delete_account))
        .route("/me/settings", put(handlers::update_settings))
        .route("/me/password", put(handlers::update_password))
        // Records
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/categories", get(handlers::list_categories))
        .route(
            "/balances",
            get(handlers::list_balances).post(handlers::create_balance),
        )
        // Aggregated views
        .route("/dashboard", get(handlers::get_dashboard))
        .route(
            "/analytics/category-trend",
            get(handlers::category_trend),
        )
        .route("/analytics/insights", get(handlers::category_insights))
        // Assistant
        .route(
            "/chat",
            get(handlers::chat_info).post(handlers::chat_message),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = public_routes.merge(protected_routes);

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    // Security headers
    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' blob: data:; font-src 'self'; connect-src 'self'; frame-ancestors 'none'",
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
) -> anyhow::Result<()> {
    serve_with_config(db, host, port, static_dir, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    // Drop sessions that expired while the server was down
    match db.sweep_expired_sessions() {
        Ok(count) if count > 0 => {
            info!("Swept {} expired session(s)", count);
        }
        Ok(_) => {}
        Err(e) => {
            warn!("Failed to sweep expired sessions: {}", e);
        }
    }

    let app = create_router(db, static_dir, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn conflict(msg: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<finlytics_core::Error> for AppError {
    fn from(err: finlytics_core::Error) -> Self {
        use finlytics_core::Error;

        match err {
            // Data-quality and caller errors carry their message to the
            // client.
            Error::InvalidData(msg) => Self::bad_request(&msg),
            Error::NotFound(msg) => Self::not_found(&msg),
            Error::Auth(msg) => Self::unauthorized(&msg),
            Error::Conflict(msg) => Self::conflict(&msg),
            // Store faults get a generic message; the cause is logged.
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "An internal error occurred".to_string(),
                internal: Some(anyhow::Error::new(other)),
            },
        }
    }
}
