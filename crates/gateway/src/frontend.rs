//! Embedded dashboard assets.
//!
//! The dashboard's HTML, CSS and JS from `frontend/` are compiled into the
//! binary with `include_str!`, so the server ships as a single file.

use axum::{
    Router,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};

const INDEX_HTML: &str = include_str!("../../../frontend/index.html");
const STYLE_CSS: &str = include_str!("../../../frontend/style.css");
const APP_JS: &str = include_str!("../../../frontend/app.js");

/// Routes for the dashboard page and its static files.
pub fn frontend_router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/static/style.css", get(|| asset(STYLE_CSS, "text/css; charset=utf-8")))
        .route(
            "/static/app.js",
            get(|| asset(APP_JS, "application/javascript; charset=utf-8")),
        )
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn asset(body: &'static str, content_type: &'static str) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}
