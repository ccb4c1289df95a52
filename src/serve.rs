//! Local preview server for a built site.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse as _, Response};
use axum::routing::get;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::cli::ServeArgs;
use crate::detail::{self, ModalState};
use crate::html::error_block;
use crate::markdown::LinkMode;
use crate::source::{FsSource, MarkdownSource};

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn MarkdownSource>,
    pub link_mode: LinkMode,
}

pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let site_dir = PathBuf::from(&args.site);
    if !site_dir.is_dir() {
        anyhow::bail!("site directory not found: {}", site_dir.display());
    }
    let addr: SocketAddr = args
        .addr
        .parse()
        .with_context(|| format!("parse listen address: {}", args.addr))?;

    let state = AppState {
        source: Arc::new(FsSource::new(&args.data)),
        link_mode: args.link_mode,
    };
    let app = router(state, site_dir);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {addr}: {err}"))?;
    tracing::info!(addr = %addr, site = %args.site, data = %args.data, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: AppState, site_dir: PathBuf) -> Router {
    let not_found = site_dir.join("404.html");
    let static_files = ServeDir::new(site_dir).not_found_service(ServeFile::new(not_found));

    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/fragments/*path", get(fragment))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Render `<path>` (without the trailing `.html`) from the content root.
async fn fragment(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    let Some(markdown_path) = path.strip_suffix(".html") else {
        return (StatusCode::NOT_FOUND, Html(error_block(detail::MODAL_LOAD_ERROR))).into_response();
    };

    match detail::load_fragment(state.source.as_ref(), markdown_path, state.link_mode).await {
        ModalState::Loaded { html, .. } => Html(html).into_response(),
        ModalState::Error { message, .. } => {
            (StatusCode::NOT_FOUND, Html(error_block(&message))).into_response()
        }
        ModalState::Closed | ModalState::Loading { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
