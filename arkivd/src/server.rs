//! HTTP surface of the archiver daemon.
//!
//! Two archiving routes differ only in their resolver/executor pair; both
//! share one registry and one store. The archive namespace itself is exposed
//! read-only under `/fs`.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arkiv_engine::{CoordinateError, Coordinator, Disposition, Identity, ResolveError};
use axum::Router;
use axum::body::Body;
use axum::extract::{ConnectInfo, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared state for the request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Probe-based resolution + external downloader
    pub media: Arc<Coordinator>,
    /// Path-derived resolution + generic HTTP fetch
    pub direct: Arc<Coordinator>,
    pub allow_list: Arc<Vec<IpAddr>>,
}

pub fn router(state: AppState, archive_root: PathBuf) -> Router {
    Router::new()
        .route("/", get(archive_direct))
        .route("/media", get(archive_media))
        .nest_service("/fs", ServeDir::new(archive_root))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            allow_list_filter,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Admits only configured client addresses; everyone else is turned away
/// before any handler runs.
async fn allow_list_filter(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if !state.allow_list.contains(&peer.ip()) {
        return (StatusCode::FORBIDDEN, "Access Forbidden").into_response();
    }
    next.run(request).await
}

#[derive(Debug, Deserialize)]
struct ArchiveQuery {
    url: Option<String>,
}

async fn archive_media(
    State(state): State<AppState>,
    Query(query): Query<ArchiveQuery>,
) -> Response {
    archive(&state.media, query).await
}

async fn archive_direct(
    State(state): State<AppState>,
    Query(query): Query<ArchiveQuery>,
) -> Response {
    archive(&state.direct, query).await
}

async fn archive(coordinator: &Coordinator, query: ArchiveQuery) -> Response {
    let Some(url) = query.url else {
        return (StatusCode::BAD_REQUEST, "Missing 'url' query param").into_response();
    };

    match coordinator.handle(&url).await {
        Ok(Disposition::Ready { identity, path }) => serve_artifact(&identity, &path).await,
        Ok(Disposition::Processing { identity }) => (
            StatusCode::OK,
            format!("File '{identity}' is being processed"),
        )
            .into_response(),
        Err(e) => coordinate_error_response(e),
    }
}

async fn serve_artifact(identity: &Identity, path: &Path) -> Response {
    match tokio::fs::File::open(path).await {
        Ok(file) => {
            let body = Body::from_stream(ReaderStream::new(file));
            (
                [
                    (
                        header::CONTENT_TYPE,
                        "application/octet-stream".to_string(),
                    ),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("inline; filename=\"{identity}\""),
                    ),
                ],
                body,
            )
                .into_response()
        }
        Err(e) => {
            error!(identity = %identity, error = %e, "failed to open artifact");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error reading artifact").into_response()
        }
    }
}

fn coordinate_error_response(err: CoordinateError) -> Response {
    let status = match &err {
        // The probe is an upstream collaborator; its failures are not the
        // client's fault.
        CoordinateError::Resolve(ResolveError::ProbeSpawn(_) | ResolveError::ProbeFailed { .. }) => {
            StatusCode::BAD_GATEWAY
        }
        CoordinateError::Resolve(_) => StatusCode::BAD_REQUEST,
        CoordinateError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!(error = %err, "request failed");
    (status, err.to_string()).into_response()
}
