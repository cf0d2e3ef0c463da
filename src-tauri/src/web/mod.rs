//! Read-only history viewer served on loopback.
//!
//! `GET /` returns a static page that polls `GET /api/clips`. There are no
//! mutation endpoints.

use std::convert::Infallible;
use std::io;
use std::net::Ipv4Addr;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE, HOST};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::db::{Database, DbError};
use crate::utils::text::age_label;

const VIEWER_HTML: &str = include_str!("viewer.html");

/// One record of the `/api/clips` payload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClipView {
    pub id: i64,
    pub content: String,
    pub created_at: String,
    pub pinned: bool,
    pub time_ago: String,
}

pub fn clip_views(db: &Database, limit: usize, now: DateTime<Utc>) -> Result<Vec<ClipView>, DbError> {
    let clips = db.list(limit, true)?;
    Ok(clips
        .into_iter()
        .map(|clip| ClipView {
            time_ago: age_label(&clip.created_at, now),
            id: clip.id,
            content: clip.content,
            created_at: clip.created_at,
            pinned: clip.pinned,
        })
        .collect())
}

fn respond(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "error": message }).to_string();
    respond(status, "application/json", body)
}

pub fn route(
    method: &Method,
    path: &str,
    db: &Database,
    list_limit: usize,
    now: DateTime<Utc>,
) -> Response<Full<Bytes>> {
    if method != Method::GET {
        return error_response(StatusCode::METHOD_NOT_ALLOWED, "read-only endpoint");
    }

    match path {
        "/" | "/index.html" => respond(StatusCode::OK, "text/html; charset=utf-8", VIEWER_HTML),
        "/api/clips" => match clip_views(db, list_limit, now) {
            Ok(views) => match serde_json::to_vec(&views) {
                Ok(body) => respond(StatusCode::OK, "application/json; charset=utf-8", body),
                Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
            },
            Err(err) => {
                warn!("failed to list clips for web viewer: {err}");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "history unavailable")
            }
        },
        _ => error_response(StatusCode::NOT_FOUND, "not found"),
    }
}

/// Only loopback names are served. Anything else is a page elsewhere
/// reaching the viewer through a rebound DNS name.
pub fn host_allowed(host: Option<&str>, port: u16) -> bool {
    let Some(host) = host else {
        return false;
    };
    let (name, host_port) = match host.rsplit_once(':') {
        Some((name, raw)) if !raw.contains(']') => (name, Some(raw)),
        _ => (host, None),
    };
    let loopback = matches!(
        name.to_ascii_lowercase().as_str(),
        "127.0.0.1" | "localhost" | "[::1]"
    );
    let port_matches = match host_port {
        Some(raw) => raw.parse::<u16>().is_ok_and(|value| value == port),
        None => true,
    };
    loopback && port_matches
}

async fn handle(
    request: Request<Incoming>,
    db: Arc<Database>,
    list_limit: usize,
    port: u16,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let host = request.headers().get(HOST).and_then(|value| value.to_str().ok());
    if !host_allowed(host, port) {
        debug!("rejected web request for host {host:?}");
        return Ok(error_response(StatusCode::FORBIDDEN, "unexpected host"));
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = tokio::task::spawn_blocking(move || route(&method, &path, &db, list_limit, Utc::now()))
        .await
        .unwrap_or_else(|err| {
            error!("web request handler failed: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        });
    Ok(response)
}

pub async fn bind(port: u16) -> io::Result<TcpListener> {
    TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await
}

/// Accepts connections until `shutdown` fires or its sender is dropped.
pub async fn serve(
    listener: TcpListener,
    db: Arc<Database>,
    list_limit: usize,
    mut shutdown: oneshot::Receiver<()>,
) {
    let port = match listener.local_addr() {
        Ok(addr) => {
            info!("web viewer listening on http://{addr}");
            addr.port()
        }
        Err(err) => {
            error!("web viewer has no local address: {err}");
            return;
        }
    };

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(connection) => connection,
                Err(err) => {
                    warn!("failed to accept web connection: {err}");
                    continue;
                }
            },
            _ = &mut shutdown => break,
        };

        let db = Arc::clone(&db);
        tokio::spawn(async move {
            let service = service_fn(move |request| handle(request, Arc::clone(&db), list_limit, port));
            if let Err(err) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!("web connection from {peer} ended: {err}");
            }
        });
    }

    info!("web viewer stopped");
}
