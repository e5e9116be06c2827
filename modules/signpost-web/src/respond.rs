//! Terminal responses: page forwards, redirects, direct payloads, and
//! the error → status mapping.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use tracing::error;

use signpost_core::DispatchError;
use signpost_engine::ResponseWriter;

/// Collects the one terminal response of a request.
///
/// Forwards are served by reading the destination page from the pages
/// root, the container-side include this host supports. Redirects are
/// 303s so a form POST lands on a GET.
pub struct PageWriter {
    pages_root: PathBuf,
    response: Option<Response>,
}

impl PageWriter {
    pub fn new(pages_root: impl Into<PathBuf>) -> Self {
        Self {
            pages_root: pages_root.into(),
            response: None,
        }
    }

    /// The collected response. A pipeline that completed without
    /// writing anything is a bug surfaced as a 500.
    pub fn into_response(self) -> Response {
        self.response
            .unwrap_or_else(|| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }
}

#[async_trait]
impl ResponseWriter for PageWriter {
    async fn redirect(&mut self, url: &str) -> Result<()> {
        self.response = Some(Redirect::to(url).into_response());
        Ok(())
    }

    async fn forward(&mut self, destination: &str) -> Result<()> {
        let path = page_path(&self.pages_root, destination)
            .ok_or_else(|| anyhow!("refusing page path {destination}"))?;
        let body = tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading page {}", path.display()))?;
        self.response = Some(page_response(&path, body));
        Ok(())
    }

    async fn send_direct(&mut self, content_type: &str, body: &[u8]) -> Result<()> {
        self.response =
            Some(([(header::CONTENT_TYPE, content_type)], body.to_vec()).into_response());
        Ok(())
    }
}

/// Map a destination onto the pages root. Traversal segments and empty
/// destinations resolve to nothing.
pub(crate) fn page_path(root: &Path, destination: &str) -> Option<PathBuf> {
    let trimmed = destination.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.split(['/', '\\']).any(|seg| seg == "..") {
        return None;
    }
    Some(root.join(trimmed))
}

fn page_response(path: &Path, body: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, content_type_for(path))], body).into_response()
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Serve a file under the pages root, for requests outside the two
/// dispatch suffixes. Anything unreadable is a plain 404.
pub async fn serve_page(root: &Path, request_path: &str) -> Response {
    let Some(path) = page_path(root, request_path) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match tokio::fs::read(&path).await {
        Ok(body) => page_response(&path, body),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

/// One place turns pipeline errors into HTTP responses, logged with
/// their stable code.
pub fn error_response(err: &DispatchError) -> Response {
    let status = match err {
        DispatchError::ActionNameUnresolved { .. } | DispatchError::ActionNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        DispatchError::SessionExpired => StatusCode::UNAUTHORIZED,
        DispatchError::MalformedModelPath { .. }
        | DispatchError::NoSuchField { .. }
        | DispatchError::ValueConversion { .. }
        | DispatchError::CharConversion { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!(code = err.code(), error = %err, "request dispatch failed");
    (status, format!("error {}: {err}", err.code())).into_response()
}
