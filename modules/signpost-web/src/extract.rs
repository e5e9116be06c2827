//! HTTP request → `RequestContext`.
//!
//! Query-string parameters always load; form bodies load when the
//! content type says urlencoded or multipart. Multipart file fields
//! are spooled to a scratch directory and surface twice: the original
//! base name as the parameter value, the spooled path as an upload.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::body::to_bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{header, HeaderMap};
use chrono::Utc;
use tempfile::TempDir;
use url::form_urlencoded;
use uuid::Uuid;

use signpost_engine::{Dispatcher, RequestContext};

/// Cap on urlencoded form bodies; multipart streams field by field.
const FORM_BODY_LIMIT: usize = 1024 * 1024;

/// Scratch space for uploaded files. Contents are deleted with the
/// directory when the store is dropped.
pub struct TempStore {
    dir: TempDir,
}

impl TempStore {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Write one upload under a collision-free generated name, keeping
    /// the client file's extension.
    pub fn save(&self, original_name: &str, data: &[u8]) -> io::Result<PathBuf> {
        let mut name = format!("{}-{}", Utc::now().format("%Y%m%d%H%M%S%3f"), Uuid::new_v4());
        if let Some(ext) = Path::new(original_name).extension().and_then(|e| e.to_str()) {
            name.push('.');
            name.push_str(ext);
        }
        let path = self.dir.path().join(name);
        std::fs::write(&path, data)?;
        Ok(path)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

/// The absolute prefix redirects are assembled against, from the Host
/// header and the proxy's forwarded scheme.
pub fn base_path(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{scheme}://{host}")
}

/// Decode the request into a context bound to the dispatcher's
/// session store.
pub async fn build_context(
    dispatcher: &Dispatcher,
    uploads: &TempStore,
    request: Request,
) -> Result<RequestContext> {
    let base = base_path(request.headers());
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let mut ctx = dispatcher.new_context(request.uri().path(), base);
    if let Some(query) = request.uri().query() {
        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            ctx.add_parameter(name.into_owned(), value.into_owned());
        }
    }

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let bytes = to_bytes(request.into_body(), FORM_BODY_LIMIT)
            .await
            .context("reading form body")?;
        for (name, value) in form_urlencoded::parse(&bytes) {
            ctx.add_parameter(name.into_owned(), value.into_owned());
        }
    } else if content_type.starts_with("multipart/form-data") {
        ctx.set_multipart(true);
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| anyhow::anyhow!("reading multipart body: {e}"))?;
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };
            match field.file_name().map(ToString::to_string) {
                Some(file_name) => {
                    let data = field.bytes().await?;
                    let stored = uploads.save(&file_name, &data).context("spooling upload")?;
                    ctx.add_parameter(&name, base_name(&file_name));
                    ctx.add_upload(name, stored);
                }
                None => {
                    let text = field.text().await?;
                    ctx.add_parameter(name, text);
                }
            }
        }
    }

    Ok(ctx)
}

/// Strip any client-side directory part from an uploaded file name.
fn base_name(file_name: &str) -> String {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .to_string()
}
