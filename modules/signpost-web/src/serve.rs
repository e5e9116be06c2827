//! Router wiring: one catch-all handler splits traffic on the
//! configured suffixes and everything else is served as a page file.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use signpost_engine::Dispatcher;

use crate::cookie;
use crate::extract::{self, TempStore};
use crate::respond::{self, PageWriter};

/// Everything one site needs to answer requests: the wired dispatcher,
/// the pages root forwards resolve against, and upload scratch space.
pub struct SiteServer {
    dispatcher: Dispatcher,
    pages_root: PathBuf,
    uploads: TempStore,
}

impl SiteServer {
    pub fn new(dispatcher: Dispatcher, pages_root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        Ok(Self {
            dispatcher,
            pages_root: pages_root.into(),
            uploads: TempStore::new()?,
        })
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

pub fn router(server: Arc<SiteServer>) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(server)
        // method + path only; parameters may carry form input
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}

/// Bind and serve until the task is dropped.
pub async fn serve(server: Arc<SiteServer>, addr: &str) -> anyhow::Result<()> {
    let app = router(server);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("signpost serving on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn dispatch(State(server): State<Arc<SiteServer>>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    let mappings = server.dispatcher.mappings();
    if path.ends_with(mappings.page_suffix()) {
        run(&server, request, false).await
    } else if path.ends_with(mappings.direct_suffix()) {
        run(&server, request, true).await
    } else {
        respond::serve_page(&server.pages_root, &path).await
    }
}

async fn run(server: &SiteServer, request: Request, direct: bool) -> Response {
    // resolve the cookie before the body is consumed
    let session = cookie::session_id(request.headers())
        .and_then(|id| server.dispatcher.sessions().resolve(id));

    let mut ctx = match extract::build_context(&server.dispatcher, &server.uploads, request).await {
        Ok(ctx) => ctx,
        Err(e) => {
            warn!(error = %e, "request decode failed");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    if let Some(session) = session {
        ctx.set_session(session);
    }

    let mut writer = PageWriter::new(&server.pages_root);
    let handled = if direct {
        server.dispatcher.handle_direct(&mut ctx, &mut writer).await
    } else {
        server.dispatcher.handle_page(&mut ctx, &mut writer).await
    };

    let mut response = match handled {
        Ok(()) => writer.into_response(),
        Err(err) => respond::error_response(&err),
    };

    // a session minted during this request goes back in a cookie
    if ctx.fresh_session() {
        if let Some(session) = ctx.session() {
            if let Ok(value) = HeaderValue::from_str(&cookie::session_cookie(session.id())) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
    }
    response
}
