//! Integration tests for the HTTP host: suffix routing, session
//! cookies, page serving and error statuses, driven through the router
//! in-memory.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;

use signpost_core::mappings_from_toml;
use signpost_engine::testing::{EchoAction, Person};
use signpost_engine::{
    Action, ActionRegistry, Dispatcher, ModelRegistry, ModelTypes, Outcome, RequestContext,
};
use signpost_web::{router, SiteServer};

// ---------------------------------------------------------------------------
// Site mappings
// ---------------------------------------------------------------------------

const SITE: &str = r#"
    [[actions]]
    path = "hello"
    type = "HelloAction"

    [[actions.forwards]]
    name = "shown"
    path = "/welcome.html"

    [[actions.forwards]]
    name = "redirected"
    path = "/welcome.html"
    redirect = true

    [[actions]]
    path = "count"
    type = "CountAction"

    [[models]]
    name = "person"
    type = "Person"
    scope = "request"

    [[models]]
    name = "visits"
    type = "Person"
    scope = "session"
"#;

const DIRECT: &str = r#"
    [[actions]]
    path = "ping"
    type = "EchoAction"
"#;

// ---------------------------------------------------------------------------
// Hello action: greets a populated person, else shows the page
// ---------------------------------------------------------------------------

struct HelloAction {
    path: String,
}

#[async_trait]
impl Action for HelloAction {
    fn path(&self) -> &str {
        &self.path
    }

    async fn execute(
        &mut self,
        ctx: &mut RequestContext,
        models: &ModelRegistry,
    ) -> Result<Outcome> {
        let name = models.with_model::<Person, _>(ctx, "person", |p| p.name.clone())?;
        if !name.is_empty() {
            return Ok(Outcome::direct("text/plain", format!("hello {name}")));
        }
        if ctx.parameter("via").is_some() {
            Ok(Outcome::forward("redirected"))
        } else {
            Ok(Outcome::forward("shown"))
        }
    }
}

// ---------------------------------------------------------------------------
// Count action: bumps a session-scoped counter
// ---------------------------------------------------------------------------

struct CountAction {
    path: String,
}

#[async_trait]
impl Action for CountAction {
    fn path(&self) -> &str {
        &self.path
    }

    async fn execute(
        &mut self,
        ctx: &mut RequestContext,
        models: &ModelRegistry,
    ) -> Result<Outcome> {
        let count = models.with_model::<Person, _>(ctx, "visits", |p| {
            p.age += 1;
            p.age
        })?;
        Ok(Outcome::direct("text/plain", count.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

fn pages() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("welcome.html"), "<h1>welcome</h1>").unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>index</h1>").unwrap();
    dir
}

fn app(pages_root: &Path) -> Router {
    let mappings = mappings_from_toml(SITE, Some(DIRECT)).unwrap();

    let mut actions = ActionRegistry::new();
    actions.register("HelloAction", |path, _ctx| {
        Ok(Box::new(HelloAction {
            path: path.to_string(),
        }) as Box<dyn Action>)
    });
    actions.register("CountAction", |path, _ctx| {
        Ok(Box::new(CountAction {
            path: path.to_string(),
        }) as Box<dyn Action>)
    });
    actions.register("EchoAction", |path, _ctx| {
        Ok(Box::new(EchoAction::new(path)) as Box<dyn Action>)
    });

    let mut types = ModelTypes::new();
    types.register::<Person>("Person");

    let dispatcher = Dispatcher::new(mappings, actions, types);
    router(Arc::new(SiteServer::new(dispatcher, pages_root).unwrap()))
}

async fn body_of(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn cookie_of(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn forward_serves_the_page_and_mints_a_session() {
    let dir = pages();
    let app = app(dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/hello.act")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/html; charset=utf-8"
    );
    // the history push created a session, so a cookie comes back
    assert!(cookie_of(&response).starts_with("signpost_sid="));
    assert_eq!(body_of(response).await, "<h1>welcome</h1>");
}

#[tokio::test]
async fn redirect_is_absolute_against_the_host_header() {
    let dir = pages();
    let app = app(dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/hello.act?via=1")
                .header(header::HOST, "example.org")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "http://example.org/welcome.html"
    );
}

#[tokio::test]
async fn form_post_populates_the_model() {
    let dir = pages();
    let app = app(dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/hello.act")
                .method("POST")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("%23person.name=ada"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_of(response).await, "hello ada");
}

#[tokio::test]
async fn session_counter_persists_via_the_cookie() {
    let dir = pages();
    let app = app(dir.path());

    // first request mints the session
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/hello.act")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let cookie = cookie_of(&response);

    for expected in ["1", "2", "3"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/count.act")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await, expected);
    }
}

#[tokio::test]
async fn populating_session_scope_without_a_cookie_is_401() {
    let dir = pages();
    let app = app(dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/count.act")
                .method("POST")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("%23visits.age=5"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn direct_suffix_routes_to_the_direct_table() {
    let dir = pages();
    let app = app(dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ping.ajx?q=pong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain"
    );
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_of(response).await, "pong");
}

#[tokio::test]
async fn unknown_actions_are_404() {
    let dir = pages();
    let app = app(dir.path());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/ghost.act")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/hello.ajx")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn other_paths_serve_page_files() {
    let dir = pages();
    let app = app(dir.path());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/index.html")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_of(response).await, "<h1>index</h1>");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/missing.html")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/../signpost.toml")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
