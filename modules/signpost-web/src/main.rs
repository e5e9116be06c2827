//! Demo site: a guestbook wired through the dispatch pipeline.
//!
//! Mappings and pages come from `demo/`; override the locations with
//! SIGNPOST_SITE, SIGNPOST_DIRECT and SIGNPOST_PAGES.

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;
use tracing_subscriber::EnvFilter;

use signpost_core::load_mappings;
use signpost_engine::{
    Action, ActionRegistry, Dispatcher, FieldError, FieldType, Model, ModelRegistry, ModelTypes,
    Outcome, RequestContext, Scalar, ScalarKind, Value,
};
use signpost_web::{router, SiteServer};

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct GuestbookEntry {
    name: String,
    message: String,
}

impl Model for GuestbookEntry {
    fn field_type(&self, field: &str) -> Option<FieldType> {
        match field {
            "name" | "message" => Some(FieldType::Scalar(ScalarKind::Text)),
            _ => None,
        }
    }

    fn set_field(&mut self, field: &str, value: Value) -> Result<(), FieldError> {
        match (field, value) {
            ("name", Value::Scalar(Scalar::Text(v))) => self.name = v,
            ("message", Value::Scalar(Scalar::Text(v))) => self.message = v,
            ("name" | "message", _) => return Err(FieldError::WrongKind),
            _ => return Err(FieldError::NoSuchField),
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Application-wide entry list. Not populatable; actions write to it.
#[derive(Debug, Default)]
struct Guestbook {
    entries: Vec<String>,
}

impl Model for Guestbook {
    fn field_type(&self, _field: &str) -> Option<FieldType> {
        None
    }

    fn set_field(&mut self, _field: &str, _value: Value) -> Result<(), FieldError> {
        Err(FieldError::NoSuchField)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

struct SignAction {
    path: String,
}

#[async_trait]
impl Action for SignAction {
    fn path(&self) -> &str {
        &self.path
    }

    async fn execute(
        &mut self,
        ctx: &mut RequestContext,
        models: &ModelRegistry,
    ) -> Result<Outcome> {
        let (name, message) =
            models.with_model::<GuestbookEntry, _>(ctx, "entry", |e| {
                (e.name.trim().to_string(), e.message.trim().to_string())
            })?;
        if name.is_empty() || message.is_empty() {
            ctx.set_last_error("both name and message are required");
            return Ok(Outcome::forward("again"));
        }
        models.with_model::<Guestbook, _>(ctx, "book", |b| {
            b.entries.push(format!("{name}: {message}"));
        })?;
        info!(entry = %name, "guestbook signed");
        Ok(Outcome::forward("signed"))
    }
}

struct EntriesAction {
    path: String,
}

#[async_trait]
impl Action for EntriesAction {
    fn path(&self) -> &str {
        &self.path
    }

    async fn execute(
        &mut self,
        ctx: &mut RequestContext,
        models: &ModelRegistry,
    ) -> Result<Outcome> {
        let entries = models.with_model::<Guestbook, _>(ctx, "book", |b| b.entries.clone())?;
        let body = serde_json::to_vec(&entries)?;
        Ok(Outcome::direct("application/json", body))
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("signpost=info".parse()?))
        .init();

    let site = std::env::var("SIGNPOST_SITE").unwrap_or_else(|_| "demo/signpost.toml".into());
    let direct =
        std::env::var("SIGNPOST_DIRECT").unwrap_or_else(|_| "demo/signpost-direct.toml".into());
    let pages = std::env::var("SIGNPOST_PAGES").unwrap_or_else(|_| "demo/pages".into());

    let mappings = load_mappings(Path::new(&site), Some(Path::new(&direct)))?;

    let mut actions = ActionRegistry::new();
    actions.register("SignAction", |path, _ctx| {
        Ok(Box::new(SignAction {
            path: path.to_string(),
        }) as Box<dyn Action>)
    });
    actions.register("EntriesAction", |path, _ctx| {
        Ok(Box::new(EntriesAction {
            path: path.to_string(),
        }) as Box<dyn Action>)
    });

    let mut types = ModelTypes::new();
    types.register::<GuestbookEntry>("GuestbookEntry");
    types.register::<Guestbook>("Guestbook");

    let server = Arc::new(SiteServer::new(
        Dispatcher::new(mappings, actions, types),
        &pages,
    )?);

    // background sweep keeps the session map from accumulating corpses
    {
        let server = server.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                tick.tick().await;
                let swept = server.dispatcher().sessions().sweep();
                if swept > 0 {
                    info!(swept, "expired sessions removed");
                }
            }
        });
    }

    let host = std::env::var("SIGNPOST_HOST").unwrap_or_else(|_| "127.0.0.1".into());
    let port = std::env::var("SIGNPOST_PORT").unwrap_or_else(|_| "8080".into());
    let addr = format!("{host}:{port}");

    let app = router(server);
    info!("signpost demo at http://{addr}/index.html");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
