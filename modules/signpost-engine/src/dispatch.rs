//! Pipeline entry points.

use std::sync::Arc;

use chrono::Duration;
use tracing::info;

use signpost_core::{DispatchError, DispatchResult, MappingRegistry};

use crate::action::{ActionRegistry, Outcome};
use crate::context::RequestContext;
use crate::navigate::{Navigator, ResponseWriter};
use crate::populate::populate;
use crate::registry::{ModelRegistry, ModelTypes};
use crate::resolver;
use crate::session::{SessionStore, DEFAULT_IDLE_MINUTES};

/// The wired dispatch layer: mappings, action factories, model registry
/// and session store, shared by every request.
///
/// Build one at startup, wrap it in an `Arc`, and feed each request
/// through [`handle_page`](Self::handle_page) or
/// [`handle_direct`](Self::handle_direct).
pub struct Dispatcher {
    mappings: Arc<MappingRegistry>,
    actions: ActionRegistry,
    models: ModelRegistry,
    sessions: Arc<SessionStore>,
}

impl Dispatcher {
    pub fn new(mappings: MappingRegistry, actions: ActionRegistry, types: ModelTypes) -> Self {
        Self::with_session_ttl(mappings, actions, types, Duration::minutes(DEFAULT_IDLE_MINUTES))
    }

    pub fn with_session_ttl(
        mappings: MappingRegistry,
        actions: ActionRegistry,
        types: ModelTypes,
        session_ttl: Duration,
    ) -> Self {
        let mappings = Arc::new(mappings);
        let sessions = Arc::new(SessionStore::new(
            mappings.history_stack_size(),
            session_ttl,
        ));
        let models = ModelRegistry::new(mappings.clone(), types);
        info!(
            actions = mappings.actions().count(),
            direct_actions = mappings.direct_actions().count(),
            global_forwards = mappings.global_forwards().count(),
            models = mappings.models().count(),
            history_stack_size = mappings.history_stack_size(),
            "dispatch mappings loaded"
        );
        Self {
            mappings,
            actions,
            models,
            sessions,
        }
    }

    /// A request context bound to this dispatcher's session store.
    pub fn new_context(
        &self,
        path: impl Into<String>,
        base_path: impl Into<String>,
    ) -> RequestContext {
        RequestContext::new(path, base_path, self.sessions.clone())
    }

    pub fn mappings(&self) -> &MappingRegistry {
        &self.mappings
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// The page pipeline: resolve the action, populate models, execute,
    /// navigate. An action may still return a direct payload, which is
    /// written out in place of navigation.
    pub async fn handle_page(
        &self,
        ctx: &mut RequestContext,
        writer: &mut dyn ResponseWriter,
    ) -> DispatchResult<()> {
        let mut action = resolver::resolve_page_action(&self.mappings, &self.actions, ctx)?;
        populate(&self.models, ctx)?;

        let path = action.path().to_string();
        let outcome = action
            .execute(ctx, &self.models)
            .await
            .map_err(|e| DispatchError::ActionFailed {
                action: path.clone(),
                source: e,
            })?;

        Navigator::new(&self.mappings)
            .navigate(ctx, &outcome, writer)
            .await
    }

    /// The direct pipeline: resolve against the direct table, execute,
    /// write the payload. No population; direct handlers read raw
    /// parameters themselves.
    pub async fn handle_direct(
        &self,
        ctx: &mut RequestContext,
        writer: &mut dyn ResponseWriter,
    ) -> DispatchResult<()> {
        let mut action = resolver::resolve_direct_action(&self.mappings, &self.actions, ctx)?;

        let path = action.path().to_string();
        let outcome = action
            .execute(ctx, &self.models)
            .await
            .map_err(|e| DispatchError::ActionFailed {
                action: path.clone(),
                source: e,
            })?;

        match outcome {
            Outcome::Direct { content_type, body } => {
                Navigator::new(&self.mappings)
                    .write_direct(&content_type, &body, writer)
                    .await
            }
            _ => Err(DispatchError::ActionResultTypeMismatch { action: path }),
        }
    }
}
