//! The action seam: handlers, their outcomes, and the factory registry.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use signpost_core::{DispatchError, DispatchResult};

use crate::context::RequestContext;
use crate::registry::ModelRegistry;

/// What a handler produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A symbolic result, resolved through the forward tables.
    Forward(String),
    /// A symbolic result whose destination the handler computed itself.
    /// Only valid against forwards flagged `custom_url`.
    CustomUrl { result: String, url: String },
    /// A payload written straight back, bypassing navigation.
    Direct {
        content_type: String,
        body: Vec<u8>,
    },
}

impl Outcome {
    pub fn forward(result: impl Into<String>) -> Self {
        Outcome::Forward(result.into())
    }

    pub fn custom_url(result: impl Into<String>, url: impl Into<String>) -> Self {
        Outcome::CustomUrl {
            result: result.into(),
            url: url.into(),
        }
    }

    pub fn direct(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Outcome::Direct {
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// The symbolic result name, if this outcome carries one.
    pub fn result(&self) -> Option<&str> {
        match self {
            Outcome::Forward(result) => Some(result),
            Outcome::CustomUrl { result, .. } => Some(result),
            Outcome::Direct { .. } => None,
        }
    }
}

/// A request handler. One instance is built per request by the factory
/// registered for the mapping's type key.
#[async_trait]
pub trait Action: Send {
    /// The action path this instance was built for.
    fn path(&self) -> &str;

    async fn execute(
        &mut self,
        ctx: &mut RequestContext,
        models: &ModelRegistry,
    ) -> Result<Outcome>;
}

/// Builds an action from its path and the current request.
pub type ActionFactory =
    Box<dyn Fn(&str, &RequestContext) -> Result<Box<dyn Action>> + Send + Sync>;

/// Type-key → factory table. Behavior is added by registering keys, not
/// by touching the resolver.
#[derive(Default)]
pub struct ActionRegistry {
    factories: HashMap<String, ActionFactory>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a type key. Re-registering replaces.
    pub fn register<F>(&mut self, type_key: impl Into<String>, factory: F)
    where
        F: Fn(&str, &RequestContext) -> Result<Box<dyn Action>> + Send + Sync + 'static,
    {
        self.factories.insert(type_key.into(), Box::new(factory));
    }

    pub fn contains(&self, type_key: &str) -> bool {
        self.factories.contains_key(type_key)
    }

    /// Build the action for a resolved mapping.
    pub fn build(
        &self,
        type_key: &str,
        action: &str,
        ctx: &RequestContext,
    ) -> DispatchResult<Box<dyn Action>> {
        let factory =
            self.factories
                .get(type_key)
                .ok_or_else(|| DispatchError::ActionTypeNotRegistered {
                    type_key: type_key.to_string(),
                    action: action.to_string(),
                })?;
        factory(action, ctx).map_err(|e| DispatchError::ActionBuildFailed {
            action: action.to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use crate::testing::EchoAction;
    use std::sync::Arc;

    fn ctx() -> RequestContext {
        let sessions = Arc::new(SessionStore::new(10, chrono::Duration::minutes(30)));
        RequestContext::new("/echo.act", "http://localhost", sessions)
    }

    #[test]
    fn build_goes_through_the_registered_factory() {
        let mut registry = ActionRegistry::new();
        registry.register("EchoAction", |path, _ctx| {
            Ok(Box::new(EchoAction::new(path)) as Box<dyn Action>)
        });

        assert!(registry.contains("EchoAction"));
        let action = registry.build("EchoAction", "echo", &ctx()).unwrap();
        assert_eq!(action.path(), "echo");
    }

    #[test]
    fn unregistered_type_key() {
        let registry = ActionRegistry::new();
        let err = registry.build("Ghost", "echo", &ctx()).err().unwrap();
        assert!(matches!(err, DispatchError::ActionTypeNotRegistered { .. }));
        assert_eq!(err.code(), 1102);
    }

    #[test]
    fn factory_failure_becomes_build_error() {
        let mut registry = ActionRegistry::new();
        registry.register("Broken", |_path, _ctx| anyhow::bail!("boom"));

        let err = registry.build("Broken", "echo", &ctx()).err().unwrap();
        assert!(matches!(err, DispatchError::ActionBuildFailed { .. }));
        assert_eq!(err.code(), 1103);
    }

    #[test]
    fn outcome_result_names() {
        assert_eq!(Outcome::forward("success").result(), Some("success"));
        assert_eq!(
            Outcome::custom_url("success", "/u").result(),
            Some("success")
        );
        assert_eq!(Outcome::direct("text/plain", "x").result(), None);
    }
}
