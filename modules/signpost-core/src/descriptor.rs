//! Descriptors for actions, forwards and models, and the registry that
//! holds them after configuration load.

use std::collections::HashMap;

use serde::Deserialize;

/// Default capacity of the per-session page history stack.
pub const DEFAULT_HISTORY_STACK_SIZE: usize = 10;

/// Default suffix marker for page-action request paths.
pub const DEFAULT_PAGE_SUFFIX: &str = ".act";

/// Default suffix marker for direct-response (data) request paths.
pub const DEFAULT_DIRECT_SUFFIX: &str = ".ajx";

/// Where a named symbolic result leads.
///
/// `path` may be empty for back-to-caller forwards (the destination comes
/// from the history stack) and is ignored for custom-URL forwards (the
/// destination comes from the action's outcome at runtime).
#[derive(Debug, Clone)]
pub struct ForwardDescriptor {
    pub name: String,
    pub path: String,
    /// Client-visible redirect rather than an internal forward.
    pub redirect: bool,
    /// Destination is popped from the session's page history.
    pub back_to_caller: bool,
    /// Do not record this navigation in the page history.
    pub avoid_history_save: bool,
    /// Destination is supplied by the action at runtime.
    pub custom_url: bool,
}

impl ForwardDescriptor {
    /// A plain internal forward with all flags off.
    pub fn to(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            redirect: false,
            back_to_caller: false,
            avoid_history_save: false,
            custom_url: false,
        }
    }
}

/// A page action: request path, handler type key, and its local forwards.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    pub path: String,
    pub type_key: String,
    forwards: HashMap<String, ForwardDescriptor>,
}

impl ActionDescriptor {
    pub fn new(path: impl Into<String>, type_key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            type_key: type_key.into(),
            forwards: HashMap::new(),
        }
    }

    /// Attach a local forward. Re-adding a name overwrites.
    pub fn add_forward(&mut self, forward: ForwardDescriptor) {
        self.forwards.insert(forward.name.clone(), forward);
    }

    /// Builder-style variant of [`add_forward`](Self::add_forward).
    pub fn with_forward(mut self, forward: ForwardDescriptor) -> Self {
        self.add_forward(forward);
        self
    }

    pub fn forward(&self, name: &str) -> Option<&ForwardDescriptor> {
        self.forwards.get(name)
    }

    pub fn forwards(&self) -> impl Iterator<Item = &ForwardDescriptor> {
        self.forwards.values()
    }
}

/// A direct-response (data) action: no forwards, the handler writes the
/// payload itself.
#[derive(Debug, Clone)]
pub struct DirectActionDescriptor {
    pub path: String,
    pub type_key: String,
}

/// Lifetime of a named model instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelScope {
    Application,
    Session,
    Request,
}

/// A named, typed, scoped model available to population and handlers.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    pub name: String,
    pub type_key: String,
    pub scope: ModelScope,
}

/// All loaded mappings. Immutable once the host finishes wiring; lookups
/// never fail, they return `Option`.
///
/// Registration is idempotent per key: registering an existing path or
/// name replaces the earlier entry.
#[derive(Debug, Clone)]
pub struct MappingRegistry {
    actions: HashMap<String, ActionDescriptor>,
    global_forwards: HashMap<String, ForwardDescriptor>,
    models: HashMap<String, ModelDescriptor>,
    direct_actions: HashMap<String, DirectActionDescriptor>,
    history_stack_size: usize,
    page_suffix: String,
    direct_suffix: String,
}

impl Default for MappingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
            global_forwards: HashMap::new(),
            models: HashMap::new(),
            direct_actions: HashMap::new(),
            history_stack_size: DEFAULT_HISTORY_STACK_SIZE,
            page_suffix: DEFAULT_PAGE_SUFFIX.to_string(),
            direct_suffix: DEFAULT_DIRECT_SUFFIX.to_string(),
        }
    }

    pub fn add_action(&mut self, descriptor: ActionDescriptor) {
        self.actions.insert(descriptor.path.clone(), descriptor);
    }

    pub fn add_global_forward(&mut self, forward: ForwardDescriptor) {
        self.global_forwards.insert(forward.name.clone(), forward);
    }

    pub fn add_model(&mut self, descriptor: ModelDescriptor) {
        self.models.insert(descriptor.name.clone(), descriptor);
    }

    pub fn add_direct_action(&mut self, descriptor: DirectActionDescriptor) {
        self.direct_actions.insert(descriptor.path.clone(), descriptor);
    }

    pub fn action(&self, path: &str) -> Option<&ActionDescriptor> {
        self.actions.get(path)
    }

    pub fn global_forward(&self, name: &str) -> Option<&ForwardDescriptor> {
        self.global_forwards.get(name)
    }

    pub fn model(&self, name: &str) -> Option<&ModelDescriptor> {
        self.models.get(name)
    }

    pub fn direct_action(&self, path: &str) -> Option<&DirectActionDescriptor> {
        self.direct_actions.get(path)
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.actions.values()
    }

    pub fn global_forwards(&self) -> impl Iterator<Item = &ForwardDescriptor> {
        self.global_forwards.values()
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.values()
    }

    pub fn direct_actions(&self) -> impl Iterator<Item = &DirectActionDescriptor> {
        self.direct_actions.values()
    }

    pub fn history_stack_size(&self) -> usize {
        self.history_stack_size
    }

    pub fn set_history_stack_size(&mut self, size: usize) {
        self.history_stack_size = size;
    }

    pub fn page_suffix(&self) -> &str {
        &self.page_suffix
    }

    pub fn direct_suffix(&self) -> &str {
        &self.direct_suffix
    }

    pub fn set_suffixes(&mut self, page: impl Into<String>, direct: impl Into<String>) {
        self.page_suffix = page.into();
        self.direct_suffix = direct.into();
    }
}
