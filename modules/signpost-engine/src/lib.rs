//! Request dispatch engine.
//!
//! Drives one request through the pipeline: resolve the action from the
//! request path, populate models from request parameters, execute the
//! action, then navigate on the returned outcome. Mappings come from
//! `signpost-core`; the host supplies a `ResponseWriter` for the actual
//! redirect/forward/payload plumbing.

pub mod action;
pub mod coerce;
pub mod context;
pub mod dispatch;
pub mod model;
pub mod navigate;
pub mod populate;
pub mod registry;
pub mod resolver;
pub mod session;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use action::{Action, ActionFactory, ActionRegistry, Outcome};
pub use context::RequestContext;
pub use dispatch::Dispatcher;
pub use model::{FieldError, FieldType, Model, Scalar, ScalarKind, SharedModel, Value};
pub use navigate::{Navigator, ResponseWriter};
pub use populate::populate;
pub use registry::{ModelRegistry, ModelTypes};
pub use resolver::action_name;
pub use session::{SessionState, SessionStore, DEFAULT_IDLE_MINUTES};
