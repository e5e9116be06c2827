//! Typed errors for the dispatch pipeline.
//!
//! Every error carries a stable numeric code for log and telemetry
//! correlation. Codes are partitioned by component:
//!
//! | range | component                  |
//! |-------|----------------------------|
//! | 10xx  | configuration loading      |
//! | 11xx  | action resolution          |
//! | 12xx  | navigation                 |
//! | 13xx  | model registry             |
//! | 14xx  | population and conversion  |
//!
//! Gaps inside a range are deliberate: codes are never reused once
//! published, and a few legacy failure modes (reflective constructor
//! lookup, setter arity) cannot occur under factory registration and
//! keep their slots empty.

use thiserror::Error;

/// Errors surfaced by any stage of request dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Declarative mapping input did not parse.
    #[error("configuration parse error: {detail}")]
    ConfigParse { detail: String },

    /// A mapping file could not be read.
    #[error("configuration file unreadable: {path}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// No action name could be derived from the request path.
    #[error("no action name in request path: {path}")]
    ActionNameUnresolved { path: String },

    /// The derived action name has no configured mapping.
    #[error("no action mapped for: {name}")]
    ActionNotFound { name: String },

    /// The mapping names a handler type no factory was registered for.
    #[error("action type not registered: {type_key} (action {action})")]
    ActionTypeNotRegistered { type_key: String, action: String },

    /// The handler factory returned an error.
    #[error("action construction failed: {action}")]
    ActionBuildFailed {
        action: String,
        #[source]
        source: anyhow::Error,
    },

    /// The handler itself failed while executing.
    #[error("action execution failed: {action}")]
    ActionFailed {
        action: String,
        #[source]
        source: anyhow::Error,
    },

    /// The symbolic result matched neither an action-local nor a global forward.
    #[error("no forward named {result:?} for action {action}")]
    ForwardNotResolved { result: String, action: String },

    /// The selected forward resolved to an empty destination.
    #[error("forward {forward:?} has an empty destination (action {action})")]
    EmptyForwardPath { forward: String, action: String },

    /// The action's outcome kind does not match what the mapping requires.
    #[error("action {action} returned the wrong result kind for its mapping")]
    ActionResultTypeMismatch { action: String },

    /// Terminal dispatch (redirect, internal forward) failed in the host.
    #[error("dispatch to {destination:?} failed")]
    ForwardIo {
        destination: String,
        #[source]
        source: anyhow::Error,
    },

    /// back-to-caller with no page history to return to.
    #[error("navigation history is empty (action {action})")]
    HistoryStackEmpty { action: String },

    /// No model descriptor under this name.
    #[error("model not defined: {name}")]
    ModelNotDefined { name: String },

    /// The descriptor names a model type no factory was registered for.
    #[error("model type not registered: {type_key} (model {model})")]
    ModelTypeNotRegistered { type_key: String, model: String },

    /// A stored or supplied value is not of the descriptor's declared type.
    #[error("model {model} is not of declared type {expected}")]
    ModelTypeMismatch { model: String, expected: String },

    /// Session-scoped access without an established session.
    #[error("session expired or not established")]
    SessionExpired,

    /// Population parameter path is structurally invalid.
    #[error("malformed model path in parameter: {parameter}")]
    MalformedModelPath { parameter: String },

    /// The path names a field the model does not expose (or one that
    /// cannot accept the converted value).
    #[error("no field {field:?} reachable via parameter {parameter}")]
    NoSuchField { field: String, parameter: String },

    /// A raw value failed numeric conversion for its declared field kind.
    #[error("cannot convert {value:?} to {target} for field {field:?}")]
    ValueConversion {
        field: String,
        value: String,
        target: String,
    },

    /// Character fields require exactly one character after trimming.
    #[error("cannot convert {value:?} to a single character for field {field:?}")]
    CharConversion { field: String, value: String },
}

impl DispatchError {
    /// Stable numeric code for this error kind.
    pub fn code(&self) -> u16 {
        match self {
            DispatchError::ConfigParse { .. } => 1000,
            DispatchError::ConfigIo { .. } => 1001,
            DispatchError::ActionNameUnresolved { .. } => 1100,
            DispatchError::ActionNotFound { .. } => 1101,
            DispatchError::ActionTypeNotRegistered { .. } => 1102,
            DispatchError::ActionBuildFailed { .. } => 1103,
            DispatchError::ActionFailed { .. } => 1104,
            DispatchError::ForwardNotResolved { .. } => 1200,
            DispatchError::EmptyForwardPath { .. } => 1201,
            DispatchError::ActionResultTypeMismatch { .. } => 1202,
            DispatchError::ForwardIo { .. } => 1203,
            DispatchError::HistoryStackEmpty { .. } => 1204,
            DispatchError::ModelNotDefined { .. } => 1300,
            DispatchError::ModelTypeNotRegistered { .. } => 1301,
            DispatchError::ModelTypeMismatch { .. } => 1302,
            DispatchError::SessionExpired => 1303,
            DispatchError::MalformedModelPath { .. } => 1400,
            DispatchError::NoSuchField { .. } => 1401,
            DispatchError::ValueConversion { .. } => 1402,
            DispatchError::CharConversion { .. } => 1403,
        }
    }
}

/// Result type alias for dispatch operations.
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;
