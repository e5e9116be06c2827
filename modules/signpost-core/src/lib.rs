//! Declarative mappings, error taxonomy and navigation history for the
//! signpost dispatch layer.
//!
//! This crate is the pure-data foundation: descriptors loaded from TOML,
//! the [`DispatchError`] taxonomy with stable numeric codes, and the
//! bounded per-session history stack. The pipeline that consumes these
//! lives in `signpost-engine`.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod history;

pub use config::{load_mappings, mappings_from_toml};
pub use descriptor::{
    ActionDescriptor, DirectActionDescriptor, ForwardDescriptor, MappingRegistry, ModelDescriptor,
    ModelScope, DEFAULT_DIRECT_SUFFIX, DEFAULT_HISTORY_STACK_SIZE, DEFAULT_PAGE_SUFFIX,
};
pub use error::{DispatchError, DispatchResult};
pub use history::{BoundedStack, HistoryEntry};
