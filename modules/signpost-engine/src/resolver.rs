//! Request path → configured action.

use tracing::debug;

use signpost_core::{DispatchError, DispatchResult, MappingRegistry};

use crate::action::{Action, ActionRegistry};
use crate::context::RequestContext;

/// Derive the action name from a request path.
///
/// The path is truncated at the last occurrence of the suffix marker,
/// trimmed, and reduced to the text after the last `/` (a trailing `/`
/// keeps the whole remainder, which then fails mapping lookup). Empty
/// and bare-`/` results resolve to nothing.
pub fn action_name(path: &str, suffix: &str) -> Option<String> {
    let mut name = match path.rfind(suffix) {
        Some(idx) => &path[..idx],
        None => path,
    };
    name = name.trim();
    if let Some(slash) = name.rfind('/') {
        if slash + 1 != name.len() {
            name = &name[slash + 1..];
        }
    }
    if name.is_empty() || name == "/" {
        None
    } else {
        Some(name.to_string())
    }
}

/// Resolve the context's path against the page-action table and build
/// the handler.
pub fn resolve_page_action(
    mappings: &MappingRegistry,
    actions: &ActionRegistry,
    ctx: &RequestContext,
) -> DispatchResult<Box<dyn Action>> {
    let name = action_name(ctx.path(), mappings.page_suffix()).ok_or_else(|| {
        DispatchError::ActionNameUnresolved {
            path: ctx.path().to_string(),
        }
    })?;
    let descriptor = mappings
        .action(&name)
        .ok_or_else(|| DispatchError::ActionNotFound { name: name.clone() })?;
    debug!(action = %name, type_key = %descriptor.type_key, "page action resolved");
    actions.build(&descriptor.type_key, &name, ctx)
}

/// Resolve the context's path against the direct-action table and build
/// the handler.
pub fn resolve_direct_action(
    mappings: &MappingRegistry,
    actions: &ActionRegistry,
    ctx: &RequestContext,
) -> DispatchResult<Box<dyn Action>> {
    let name = action_name(ctx.path(), mappings.direct_suffix()).ok_or_else(|| {
        DispatchError::ActionNameUnresolved {
            path: ctx.path().to_string(),
        }
    })?;
    let descriptor = mappings
        .direct_action(&name)
        .ok_or_else(|| DispatchError::ActionNotFound { name: name.clone() })?;
    debug!(action = %name, type_key = %descriptor.type_key, "direct action resolved");
    actions.build(&descriptor.type_key, &name, ctx)
}
