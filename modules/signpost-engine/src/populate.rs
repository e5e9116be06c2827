//! Population of models from request parameters.
//!
//! Parameters named `#root.path.to.field` drive population: the first
//! segment names a registered model, intermediate segments walk nested
//! models (instantiating absent ones on the way), and the final segment
//! receives the converted value. Parameters without the `#` prefix or
//! without a separator are left alone for handlers to read directly.

use tracing::debug;

use signpost_core::{DispatchError, DispatchResult};

use crate::coerce;
use crate::context::RequestContext;
use crate::model::{FieldType, Model};
use crate::registry::ModelRegistry;

/// Marks a parameter as a population path.
pub const MODEL_PREFIX: char = '#';

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';

/// Populate every model addressed by the context's parameters.
///
/// Population is atomic per parameter (the root model stays locked for
/// the whole walk) but not across parameters or requests; concurrent
/// requests writing the same session model interleave last-writer-wins.
pub fn populate(models: &ModelRegistry, ctx: &RequestContext) -> DispatchResult<()> {
    for (name, values) in ctx.parameters() {
        let Some(path) = name.strip_prefix(MODEL_PREFIX) else {
            continue;
        };
        if !path.contains(PATH_SEPARATOR) {
            continue;
        }
        apply(models, ctx, name, path, values)?;
        debug!(parameter = name, "model field populated");
    }
    Ok(())
}

fn apply(
    models: &ModelRegistry,
    ctx: &RequestContext,
    parameter: &str,
    path: &str,
    values: &[String],
) -> DispatchResult<()> {
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    // Catches the trailing separator and every other empty segment.
    if segments.iter().any(|s| s.is_empty()) {
        return Err(DispatchError::MalformedModelPath {
            parameter: parameter.to_string(),
        });
    }

    let root = segments[0];
    let field = segments[segments.len() - 1];
    let middle = &segments[1..segments.len() - 1];

    let shared = models.get(ctx, root)?;
    let mut guard = shared.lock().expect("model lock poisoned");

    let mut current: &mut dyn Model = guard.as_mut();
    for segment in middle {
        current = descend(current, parameter, segment)?;
    }
    set_leaf(current, parameter, field, values)
}

/// Step into a nested model, instantiating it if the slot is empty.
fn descend<'a>(
    model: &'a mut dyn Model,
    parameter: &str,
    field: &str,
) -> DispatchResult<&'a mut dyn Model> {
    if model.field_type(field) != Some(FieldType::Nested) {
        return Err(no_such_field(field, parameter));
    }
    if model.nested_mut(field).is_none() && model.create_nested(field).is_none() {
        return Err(no_such_field(field, parameter));
    }
    model
        .nested_mut(field)
        .ok_or_else(|| no_such_field(field, parameter))
}

fn set_leaf(
    model: &mut dyn Model,
    parameter: &str,
    field: &str,
    values: &[String],
) -> DispatchResult<()> {
    let target = model
        .field_type(field)
        .ok_or_else(|| no_such_field(field, parameter))?;
    if target == FieldType::Nested {
        // A nested model has no scalar setter to receive a value.
        return Err(no_such_field(field, parameter));
    }
    let value = coerce::convert(field, values, target)?;
    model
        .set_field(field, value)
        .map_err(|_| no_such_field(field, parameter))
}

fn no_such_field(field: &str, parameter: &str) -> DispatchError {
    DispatchError::NoSuchField {
        field: field.to_string(),
        parameter: parameter.to_string(),
    }
}
