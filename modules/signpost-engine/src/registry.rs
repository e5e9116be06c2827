//! Scoped model registry: lazy instantiation, exact-type replacement.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tracing::debug;

use signpost_core::{DispatchError, DispatchResult, MappingRegistry, ModelScope};

use crate::context::RequestContext;
use crate::model::{Model, SharedModel};

type Constructor = Box<dyn Fn() -> Box<dyn Model> + Send + Sync>;

struct ModelType {
    type_id: TypeId,
    construct: Constructor,
}

/// Type-key → constructor table. Populated by the host at wiring time;
/// descriptors refer to these keys.
#[derive(Default)]
pub struct ModelTypes {
    types: HashMap<String, ModelType>,
}

impl ModelTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model type under a key. Re-registering replaces.
    pub fn register<T: Model + Default>(&mut self, type_key: impl Into<String>) {
        self.types.insert(
            type_key.into(),
            ModelType {
                type_id: TypeId::of::<T>(),
                construct: Box::new(|| Box::new(T::default())),
            },
        );
    }

    pub fn contains(&self, type_key: &str) -> bool {
        self.types.contains_key(type_key)
    }

    fn get(&self, type_key: &str) -> Option<&ModelType> {
        self.types.get(type_key)
    }
}

/// Hands out model instances by configured name, honoring scope.
///
/// First access per scope instantiates the declared type and caches it;
/// later callers get the same instance. Application storage lives here,
/// session storage in [`SessionState`](crate::session::SessionState),
/// request storage in the context.
pub struct ModelRegistry {
    mappings: Arc<MappingRegistry>,
    types: ModelTypes,
    application: RwLock<HashMap<String, SharedModel>>,
}

impl ModelRegistry {
    pub fn new(mappings: Arc<MappingRegistry>, types: ModelTypes) -> Self {
        Self {
            mappings,
            types,
            application: RwLock::new(HashMap::new()),
        }
    }

    /// The instance for `name`, creating it on first access.
    pub fn get(&self, ctx: &RequestContext, name: &str) -> DispatchResult<SharedModel> {
        let (descriptor, ty) = self.lookup(name)?;
        match descriptor.scope {
            ModelScope::Application => {
                {
                    let map = self
                        .application
                        .read()
                        .expect("application model map lock poisoned");
                    if let Some(found) = map.get(name) {
                        return Ok(found.clone());
                    }
                }
                let mut map = self
                    .application
                    .write()
                    .expect("application model map lock poisoned");
                // Re-check under the write lock; first creator wins.
                Ok(map
                    .entry(name.to_string())
                    .or_insert_with(|| {
                        debug!(model = name, scope = "application", "model instantiated");
                        fresh(ty)
                    })
                    .clone())
            }
            ModelScope::Session => {
                let session = ctx.session().ok_or(DispatchError::SessionExpired)?;
                let mut map = session.models_mut();
                Ok(map
                    .entry(name.to_string())
                    .or_insert_with(|| {
                        debug!(model = name, scope = "session", "model instantiated");
                        fresh(ty)
                    })
                    .clone())
            }
            ModelScope::Request => {
                let mut map = ctx.request_models_mut();
                Ok(map
                    .entry(name.to_string())
                    .or_insert_with(|| fresh(ty))
                    .clone())
            }
        }
    }

    /// Replace the stored instance for `name`. The supplied value must
    /// be exactly the descriptor's registered type.
    pub fn set(
        &self,
        ctx: &RequestContext,
        name: &str,
        value: Box<dyn Model>,
    ) -> DispatchResult<()> {
        let (descriptor, ty) = self.lookup(name)?;
        if value.as_any().type_id() != ty.type_id {
            return Err(DispatchError::ModelTypeMismatch {
                model: name.to_string(),
                expected: descriptor.type_key.clone(),
            });
        }
        let shared: SharedModel = Arc::new(Mutex::new(value));
        match descriptor.scope {
            ModelScope::Application => {
                self.application
                    .write()
                    .expect("application model map lock poisoned")
                    .insert(name.to_string(), shared);
            }
            ModelScope::Session => {
                let session = ctx.session().ok_or(DispatchError::SessionExpired)?;
                session.models_mut().insert(name.to_string(), shared);
            }
            ModelScope::Request => {
                ctx.request_models_mut().insert(name.to_string(), shared);
            }
        }
        Ok(())
    }

    /// Lock the named model, downcast it to `T`, and run `f` on it.
    pub fn with_model<T, R>(
        &self,
        ctx: &RequestContext,
        name: &str,
        f: impl FnOnce(&mut T) -> R,
    ) -> DispatchResult<R>
    where
        T: Model,
    {
        let shared = self.get(ctx, name)?;
        let mut guard = shared.lock().expect("model lock poisoned");
        let model = guard
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| DispatchError::ModelTypeMismatch {
                model: name.to_string(),
                expected: std::any::type_name::<T>().to_string(),
            })?;
        Ok(f(model))
    }

    fn lookup(&self, name: &str) -> DispatchResult<(&signpost_core::ModelDescriptor, &ModelType)> {
        let descriptor = self
            .mappings
            .model(name)
            .ok_or_else(|| DispatchError::ModelNotDefined {
                name: name.to_string(),
            })?;
        let ty = self.types.get(&descriptor.type_key).ok_or_else(|| {
            DispatchError::ModelTypeNotRegistered {
                type_key: descriptor.type_key.clone(),
                model: name.to_string(),
            }
        })?;
        Ok((descriptor, ty))
    }
}

fn fresh(ty: &ModelType) -> SharedModel {
    Arc::new(Mutex::new((ty.construct)()))
}
