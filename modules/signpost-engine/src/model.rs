//! The model capability: what population and the registry need from an
//! application object.
//!
//! Models declare their fields (name → kind), accept converted values,
//! and expose nested models for dotted-path population. Implementations
//! are plain structs; the trait replaces runtime accessor discovery with
//! an explicit, compile-checked surface.

use std::any::Any;
use std::sync::{Arc, Mutex};

/// Scalar kinds a model field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Text,
}

impl ScalarKind {
    /// Short name used in conversion error messages.
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Char => "char",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Text => "text",
        }
    }
}

/// Declared shape of a model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarKind),
    /// Multi-valued field; every raw value converts element-wise.
    List(ScalarKind),
    /// Another model, reached by a further path segment.
    Nested,
}

/// One converted scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Text(String),
}

/// A converted value ready for [`Model::set_field`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

/// Why a [`Model::set_field`] call was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    /// No field under that name.
    NoSuchField,
    /// Field exists but cannot take a value of this kind.
    WrongKind,
}

/// A populatable, registry-managed application object.
///
/// `field_type` drives conversion: the populator asks what a field
/// expects before converting raw request values. `nested_mut` and
/// `create_nested` carry dotted paths across object boundaries, with
/// `create_nested` instantiating an absent nested model on demand.
pub trait Model: Any + Send {
    fn field_type(&self, field: &str) -> Option<FieldType>;

    fn set_field(&mut self, field: &str, value: Value) -> Result<(), FieldError>;

    /// The nested model under `field`, if the field is nested and
    /// currently holds one.
    fn nested_mut(&mut self, field: &str) -> Option<&mut dyn Model> {
        let _ = field;
        None
    }

    /// Instantiate a default value for the nested field and return it.
    /// Only meaningful for fields declared [`FieldType::Nested`].
    fn create_nested(&mut self, field: &str) -> Option<&mut dyn Model> {
        let _ = field;
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A registry-held model instance, shareable across requests.
pub type SharedModel = Arc<Mutex<Box<dyn Model>>>;
