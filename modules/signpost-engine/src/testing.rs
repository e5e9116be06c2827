//! In-memory collaborators for tests: sample models, scripted actions,
//! and a recording response writer.
//!
//! Available to downstream crates behind the `test-support` feature.

use std::any::Any;

use anyhow::Result;
use async_trait::async_trait;

use crate::action::{Action, Outcome};
use crate::context::RequestContext;
use crate::model::{FieldError, FieldType, Model, Scalar, ScalarKind, Value};
use crate::navigate::ResponseWriter;
use crate::registry::ModelRegistry;

// ---------------------------------------------------------------------------
// Sample models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub street: String,
    pub number: i32,
    pub color: i64,
}

impl Model for Address {
    fn field_type(&self, field: &str) -> Option<FieldType> {
        match field {
            "street" => Some(FieldType::Scalar(ScalarKind::Text)),
            "number" => Some(FieldType::Scalar(ScalarKind::I32)),
            "color" => Some(FieldType::Scalar(ScalarKind::I64)),
            _ => None,
        }
    }

    fn set_field(&mut self, field: &str, value: Value) -> Result<(), FieldError> {
        match (field, value) {
            ("street", Value::Scalar(Scalar::Text(v))) => self.street = v,
            ("number", Value::Scalar(Scalar::I32(v))) => self.number = v,
            ("color", Value::Scalar(Scalar::I64(v))) => self.color = v,
            ("street" | "number" | "color", _) => return Err(FieldError::WrongKind),
            _ => return Err(FieldError::NoSuchField),
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub name: String,
    pub age: i32,
    pub active: bool,
    pub grade: char,
    pub score: f64,
    pub tags: Vec<String>,
    pub lucky_numbers: Vec<i32>,
    pub address: Option<Address>,
}

impl Model for Person {
    fn field_type(&self, field: &str) -> Option<FieldType> {
        match field {
            "name" => Some(FieldType::Scalar(ScalarKind::Text)),
            "age" => Some(FieldType::Scalar(ScalarKind::I32)),
            "active" => Some(FieldType::Scalar(ScalarKind::Bool)),
            "grade" => Some(FieldType::Scalar(ScalarKind::Char)),
            "score" => Some(FieldType::Scalar(ScalarKind::F64)),
            "tags" => Some(FieldType::List(ScalarKind::Text)),
            "lucky_numbers" => Some(FieldType::List(ScalarKind::I32)),
            "address" => Some(FieldType::Nested),
            _ => None,
        }
    }

    fn set_field(&mut self, field: &str, value: Value) -> Result<(), FieldError> {
        match (field, value) {
            ("name", Value::Scalar(Scalar::Text(v))) => self.name = v,
            ("age", Value::Scalar(Scalar::I32(v))) => self.age = v,
            ("active", Value::Scalar(Scalar::Bool(v))) => self.active = v,
            ("grade", Value::Scalar(Scalar::Char(v))) => self.grade = v,
            ("score", Value::Scalar(Scalar::F64(v))) => self.score = v,
            ("tags", Value::List(items)) => {
                self.tags = items
                    .into_iter()
                    .filter_map(|s| match s {
                        Scalar::Text(v) => Some(v),
                        _ => None,
                    })
                    .collect();
            }
            ("lucky_numbers", Value::List(items)) => {
                self.lucky_numbers = items
                    .into_iter()
                    .filter_map(|s| match s {
                        Scalar::I32(v) => Some(v),
                        _ => None,
                    })
                    .collect();
            }
            ("name" | "age" | "active" | "grade" | "score", _) => {
                return Err(FieldError::WrongKind)
            }
            _ => return Err(FieldError::NoSuchField),
        }
        Ok(())
    }

    fn nested_mut(&mut self, field: &str) -> Option<&mut dyn Model> {
        match field {
            "address" => self.address.as_mut().map(|a| a as &mut dyn Model),
            _ => None,
        }
    }

    fn create_nested(&mut self, field: &str) -> Option<&mut dyn Model> {
        match field {
            "address" => {
                self.address = Some(Address::default());
                self.nested_mut(field)
            }
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Scripted actions
// ---------------------------------------------------------------------------

/// Returns a fixed outcome every time.
pub struct ScriptedAction {
    path: String,
    outcome: Outcome,
}

impl ScriptedAction {
    pub fn new(path: &str, outcome: Outcome) -> Self {
        Self {
            path: path.to_string(),
            outcome,
        }
    }
}

#[async_trait]
impl Action for ScriptedAction {
    fn path(&self) -> &str {
        &self.path
    }

    async fn execute(
        &mut self,
        _ctx: &mut RequestContext,
        _models: &ModelRegistry,
    ) -> Result<Outcome> {
        Ok(self.outcome.clone())
    }
}

/// Echoes the `q` parameter back as a plain-text direct payload.
pub struct EchoAction {
    path: String,
}

impl EchoAction {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }
}

#[async_trait]
impl Action for EchoAction {
    fn path(&self) -> &str {
        &self.path
    }

    async fn execute(
        &mut self,
        ctx: &mut RequestContext,
        _models: &ModelRegistry,
    ) -> Result<Outcome> {
        let q = ctx.parameter("q").unwrap_or_default().to_string();
        Ok(Outcome::direct("text/plain", q))
    }
}

/// Always fails, for exercising the execution error path.
pub struct FailingAction {
    path: String,
}

impl FailingAction {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }
}

#[async_trait]
impl Action for FailingAction {
    fn path(&self) -> &str {
        &self.path
    }

    async fn execute(
        &mut self,
        _ctx: &mut RequestContext,
        _models: &ModelRegistry,
    ) -> Result<Outcome> {
        anyhow::bail!("scripted failure")
    }
}

// ---------------------------------------------------------------------------
// Recording writer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteEvent {
    Redirect(String),
    Forward(String),
    Direct {
        content_type: String,
        body: Vec<u8>,
    },
}

/// Captures everything the navigator asks the host to do. Can be told
/// to fail, for exercising the `ForwardIo` and swallowed-direct paths.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    pub events: Vec<WriteEvent>,
    fail: bool,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            events: Vec::new(),
            fail: true,
        }
    }

    pub fn last(&self) -> Option<&WriteEvent> {
        self.events.last()
    }
}

#[async_trait]
impl ResponseWriter for RecordingWriter {
    async fn redirect(&mut self, url: &str) -> Result<()> {
        if self.fail {
            anyhow::bail!("writer told to fail");
        }
        self.events.push(WriteEvent::Redirect(url.to_string()));
        Ok(())
    }

    async fn forward(&mut self, destination: &str) -> Result<()> {
        if self.fail {
            anyhow::bail!("writer told to fail");
        }
        self.events.push(WriteEvent::Forward(destination.to_string()));
        Ok(())
    }

    async fn send_direct(&mut self, content_type: &str, body: &[u8]) -> Result<()> {
        if self.fail {
            anyhow::bail!("writer told to fail");
        }
        self.events.push(WriteEvent::Direct {
            content_type: content_type.to_string(),
            body: body.to_vec(),
        });
        Ok(())
    }
}
