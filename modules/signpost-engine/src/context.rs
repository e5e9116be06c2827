//! Per-request state threaded through the pipeline.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::model::SharedModel;
use crate::session::{SessionState, SessionStore};

/// Everything the pipeline knows about one request: the path being
/// dispatched, parsed parameters, uploads, and the session handle.
///
/// The raw HTTP request and response stay in the host; the context is
/// the framework-facing view of them. `base_path` is the absolute
/// prefix (`scheme://host:port`) redirects are assembled against.
pub struct RequestContext {
    path: String,
    base_path: String,
    params: HashMap<String, Vec<String>>,
    uploads: HashMap<String, PathBuf>,
    multipart: bool,
    sessions: Arc<SessionStore>,
    session: Option<Arc<SessionState>>,
    fresh_session: bool,
    request_models: Mutex<HashMap<String, SharedModel>>,
}

impl RequestContext {
    pub fn new(
        path: impl Into<String>,
        base_path: impl Into<String>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            path: path.into(),
            base_path: base_path.into(),
            params: HashMap::new(),
            uploads: HashMap::new(),
            multipart: false,
            sessions,
            session: None,
            fresh_session: false,
            request_models: Mutex::new(HashMap::new()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Append one value under a parameter name. Repeated names
    /// accumulate, preserving arrival order.
    pub fn add_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params
            .entry(name.into())
            .or_default()
            .push(value.into());
    }

    /// Builder-style variant of [`add_parameter`](Self::add_parameter).
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_parameter(name, value);
        self
    }

    /// First value under the name, if any.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    pub fn parameter_values(&self, name: &str) -> Option<&[String]> {
        self.params.get(name).map(Vec::as_slice)
    }

    pub fn parameters(&self) -> &HashMap<String, Vec<String>> {
        &self.params
    }

    /// Record an uploaded file: form field name → temp path.
    pub fn add_upload(&mut self, field: impl Into<String>, stored_at: impl Into<PathBuf>) {
        self.uploads.insert(field.into(), stored_at.into());
    }

    pub fn upload(&self, field: &str) -> Option<&Path> {
        self.uploads.get(field).map(PathBuf::as_path)
    }

    pub fn uploads(&self) -> &HashMap<String, PathBuf> {
        &self.uploads
    }

    /// Whether parameters came from a multipart body rather than the
    /// standard query/form channel.
    pub fn is_multipart(&self) -> bool {
        self.multipart
    }

    pub fn set_multipart(&mut self, multipart: bool) {
        self.multipart = multipart;
    }

    /// The established session, if the host resolved one.
    pub fn session(&self) -> Option<&Arc<SessionState>> {
        self.session.as_ref()
    }

    /// Attach a session resolved by the host (from its cookie).
    pub fn set_session(&mut self, session: Arc<SessionState>) {
        self.session = Some(session);
    }

    /// The session, creating one if the request has none yet.
    pub fn ensure_session(&mut self) -> Arc<SessionState> {
        if let Some(session) = &self.session {
            return session.clone();
        }
        let session = self.sessions.create();
        self.session = Some(session.clone());
        self.fresh_session = true;
        session
    }

    /// True when this request created its session; the host must send
    /// the session cookie back.
    pub fn fresh_session(&self) -> bool {
        self.fresh_session
    }

    /// Replace the session's error note, creating a session if needed.
    pub fn set_last_error(&mut self, text: impl Into<String>) {
        self.ensure_session().set_last_error(text);
    }

    /// Append to the session's error note, creating a session if needed.
    pub fn append_last_error(&mut self, text: &str) {
        self.ensure_session().append_last_error(text);
    }

    /// Read and clear the session's error note.
    pub fn take_last_error(&self) -> Option<String> {
        self.session.as_ref().and_then(|s| s.take_last_error())
    }

    pub(crate) fn request_models_mut(&self) -> MutexGuard<'_, HashMap<String, SharedModel>> {
        self.request_models
            .lock()
            .expect("request model map lock poisoned")
    }
}
