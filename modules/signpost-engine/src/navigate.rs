//! Forward resolution and terminal dispatch.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use signpost_core::{DispatchError, DispatchResult, HistoryEntry, MappingRegistry};

use crate::action::Outcome;
use crate::context::RequestContext;
use crate::resolver::action_name;

/// Host capability for getting a response out the door.
///
/// Implemented by the web layer (and by `RecordingWriter` in tests).
/// Errors from `redirect` and `forward` surface as `ForwardIo`;
/// `send_direct` failures are logged and swallowed by the navigator.
#[async_trait]
pub trait ResponseWriter: Send {
    /// Client-visible redirect to an absolute URL.
    async fn redirect(&mut self, url: &str) -> Result<()>;

    /// Internal forward to a destination within the application.
    async fn forward(&mut self, destination: &str) -> Result<()>;

    /// Write a payload straight back with the given content type.
    async fn send_direct(&mut self, content_type: &str, body: &[u8]) -> Result<()>;
}

/// Routes a handler's outcome to its destination.
///
/// Destination precedence: a custom-URL forward takes the URL from the
/// outcome; a back-to-caller forward pops the session history (the
/// popped entry supplies the redirect flag too); otherwise the
/// forward's static path applies. Unless the forward opts out, the
/// chosen destination is pushed onto the session history before
/// dispatch.
pub struct Navigator<'a> {
    mappings: &'a MappingRegistry,
}

impl<'a> Navigator<'a> {
    pub fn new(mappings: &'a MappingRegistry) -> Self {
        Self { mappings }
    }

    pub async fn navigate(
        &self,
        ctx: &mut RequestContext,
        outcome: &Outcome,
        writer: &mut dyn ResponseWriter,
    ) -> DispatchResult<()> {
        let result = match outcome {
            Outcome::Direct { content_type, body } => {
                return self.write_direct(content_type, body, writer).await;
            }
            Outcome::Forward(result) => result.as_str(),
            Outcome::CustomUrl { result, .. } => result.as_str(),
        };

        let action = action_name(ctx.path(), self.mappings.page_suffix()).ok_or_else(|| {
            DispatchError::ActionNameUnresolved {
                path: ctx.path().to_string(),
            }
        })?;
        let descriptor =
            self.mappings
                .action(&action)
                .ok_or_else(|| DispatchError::ActionNotFound {
                    name: action.clone(),
                })?;

        // Action-local forwards shadow global ones.
        let forward = descriptor
            .forward(result)
            .or_else(|| self.mappings.global_forward(result))
            .ok_or_else(|| DispatchError::ForwardNotResolved {
                result: result.to_string(),
                action: action.clone(),
            })?;

        let (destination, redirect) = if forward.custom_url {
            let url = match outcome {
                Outcome::CustomUrl { url, .. } => url,
                _ => {
                    return Err(DispatchError::ActionResultTypeMismatch {
                        action: action.clone(),
                    })
                }
            };
            if url.is_empty() {
                return Err(DispatchError::EmptyForwardPath {
                    forward: forward.name.clone(),
                    action: action.clone(),
                });
            }
            (url.clone(), forward.redirect)
        } else if forward.back_to_caller {
            let session = ctx.ensure_session();
            let entry = session
                .pop_history()
                .ok_or_else(|| DispatchError::HistoryStackEmpty {
                    action: action.clone(),
                })?;
            (entry.uri, entry.redirect)
        } else {
            if forward.path.is_empty() {
                return Err(DispatchError::EmptyForwardPath {
                    forward: forward.name.clone(),
                    action: action.clone(),
                });
            }
            (forward.path.clone(), forward.redirect)
        };

        if !forward.avoid_history_save {
            ctx.ensure_session()
                .push_history(HistoryEntry::new(destination.clone(), redirect));
        }

        info!(action = %action, destination = %destination, redirect, "navigating");
        if redirect {
            let url = format!("{}{}", ctx.base_path(), destination);
            writer
                .redirect(&url)
                .await
                .map_err(|e| DispatchError::ForwardIo {
                    destination: url.clone(),
                    source: e,
                })?;
        } else {
            writer
                .forward(&destination)
                .await
                .map_err(|e| DispatchError::ForwardIo {
                    destination: destination.clone(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Write a direct payload. Failures are logged, never surfaced; the
    /// host closes the stream on every exit path anyway.
    pub async fn write_direct(
        &self,
        content_type: &str,
        body: &[u8],
        writer: &mut dyn ResponseWriter,
    ) -> DispatchResult<()> {
        if let Err(e) = writer.send_direct(content_type, body).await {
            warn!(error = %e, content_type, "direct response write failed");
        }
        Ok(())
    }
}
