use std::sync::Arc;

use crate::error::ViewerError;
use crate::viewer::{View, Viewer};
use async_trait::async_trait;
use glimpse_core::{Code, ConsumeOutcome, Repository};
use serde_json::Value;
use tracing::{debug, error, trace};

/// Service for handling reads.
///
/// Every call to [`ViewerService::view`] is one atomic consumption attempt
/// against the repository; the service keeps no view state of its own.
#[derive(Debug)]
pub struct ViewerService<R> {
    repository: Arc<R>,
}

impl<R> Clone for ViewerService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: Repository> ViewerService<R> {
    /// Creates a new ViewerService with the given repository.
    pub fn new(repository: R) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    /// Creates a service over a repository that other components also hold.
    pub fn from_shared(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Consumes one view of `code`.
    ///
    /// # Returns
    ///
    /// * `Ok(View::Consumed { .. })` - A view was taken; carries the payload
    ///   and the views left afterwards
    /// * `Ok(View::Exhausted)` - The code exists but has no views left
    /// * `Ok(View::NotFound)` - The code does not exist
    /// * `Err(e)` - The repository failed or the stored payload is corrupt
    pub async fn view(&self, code: &Code) -> crate::Result<View> {
        Viewer::view(self, code).await
    }
}

fn decode_payload(code: &Code, payload: &str) -> crate::Result<Value> {
    if payload.is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(payload).map_err(|e| ViewerError::CorruptPayload {
        code: code.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl<R: Repository> Viewer for ViewerService<R> {
    async fn view(&self, code: &Code) -> crate::Result<View> {
        trace!(code = %code, "viewing code");

        let outcome = self.repository.try_consume(code).await.map_err(|e| {
            error!(code = %code, error = %e, "consume failed");
            ViewerError::from(e)
        })?;

        match outcome {
            ConsumeOutcome::NotFound => {
                trace!(code = %code, "code not found");
                Ok(View::NotFound)
            }
            ConsumeOutcome::Exhausted => {
                debug!(code = %code, "code exhausted");
                Ok(View::Exhausted)
            }
            ConsumeOutcome::Consumed { payload, remaining } => {
                debug!(code = %code, remaining_views = remaining, "view consumed");
                Ok(View::Consumed {
                    code: code.clone(),
                    payload: decode_payload(code, &payload)?,
                    remaining_views: remaining,
                })
            }
        }
    }
}
