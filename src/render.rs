//! Render client
//!
//! Turns a completed diary form into a request against the external
//! rendering service and returns the image it produces.

mod error;
mod http;
mod request;

pub use error::RenderError;
pub use http::{HttpRenderClient, RenderEndpoints, DEFAULT_RENDER_TIMEOUT};
pub use request::RenderRequest;

use async_trait::async_trait;
use std::sync::Arc;

/// Anything that can turn a completed form into image bytes
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render once. No retries.
    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError>;
}

#[async_trait]
impl<T: Renderer + ?Sized> Renderer for Arc<T> {
    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError> {
        (**self).render(request).await
    }
}

/// Logging wrapper for renderers
pub struct LoggingRenderer<R> {
    inner: R,
}

impl<R: Renderer> LoggingRenderer<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: Renderer> Renderer for LoggingRenderer<R> {
    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError> {
        let start = std::time::Instant::now();
        let result = self.inner.render(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(image) => {
                tracing::info!(
                    shape = request.shape(),
                    duration_ms = %duration.as_millis(),
                    bytes = image.len(),
                    "Render completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    shape = request.shape(),
                    duration_ms = %duration.as_millis(),
                    error = %e,
                    "Render failed"
                );
            }
        }

        result
    }
}
