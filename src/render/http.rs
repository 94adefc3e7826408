//! HTTP implementation of the render client

use super::{RenderError, RenderRequest, Renderer};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

/// Default timeout for one render round trip
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Base URLs of the two render endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderEndpoints {
    /// Accepts `class, subject, cw, hw, remarks, teacher`
    pub with_homework: Url,
    /// Accepts `class, subject, cw, teacher`
    pub classwork_only: Url,
}

impl RenderEndpoints {
    pub fn parse(with_homework: &str, classwork_only: &str) -> Result<Self, RenderError> {
        Ok(Self {
            with_homework: parse_endpoint(with_homework)?,
            classwork_only: parse_endpoint(classwork_only)?,
        })
    }

    /// Full request URL. Values are form-encoded as opaque strings.
    pub fn url_for(&self, request: &RenderRequest) -> Url {
        let mut url = if request.has_homework() {
            self.with_homework.clone()
        } else {
            self.classwork_only.clone()
        };
        url.query_pairs_mut().extend_pairs(request.query_pairs());
        url
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, RenderError> {
    let url = Url::parse(raw).map_err(|e| RenderError::InvalidEndpoint {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(RenderError::InvalidEndpoint {
            url: raw.to_string(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

/// Render client backed by `reqwest`
pub struct HttpRenderClient {
    client: Client,
    endpoints: RenderEndpoints,
}

impl HttpRenderClient {
    pub fn new(endpoints: RenderEndpoints, timeout: Duration) -> Result<Self, RenderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RenderError::network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, endpoints })
    }
}

#[async_trait]
impl Renderer for HttpRenderClient {
    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError> {
        let url = self.endpoints.url_for(request);
        tracing::debug!(shape = request.shape(), host = ?url.host_str(), "Requesting render");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(RenderError::EmptyBody);
        }
        Ok(body.to_vec())
    }
}
