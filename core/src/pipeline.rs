//! The request pipeline every endpoint wrapper goes through.
//!
//! # Design
//! A `Pipeline` is built once from a `PipelineConfig` and is immutable
//! afterwards; there is no way to reconfigure it, so share it behind an `Arc`
//! and build a new one if settings must change. One call runs:
//!
//! 1. validate the descriptor and resolve its url against `base_url`
//! 2. claim the in-flight key (when dedup is on) or fail with
//!    `DuplicateRequest`
//! 3. `on_request` interceptors, in registration order
//! 4. send with a per-attempt timeout, retrying per the `RetryPolicy`
//! 5. `on_response` interceptors on 2xx, then decode into the response type
//! 6. on any failure, the `on_error` chain, which may translate or suppress
//!
//! The in-flight key is released as soon as step 4/5 settles, whatever the
//! outcome. Nothing is cached.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::{ConfigError, PipelineConfig};
use crate::dedup::{InFlightKey, InFlightRegistry};
use crate::descriptor::RequestDescriptor;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::interceptor::{ErrorContext, Interceptor};

pub struct PipelineBuilder {
    config: PipelineConfig,
    transport: Option<Arc<dyn Transport>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl PipelineBuilder {
    /// Append an interceptor; handlers run in the order they are added.
    pub fn interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn shared_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Replace the default `reqwest` transport.
    pub fn transport(self, transport: impl Transport + 'static) -> Self {
        self.shared_transport(Arc::new(transport))
    }

    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<Pipeline, ConfigError> {
        self.config.validate()?;
        let transport = match self.transport {
            Some(t) => t,
            None => {
                let connect_timeout = match self.config.timeout_ms {
                    0 => Duration::from_secs(30),
                    _ => self.config.timeout(),
                };
                let t = ReqwestTransport::new(connect_timeout)
                    .map_err(|e| ConfigError::Transport(e.to_string()))?;
                Arc::new(t) as Arc<dyn Transport>
            }
        };
        Ok(Pipeline {
            base_url: self.config.base_url.trim_end_matches('/').to_string(),
            config: self.config,
            transport,
            interceptors: self.interceptors,
            in_flight: InFlightRegistry::new(),
        })
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    base_url: String,
    transport: Arc<dyn Transport>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    in_flight: InFlightRegistry,
}

impl Pipeline {
    pub fn builder(config: PipelineConfig) -> PipelineBuilder {
        PipelineBuilder {
            config,
            transport: None,
            interceptors: Vec::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Keys of the requests currently outstanding.
    pub fn in_flight(&self) -> &InFlightRegistry {
        &self.in_flight
    }

    pub async fn get<T: DeserializeOwned>(&self, url: impl Into<String>) -> Result<T, ApiError> {
        self.request(RequestDescriptor::get(url)).await
    }

    pub async fn post<T, P>(&self, url: impl Into<String>, payload: &P) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let url = url.into();
        match RequestDescriptor::post(url.clone(), payload) {
            Ok(descriptor) => self.request(descriptor).await,
            Err(e) => self.reject(HttpMethod::Post, &url, e),
        }
    }

    pub async fn put<T, P>(&self, url: impl Into<String>, payload: &P) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let url = url.into();
        match RequestDescriptor::put(url.clone(), payload) {
            Ok(descriptor) => self.request(descriptor).await,
            Err(e) => self.reject(HttpMethod::Put, &url, e),
        }
    }

    pub async fn delete<T: DeserializeOwned>(&self, url: impl Into<String>) -> Result<T, ApiError> {
        self.request(RequestDescriptor::delete(url)).await
    }

    pub async fn delete_with<T, P>(&self, url: impl Into<String>, payload: &P) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let url = url.into();
        match RequestDescriptor::delete_with(url.clone(), payload) {
            Ok(descriptor) => self.request(descriptor).await,
            Err(e) => self.reject(HttpMethod::Delete, &url, e),
        }
    }

    /// Issue one logical request and decode its body as `T`.
    pub async fn request<T: DeserializeOwned>(&self, descriptor: RequestDescriptor<T>) -> Result<T, ApiError> {
        let url = self.resolve_url(descriptor.url());
        let mut attempts = 0;

        let result = match self.dispatch(&descriptor, &url, &mut attempts).await {
            Ok(response) => decode(&response),
            Err(e) => Err(e),
        };

        match result {
            Ok(value) => Ok(value),
            Err(error) => {
                let ctx = ErrorContext {
                    method: descriptor.method(),
                    url: &url,
                    attempts,
                };
                let response = self.run_error_chain(&ctx, error)?;
                decode(&response)
            }
        }
    }

    async fn dispatch<T>(
        &self,
        descriptor: &RequestDescriptor<T>,
        url: &str,
        attempts: &mut u32,
    ) -> Result<HttpResponse, ApiError> {
        let method = descriptor.method();
        if descriptor.url().trim().is_empty() {
            return Err(ApiError::InvalidRequest("url must not be empty".to_string()));
        }
        if method.requires_body() && descriptor.payload().is_none() {
            return Err(ApiError::InvalidRequest(format!("{method} {url} requires a payload")));
        }

        let body = match descriptor.payload() {
            Some(payload) if method.allows_body() => {
                Some(serde_json::to_string(payload).map_err(|e| ApiError::Encode(e.to_string()))?)
            }
            Some(_) => {
                debug!(%method, url, "dropping payload on bodiless request");
                None
            }
            None => None,
        };

        let _guard = if self.config.dedup_in_flight {
            let key = InFlightKey::new(method, url, body.clone());
            let guard = self.in_flight.try_claim(key).ok_or_else(|| {
                debug!(%method, url, "rejecting duplicate in-flight request");
                ApiError::DuplicateRequest {
                    method,
                    url: url.to_string(),
                }
            })?;
            Some(guard)
        } else {
            None
        };

        let mut request = HttpRequest {
            method,
            url: url.to_string(),
            headers: vec![("accept".to_string(), "application/json".to_string())],
            body,
        };
        if request.body.is_some() {
            request.set_header("content-type", "application/json");
        }
        for interceptor in &self.interceptors {
            interceptor.on_request(&mut request)?;
        }

        let timeout = self.config.timeout();
        let request_ref = &request;
        let mut response = self
            .config
            .retry
            .execute(|attempt| {
                *attempts = attempt + 1;
                let request = request_ref.clone();
                async move { self.send_once(request, timeout).await }
            })
            .await?;

        for interceptor in &self.interceptors {
            interceptor.on_response(&request, &mut response)?;
        }
        Ok(response)
    }

    async fn send_once(&self, request: HttpRequest, timeout: Duration) -> Result<HttpResponse, ApiError> {
        let method = request.method;
        let url = request.url.clone();
        debug!(%method, url = %url, "sending request");

        let response = if timeout.is_zero() {
            self.transport.send(request).await?
        } else {
            match tokio::time::timeout(timeout, self.transport.send(request)).await {
                Ok(result) => result?,
                Err(_) => return Err(ApiError::Timeout(timeout)),
            }
        };

        debug!(%method, url = %url, status = response.status, "received response");
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(response.status, &response.body))
        }
    }

    fn run_error_chain(&self, ctx: &ErrorContext<'_>, mut error: ApiError) -> Result<HttpResponse, ApiError> {
        for interceptor in &self.interceptors {
            match interceptor.on_error(ctx, error) {
                Ok(response) => {
                    debug!(method = %ctx.method, url = ctx.url, "error suppressed by interceptor");
                    return Ok(response);
                }
                Err(e) => error = e,
            }
        }
        Err(error)
    }

    /// Route an error raised before a descriptor existed through `on_error`.
    fn reject<T: DeserializeOwned>(&self, method: HttpMethod, url: &str, error: ApiError) -> Result<T, ApiError> {
        let url = self.resolve_url(url);
        let ctx = ErrorContext {
            method,
            url: &url,
            attempts: 0,
        };
        let response = self.run_error_chain(&ctx, error)?;
        decode(&response)
    }

    fn resolve_url(&self, path: &str) -> String {
        let path = path.trim();
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

/// An empty body decodes as JSON `null`, so `()` and `Option<_>` shapes work.
fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    let body = if response.body.trim().is_empty() {
        "null"
    } else {
        response.body.as_str()
    };
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}
