//! Request/response interceptors and the token seam they read from.
//!
//! # Design
//! Interceptors are registered on the pipeline builder and run in
//! registration order on every path: `on_request` before dispatch,
//! `on_response` after a 2xx, `on_error` for any failure. Every hook has a
//! pass-through default so an interceptor only implements what it needs.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// What an `on_error` handler knows about the failed call.
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext<'a> {
    pub method: HttpMethod,
    pub url: &'a str,
    /// Sends made before giving up; `0` if the request never left the pipeline.
    pub attempts: u32,
}

pub trait Interceptor: Send + Sync {
    /// Inspect or rewrite the outgoing request. An error aborts the call.
    fn on_request(&self, _request: &mut HttpRequest) -> Result<(), ApiError> {
        Ok(())
    }

    /// Inspect or rewrite a successful response before it is decoded.
    fn on_response(&self, _request: &HttpRequest, _response: &mut HttpResponse) -> Result<(), ApiError> {
        Ok(())
    }

    /// Return `Err` to pass the (possibly translated) error to the next
    /// handler, or `Ok(response)` to suppress it with a substitute response.
    fn on_error(&self, _ctx: &ErrorContext<'_>, error: ApiError) -> Result<HttpResponse, ApiError> {
        Err(error)
    }
}

/// Read access to the session tokens. Persistence is the caller's concern.
pub trait TokenStore: Send + Sync {
    fn access_token(&self) -> Option<String>;

    fn refresh_token(&self) -> Option<String> {
        None
    }

    /// Forget the session, e.g. after the server rejects the token.
    fn clear(&self);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTokens {
    pub access: String,
    pub refresh: Option<String>,
}

/// Process-local `TokenStore`.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Option<SessionTokens>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tokens(&self, access: impl Into<String>, refresh: Option<String>) {
        *self.tokens.write() = Some(SessionTokens {
            access: access.into(),
            refresh,
        });
    }

    pub fn tokens(&self) -> Option<SessionTokens> {
        self.tokens.read().clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<String> {
        self.tokens.read().as_ref().map(|t| t.access.clone())
    }

    fn refresh_token(&self) -> Option<String> {
        self.tokens.read().as_ref().and_then(|t| t.refresh.clone())
    }

    fn clear(&self) {
        *self.tokens.write() = None;
    }
}

/// Attaches `authorization: Bearer <token>` when a session exists.
pub struct BearerAuth {
    store: Arc<dyn TokenStore>,
}

impl BearerAuth {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }
}

impl Interceptor for BearerAuth {
    fn on_request(&self, request: &mut HttpRequest) -> Result<(), ApiError> {
        if let Some(token) = self.store.access_token().filter(|t| !t.is_empty()) {
            request.set_header("authorization", format!("Bearer {token}"));
        }
        Ok(())
    }
}

/// Ends the local session when the server answers 401. The error itself is
/// passed on unchanged.
pub struct SessionGuard {
    store: Arc<dyn TokenStore>,
}

impl SessionGuard {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }
}

impl Interceptor for SessionGuard {
    fn on_error(&self, ctx: &ErrorContext<'_>, error: ApiError) -> Result<HttpResponse, ApiError> {
        if error.is_unauthorized() {
            warn!(method = %ctx.method, url = ctx.url, "session expired, clearing tokens");
            self.store.clear();
        }
        Err(error)
    }
}
