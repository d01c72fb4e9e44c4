//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

pub(crate) enum Reply {
    Respond(HttpResponse),
    Fail(ApiError),
    After(Duration, HttpResponse),
    Hang,
}

pub(crate) fn ok(body: &str) -> Reply {
    Reply::Respond(HttpResponse::new(200, body))
}

pub(crate) fn status(code: u16, body: &str) -> Reply {
    Reply::Respond(HttpResponse::new(code, body))
}

/// Replays `replies` in order; once they run out, repeats `fallback`.
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    fallback: fn() -> Reply,
    sent: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(replies: Vec<Reply>) -> Self {
        Self::with_fallback(replies, || ok("{}"))
    }

    pub(crate) fn with_fallback(replies: Vec<Reply>, fallback: fn() -> Reply) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.sent.lock().push(request);
        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| (self.fallback)());
        match reply {
            Reply::Respond(response) => Ok(response),
            Reply::Fail(error) => Err(error),
            Reply::After(delay, response) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Reply::Hang => std::future::pending().await,
        }
    }
}

