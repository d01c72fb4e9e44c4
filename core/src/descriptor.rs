//! Typed request descriptors.
//!
//! # Design
//! A `RequestDescriptor<T>` is the method/url/payload of one call plus a
//! zero-sized tag naming the response type `T`. The tag costs nothing at
//! runtime; it lets the pipeline decode into the right shape without each
//! endpoint wrapper repeating a turbofish.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpMethod;

pub struct RequestDescriptor<T> {
    method: HttpMethod,
    url: String,
    payload: Option<Value>,
    shape: PhantomData<fn() -> T>,
}

impl<T> RequestDescriptor<T> {
    pub fn new(method: HttpMethod, url: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            method,
            url: url.into(),
            payload,
            shape: PhantomData,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url, None)
    }

    pub fn post<P: Serialize + ?Sized>(url: impl Into<String>, payload: &P) -> Result<Self, ApiError> {
        Ok(Self::new(HttpMethod::Post, url, Some(encode(payload)?)))
    }

    pub fn put<P: Serialize + ?Sized>(url: impl Into<String>, payload: &P) -> Result<Self, ApiError> {
        Ok(Self::new(HttpMethod::Put, url, Some(encode(payload)?)))
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url, None)
    }

    /// DELETE carrying a JSON body, as the file and sheet routes expect.
    pub fn delete_with<P: Serialize + ?Sized>(
        url: impl Into<String>,
        payload: &P,
    ) -> Result<Self, ApiError> {
        Ok(Self::new(HttpMethod::Delete, url, Some(encode(payload)?)))
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }
}

fn encode<P: Serialize + ?Sized>(payload: &P) -> Result<Value, ApiError> {
    serde_json::to_value(payload).map_err(|e| ApiError::Encode(e.to_string()))
}

impl<T> Clone for RequestDescriptor<T> {
    fn clone(&self) -> Self {
        Self::new(self.method, self.url.clone(), self.payload.clone())
    }
}

impl<T> PartialEq for RequestDescriptor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && self.url == other.url && self.payload == other.payload
    }
}

impl<T> fmt::Debug for RequestDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("payload", &self.payload)
            .field("shape", &std::any::type_name::<T>())
            .finish()
    }
}
