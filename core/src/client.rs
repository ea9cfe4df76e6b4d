//! The request dispatcher.
//!
//! # Design
//! `Fuel` holds a transport handle and a closed flag, nothing else. Each verb
//! method builds an `HttpRequest` (which is where argument shapes are
//! checked) and hands it to the transport for exactly one round trip. Status
//! codes are only interpreted by the `fetch_*` / `get_text` / `get_json`
//! convenience methods.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::FuelConfig;
use crate::error::FuelError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
use crate::transport::{FromConfig, Transport, TransportHandle};
use crate::ureq_transport::UreqTransport;

/// Verb-shaped facade over a `Transport`.
///
/// Cheap to share behind an `Arc`; concurrent calls only touch the transport.
#[derive(Debug)]
pub struct Fuel<T: Transport = UreqTransport> {
    transport: TransportHandle<T>,
    closed: AtomicBool,
}

impl Fuel<UreqTransport> {
    /// A dispatcher owning a `UreqTransport` with default settings.
    pub fn new() -> Self {
        Self::owned(UreqTransport::default())
    }
}

impl Default for Fuel<UreqTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Fuel<T> {
    /// Take ownership of `transport`; `close` will shut it down.
    pub fn owned(transport: T) -> Self {
        Self::with_handle(TransportHandle::Owned(transport))
    }

    /// Share a caller-owned transport; `close` leaves it running.
    pub fn shared(transport: Arc<T>) -> Self {
        Self::with_handle(TransportHandle::Shared(transport))
    }

    /// Wrap an already tagged handle. `Owned` is shut down by `close`,
    /// `Shared` is not.
    pub fn with_handle(transport: TransportHandle<T>) -> Self {
        Self {
            transport,
            closed: AtomicBool::new(false),
        }
    }

    /// Use `config.preconfigured` when present, otherwise build an owned
    /// transport from `config.transport`.
    pub fn from_config(config: FuelConfig<T>) -> Self
    where
        T: FromConfig,
    {
        match config.preconfigured {
            Some(transport) => Self::shared(transport),
            None => Self::owned(T::from_config(&config.transport)),
        }
    }

    /// The transport requests are forwarded to.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether `close` will shut the transport down.
    pub fn owns_transport(&self) -> bool {
        self.transport.is_owned()
    }

    pub fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, FuelError> {
        self.dispatch(url, HttpMethod::Get, None, headers)
    }

    pub fn post(
        &self,
        url: &str,
        body: Option<RequestBody>,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, FuelError> {
        self.dispatch(url, HttpMethod::Post, body, headers)
    }

    pub fn put(
        &self,
        url: &str,
        body: Option<RequestBody>,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, FuelError> {
        self.dispatch(url, HttpMethod::Put, body, headers)
    }

    pub fn patch(
        &self,
        url: &str,
        body: Option<RequestBody>,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, FuelError> {
        self.dispatch(url, HttpMethod::Patch, body, headers)
    }

    pub fn delete(
        &self,
        url: &str,
        body: Option<RequestBody>,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, FuelError> {
        self.dispatch(url, HttpMethod::Delete, body, headers)
    }

    pub fn head(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, FuelError> {
        self.dispatch(url, HttpMethod::Head, None, headers)
    }

    /// Send an arbitrary method, e.g. `CONNECT`. The name must be a
    /// non-empty HTTP token.
    pub fn method(
        &self,
        url: &str,
        method_name: &str,
        body: Option<RequestBody>,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, FuelError> {
        let method =
            HttpMethod::parse(method_name).inspect_err(|e| warn!(error = %e, "rejected request"))?;
        self.dispatch(url, method, body, headers)
    }

    /// Send a prebuilt request.
    pub fn execute(&self, request: HttpRequest) -> Result<HttpResponse, FuelError> {
        if self.is_closed() {
            return Err(FuelError::Closed);
        }

        debug!(method = %request.method(), url = %request.url(), "dispatching request");
        match self.transport.execute(request) {
            Ok(response) => {
                debug!(status = response.status, "received response");
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, "transport failure");
                Err(e.into())
            }
        }
    }

    /// Execute and return the body text, failing on non-2xx.
    pub fn fetch_text(&self, request: HttpRequest) -> Result<String, FuelError> {
        Ok(self.execute(request)?.error_for_status()?.text()?)
    }

    pub fn fetch_bytes(&self, request: HttpRequest) -> Result<Vec<u8>, FuelError> {
        Ok(self.execute(request)?.error_for_status()?.bytes()?)
    }

    pub fn fetch_json<D: DeserializeOwned>(&self, request: HttpRequest) -> Result<D, FuelError> {
        self.execute(request)?.error_for_status()?.json()
    }

    pub fn get_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, FuelError> {
        self.fetch_text(build(url, HttpMethod::Get, None, headers)?)
    }

    pub fn get_json<D: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<D, FuelError> {
        self.fetch_json(build(url, HttpMethod::Get, None, headers)?)
    }

    /// Stop accepting requests. Shuts the transport down only if this
    /// dispatcher owns it. Calling it again does nothing.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let owned = self.owns_transport();
        info!(owned, "closing dispatcher");
        if owned {
            self.transport.shutdown();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn dispatch(
        &self,
        url: &str,
        method: HttpMethod,
        body: Option<RequestBody>,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, FuelError> {
        self.execute(build(url, method, body, headers)?)
    }
}

fn build(
    url: &str,
    method: HttpMethod,
    body: Option<RequestBody>,
    headers: &[(&str, &str)],
) -> Result<HttpRequest, FuelError> {
    HttpRequest::builder(url)
        .method(method)
        .headers(headers)
        .optional_body(body)
        .build()
        .inspect_err(|e| warn!(error = %e, "rejected request"))
}
