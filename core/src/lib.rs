//! Verb-shaped HTTP client facade over a pluggable transport.
//!
//! # Overview
//! `Fuel` turns `get`/`post`/`put`/`patch`/`delete`/`head`/`method` calls
//! into validated `HttpRequest` values and hands each one to a `Transport`
//! for a single round trip. Pooling, TLS, timeouts and redirects stay inside
//! the transport; the bundled one is `UreqTransport`.
//!
//! # Design
//! - Request shape is checked locally (`InvalidArgument`) before any I/O.
//! - Verb methods return the raw response; only the `fetch_*`, `get_text`
//!   and `get_json` helpers turn non-2xx statuses into `FuelError::Http`.
//! - The transport is held through a `TransportHandle` that records whether
//!   the dispatcher owns it, so `close` never shuts down a transport the
//!   caller passed in.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod ureq_transport;

pub use client::Fuel;
pub use config::{FuelConfig, TransportConfig};
pub use error::{FuelError, TransportError};
pub use crate::http::{
    CustomMethod, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse, RequestBody,
    ResponseBody,
};
pub use transport::{FromConfig, Transport, TransportHandle};
pub use ureq_transport::UreqTransport;
