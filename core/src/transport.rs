//! The transport capability the dispatcher delegates to.
//!
//! # Design
//! `Transport` is the only seam between `Fuel` and the network. Anything that
//! can turn an `HttpRequest` into an `HttpResponse` can sit behind it: the
//! bundled `UreqTransport`, a test double, or an adapter over another engine.
//!
//! `TransportHandle` records who owns the transport. The dispatcher only
//! shuts down a transport it built itself.

use std::ops::Deref;
use std::sync::Arc;

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Performs one HTTP exchange.
///
/// Implementations own connection reuse, timeouts and TLS. They must be
/// safe to call from several threads at once.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Release pooled resources. Only called on transports the dispatcher
    /// owns. Must tolerate being called more than once.
    fn shutdown(&self) {}
}

/// A transport the dispatcher can build for itself.
pub trait FromConfig: Transport + Sized {
    fn from_config(config: &TransportConfig) -> Self;
}

/// A transport tagged with its owner.
#[derive(Debug)]
pub enum TransportHandle<T> {
    /// Built by the dispatcher, shut down on close.
    Owned(T),
    /// Supplied by the caller, never shut down by the dispatcher.
    Shared(Arc<T>),
}

impl<T> TransportHandle<T> {
    pub fn is_owned(&self) -> bool {
        matches!(self, TransportHandle::Owned(_))
    }
}

impl<T> Deref for TransportHandle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            TransportHandle::Owned(t) => t,
            TransportHandle::Shared(t) => t,
        }
    }
}
