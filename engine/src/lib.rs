//! Async engine adapter for the `fuel` dispatcher.
//!
//! # Overview
//! `FuelEngine` lets async code drive a `Fuel` dispatcher. Transports are
//! blocking, so every exchange runs on tokio's blocking pool and the calling
//! task is suspended until it finishes.
//!
//! # Design
//! - Built from a `FuelConfig`; its `preconfigured` transport is used as is
//!   and is never shut down by the engine.
//! - Clones share one dispatcher. `close` is idempotent and applies to all
//!   clones.
//! - Dropping a pending future detaches the blocking call: it runs to
//!   completion and the result is discarded.

use std::sync::Arc;

use fuel::{
    FromConfig, Fuel, FuelConfig, FuelError, HttpRequest, HttpResponse, Transport, UreqTransport,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::debug;

/// Errors returned by `FuelEngine`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Fuel(#[from] FuelError),

    /// The blocking task running the exchange panicked or was cancelled.
    #[error("dispatch task failed: {0}")]
    Join(#[from] JoinError),
}

impl EngineError {
    /// Status code of an HTTP failure from the convenience path.
    pub fn status(&self) -> Option<u16> {
        match self {
            EngineError::Fuel(e) => e.status(),
            EngineError::Join(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct FuelEngine<T: Transport = UreqTransport> {
    fuel: Arc<Fuel<T>>,
}

impl<T: Transport> Clone for FuelEngine<T> {
    fn clone(&self) -> Self {
        Self {
            fuel: Arc::clone(&self.fuel),
        }
    }
}

impl<T: FromConfig + 'static> FuelEngine<T> {
    pub fn new(config: FuelConfig<T>) -> Self {
        Self::from_dispatcher(Fuel::from_config(config))
    }
}

impl<T: Transport + 'static> FuelEngine<T> {
    pub fn from_dispatcher(fuel: Fuel<T>) -> Self {
        Self { fuel: Arc::new(fuel) }
    }

    pub fn dispatcher(&self) -> &Fuel<T> {
        &self.fuel
    }

    /// Run one exchange and return the raw response.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, EngineError> {
        self.blocking(move |fuel| fuel.execute(request)).await
    }

    /// Run one exchange and return the body text, failing on non-2xx.
    pub async fn fetch_text(&self, request: HttpRequest) -> Result<String, EngineError> {
        self.blocking(move |fuel| fuel.fetch_text(request)).await
    }

    pub async fn fetch_bytes(&self, request: HttpRequest) -> Result<Vec<u8>, EngineError> {
        self.blocking(move |fuel| fuel.fetch_bytes(request)).await
    }

    /// Run one exchange and decode the JSON body, failing on non-2xx.
    pub async fn fetch_json<D>(&self, request: HttpRequest) -> Result<D, EngineError>
    where
        D: DeserializeOwned + Send + 'static,
    {
        self.blocking(move |fuel| fuel.fetch_json(request)).await
    }

    /// GET `url` and return the body text, failing on non-2xx.
    pub async fn get_text(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<String, EngineError> {
        // Built here so a bad url fails without a trip to the blocking pool.
        let request = HttpRequest::builder(url).headers(headers).build()?;
        self.fetch_text(request).await
    }

    pub async fn get_json<D>(&self, url: &str, headers: &[(&str, &str)]) -> Result<D, EngineError>
    where
        D: DeserializeOwned + Send + 'static,
    {
        let request = HttpRequest::builder(url).headers(headers).build()?;
        self.fetch_json(request).await
    }

    pub fn close(&self) {
        debug!("closing engine");
        self.fuel.close();
    }

    pub fn is_closed(&self) -> bool {
        self.fuel.is_closed()
    }

    async fn blocking<R, F>(&self, call: F) -> Result<R, EngineError>
    where
        R: Send + 'static,
        F: FnOnce(&Fuel<T>) -> Result<R, FuelError> + Send + 'static,
    {
        if self.fuel.is_closed() {
            return Err(FuelError::Closed.into());
        }
        let fuel = Arc::clone(&self.fuel);
        let result = tokio::task::spawn_blocking(move || call(fuel.as_ref())).await?;
        Ok(result?)
    }
}

#[cfg(test)]
mod tests {
    use fuel::{ResponseBody, TransportError};

    use super::*;

    struct Fixed(u16);

    impl Transport for Fixed {
        fn execute(&self, _: HttpRequest) -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse::new(self.0, Vec::new(), ResponseBody::from_bytes("body")))
        }
    }

    #[tokio::test]
    async fn fetch_text_returns_body() {
        let engine = FuelEngine::from_dispatcher(Fuel::owned(Fixed(200)));
        assert_eq!(engine.get_text("http://localhost/", &[]).await.unwrap(), "body");
    }

    #[tokio::test]
    async fn fetch_text_maps_404() {
        let engine = FuelEngine::from_dispatcher(Fuel::owned(Fixed(404)));
        let err = engine.get_text("http://localhost/", &[]).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn fetch_bytes_maps_404() {
        let engine = FuelEngine::from_dispatcher(Fuel::owned(Fixed(404)));
        let request = HttpRequest::builder("http://localhost/").build().unwrap();
        let err = engine.fetch_bytes(request).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_up_front() {
        let engine = FuelEngine::from_dispatcher(Fuel::owned(Fixed(200)));
        let err = engine.get_text("relative/path", &[]).await.unwrap_err();
        assert!(matches!(err, EngineError::Fuel(FuelError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn closed_engine_refuses_calls() {
        let engine = FuelEngine::from_dispatcher(Fuel::owned(Fixed(200)));
        let clone = engine.clone();
        engine.close();
        engine.close();
        assert!(clone.is_closed());
        let err = clone.get_text("http://localhost/", &[]).await.unwrap_err();
        assert!(matches!(err, EngineError::Fuel(FuelError::Closed)));
    }
}
