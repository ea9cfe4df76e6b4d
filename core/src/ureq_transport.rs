//! `Transport` backed by a `ureq::Agent`.
//!
//! Agents built from a `TransportConfig` never turn status codes into errors,
//! so every completed exchange comes back as an `HttpResponse`, and they
//! accept any method token so `Fuel::method` can send extension verbs. An
//! agent handed in through `from_agent` is used unchanged.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use ureq::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use ureq::{Agent, Body, RequestBuilder};

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody, ResponseBody};
use crate::transport::{FromConfig, Transport};

pub struct UreqTransport {
    agent: Agent,
    shut_down: AtomicBool,
}

impl UreqTransport {
    pub fn new(config: &TransportConfig) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .allow_non_standard_methods(true)
            .timeout_global(config.timeout())
            .timeout_connect(config.connect_timeout())
            .max_redirects(config.max_redirects)
            .max_idle_connections(config.max_idle_connections)
            .build()
            .new_agent();
        Self::from_agent(agent)
    }

    /// Wrap an existing agent without touching its configuration.
    ///
    /// ureq agents turn 4xx/5xx into errors by default. Unless the agent was
    /// built with `http_status_as_error(false)`, those statuses come back as
    /// `TransportError::Status` with no response or body, even from the verb
    /// methods. Likewise extension methods need `allow_non_standard_methods`.
    pub fn from_agent(agent: Agent) -> Self {
        Self {
            agent,
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    fn run_custom(
        &self,
        name: &str,
        url: &str,
        headers: &[(String, String)],
        body: Option<&RequestBody>,
    ) -> Result<ureq::http::Response<Body>, TransportError> {
        let mut builder = ureq::http::Request::builder().method(name).uri(url);
        for (k, v) in headers {
            builder = builder.header(k.as_str(), v.as_str());
        }
        let response = match body {
            Some(body) => {
                let request = builder
                    .header(CONTENT_TYPE, body.content_type())
                    .body(body.data().to_vec())
                    .map_err(TransportError::engine)?;
                self.agent.run(request)?
            }
            None => {
                let request = builder.body(()).map_err(TransportError::engine)?;
                self.agent.run(request)?
            }
        };
        Ok(response)
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}

impl FromConfig for UreqTransport {
    fn from_config(config: &TransportConfig) -> Self {
        Self::new(config)
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if self.is_shut_down() {
            return Err(TransportError::Shutdown);
        }

        let url = request.url().to_string();
        let url = url.as_str();
        let body = request.body();
        // The body's own content type wins over a caller-supplied header.
        let headers: Vec<(String, String)> = request
            .headers()
            .iter()
            .filter(|(k, _)| body.is_none() || !k.eq_ignore_ascii_case(CONTENT_TYPE.as_str()))
            .cloned()
            .collect();

        let agent = &self.agent;
        let response = match (request.method(), body) {
            (HttpMethod::Get, _) => with_headers(agent.get(url), &headers).call()?,
            (HttpMethod::Head, _) => with_headers(agent.head(url), &headers).call()?,
            (HttpMethod::Delete, None) => with_headers(agent.delete(url), &headers).call()?,
            (HttpMethod::Delete, Some(body)) => {
                with_headers(agent.delete(url).force_send_body(), &headers)
                    .content_type(body.content_type())
                    .send(&body.data()[..])?
            }
            (HttpMethod::Post, Some(body)) => with_headers(agent.post(url), &headers)
                .content_type(body.content_type())
                .send(&body.data()[..])?,
            (HttpMethod::Put, Some(body)) => with_headers(agent.put(url), &headers)
                .content_type(body.content_type())
                .send(&body.data()[..])?,
            (HttpMethod::Patch, Some(body)) => with_headers(agent.patch(url), &headers)
                .content_type(body.content_type())
                .send(&body.data()[..])?,
            // Unreachable for built requests, kept total for the match.
            (HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch, None) => {
                return Err(TransportError::engine(format!(
                    "{} request without a body",
                    request.method()
                )));
            }
            (HttpMethod::Custom(name), body) => self.run_custom(name.as_str(), url, &headers, body)?,
        };

        Ok(into_response(response))
    }

    fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
    }
}

fn with_headers<B>(
    mut builder: RequestBuilder<B>,
    headers: &[(String, String)],
) -> RequestBuilder<B> {
    for (k, v) in headers {
        builder = builder.header(k.as_str(), v.as_str());
    }
    builder
}

fn into_response(response: ureq::http::Response<Body>) -> HttpResponse {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(k, v)| header_pair(k, v))
        .collect();
    let body = ResponseBody::from_reader(response.into_body().into_reader());
    HttpResponse::new(status, headers, body)
}

// Non-UTF-8 values are kept lossily rather than dropped.
fn header_pair(name: &HeaderName, value: &HeaderValue) -> (String, String) {
    let value = match value.to_str() {
        Ok(v) => v.to_string(),
        Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
    };
    (name.as_str().to_string(), value)
}
