//! Request and response descriptors.
//!
//! # Design
//! These types describe one HTTP exchange as data. `HttpRequest` can only be
//! produced by `HttpRequestBuilder::build`, which checks the request shape
//! (absolute http(s) URL, valid method, body present when the method needs
//! one). A built request is therefore always safe to hand to a transport.
//!
//! `HttpResponse` keeps its body as a lazy reader owned by the caller. The
//! body can be consumed once; dropping the response releases whatever the
//! transport is holding for it.

use std::fmt;
use std::io::{self, Cursor, Read};

use bytes::Bytes;
use http::Uri;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{FuelError, TransportError};

/// HTTP method for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Custom(CustomMethod),
}

/// A non-standard method name. Always a non-empty HTTP token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomMethod(String);

impl CustomMethod {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl HttpMethod {
    /// Parse a method name. Known names map to their variants, anything else
    /// that is a valid token becomes `Custom`.
    pub fn parse(name: &str) -> Result<Self, FuelError> {
        let method = match name {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "" => return Err(FuelError::invalid("method name must not be empty")),
            other if !other.bytes().all(is_token_char) => {
                return Err(FuelError::invalid(format!("invalid method name: {other:?}")));
            }
            other => HttpMethod::Custom(CustomMethod(other.to_string())),
        };
        Ok(method)
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Custom(custom) => custom.as_str(),
        }
    }

    /// POST, PUT and PATCH cannot be sent without a body.
    pub fn requires_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }

    /// GET and HEAD never carry a body.
    pub fn forbids_body(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// tchar from RFC 9110 section 5.6.2
fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// A request payload with its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    content_type: String,
    data: Bytes,
}

impl RequestBody {
    pub fn new(content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new("text/plain; charset=utf-8", text.into())
    }

    pub fn json<T: Serialize>(value: &T) -> Result<Self, FuelError> {
        let data = serde_json::to_vec(value).map_err(|e| FuelError::Serialization(e.to_string()))?;
        Ok(Self::new("application/json", data))
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// An HTTP request that has passed shape validation.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: HttpMethod,
    url: Uri,
    headers: Vec<(String, String)>,
    body: Option<RequestBody>,
}

impl HttpRequest {
    pub fn builder(url: &str) -> HttpRequestBuilder {
        HttpRequestBuilder {
            url: url.to_string(),
            method: Ok(HttpMethod::Get),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    pub fn url(&self) -> &Uri {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }
}

/// Collects the parts of an `HttpRequest`. Defaults to GET.
///
/// Errors are deferred until `build`, so setters can be chained freely.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    url: String,
    method: Result<HttpMethod, FuelError>,
    headers: Vec<(String, String)>,
    body: Option<RequestBody>,
}

impl HttpRequestBuilder {
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Ok(method);
        self
    }

    /// Set the method by name; see `HttpMethod::parse`.
    pub fn method_name(mut self, name: &str) -> Self {
        self.method = HttpMethod::parse(name);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers(mut self, headers: &[(&str, &str)]) -> Self {
        self.headers
            .extend(headers.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn optional_body(mut self, body: Option<RequestBody>) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Result<HttpRequest, FuelError> {
        let method = self.method?;
        let url = parse_absolute_url(&self.url)?;

        if self.body.is_none() && method.requires_body() {
            return Err(FuelError::invalid(format!("{method} requires a request body")));
        }
        if self.body.is_some() && method.forbids_body() {
            return Err(FuelError::invalid(format!("{method} must not carry a request body")));
        }

        Ok(HttpRequest {
            method,
            url,
            headers: self.headers,
            body: self.body,
        })
    }
}

fn parse_absolute_url(url: &str) -> Result<Uri, FuelError> {
    let uri: Uri = url
        .parse()
        .map_err(|e| FuelError::invalid(format!("invalid url {url:?}: {e}")))?;
    match uri.scheme_str() {
        Some("http") | Some("https") if uri.authority().is_some() => Ok(uri),
        _ => Err(FuelError::invalid(format!("url must be an absolute http(s) url: {url:?}"))),
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// A lazily read response body. Consumed by the first read.
pub struct ResponseBody {
    reader: Box<dyn Read + Send>,
}

impl ResponseBody {
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self {
            reader: Box::new(reader),
        }
    }

    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::from_reader(Cursor::new(data.into()))
    }

    pub fn empty() -> Self {
        Self::from_reader(io::empty())
    }

    pub fn into_reader(self) -> Box<dyn Read + Send> {
        self.reader
    }

    pub fn bytes(mut self) -> Result<Vec<u8>, TransportError> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Read the whole body as UTF-8.
    pub fn text(mut self) -> Result<String, TransportError> {
        let mut buf = String::new();
        self.reader.read_to_string(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody").finish_non_exhaustive()
    }
}

/// An HTTP response as produced by a transport.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

impl HttpResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn text(self) -> Result<String, TransportError> {
        self.body.text()
    }

    pub fn bytes(self) -> Result<Vec<u8>, TransportError> {
        self.body.bytes()
    }

    /// Turn a non-2xx response into `FuelError::Http`, reading the body into
    /// the error. Bodies that are not UTF-8 are decoded lossily so the status
    /// is never masked.
    pub fn error_for_status(self) -> Result<Self, FuelError> {
        if self.is_success() {
            return Ok(self);
        }
        let status = self.status;
        let bytes = self.body.bytes()?;
        let body = String::from_utf8_lossy(&bytes).into_owned();
        Err(FuelError::Http { status, body })
    }

    pub fn json<T: DeserializeOwned>(self) -> Result<T, FuelError> {
        let bytes = self.bytes()?;
        serde_json::from_slice(&bytes).map_err(|e| FuelError::Deserialization(e.to_string()))
    }
}
