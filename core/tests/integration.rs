//! Dispatcher tests over real HTTP.
//!
//! # Design
//! Each test starts its own recording mock server on a random port, sends
//! requests through `Fuel` with the bundled `UreqTransport`, then checks what
//! the server actually received.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use fuel::{Fuel, FuelConfig, FuelError, RequestBody, Transport, TransportConfig, UreqTransport};
use mock_server::{MockResponse, MockServer};

fn server() -> MockServer {
    MockServer::spawn().unwrap()
}

fn html(s: &str) -> Option<RequestBody> {
    Some(RequestBody::new("text/html", s.to_string()))
}

#[test]
fn get_returns_body() {
    let server = server();
    server.enqueue(MockResponse::default().body("Hello World"));

    let response = Fuel::new().get(&server.url("get"), &[]).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.text().unwrap(), "Hello World");

    let request = server.take_request().unwrap();
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/get");
}

#[test]
fn get_text_on_404_is_http_failure() {
    let server = server();
    server.enqueue(MockResponse::default().status(404).body("Hello World"));

    let err = Fuel::new().get_text(&server.url("get"), &[]).unwrap_err();
    assert!(matches!(err, FuelError::Http { status: 404, ref body } if body == "Hello World"));
    assert_eq!(server.take_request().unwrap().method, "GET");
}

#[test]
fn primitive_get_on_404_returns_response() {
    let server = server();
    server.enqueue(MockResponse::default().status(404).body("Hello World"));

    let response = Fuel::new().get(&server.url("get"), &[]).unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.text().unwrap(), "Hello World");
}

#[test]
fn post_sends_body() {
    let server = server();
    Fuel::new().post(&server.url("post"), html("Hi?"), &[]).unwrap();

    let request = server.take_request().unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.body_utf8(), "Hi?");
    assert_eq!(request.header("content-type"), Some("text/html"));
}

#[test]
fn put_sends_body() {
    let server = server();
    Fuel::new().put(&server.url("put"), html("Hello There"), &[]).unwrap();

    let request = server.take_request().unwrap();
    assert_eq!(request.method, "PUT");
    assert_eq!(request.body_utf8(), "Hello There");
}

#[test]
fn patch_sends_body() {
    let server = server();
    Fuel::new().patch(&server.url("patch"), html("Hello There"), &[]).unwrap();

    let request = server.take_request().unwrap();
    assert_eq!(request.method, "PATCH");
    assert_eq!(request.body_utf8(), "Hello There");
}

#[test]
fn missing_body_sends_nothing() {
    let server = server();
    let fuel = Fuel::new();
    for result in [
        fuel.post(&server.url("post"), None, &[]),
        fuel.put(&server.url("put"), None, &[]),
        fuel.patch(&server.url("patch"), None, &[]),
    ] {
        assert!(matches!(result.unwrap_err(), FuelError::InvalidArgument(_)));
    }

    // A follow-up request is the first one the server sees.
    fuel.get(&server.url("after"), &[]).unwrap();
    assert_eq!(server.request_count(), 1);
    assert_eq!(server.take_request().unwrap().path, "/after");
}

#[test]
fn delete_without_body() {
    let server = server();
    server.enqueue(MockResponse::default().body("Hello World"));

    let response = Fuel::new().delete(&server.url("delete"), None, &[]).unwrap();
    assert_eq!(response.text().unwrap(), "Hello World");
    assert_eq!(server.take_request().unwrap().method, "DELETE");
}

#[test]
fn head_sends_head() {
    let server = server();
    let response = Fuel::new().head(&server.url("head"), &[]).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(server.take_request().unwrap().method, "HEAD");
}

#[test]
fn empty_method_name_sends_nothing() {
    let server = server();
    let fuel = Fuel::new();
    let err = fuel.method(&server.url("connect"), "", html("x"), &[]).unwrap_err();
    assert!(matches!(err, FuelError::InvalidArgument(_)));

    fuel.get(&server.url("after"), &[]).unwrap();
    assert_eq!(server.request_count(), 1);
}

#[test]
fn custom_method_reaches_server() {
    let server = server();
    server.enqueue(MockResponse::default().status(207).body("<multistatus/>"));

    let body = Some(RequestBody::new("application/xml", "<propfind/>"));
    let response = Fuel::new().method(&server.url("dav"), "PROPFIND", body, &[]).unwrap();
    assert_eq!(response.status, 207);
    assert_eq!(response.text().unwrap(), "<multistatus/>");

    let recorded = server.take_request().unwrap();
    assert_eq!(recorded.method, "PROPFIND");
    assert_eq!(recorded.path, "/dav");
    assert_eq!(recorded.body_utf8(), "<propfind/>");
}

#[test]
fn connect_goes_over_the_wire() {
    // hyper treats CONNECT as a tunnel, so read the request line off a bare socket.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        tx.send(line).unwrap();
        let mut rest = String::new();
        while reader.read_line(&mut rest).unwrap_or(0) > 2 {
            rest.clear();
        }
        let _ = stream.write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n");
    });

    // The reply to a tunnel request is not inspected, only what was sent.
    let _ = Fuel::new().method(&format!("http://127.0.0.1:{port}/"), "CONNECT", None, &[]);

    let line = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(line.starts_with("CONNECT "), "{line:?}");
    assert!(line.trim_end().ends_with("HTTP/1.1"), "{line:?}");
}

#[test]
fn custom_headers_reach_server() {
    let server = server();
    Fuel::new()
        .get(&server.url("get"), &[("X-Trace-Id", "abc123"), ("Accept", "text/plain")])
        .unwrap();

    let request = server.take_request().unwrap();
    assert_eq!(request.header("x-trace-id"), Some("abc123"));
    assert_eq!(request.header("accept"), Some("text/plain"));
}

#[test]
fn json_round_trip() {
    let server = server();
    server.enqueue(
        MockResponse::default()
            .header("Content-Type", "application/json")
            .body(r#"{"title":"Buy milk","completed":false}"#),
    );

    let fuel = Fuel::new();
    let body = RequestBody::json(&serde_json::json!({"title": "Buy milk"})).unwrap();
    let request = fuel::HttpRequest::builder(&server.url("todos"))
        .method(fuel::HttpMethod::Post)
        .body(body)
        .build()
        .unwrap();
    let value: serde_json::Value = fuel.fetch_json(request).unwrap();
    assert_eq!(value["title"], "Buy milk");

    let recorded = server.take_request().unwrap();
    assert_eq!(recorded.header("content-type"), Some("application/json"));
    let sent: serde_json::Value = serde_json::from_slice(&recorded.body).unwrap();
    assert_eq!(sent["title"], "Buy milk");
}

#[test]
fn preconfigured_transport_is_used_and_survives_close() {
    let server = server();
    let transport = Arc::new(UreqTransport::new(&TransportConfig::default()));

    let fuel = Fuel::from_config(FuelConfig::new().preconfigured(Arc::clone(&transport)));
    fuel.get(&server.url("first"), &[]).unwrap();
    fuel.close();
    fuel.close();

    assert!(!transport.is_shut_down());
    let request = fuel::HttpRequest::builder(&server.url("second")).build().unwrap();
    assert_eq!(transport.execute(request).unwrap().status, 200);
    assert_eq!(server.request_count(), 2);
}

#[test]
fn owned_transport_is_shut_down_on_close() {
    let fuel = Fuel::new();
    assert!(fuel.owns_transport());
    fuel.close();
    assert!(fuel.transport().is_shut_down());
}

#[test]
fn connection_refused_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let err = Fuel::new().get(&format!("http://127.0.0.1:{port}/"), &[]).unwrap_err();
    assert!(matches!(err, FuelError::Transport(_)));
}
