//! Tests for fetching forecasts over a real socket.
//!
//! Each test serves a single canned HTTP response from a local listener,
//! then drives [`HttpForecastSource`] and [`ForecastView`] against it.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use apphost_forecast::client::{FetchError, ForecastSource, HttpForecastSource};
use apphost_forecast::view::ForecastView;

/// Serves `status` and `body` to the first connection, returns the base URL.
fn serve_once(status: &str, body: &'static str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let status = status.to_string();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut request = Vec::new();
        let mut buf = [0_u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).expect("read");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).expect("write");
        String::from_utf8_lossy(&request).into_owned()
    });
    (format!("http://{addr}"), handle)
}

#[test]
fn successful_fetch_renders_rows() {
    let (base, server) = serve_once(
        "200 OK",
        r#"[{"date":"2024-01-01","temperatureC":20,"temperatureF":68,"summary":"Mild"}]"#,
    );
    let source = HttpForecastSource::new(&base).expect("client");

    let mut view = ForecastView::new();
    view.refresh(&source);

    assert_eq!(view.rows().len(), 1);
    assert_eq!(view.rows()[0][0], "2024-01-01");
    assert_eq!(view.rows()[0][1], "20°C");
    let request = server.join().expect("server thread");
    assert!(request.starts_with("GET /api/weatherforecast HTTP/1.1"));
}

#[test]
fn server_error_surfaces_status() {
    let (base, server) = serve_once("500 Internal Server Error", "{}");
    let source = HttpForecastSource::new(&base).expect("client");

    assert_eq!(source.fetch(), Err(FetchError::Status(500)));
    let _ = server.join().expect("server thread");
}

#[test]
fn malformed_body_is_a_decode_error() {
    let (base, server) = serve_once("200 OK", r#"{"not":"a list"}"#);
    let source = HttpForecastSource::new(&base).expect("client");

    let mut view = ForecastView::new();
    view.refresh(&source);

    let error = view.error().expect("decode failure");
    assert!(error.starts_with("invalid forecast payload"));
    assert!(!view.render_html().contains("<table>"));
    let _ = server.join().expect("server thread");
}

#[test]
fn unreachable_backend_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let source = HttpForecastSource::new(&format!("http://{addr}")).expect("client");
    assert!(matches!(source.fetch(), Err(FetchError::Transport(_))));
}
