//! The guest client driven end to end through the simulated host.
//!
//! # Design
//! Starts the mock server on a random port, then sends every request through
//! `Client` -> `SimHost` -> ureq -> axum and reads the response back through
//! the handle accessors.

use std::io::Read;
use std::sync::Once;

use mock_host::{Exchange, HostConfig, Reply, SimHost};
use mock_server::Echo;
use wasi_http_guest::{
    Client, ClientConfig, HostErrorCode, HttpError, Method, Request, Response, ResponseHandle,
};

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Start the mock server on a random port and return its base URL.
fn start_server() -> String {
    init_tracing();
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
    });

    format!("http://{addr}")
}

fn http_host(config: HostConfig) -> SimHost {
    SimHost::http(config).unwrap()
}

fn canned(reply: Reply) -> SimHost {
    SimHost::new(HostConfig::default(), move |_: &Exchange| -> Result<Reply, HostErrorCode> {
        Ok(reply.clone())
    })
    .unwrap()
}

#[test]
fn healthz_returns_ok() {
    let base = start_server();
    let client = Client::new(http_host(HostConfig::default()));

    let mut res = client.send(&Request::new(format!("{base}/healthz"))).unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.header_get("Content-Type").unwrap().as_deref(),
        Some("application/json")
    );
    assert_eq!(&res.body_read_all().unwrap()[..], br#""OK""#);
    res.close().unwrap();
    assert_eq!(client.host().open_sessions(), 0);
}

#[test]
fn post_carries_headers_and_body() {
    let base = start_server();
    let client = Client::new(http_host(HostConfig::default()));
    let body = "testing the body";
    let req = Request::new(format!("{base}/post"))
        .method(Method::Post)
        .header("a", "b")
        .unwrap()
        .header("c", "d")
        .unwrap()
        .body(body);

    let mut res = client.send(&req).unwrap();
    assert_eq!(res.status(), 200);

    let received = client.host().received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].method, "POST");
    assert_eq!(received[0].headers_text, "a:b\nc:d\n");
    assert_eq!(received[0].body_len, body.len());

    let echo: Echo = serde_json::from_slice(&res.body_read_all().unwrap()).unwrap();
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.data, body);
    assert_eq!(echo.headers.get("a").map(String::as_str), Some("b"));
    assert_eq!(echo.headers.get("c").map(String::as_str), Some("d"));
}

#[test]
fn body_drains_at_every_chunk_boundary() {
    let base = start_server();
    for chunk in [1usize, 7, 64, 4096] {
        let config = ClientConfig {
            body_chunk_size: chunk,
            ..ClientConfig::default()
        };
        let client = Client::with_config(http_host(HostConfig::default()), config).unwrap();
        for n in [0usize, chunk.saturating_sub(1), chunk, chunk + 1, 3 * chunk + 5] {
            let mut res = client.send(&Request::new(format!("{base}/bytes/{n}"))).unwrap();
            let body = res.body_read_all().unwrap();
            assert_eq!(&body[..], &mock_server::pattern(n)[..], "n={n} chunk={chunk}");
            assert!(res.body_read_all().unwrap().is_empty());
        }
    }
}

#[test]
fn io_read_streams_the_body() {
    let base = start_server();
    let client = Client::new(http_host(HostConfig::default()));
    let mut res = client.send(&Request::new(format!("{base}/bytes/1000"))).unwrap();
    let mut body = Vec::new();
    res.read_to_end(&mut body).unwrap();
    assert_eq!(body, mock_server::pattern(1000));
}

#[test]
fn wide_header_is_truncated_then_retried() {
    let base = start_server();
    let config = ClientConfig {
        header_value_capacity: 16,
        ..ClientConfig::default()
    };
    let client = Client::with_config(http_host(HostConfig::default()), config).unwrap();
    let res = client.send(&Request::new(format!("{base}/large-header/100"))).unwrap();

    let err = res.header_get("x-large").unwrap_err();
    assert!(matches!(err, HttpError::Truncated { capacity: 16 }));

    let value = res.header_get_with_capacity("x-large", 100).unwrap().unwrap();
    assert_eq!(value, "a".repeat(100));
}

#[test]
fn missing_header_is_none() {
    let base = start_server();
    let client = Client::new(http_host(HostConfig::default()));
    let res = client.send(&Request::new(format!("{base}/healthz"))).unwrap();
    assert_eq!(res.header_get("x-not-there").unwrap(), None);
}

#[test]
fn headers_get_all_decodes_response_headers() {
    let base = start_server();
    let client = Client::new(http_host(HostConfig::default()));
    let res = client.send(&Request::new(format!("{base}/healthz"))).unwrap();
    let headers = res.headers_get_all().unwrap();
    assert_eq!(headers.get("content-type").unwrap(), "application/json");

    let err = res.headers_get_all_with_capacity(4).unwrap_err();
    assert!(matches!(err, HttpError::Truncated { capacity: 4 }));
}

#[test]
fn error_statuses_are_responses() {
    let base = start_server();
    let client = Client::new(http_host(HostConfig::default()));
    let res = client.send(&Request::new(format!("{base}/status/418"))).unwrap();
    assert_eq!(res.status(), 418);
}

#[test]
fn closed_handle_is_invalid() {
    let base = start_server();
    let client = Client::new(http_host(HostConfig::default()));
    let res = client.send(&Request::new(format!("{base}/healthz"))).unwrap();
    let raw = res.raw_handle();
    res.close().unwrap();

    // Adopt the stale number to confirm the host refuses it.
    let stale = unsafe { ResponseHandle::from_raw(raw) };
    let mut forged =
        Response::from_handle(client.host(), stale, http::StatusCode::OK, ClientConfig::default())
            .unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(
        forged.body_read(&mut buf).unwrap_err().host_code(),
        Some(HostErrorCode::InvalidHandle)
    );
    assert_eq!(
        forged.header_get("content-type").unwrap_err().host_code(),
        Some(HostErrorCode::InvalidHandle)
    );
    assert_eq!(forged.close().unwrap_err().host_code(), Some(HostErrorCode::InvalidHandle));
}

#[test]
fn dropped_response_releases_its_session() {
    let base = start_server();
    let client = Client::new(http_host(HostConfig::default()));
    {
        let _res = client.send(&Request::new(format!("{base}/healthz"))).unwrap();
        assert_eq!(client.host().open_sessions(), 1);
    }
    assert_eq!(client.host().open_sessions(), 0);
}

#[test]
fn disallowed_destination_is_refused() {
    let base = start_server();
    let config = HostConfig {
        allowed_hosts: Some(vec!["https://api.brigade.sh".to_string()]),
        max_concurrent_requests: None,
    };
    let client = Client::new(http_host(config));
    let err = client.send(&Request::new(format!("{base}/healthz"))).unwrap_err();
    assert_eq!(err.host_code(), Some(HostErrorCode::DestinationNotAllowed));
    assert_eq!(client.host().open_sessions(), 0);
}

#[test]
fn unparsable_url_is_invalid_url() {
    let client = Client::new(http_host(HostConfig::default()));
    let err = client.send(&Request::new("not a url")).unwrap_err();
    assert_eq!(err.host_code(), Some(HostErrorCode::InvalidUrl));
}

#[test]
fn session_limit_is_enforced() {
    let base = start_server();
    let config = HostConfig {
        allowed_hosts: None,
        max_concurrent_requests: Some(1),
    };
    let client = Client::new(http_host(config));
    let first = client.send(&Request::new(format!("{base}/healthz"))).unwrap();
    let err = client.send(&Request::new(format!("{base}/healthz"))).unwrap_err();
    assert_eq!(err.host_code(), Some(HostErrorCode::TooManySessions));

    first.close().unwrap();
    client.send(&Request::new(format!("{base}/healthz"))).unwrap();
}

#[test]
fn canned_upstream_sees_the_decoded_request() {
    let host = SimHost::new(HostConfig::default(), |ex: &Exchange| -> Result<Reply, HostErrorCode> {
        assert_eq!(ex.method, http::Method::PUT);
        assert_eq!(ex.headers.get("x-id").unwrap(), "7");
        let reply = Reply::new(201).header("location", "/items/7").unwrap();
        Ok(reply.body(ex.body.clone()))
    })
    .unwrap();
    let client = Client::new(host);
    let req = Request::new("http://upstream.test/items")
        .method(Method::Put)
        .header("x-id", "7")
        .unwrap()
        .body("payload");

    let mut res = client.send(&req).unwrap();
    assert_eq!(res.status(), 201);
    assert_eq!(res.header_get("location").unwrap().as_deref(), Some("/items/7"));
    assert_eq!(&res.body_read_all().unwrap()[..], b"payload");
}

#[test]
fn send_http_converts_a_standard_request() {
    let host = canned(Reply::new(204));
    let client = Client::new(host);
    let req = http::Request::builder()
        .method(http::Method::DELETE)
        .uri("http://upstream.test/items/7")
        .body(None::<bytes::Bytes>)
        .unwrap();
    let res = client.send_http(req).unwrap();
    assert_eq!(res.status(), 204);
    assert_eq!(client.host().received()[0].method, "DELETE");
}

#[test]
fn repeated_header_values_never_cross_silently() {
    let reply = Reply::new(200)
        .header("set-cookie", "a=1")
        .and_then(|r| r.header("set-cookie", "b=2"))
        .unwrap();
    let client = Client::new(canned(reply));

    let mut req = Request::new("http://upstream.test/");
    req.headers.append("accept", http::HeaderValue::from_static("text/html"));
    req.headers.append("accept", http::HeaderValue::from_static("application/json"));
    let err = client.send(&req).unwrap_err();
    assert!(matches!(err, HttpError::InvalidHeader { .. }));
    assert!(client.host().received().is_empty());

    let res = client.send(&Request::new("http://upstream.test/")).unwrap();
    let headers = res.headers_get_all().unwrap();
    assert_eq!(headers["set-cookie"], "a=1, b=2");
}
