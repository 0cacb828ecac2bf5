use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, pattern, Echo};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

// --- healthz ---

#[tokio::test]
async fn healthz_returns_quoted_ok() {
    let resp = app().oneshot(get("/healthz")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "application/json");
    assert_eq!(&body_bytes(resp).await[..], br#""OK""#);
}

// --- echo ---

#[tokio::test]
async fn post_echoes_headers_and_body() {
    let req = Request::builder()
        .method("POST")
        .uri("/post")
        .header("a", "b")
        .header("c", "d")
        .body("testing the body".to_string())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.headers["a"], "b");
    assert_eq!(echo.headers["c"], "d");
    assert_eq!(echo.data, "testing the body");
    assert_eq!(echo.body_len, 16);
}

#[tokio::test]
async fn post_route_rejects_get() {
    let resp = app().oneshot(get("/post")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn anything_accepts_every_method() {
    for method in ["GET", "PUT", "DELETE", "PATCH", "OPTIONS"] {
        let req = Request::builder()
            .method(method)
            .uri("/anything")
            .body(String::new())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{method}");
        let echo: Echo = body_json(resp).await;
        assert_eq!(echo.method, method);
    }
}

// --- bytes ---

#[tokio::test]
async fn bytes_returns_requested_length() {
    for n in [0usize, 1, 4096, 10_000] {
        let resp = app().oneshot(get(&format!("/bytes/{n}"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_bytes(resp).await.to_vec(), pattern(n), "n = {n}");
    }
}

#[tokio::test]
async fn bytes_over_limit_is_rejected() {
    let resp = app().oneshot(get("/bytes/99999999")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn bytes_non_numeric_is_rejected() {
    let resp = app().oneshot(get("/bytes/lots")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- status ---

#[tokio::test]
async fn status_returns_requested_code() {
    let resp = app().oneshot(get("/status/418")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
    assert!(body_bytes(resp).await.is_empty());
}

// --- large header ---

#[tokio::test]
async fn large_header_has_requested_width() {
    let resp = app().oneshot(get("/large-header/5000")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-large"].len(), 5000);
}

// --- unknown route ---

#[tokio::test]
async fn unknown_route_returns_404() {
    let resp = app().oneshot(get("/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
