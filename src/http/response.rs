//! HTTP response building module
//!
//! Provides builders for the status code responses the service emits,
//! decoupled from specific business logic.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, SERVER};
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::dispatch::ModifyResponse;

pub type HttpResponse = Response<Full<Bytes>>;

/// Build a JSON response from any serializable body
pub fn build_json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return build_text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "text/plain",
                "500 Internal Server Error",
            );
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a `{"message": ...}` response
pub fn build_message_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    build_json_response(
        status,
        &ModifyResponse {
            message: message.into(),
        },
    )
}

/// Build a response with a static or owned text body
pub fn build_text_response(
    status: StatusCode,
    content_type: &str,
    body: impl Into<Bytes>,
) -> HttpResponse {
    Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .body(Full::new(body.into()))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> HttpResponse {
    build_text_response(StatusCode::NOT_FOUND, "text/plain", "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: &'static str) -> HttpResponse {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "text/plain")
        .header("Allow", allow)
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> HttpResponse {
    build_message_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body is too large.")
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(allow: &'static str, enable_cors: bool) -> HttpResponse {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", allow);

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", allow)
            .header("Access-Control-Allow-Headers", "Content-Type")
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build health check response
pub fn build_health_response(status: &'static str) -> HttpResponse {
    build_text_response(StatusCode::OK, "text/plain", status)
}

/// Stamp the `Server` header, plus the CORS origin when enabled
pub fn apply_common_headers(response: &mut HttpResponse, server_name: &str, enable_cors: bool) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(server_name) {
        headers.insert(SERVER, value);
    }
    if enable_cors && !headers.contains_key("Access-Control-Allow-Origin") {
        headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    }
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(response: HttpResponse) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_message_response() {
        let response = build_message_response(StatusCode::OK, "done");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["Content-Type"], "application/json");
        assert_eq!(body_string(response).await, r#"{"message":"done"}"#);
    }

    #[test]
    fn test_options_with_cors() {
        let response = build_options_response("POST, OPTIONS", true);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["Allow"], "POST, OPTIONS");
        assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");

        let plain = build_options_response("POST, OPTIONS", false);
        assert!(!plain.headers().contains_key("Access-Control-Allow-Origin"));
    }

    #[test]
    fn test_common_headers() {
        let mut response = build_404_response();
        apply_common_headers(&mut response, "docswriter/0.1.0", true);
        assert_eq!(response.headers()["Server"], "docswriter/0.1.0");
        assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");
    }

    #[test]
    fn test_405_lists_allowed_methods() {
        let response = build_405_response("GET, HEAD, OPTIONS");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()["Allow"], "GET, HEAD, OPTIONS");
    }
}
