//! `POST /modify` handler
//!
//! Reads the JSON body, hands the command text to the dispatcher and
//! answers with its message. Every dispatch result is a 200; only an
//! unreadable or oversized body gets another status.

use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Request, StatusCode};
use std::error::Error;

use crate::config::AppState;
use crate::dispatch::ModifyRequest;
use crate::http::{self, HttpResponse};
use crate::logger;

const INVALID_BODY: &str = "Request body must be a JSON object with a 'text' string.";

/// Handle one `/modify` request
pub async fn handle_modify<B>(req: Request<B>, state: &AppState) -> HttpResponse
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let max_body_size = state.config.http.max_body_size;
    if let Some(resp) = check_content_length(&req, max_body_size) {
        return resp;
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<http_body_util::LengthLimitError>() => {
            logger::log_warning(&format!("Request body exceeded {max_body_size} bytes"));
            return http::build_413_response();
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return http::build_message_response(StatusCode::BAD_REQUEST, INVALID_BODY);
        }
    };

    let request: ModifyRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            logger::log_warning(&format!("Invalid /modify body: {e}"));
            return http::build_message_response(StatusCode::BAD_REQUEST, INVALID_BODY);
        }
    };

    let response = state.dispatcher.handle(&request.text).await;
    http::build_json_response(StatusCode::OK, &response)
}

/// Reject requests whose declared Content-Length exceeds the limit
fn check_content_length<B>(req: &Request<B>, max_body_size: u64) -> Option<HttpResponse> {
    let value = req.headers().get("content-length")?;
    match value.to_str().ok().and_then(|s| s.parse::<u64>().ok()) {
        Some(size) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        Some(_) => None,
        None => {
            logger::log_warning("Invalid Content-Length header, relying on body limit");
            None
        }
    }
}
