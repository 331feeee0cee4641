//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for route matching,
//! method validation, and access logging.

use hyper::body::{Body, Bytes};
use hyper::{Method, Request};
use std::convert::Infallible;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use super::manifest::{self, MANIFEST_PATH, MODIFY_PATH, OPENAPI_PATH};
use super::modify::handle_modify;
use crate::config::AppState;
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};

const ALLOW_READ: &str = "GET, HEAD, OPTIONS";
const ALLOW_MODIFY: &str = "POST, OPTIONS";

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<HttpResponse, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let started = Instant::now();
    let access_log = state.config.logging.access_log;
    let mut entry = access_log.then(|| {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.http_version = version_label(req.version()).to_string();
        entry.user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        entry
    });

    let mut response = route_request(req, &state).await;
    http::apply_common_headers(
        &mut response,
        &state.config.http.server_name,
        state.config.http.enable_cors,
    );

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on path and method
async fn route_request<B>(req: Request<B>, state: &AppState) -> HttpResponse
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let enable_cors = state.config.http.enable_cors;
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let path = path.as_str();

    // Health check endpoints (highest priority, always fast)
    let health = &state.config.health;
    if health.enabled && (path == health.liveness_path || path == health.readiness_path) {
        return match method {
            Method::GET | Method::HEAD => http::build_health_response("ok"),
            _ => http::build_405_response(ALLOW_READ),
        };
    }

    match path {
        MANIFEST_PATH | OPENAPI_PATH => {
            let is_manifest = path == MANIFEST_PATH;
            match method {
                Method::GET | Method::HEAD if is_manifest => {
                    manifest::serve_manifest(&state.config.plugin)
                }
                Method::GET | Method::HEAD => manifest::serve_openapi(&state.config.plugin),
                Method::OPTIONS => http::build_options_response(ALLOW_READ, enable_cors),
                _ => method_not_allowed(&method, path, ALLOW_READ),
            }
        }
        MODIFY_PATH => match method {
            Method::POST => handle_modify(req, state).await,
            Method::OPTIONS => http::build_options_response(ALLOW_MODIFY, enable_cors),
            _ => method_not_allowed(&method, path, ALLOW_MODIFY),
        },
        _ => http::build_404_response(),
    }
}

fn method_not_allowed(method: &Method, path: &str, allow: &'static str) -> HttpResponse {
    logger::log_warning(&format!("Method not allowed: {method} {path}"));
    http::build_405_response(allow)
}

fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
}
