//! Plugin descriptor documents
//!
//! Serves the plugin manifest and the OpenAPI description of `/modify`,
//! both derived from the `[plugin]` configuration.

use hyper::StatusCode;
use serde::Serialize;

use crate::config::PluginConfig;
use crate::http::{self, HttpResponse};

pub const MANIFEST_PATH: &str = "/.well-known/ai-plugin.json";
pub const OPENAPI_PATH: &str = "/.well-known/openapi.yaml";
pub const MODIFY_PATH: &str = "/modify";

/// Plugin manifest served at [`MANIFEST_PATH`]
#[derive(Debug, Serialize)]
pub struct PluginManifest<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub url: &'a str,
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Serialize)]
pub struct Endpoint {
    pub name: &'static str,
    pub url: &'static str,
    pub method: &'static str,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
}

impl<'a> PluginManifest<'a> {
    pub fn from_config(plugin: &'a PluginConfig) -> Self {
        Self {
            name: &plugin.name,
            description: &plugin.description,
            url: &plugin.base_url,
            endpoints: vec![Endpoint {
                name: "Modify Document",
                url: MODIFY_PATH,
                method: "POST",
                input: serde_json::json!({ "text": "string" }),
                output: serde_json::json!({ "message": "string" }),
            }],
        }
    }
}

/// Render the OpenAPI 3.0 document for the service
pub fn openapi_document(plugin: &PluginConfig) -> String {
    // JSON string literals are valid YAML double-quoted scalars
    let quote = |s: &str| serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string());

    format!(
        r"openapi: 3.0.0
info:
  title: {title}
  description: {description}
  version: {version}
servers:
  - url: {url}
paths:
  {path}:
    post:
      description: Modify the specified document
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: object
              required:
                - text
              properties:
                text:
                  type: string
                  description: A command such as 'create <name>' or 'edit <name> <text to add>'
      responses:
        '200':
          description: Modification processed
          content:
            application/json:
              schema:
                type: object
                properties:
                  message:
                    type: string
",
        title = quote(&plugin.name),
        description = quote(&plugin.description),
        version = env!("CARGO_PKG_VERSION"),
        url = quote(&plugin.base_url),
        path = MODIFY_PATH,
    )
}

pub fn serve_manifest(plugin: &PluginConfig) -> HttpResponse {
    http::build_json_response(StatusCode::OK, &PluginManifest::from_config(plugin))
}

pub fn serve_openapi(plugin: &PluginConfig) -> HttpResponse {
    http::build_text_response(StatusCode::OK, "text/yaml; charset=utf-8", openapi_document(plugin))
}
