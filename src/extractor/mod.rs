//! Call-site extraction module for finding HTTP client calls in parsed sources.
//!
//! This module provides a unified interface for turning parsed files into request records.
//! Each extractor knows one client calling convention and how to rebuild the URL and body
//! of every call it recognizes.
//!
//! # Supported Clients
//!
//! - **axios**: See [`axios::AxiosExtractor`]
//!
//! # Example
//!
//! ```no_run
//! use postman_from_source::extractor::{CallSiteExtractor, axios::AxiosExtractor};
//! use postman_from_source::parser::AstParser;
//! use std::path::Path;
//!
//! let parsed = AstParser::parse_file(Path::new("tools/1_cards/index.js")).unwrap();
//! let extractor = AxiosExtractor::default();
//! let records = extractor.extract_calls(&[parsed]);
//! println!("Found {} requests", records.len());
//! ```

pub mod axios;

use crate::parser::ParsedFile;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// Trait for extracting request records from parsed source files.
pub trait CallSiteExtractor {
    /// Extracts every recognized call site, file by file, in document order.
    fn extract_calls(&self, parsed_files: &[ParsedFile]) -> Vec<RequestRecord>;
}

/// One HTTP request discovered at a call site.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    /// File the call was found in
    pub source_path: PathBuf,
    /// HTTP method named by the call
    pub method: HttpMethod,
    /// URL with `{{NAME}}` placeholders for runtime values
    pub url_template: String,
    /// Reconstructed request body; only set for POST, PUT and PATCH
    pub body: Option<Value>,
}

impl RequestRecord {
    pub fn new(source_path: PathBuf, method: HttpMethod, url_template: String) -> Self {
        Self {
            source_path,
            method,
            url_template,
            body: None,
        }
    }
}

/// HTTP methods recognized at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Looks up a method by name, ignoring case (`post`, `Post` and `POST` all match).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Whether the second call argument is a request body for this method.
    pub fn carries_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
