//! Blocking byte fetches for the Kestrel transport layer.
//!
//! Provides the raw `http(s):`, `file:` and `data:` fetches the browser
//! crate's transport wraps into fetch events.
//!
//! TODO: Implement proper Fetch Standard (<https://fetch.spec.whatwg.org/>)
use std::path::Path;
use std::time::Duration;

use base64::Engine;
use thiserror::Error;

use crate::url;

/// User-Agent header sent with all requests.
const USER_AGENT: &str = concat!("Kestrel/", env!("CARGO_PKG_VERSION"));

/// Default request timeout.
const TIMEOUT: Duration = Duration::from_secs(30);

/// Failure to obtain the bytes of a resource.
#[derive(Debug, Error)]
pub enum NetError {
    /// The HTTP client could not be built or the request failed.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status code.
    #[error("HTTP error: {0}")]
    Status(u16),
    /// A local file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// The path that was read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A `data:` URL was malformed.
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),
    /// The URL scheme has no fetcher.
    #[error("unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),
}

/// The bytes of a fetched resource plus the type the source declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResource {
    /// The `Content-Type` the source declared (header, data-URL metadata or
    /// file-extension guess), if any.
    pub content_type: Option<String>,
    /// The resource body.
    pub body: Vec<u8>,
}

/// Fetch any supported URL, dispatching on its scheme.
///
/// URLs without a scheme are treated as local paths.
///
/// # Errors
///
/// Returns a [`NetError`] if the scheme is unsupported or the fetch fails.
pub fn fetch(target: &str) -> Result<FetchedResource, NetError> {
    match url::scheme(target) {
        Some("http" | "https") => fetch_http(target),
        Some("data") => DataUrl::parse(target)?.decode(),
        Some("file") => read_file(file_url_path(target)),
        Some(other) if other.len() > 1 => Err(NetError::UnsupportedScheme(other.to_string())),
        // A one-letter "scheme" is a drive letter.
        _ => read_file(target),
    }
}

/// Fetch an `http:` or `https:` URL.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be created, the request
/// fails, the response has a non-success status, or the body cannot be read.
pub fn fetch_http(target: &str) -> Result<FetchedResource, NetError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(TIMEOUT)
        .build()?;

    let response = client
        .get(target)
        .header("User-Agent", USER_AGENT)
        .send()?;

    if !response.status().is_success() {
        return Err(NetError::Status(response.status().as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.bytes()?.to_vec();
    Ok(FetchedResource { content_type, body })
}

/// Read a local file, guessing its type from the extension.
///
/// # Errors
///
/// Returns [`NetError::Io`] if the file cannot be read.
pub fn read_file(path: &str) -> Result<FetchedResource, NetError> {
    let body = std::fs::read(path).map_err(|source| NetError::Io {
        path: path.to_string(),
        source,
    })?;
    Ok(FetchedResource {
        content_type: guess_mime_type(path).map(str::to_string),
        body,
    })
}

/// Strip the `file://` prefix (and an empty authority) from a file URL.
fn file_url_path(target: &str) -> &str {
    let rest = target.trim_start_matches("file:");
    rest.strip_prefix("//").unwrap_or(rest)
}

/// Guess a MIME type from a path's extension.
#[must_use]
pub fn guess_mime_type(path: &str) -> Option<&'static str> {
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        _ => return None,
    };
    Some(mime)
}

/// A parsed `data:` URL.
///
/// [RFC 2397](https://www.rfc-editor.org/rfc/rfc2397)
///
/// `data:[<mediatype>][;base64],<data>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl<'a> {
    /// The declared media type, `text/plain` when omitted.
    pub media_type: &'a str,
    /// Whether the payload is base64 encoded.
    pub base64: bool,
    /// The raw payload after the comma.
    pub payload: &'a str,
}

impl<'a> DataUrl<'a> {
    /// Split a `data:` URL into its metadata and payload.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidDataUrl`] if the URL has no comma.
    pub fn parse(raw: &'a str) -> Result<Self, NetError> {
        let rest = raw.trim_start_matches("data:");
        let (metadata, payload) = rest
            .split_once(',')
            .ok_or_else(|| NetError::InvalidDataUrl("missing comma".to_string()))?;
        let (metadata, base64) = metadata
            .strip_suffix(";base64")
            .map_or((metadata, false), |m| (m, true));
        let media_type = if metadata.is_empty() {
            "text/plain"
        } else {
            metadata
        };
        Ok(Self {
            media_type,
            base64,
            payload,
        })
    }

    /// Decode the payload into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidDataUrl`] if base64 or percent decoding fails.
    pub fn decode(&self) -> Result<FetchedResource, NetError> {
        let body = if self.base64 {
            base64::engine::general_purpose::STANDARD
                .decode(self.payload)
                .map_err(|e| NetError::InvalidDataUrl(format!("base64 decode error: {e}")))?
        } else {
            percent_decode(self.payload)?
        };
        Ok(FetchedResource {
            content_type: Some(self.media_type.to_string()),
            body,
        })
    }
}

/// [URL Standard § 1.3 Percent-encoded bytes](https://url.spec.whatwg.org/#percent-decode)
fn percent_decode(input: &str) -> Result<Vec<u8>, NetError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input
                .get(i + 1..i + 3)
                .ok_or_else(|| NetError::InvalidDataUrl("truncated escape".to_string()))?;
            let value = u8::from_str_radix(hex, 16)
                .map_err(|_| NetError::InvalidDataUrl(format!("bad escape '%{hex}'")))?;
            out.push(value);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}
