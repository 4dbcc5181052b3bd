use std::path::{Path, PathBuf};

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{TesseraError, TesseraResult};

/// Where the bytes of an image, mask, texture or font come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceRef {
    Path(PathBuf),
    DataUri(String),
    Remote(String),
    Bytes(Vec<u8>),
}

impl SourceRef {
    /// Classify a string: `data:` URIs, `http(s)://` remotes, otherwise a file path.
    pub fn parse(s: &str) -> Self {
        let t = s.trim();
        if t.starts_with("data:") {
            Self::DataUri(t.to_owned())
        } else if t.starts_with("http://") || t.starts_with("https://") {
            Self::Remote(t.to_owned())
        } else {
            Self::Path(PathBuf::from(t))
        }
    }

    pub fn validate(&self, op: &'static str) -> TesseraResult<()> {
        let empty = match self {
            Self::Path(p) => p.as_os_str().is_empty(),
            Self::DataUri(s) | Self::Remote(s) => s.trim().is_empty(),
            Self::Bytes(b) => b.is_empty(),
        };
        if empty {
            return Err(TesseraError::validation(op, "source must not be empty"));
        }
        Ok(())
    }

    /// Stable identity used to deduplicate registrations.
    pub fn key(&self) -> String {
        match self {
            Self::Path(p) => format!("path:{}", p.display()),
            Self::DataUri(s) => format!("data:{:016x}", xxhash_rust::xxh3::xxh3_64(s.as_bytes())),
            Self::Remote(s) => format!("remote:{s}"),
            Self::Bytes(b) => format!("bytes:{:016x}", xxhash_rust::xxh3::xxh3_64(b)),
        }
    }
}

impl From<&str> for SourceRef {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<PathBuf> for SourceRef {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

impl From<&Path> for SourceRef {
    fn from(p: &Path) -> Self {
        Self::Path(p.to_path_buf())
    }
}

impl From<Vec<u8>> for SourceRef {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

/// Turns a source reference into raw bytes.
pub trait SourceResolver: Send + Sync {
    fn resolve(&self, source: &SourceRef) -> TesseraResult<Vec<u8>>;
}

/// Reads files (relative to an optional root), decodes `data:` URIs and returns in-memory bytes.
/// Remote references are rejected; plug in a fetching resolver to support them.
#[derive(Debug, Clone, Default)]
pub struct DefaultResolver {
    root: Option<PathBuf>,
}

impl DefaultResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn full_path(&self, p: &Path) -> PathBuf {
        match &self.root {
            Some(root) if p.is_relative() => root.join(p),
            _ => p.to_path_buf(),
        }
    }
}

impl SourceResolver for DefaultResolver {
    fn resolve(&self, source: &SourceRef) -> TesseraResult<Vec<u8>> {
        match source {
            SourceRef::Path(p) => {
                let full = self.full_path(p);
                std::fs::read(&full).map_err(|e| {
                    TesseraError::resource(format!("failed to read '{}': {e}", full.display()))
                })
            }
            SourceRef::DataUri(uri) => decode_data_uri(uri).map(|(bytes, _)| bytes),
            SourceRef::Remote(url) => Err(TesseraError::source(format!(
                "remote source '{url}' is not supported by the default resolver"
            ))),
            SourceRef::Bytes(b) => {
                if b.is_empty() {
                    return Err(TesseraError::source("in-memory source is empty"));
                }
                Ok(b.clone())
            }
        }
    }
}

/// Decode an RFC 2397 `data:` URI into `(bytes, media_type)`.
pub fn decode_data_uri(uri: &str) -> TesseraResult<(Vec<u8>, String)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| TesseraError::source("data URI must start with 'data:'"))?;
    let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| TesseraError::source("data URI is missing ','"))?;

    let mut parts = meta.split(';');
    let media = parts.next().unwrap_or("").trim();
    let is_base64 = parts.any(|p| p.trim().eq_ignore_ascii_case("base64"));
    let media = if media.is_empty() { "text/plain" } else { media }.to_owned();

    let bytes = if is_base64 {
        let cleaned: Vec<u8> = data.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(cleaned)
            .map_err(|e| TesseraError::source(format!("invalid base64 in data URI: {e}")))?
    } else {
        percent_decode(data)?
    };
    Ok((bytes, media))
}

fn percent_decode(input: &str) -> TesseraResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let hex = bytes
            .get(i + 1..i + 3)
            .and_then(|h| std::str::from_utf8(h).ok())
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(|| TesseraError::source("invalid percent-escape in data URI"))?;
        out.push(hex);
        i += 3;
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
