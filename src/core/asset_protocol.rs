//! Asset Protocol Resolver
//!
//! Answers requests under the private `app://` scheme by reading files from
//! the app root:
//! 1. strip the scheme prefix
//! 2. percent-decode the path (URLs may contain spaces); escapes of reserved
//!    characters such as `%2F` are kept as written
//! 3. reject anything that would escape the root
//! 4. read the file and pair it with a MIME type from a fixed table
//!
//! Nothing is cached; every request produces a fresh path/MIME pair.

use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error};
use url::Url;

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{AssetResponse, ResolvedAsset};
use crate::utils::constants::{DIRECTORY_INDEX, MIME_TABLE, SCHEME_HOST, UNKNOWN_MIME, URI_RESERVED};

/// MIME type for a path, by lower-cased extension. Unmapped -> ""
pub fn mime_for_path(path: impl AsRef<Path>) -> &'static str {
    let ext = match path.as_ref().extension().and_then(|e| e.to_str()) {
        Some(ext) => format!(".{}", ext.to_ascii_lowercase()),
        None => return UNKNOWN_MIME,
    };

    MIME_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(UNKNOWN_MIME)
}

/// Resolves custom-scheme requests to files under one root directory
#[derive(Debug, Clone)]
pub struct AssetResolver {
    root: PathBuf,
    scheme: String,
}

impl AssetResolver {
    pub fn new(root: impl Into<PathBuf>, scheme: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            scheme: scheme.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Decoded request path, without scheme, host, query or fragment.
    ///
    /// Accepts `app://localhost/x`, the Windows webview form
    /// `http://app.localhost/x`, and bare `/x`.
    pub fn request_path(&self, request_url: &str) -> AppResult<String> {
        let raw_path = if request_url.starts_with('/') {
            request_url
                .split(|c: char| c == '?' || c == '#')
                .next()
                .unwrap_or_default()
                .to_string()
        } else {
            let url = Url::parse(request_url).map_err(|e| {
                AppError::with_source(
                    ErrorCode::AssetInvalidUrl,
                    format!("Unparseable request URL: {}", request_url),
                    e,
                )
            })?;

            if !self.accepts(&url) {
                return Err(AppError::invalid_url(format!(
                    "Request is not for the {} scheme: {}",
                    self.scheme, request_url
                )));
            }
            url.path().to_string()
        };

        decode_uri(&raw_path)
    }

    fn accepts(&self, url: &Url) -> bool {
        if url.scheme().eq_ignore_ascii_case(&self.scheme) {
            return true;
        }
        let windows_host = format!("{}.{}", self.scheme, SCHEME_HOST);
        matches!(url.scheme(), "http" | "https")
            && url
                .host_str()
                .is_some_and(|host| host.eq_ignore_ascii_case(&windows_host))
    }

    /// Map a request URL to a file path under the root without touching it
    pub fn locate(&self, request_url: &str) -> AppResult<PathBuf> {
        let decoded = self.request_path(request_url)?;

        let mut relative = PathBuf::new();
        for component in Path::new(decoded.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(AppError::path_rejected(&decoded));
                }
            }
        }

        let mut path = self.root.join(&relative);
        if relative.as_os_str().is_empty() || path.is_dir() {
            path.push(DIRECTORY_INDEX);
        }
        Ok(path)
    }

    /// Resolve a request to file contents and MIME type
    pub fn resolve(&self, request_url: &str) -> AppResult<ResolvedAsset> {
        let path = self.locate(request_url)?;
        let data = std::fs::read(&path).map_err(|e| self.read_error(&path, e))?;
        Ok(self.finish(path, data))
    }

    /// Async variant of [`AssetResolver::resolve`] for the HTTP server
    pub async fn resolve_async(&self, request_url: &str) -> AppResult<ResolvedAsset> {
        let path = self.locate(request_url)?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| self.read_error(&path, e))?;
        Ok(self.finish(path, data))
    }

    /// Webview-facing handler. Never fails: errors are logged and answered
    /// with an empty body.
    pub fn respond(&self, request_url: &str) -> AssetResponse {
        match self.resolve(request_url) {
            Ok(asset) => asset.into(),
            Err(e) => {
                error!(url = %request_url, code = e.code_str(), "❌ Asset request failed: {}", e);
                let mime_type = self
                    .request_path(request_url)
                    .map(mime_for_path)
                    .unwrap_or(UNKNOWN_MIME);
                AssetResponse {
                    mime_type,
                    data: Vec::new(),
                }
            }
        }
    }

    fn finish(&self, path: PathBuf, data: Vec<u8>) -> ResolvedAsset {
        let mime_type = mime_for_path(&path);
        debug!(path = %path.display(), mime = mime_type, bytes = data.len(), "📄 Asset resolved");
        ResolvedAsset {
            path,
            mime_type,
            data,
        }
    }

    fn read_error(&self, path: &Path, err: std::io::Error) -> AppError {
        let mut e = AppError::from(err);
        e.message = format!("Cannot read {}", path.display());
        e
    }
}

/// Percent-decode everything except escapes of reserved characters
fn decode_uri(raw: &str) -> AppResult<String> {
    let mut decoded: Vec<u8> = Vec::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(at) = reserved_escape(rest) {
        decoded.extend(percent_decode_str(&rest[..at]));
        decoded.extend_from_slice(rest[at..at + 3].as_bytes());
        rest = &rest[at + 3..];
    }
    decoded.extend(percent_decode_str(rest));

    String::from_utf8(decoded).map_err(|e| {
        AppError::with_source(
            ErrorCode::AssetInvalidUrl,
            format!("Path is not valid UTF-8 after decoding: {}", raw),
            e,
        )
    })
}

/// Byte offset of the first `%XX` that encodes a reserved character
fn reserved_escape(s: &str) -> Option<usize> {
    s.match_indices('%').map(|(at, _)| at).find(|&at| {
        s.get(at + 1..at + 3)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .is_some_and(|byte| URI_RESERVED.contains(&byte))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_table() {
        assert_eq!(mime_for_path("a/b.js"), "text/javascript");
        assert_eq!(mime_for_path("index.html"), "text/html");
        assert_eq!(mime_for_path("style.CSS"), "text/css");
        assert_eq!(mime_for_path("logo.svg"), "image/svg+xml");
        assert_eq!(mime_for_path("logo.svgz"), "image/svg+xml");
        assert_eq!(mime_for_path("data.json"), "application/json");
    }

    #[test]
    fn test_unmapped_extension_is_empty() {
        assert_eq!(mime_for_path("module.wasm"), "");
        assert_eq!(mime_for_path("README"), "");
        assert_eq!(mime_for_path("archive.tar.gz"), "");
    }

    #[test]
    fn test_request_path_forms() {
        let resolver = AssetResolver::new("/srv/ui", "app");
        assert_eq!(
            resolver.request_path("app://localhost/index.html").unwrap(),
            "/index.html"
        );
        assert_eq!(
            resolver.request_path("http://app.localhost/css/site.css").unwrap(),
            "/css/site.css"
        );
        assert_eq!(
            resolver.request_path("/data.json?v=2#top").unwrap(),
            "/data.json"
        );
    }

    #[test]
    fn test_request_path_decodes_escapes() {
        let resolver = AssetResolver::new("/srv/ui", "app");
        assert_eq!(
            resolver.request_path("app://localhost/my%20page.html").unwrap(),
            "/my page.html"
        );
    }

    #[test]
    fn test_foreign_scheme_rejected() {
        let resolver = AssetResolver::new("/srv/ui", "app");
        let err = resolver.request_path("https://example.com/index.html").unwrap_err();
        assert_eq!(err.code, ErrorCode::AssetInvalidUrl);
    }

    #[test]
    fn test_encoded_traversal_rejected() {
        let resolver = AssetResolver::new("/srv/ui", "app");
        let err = resolver.locate("/%2E%2E/%2E%2E/etc/passwd").unwrap_err();
        assert_eq!(err.code, ErrorCode::AssetPathRejected);
    }

    #[test]
    fn test_reserved_escapes_stay_encoded() {
        let resolver = AssetResolver::new("/srv/ui", "app");
        assert_eq!(
            resolver.request_path("app://localhost/a%2Fb.js").unwrap(),
            "/a%2Fb.js"
        );
        assert_eq!(
            resolver.request_path("/q%3fx%20y.json").unwrap(),
            "/q%3fx y.json"
        );
        let path = resolver.locate("/..%2Fsecret.txt").unwrap();
        assert_eq!(path, PathBuf::from("/srv/ui").join("..%2Fsecret.txt"));
    }

    #[test]
    fn test_root_request_maps_to_index() {
        let resolver = AssetResolver::new("/srv/ui", "app");
        let path = resolver.locate("app://localhost/").unwrap();
        assert_eq!(path, PathBuf::from("/srv/ui").join("index.html"));
    }
}
