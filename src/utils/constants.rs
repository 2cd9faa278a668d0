//! Constants Module - Single Source of Truth
//!
//! Every literal the shell, the UI server and the client glue share lives
//! here. Other modules import these instead of repeating them.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "Barracuda";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for remote compute module fetches
pub const USER_AGENT: &str = concat!("BarracudaShell/", env!("CARGO_PKG_VERSION"));

// ============================================
// ASSET PROTOCOL
// ============================================

/// Private URL scheme served by the asset resolver
pub const DEFAULT_SCHEME: &str = "app";

/// Host used when building `app://` URLs
pub const SCHEME_HOST: &str = "localhost";

/// Default directory holding the UI assets
pub const DEFAULT_APP_ROOT: &str = "ui";

/// Default HTML entry point
pub const DEFAULT_ENTRY: &str = "index.html";

/// File served when a request names a directory
pub const DIRECTORY_INDEX: &str = "index.html";

/// Bytes whose escapes stay encoded when a request path is decoded
/// (`decodeURI` semantics: `app://localhost/a%2Fb.js` names the file `a%2Fb.js`)
pub const URI_RESERVED: &[u8] = b";/?:@&=+$,#";

/// Extension (lower case, with dot) -> MIME type.
/// Anything not listed resolves to an empty MIME type.
pub const MIME_TABLE: [(&str, &str); 6] = [
    (".js", "text/javascript"),
    (".html", "text/html"),
    (".css", "text/css"),
    (".svg", "image/svg+xml"),
    (".svgz", "image/svg+xml"),
    (".json", "application/json"),
];

/// MIME type for unmapped extensions
pub const UNKNOWN_MIME: &str = "";

// ============================================
// WINDOW PRESETS
// ============================================

/// Standard window size (width, height)
pub const STANDARD_WINDOW: (u32, u32) = (800, 600);

/// Inspector window size, opened with devtools
pub const INSPECTOR_WINDOW: (u32, u32) = (1000, 800);

// ============================================
// NETWORK
// ============================================

/// Asset server bind address
pub const DEFAULT_UI_ADDR: &str = "127.0.0.1:8088";

/// WebSocket server bind address
pub const DEFAULT_WS_ADDR: &str = "127.0.0.1:3013";

/// WebSocket endpoint the client connects to
pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:3013";

/// Greeting sent once when the socket opens
pub const DEFAULT_GREETING: &str = "thefux says hello";

/// Reply the echo server sends for every inbound message
pub const ECHO_REPLY: &str = "send message back";

/// Buffered events per WebSocket connection handle
pub const WS_EVENT_BUFFER: usize = 256;

// ============================================
// COMPUTE MODULE
// ============================================

/// Default compute module, relative to the app root. Text format compiles too.
pub const DEFAULT_COMPUTE_MODULE: &str = "wasm/deno.wat";

/// Import namespace the compute module may pull host functions from
pub const HOST_IMPORT_MODULE: &str = "imports";

/// Host function that logs its single argument
pub const HOST_IMPORT_LOG: &str = "imported_func";

/// Default click bindings: element id -> export call
pub const DEFAULT_BINDINGS: &str = "ok_button=square:3,but=tada";

/// Build the URL a webview loads for `entry` under `scheme`.
///
/// Windows webviews can't register arbitrary schemes and expose them as
/// `http://<scheme>.localhost/` instead.
pub fn entry_url(scheme: &str, entry: &str) -> String {
    let entry = entry.trim_start_matches('/');
    if cfg!(windows) {
        format!("http://{}.{}/{}", scheme, SCHEME_HOST, entry)
    } else {
        format!("{}://{}/{}", scheme, SCHEME_HOST, entry)
    }
}
