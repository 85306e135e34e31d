use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

const APP_USER_AGENT: &str = concat!("MikihoLauncher/", env!("CARGO_PKG_VERSION"));

/// Connection and idle limits for the shared client.
///
/// No total deadline is set; bundle downloads stream for as long as bytes
/// keep arriving. Short requests set their own per-request timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    /// Longest gap between two reads of a response.
    pub read: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            read: Duration::from_secs(60),
        }
    }
}

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    build_http_client_with(HttpTimeouts::default())
}

pub fn build_http_client_with(timeouts: HttpTimeouts) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(timeouts.connect)
        .read_timeout(timeouts.read)
        .build()
}
