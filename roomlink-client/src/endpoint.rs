//! Realtime endpoint construction
//!
//! The socket lives at `<ws|wss>://<host>/ws`, with the auth token, when
//! one is known, appended as an `authToken` query parameter. The scheme
//! follows the security context of the page the client runs for: a page
//! served over `https` talks to `wss`.

use roomlink_core::{Error, Result};
use url::Url;

/// Default socket path
pub const DEFAULT_PATH: &str = "/ws";

/// Query parameter carrying the auth token
pub const AUTH_TOKEN_PARAM: &str = "authToken";

/// Where the realtime socket lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    secure: bool,
    path: String,
}

impl Endpoint {
    /// Endpoint on `host` (with optional port), plain `ws` scheme
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            secure: false,
            path: DEFAULT_PATH.to_string(),
        }
    }

    /// Derive the endpoint from the page URL the client serves
    ///
    /// ```rust
    /// use roomlink_client::Endpoint;
    ///
    /// let endpoint = Endpoint::for_page("https://app.example.com:8443/dashboard").unwrap();
    /// assert_eq!(endpoint.url(None).unwrap(), "wss://app.example.com:8443/ws");
    /// ```
    pub fn for_page(page_url: &str) -> Result<Self> {
        let page = Url::parse(page_url).map_err(|e| Error::InvalidEndpoint(e.to_string()))?;
        let host = page
            .host_str()
            .ok_or_else(|| Error::InvalidEndpoint(format!("page URL has no host: {}", page_url)))?;
        let host = match page.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Ok(Self::new(host).with_secure(page.scheme() == "https"))
    }

    /// Use `wss` instead of `ws`
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Override the socket path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        self
    }

    /// Host (and port) of the endpoint
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether the secure scheme is used
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Build the socket URL, appending the auth token when present
    pub fn url(&self, auth_token: Option<&str>) -> Result<String> {
        if self.host.is_empty() {
            return Err(Error::InvalidEndpoint("empty host".to_string()));
        }

        let scheme = if self.secure { "wss" } else { "ws" };
        let mut url = Url::parse(&format!("{}://{}{}", scheme, self.host, self.path))
            .map_err(|e| Error::InvalidEndpoint(format!("{}: {}", self.host, e)))?;

        if let Some(token) = auth_token {
            url.query_pairs_mut().append_pair(AUTH_TOKEN_PARAM, token);
        }

        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_endpoint() {
        let endpoint = Endpoint::new("localhost:8080");
        assert_eq!(endpoint.url(None).unwrap(), "ws://localhost:8080/ws");
    }

    #[test]
    fn test_secure_endpoint_with_token() {
        let endpoint = Endpoint::new("example.com").with_secure(true);
        assert_eq!(
            endpoint.url(Some("abc123")).unwrap(),
            "wss://example.com/ws?authToken=abc123"
        );
    }

    #[test]
    fn test_token_is_percent_encoded() {
        let endpoint = Endpoint::new("example.com");
        assert_eq!(
            endpoint.url(Some("a b&c")).unwrap(),
            "ws://example.com/ws?authToken=a+b%26c"
        );
    }

    #[test]
    fn test_custom_path() {
        let endpoint = Endpoint::new("example.com").with_path("realtime");
        assert_eq!(endpoint.url(None).unwrap(), "ws://example.com/realtime");
    }

    #[test]
    fn test_for_page_mirrors_security() {
        let plain = Endpoint::for_page("http://intranet.local/app").unwrap();
        assert!(!plain.is_secure());
        assert_eq!(plain.host(), "intranet.local");

        let secure = Endpoint::for_page("https://app.example.com/").unwrap();
        assert!(secure.is_secure());
    }

    #[test]
    fn test_invalid_host() {
        assert!(Endpoint::new("").url(None).is_err());
        assert!(Endpoint::new("bad host").url(None).is_err());
        assert!(Endpoint::for_page("not a url").is_err());
    }
}
