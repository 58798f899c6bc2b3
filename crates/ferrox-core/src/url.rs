//! URL-shaped configuration carried on every call.
//!
//! A [`Url`] is the immutable key/value parameter bag the framework threads
//! through consumers and extensions. It carries a scheme (the part before
//! `://`), an optional authority and path, and arbitrary string parameters.
//! Parameters have two scopes: global (`loadbalance=random`) and per method
//! (`sayHello.loadbalance=roundrobin`), the latter taking precedence for
//! method-scoped lookups.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing a [`Url`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlParseError {
    /// The port component is not a number.
    #[error("Invalid port in url: {0}")]
    InvalidPort(String),

    /// The input is empty.
    #[error("Empty url")]
    Empty,
}

/// Immutable URL-like configuration bag.
///
/// Values are read-only once constructed; the `with_*` builders return a
/// modified copy. An empty parameter value is treated as absent by every
/// lookup, so `loadbalance=` and a missing `loadbalance` behave the same.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Url {
    scheme: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    path: Option<String>,
    parameters: BTreeMap<String, String>,
}

impl Url {
    /// Create an empty url.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scheme (the primary field, e.g. `ferrox` in `ferrox://...`).
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Set the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the path (without a leading slash).
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set a global parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Set a method-scoped parameter (stored as `{method}.{key}`).
    pub fn with_method_param(
        self,
        method: impl AsRef<str>,
        key: impl AsRef<str>,
        value: impl Into<String>,
    ) -> Self {
        let scoped = format!("{}.{}", method.as_ref(), key.as_ref());
        self.with_param(scoped, value)
    }

    /// The scheme, if set.
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// The host, if set.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// The port, if set.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The path, if set.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Look up a global parameter. Empty values count as absent.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Look up a global parameter with a fallback default.
    pub fn param_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.param(key).unwrap_or(default)
    }

    /// Look up a method-scoped parameter, falling back to the global scope.
    ///
    /// `{method}.{key}` wins when present and non-empty; otherwise the
    /// global `key` is consulted.
    pub fn method_param(&self, method: &str, key: &str) -> Option<&str> {
        let scoped = format!("{}.{}", method, key);
        self.parameters
            .get(&scoped)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .or_else(|| self.param(key))
    }

    /// Look up a method-scoped parameter with a fallback default.
    pub fn method_param_or<'a>(&'a self, method: &str, key: &str, default: &'a str) -> &'a str {
        self.method_param(method, key).unwrap_or(default)
    }

    /// All parameters, raw (including empty values).
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }
}

impl FromStr for Url {
    type Err = UrlParseError;

    /// Parse `scheme://host:port/path?key=value&key2=value2`.
    ///
    /// Every component is optional; `/path?version=1.0.0` and
    /// `loadbalance=random` on their own are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(UrlParseError::Empty);
        }

        let mut url = Url::new();

        let rest = match s.split_once("://") {
            Some((scheme, rest)) => {
                if !scheme.is_empty() {
                    url.scheme = Some(scheme.to_string());
                }
                rest
            }
            None => s,
        };

        let (body, query) = match rest.split_once('?') {
            Some((body, query)) => (body, Some(query)),
            None => (rest, None),
        };

        let (authority, path) = match body.split_once('/') {
            Some((authority, path)) => (authority, Some(path)),
            None => (body, None),
        };

        if !authority.is_empty() {
            match authority.split_once(':') {
                Some((host, port)) => {
                    if !host.is_empty() {
                        url.host = Some(host.to_string());
                    }
                    let port: u16 = port
                        .parse()
                        .map_err(|_| UrlParseError::InvalidPort(port.to_string()))?;
                    url.port = Some(port);
                }
                None => url.host = Some(authority.to_string()),
            }
        }

        if let Some(path) = path {
            if !path.is_empty() {
                url.path = Some(path.to_string());
            }
        }

        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                match pair.split_once('=') {
                    Some((key, value)) => {
                        url.parameters.insert(key.to_string(), value.to_string());
                    }
                    None => {
                        url.parameters.insert(pair.to_string(), String::new());
                    }
                }
            }
        }

        Ok(url)
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{}://", scheme)?;
        }
        if let Some(host) = &self.host {
            write!(f, "{}", host)?;
        }
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        if let Some(path) = &self.path {
            write!(f, "/{}", path)?;
        }
        if !self.parameters.is_empty() {
            // BTreeMap iteration keeps the textual form stable for a given
            // parameter set, which diagnostics rely on.
            for (i, (key, value)) in self.parameters.iter().enumerate() {
                write!(f, "{}{}={}", if i == 0 { "?" } else { "&" }, key, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_url() {
        let url: Url = "ferrox://192.168.0.1:20880/demo.GreetService?loadbalance=random&codec=json"
            .parse()
            .unwrap();

        assert_eq!(url.scheme(), Some("ferrox"));
        assert_eq!(url.host(), Some("192.168.0.1"));
        assert_eq!(url.port(), Some(20880));
        assert_eq!(url.path(), Some("demo.GreetService"));
        assert_eq!(url.param("loadbalance"), Some("random"));
        assert_eq!(url.param("codec"), Some("json"));
    }

    #[test]
    fn test_parse_path_only() {
        let url: Url = "/context/path?version=1.0.0&application=morgan".parse().unwrap();

        assert_eq!(url.scheme(), None);
        assert_eq!(url.host(), None);
        assert_eq!(url.path(), Some("context/path"));
        assert_eq!(url.param("version"), Some("1.0.0"));
    }

    #[test]
    fn test_parse_invalid_port() {
        let result: Result<Url, _> = "ferrox://host:abc/path".parse();
        assert!(matches!(result, Err(UrlParseError::InvalidPort(_))));
    }

    #[test]
    fn test_empty_value_counts_as_absent() {
        let url = Url::new().with_param("loadbalance", "");
        assert_eq!(url.param("loadbalance"), None);
        assert_eq!(url.param_or("loadbalance", "random"), "random");
    }

    #[test]
    fn test_method_param_scoping() {
        let url = Url::new()
            .with_param("loadbalance", "random")
            .with_method_param("sayHello", "loadbalance", "roundrobin");

        assert_eq!(url.method_param("sayHello", "loadbalance"), Some("roundrobin"));
        assert_eq!(url.method_param("other", "loadbalance"), Some("random"));
        assert_eq!(url.method_param("other", "missing"), None);
    }

    #[test]
    fn test_serde_round_trip() {
        let url = Url::new()
            .with_scheme("ferrox")
            .with_host("localhost")
            .with_param("loadbalance", "roundrobin");

        let json = serde_json::to_string(&url).unwrap();
        let back: Url = serde_json::from_str(&json).unwrap();
        assert_eq!(back, url);
    }

    #[test]
    fn test_display_round_trip() {
        let url = Url::new()
            .with_scheme("ferrox")
            .with_host("localhost")
            .with_port(20880)
            .with_path("demo.GreetService")
            .with_param("b", "2")
            .with_param("a", "1");

        let text = url.to_string();
        assert_eq!(text, "ferrox://localhost:20880/demo.GreetService?a=1&b=2");

        let reparsed: Url = text.parse().unwrap();
        assert_eq!(reparsed, url);
    }
}
