//! Purpose: Endpoint and credential configuration for the HTTP gateway.
//! Exports: `GatewayConfig`, `Credential`, env var names.
//! Role: Resolve base URL, paths, and timeout from code or the environment.
//! Invariants: Base URLs use http/https and carry no path, query, or fragment.
//! Invariants: Credential values are never printed by `Debug`.
use crate::core::error::{Error, ErrorKind};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const URL_ENV: &str = "POSTFEED_URL";
pub const TOKEN_ENV: &str = "POSTFEED_TOKEN";
pub const TIMEOUT_ENV: &str = "POSTFEED_TIMEOUT_MS";

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GatewayConfig {
    base_url: Url,
    graphql_path: String,
    image_path: String,
    timeout: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, Error> {
        Ok(Self {
            base_url: normalize_base_url(base_url.as_ref())?,
            graphql_path: "graphql".to_string(),
            image_path: "post-image".to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let base_url = lookup(URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(base_url)?;
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let millis = raw.trim().parse::<u64>().map_err(|err| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("{TIMEOUT_ENV} must be a number of milliseconds"))
                    .with_source(err)
            })?;
            if millis == 0 {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(format!("{TIMEOUT_ENV} must be greater than zero"))
                    .with_hint("Use a positive value like 30000."));
            }
            config.timeout = Duration::from_millis(millis);
        }
        Ok(config)
    }

    pub fn with_graphql_path(mut self, path: impl AsRef<str>) -> Self {
        self.graphql_path = path.as_ref().trim_matches('/').to_string();
        self
    }

    pub fn with_image_path(mut self, path: impl AsRef<str>) -> Self {
        self.image_path = path.as_ref().trim_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn graphql_url(&self) -> Result<Url, Error> {
        build_url(&self.base_url, &self.graphql_path)
    }

    pub fn image_url(&self) -> Result<Url, Error> {
        build_url(&self.base_url, &self.image_path)
    }
}

/// Opaque bearer token supplied by the embedding environment.
#[derive(Clone, Eq, PartialEq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn from_env() -> Result<Self, Error> {
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => Ok(Self::new(token.trim())),
            _ => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("{TOKEN_ENV} is not set"))
                .with_hint("Export the bearer token issued at login.")),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("failed to read token file {}", path.display()))
                .with_source(err)
        })?;
        let token = raw.trim();
        if token.is_empty() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("token file {} is empty", path.display())));
        }
        Ok(Self::new(token))
    }

    pub(crate) fn authorization(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid base url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(
            Error::new(ErrorKind::Usage).with_message("base url must use http or https scheme")
        );
    }
    if url.path() != "/" && !url.path().is_empty() {
        return Err(Error::new(ErrorKind::Usage).with_message("base url must not include a path"));
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_url(base_url: &Url, path: &str) -> Result<Url, Error> {
    let mut url = base_url.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| Error::new(ErrorKind::Usage).with_message("base url cannot be a base"))?;
        segments.clear();
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            segments.push(segment);
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::{Credential, GatewayConfig, TIMEOUT_ENV, URL_ENV};
    use crate::core::error::ErrorKind;
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_local_server() {
        let config = GatewayConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config.base_url().as_str(), "http://localhost:8080/");
        assert_eq!(
            config.graphql_url().expect("url").as_str(),
            "http://localhost:8080/graphql"
        );
        assert_eq!(
            config.image_url().expect("url").as_str(),
            "http://localhost:8080/post-image"
        );
    }

    #[test]
    fn reads_url_and_timeout_from_lookup() {
        let config = GatewayConfig::from_lookup(lookup(&[
            (URL_ENV, "https://feed.example.com"),
            (TIMEOUT_ENV, "2500"),
        ]))
        .expect("config");
        assert_eq!(config.base_url().as_str(), "https://feed.example.com/");
        assert_eq!(config.timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = GatewayConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "0")])).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn rejects_base_url_with_path() {
        let err = GatewayConfig::new("http://localhost:8080/api").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = GatewayConfig::new("ftp://localhost").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn custom_paths_are_joined_to_base() {
        let config = GatewayConfig::new("http://127.0.0.1:9000")
            .expect("config")
            .with_graphql_path("/api/graphql/")
            .with_image_path("uploads");
        assert_eq!(
            config.graphql_url().expect("url").as_str(),
            "http://127.0.0.1:9000/api/graphql"
        );
        assert_eq!(
            config.image_url().expect("url").as_str(),
            "http://127.0.0.1:9000/uploads"
        );
    }

    #[test]
    fn credential_debug_hides_token() {
        let credential = Credential::new("secret-token");
        assert_eq!(format!("{credential:?}"), "Credential(..)");
        assert_eq!(credential.authorization(), "Bearer secret-token");
    }

    #[test]
    fn credential_from_file_trims_and_rejects_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("token");
        std::fs::write(&path, "abc123\n").expect("write");
        let credential = Credential::from_file(&path).expect("credential");
        assert_eq!(credential, Credential::new("abc123"));

        std::fs::write(&path, "  \n").expect("write");
        let err = Credential::from_file(&path).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
