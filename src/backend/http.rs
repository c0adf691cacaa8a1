// src/backend/http.rs

//! Store backed by a namespace on an HTTP artifact service
//!
//! Routes, relative to the master URL:
//! - `GET  /api/namespace/<ns>/list` → JSON array of `/`-prefixed paths
//! - `GET  /namespace/<ns>/<key, escaped per segment>` → file content
//! - `POST /api/namespace/<ns>/remove` with form field `path=/<key>`
//!
//! Every request carries `Authorization: token <api key>`.

use super::profile::ProfileStore;
use super::{Backend, BackendKind, BackendOptions};
use crate::artifact::ArtifactMetadata;
use crate::error::{Error, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Timeout for every request
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

pub struct HttpBackend {
    client: Client,
    master: Url,
    api_key: String,
    namespace: String,
}

impl HttpBackend {
    /// Build the backend from `namespace` plus either `profile` or both
    /// `master-url` and `api-key`
    pub fn new(opts: &BackendOptions) -> Result<Self> {
        let kind = BackendKind::Http;
        let namespace = opts.require("namespace", kind)?.to_string();

        let (master, api_key) = match opts.get("profile") {
            Some(name) => {
                let store = ProfileStore::load_default()
                    .map_err(|e| Error::InitError(format!("Cannot resolve profile {}: {}", name, e)))?;
                let profile = store
                    .get(name)
                    .map_err(|e| Error::InitError(e.to_string()))?;
                (profile.master.clone(), profile.api_key.clone())
            }
            None => (
                opts.require("master-url", kind)?.to_string(),
                opts.require("api-key", kind)?.to_string(),
            ),
        };

        Self::with_credentials(&master, &api_key, &namespace)
    }

    /// Build the backend from explicit connection settings
    pub fn with_credentials(master: &str, api_key: &str, namespace: &str) -> Result<Self> {
        let master = Url::parse(master)
            .map_err(|e| Error::InitError(format!("Invalid master URL '{}': {}", master, e)))?;

        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        info!("Using namespace {} on {}", namespace, master);
        Ok(Self {
            client,
            master,
            api_key: api_key.to_string(),
            namespace: namespace.to_string(),
        })
    }

    /// Absolute URL for a route below the master URL
    fn url(&self, route: &str) -> Result<Url> {
        let base = self.master.as_str().trim_end_matches('/');
        let full = format!("{}/{}", base, route.trim_start_matches('/'));
        Url::parse(&full).map_err(|e| Error::InitError(format!("Invalid URL '{}': {}", full, e)))
    }

    pub fn list_url(&self) -> Result<Url> {
        self.url(&format!("api/namespace/{}/list", self.namespace))
    }

    /// Each `/`-separated segment of `key` is escaped on its own
    pub fn fetch_url(&self, key: &str) -> Result<Url> {
        let escaped: Vec<String> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        self.url(&format!("namespace/{}/{}", self.namespace, escaped.join("/")))
    }

    pub fn remove_url(&self) -> Result<Url> {
        self.url(&format!("api/namespace/{}/remove", self.namespace))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("token {}", self.api_key))
    }

    /// Send a request and turn non-2xx answers into errors
    fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = self
            .authorized(request)
            .send()
            .map_err(|e| Error::IoError(format!("{} failed: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::BackendError(format!(
                "{} returned HTTP {}: {}",
                what,
                status,
                body.trim()
            )));
        }
        Ok(response)
    }
}

impl Backend for HttpBackend {
    fn list(&self) -> Result<Vec<String>> {
        let url = self.list_url()?;
        let response = self.send(self.client.get(url), "Namespace listing")?;

        let paths: Vec<String> = response
            .json()
            .map_err(|e| Error::ParseError(format!("Invalid namespace listing: {e}")))?;

        let keys: Vec<String> = paths
            .into_iter()
            .map(|p| p.trim_start_matches('/').to_string())
            .collect();

        debug!("Namespace {} holds {} files", self.namespace, keys.len());
        Ok(keys)
    }

    fn fetch_metadata(&self, key: &str) -> Result<ArtifactMetadata> {
        let url = self.fetch_url(key)?;
        let response = self
            .send(self.client.get(url), &format!("Fetching {}", key))
            .map_err(|e| Error::DownloadError(e.to_string()))?;

        let bytes = response
            .bytes()
            .map_err(|e| Error::DownloadError(format!("Failed to read {}: {}", key, e)))?;

        ArtifactMetadata::from_yaml(&bytes)
            .map_err(|e| Error::ParseError(format!("{}: {}", key, e)))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let url = self.remove_url()?;
        let path = format!("/{}", key);
        self.send(
            self.client.post(url).form(&[("path", path.as_str())]),
            &format!("Removing {}", key),
        )?;
        Ok(())
    }
}
