// src/backend/s3.rs

//! Store backed by an S3-compatible bucket
//!
//! The async client runs on a private current-thread runtime so the
//! backend stays blocking at the interface.

use super::{Backend, BackendKind, BackendOptions};
use crate::artifact::ArtifactMetadata;
use crate::error::{Error, Result};
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

pub struct S3Backend {
    bucket: Box<Bucket>,
    runtime: Runtime,
}

impl S3Backend {
    /// Connect to the bucket described by `opts`
    ///
    /// Required options: `bucket`, `endpoint`, `access-key`, `secret-key`.
    /// Optional: `region` (default us-east-1), `tls` ("false" disables).
    pub fn new(opts: &BackendOptions) -> Result<Self> {
        let kind = BackendKind::S3;
        let bucket_name = opts.require("bucket", kind)?;
        let endpoint = opts.require("endpoint", kind)?;
        let access_key = opts.require("access-key", kind)?;
        let secret_key = opts.require("secret-key", kind)?;
        let region = opts.get("region").unwrap_or(DEFAULT_REGION);
        let tls = opts.get("tls").map(|v| v != "false").unwrap_or(true);

        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .map_err(|e| Error::InitError(format!("Invalid S3 credentials: {}", e)))?;

        let region = Region::Custom {
            region: region.to_string(),
            endpoint: endpoint_url(endpoint, tls),
        };

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| Error::InitError(format!("Failed to configure bucket {}: {}", bucket_name, e)))?
            .with_path_style();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create async runtime: {}", e)))?;

        let exists = runtime
            .block_on(bucket.exists())
            .map_err(|e| Error::InitError(format!("Failed to probe bucket {}: {}", bucket_name, e)))?;
        if !exists {
            return Err(Error::InitError(format!(
                "Bucket {} doesn't exist on {}",
                bucket_name, endpoint
            )));
        }

        info!("Connected to bucket {} on {}", bucket_name, endpoint);
        Ok(Self { bucket, runtime })
    }
}

/// Endpoint URL with an explicit scheme
fn endpoint_url(endpoint: &str, tls: bool) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else if tls {
        format!("https://{}", endpoint)
    } else {
        format!("http://{}", endpoint)
    }
}

impl Backend for S3Backend {
    fn list(&self) -> Result<Vec<String>> {
        let pages = self
            .runtime
            .block_on(self.bucket.list(String::new(), None))
            .map_err(|e| Error::IoError(format!("Failed to list bucket {}: {}", self.bucket.name(), e)))?;

        let keys: Vec<String> = pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|object| object.key.trim_start_matches('/').to_string())
            .collect();

        debug!("Bucket {} holds {} objects", self.bucket.name(), keys.len());
        Ok(keys)
    }

    fn fetch_metadata(&self, key: &str) -> Result<ArtifactMetadata> {
        let response = self
            .runtime
            .block_on(self.bucket.get_object(key))
            .map_err(|e| Error::DownloadError(format!("Failed to fetch {}: {}", key, e)))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(Error::DownloadError(format!("HTTP {} fetching {}", status, key)));
        }

        ArtifactMetadata::from_yaml(response.bytes())
            .map_err(|e| Error::ParseError(format!("{}: {}", key, e)))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let response = self
            .runtime
            .block_on(self.bucket.delete_object(key))
            .map_err(|e| Error::BackendError(format!("Failed to remove {}: {}", key, e)))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(Error::BackendError(format!("HTTP {} removing {}", status, key)));
        }
        Ok(())
    }
}
