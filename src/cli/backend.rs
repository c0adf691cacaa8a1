// src/cli/backend.rs
//! Artifact store selection flags shared by every command

use clap::Args;
use repo_devkit::BackendOptions;

#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    /// Store backend: local, s3 or http
    #[arg(short, long, default_value = "local")]
    pub backend: String,

    /// Store directory (local backend)
    #[arg(short, long)]
    pub path: Option<String>,

    /// Bucket name (s3 backend)
    #[arg(long, env = "S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// Endpoint host[:port] or URL (s3 backend)
    #[arg(long, env = "S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// Access key (s3 backend)
    #[arg(long, env = "S3_ACCESS_KEY", hide_env_values = true)]
    pub s3_access_key: Option<String>,

    /// Secret key (s3 backend)
    #[arg(long, env = "S3_SECRET_KEY", hide_env_values = true)]
    pub s3_secret_key: Option<String>,

    /// Region (s3 backend, default us-east-1)
    #[arg(long)]
    pub s3_region: Option<String>,

    /// Use TLS towards the endpoint (s3 backend)
    #[arg(long, value_name = "BOOL")]
    pub s3_tls: Option<bool>,

    /// Connection profile name (http backend)
    #[arg(long)]
    pub http_profile: Option<String>,

    /// Service URL (http backend, instead of a profile)
    #[arg(long, value_name = "URL")]
    pub http_master_url: Option<String>,

    /// API key (http backend, instead of a profile)
    #[arg(long)]
    pub http_api_key: Option<String>,

    /// Namespace holding the artifacts (http backend)
    #[arg(long)]
    pub http_namespace: Option<String>,
}

impl BackendArgs {
    /// Backend options keyed by their bare names
    pub fn options(&self) -> BackendOptions {
        let mut opts = BackendOptions::new();
        opts.set_opt("bucket", self.s3_bucket.clone())
            .set_opt("endpoint", self.s3_endpoint.clone())
            .set_opt("access-key", self.s3_access_key.clone())
            .set_opt("secret-key", self.s3_secret_key.clone())
            .set_opt("region", self.s3_region.clone())
            .set_opt("tls", self.s3_tls.map(|tls| tls.to_string()))
            .set_opt("profile", self.http_profile.clone())
            .set_opt("master-url", self.http_master_url.clone())
            .set_opt("api-key", self.http_api_key.clone())
            .set_opt("namespace", self.http_namespace.clone());
        opts
    }
}
