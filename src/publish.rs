//! Publisher: hands the compiled document to the object-storage backend and
//! obtains a retrievable link.

use reqwest::StatusCode;
use tracing::{error, info, warn};

use crate::config::StorageConfig;
use crate::contract::{ObjectAcl, ObjectStore, PutObjectRequest, StoreError};

/// Retrievable-link validity floor: a week, long enough for realistic
/// polling/download windows.
pub const URL_EXPIRY_SECS: u64 = 604_800;

/// Storage key for a job's artifact. Deterministic per job id so repeated
/// publishes overwrite the same object.
pub fn artifact_key(job_id: &str) -> String {
    format!("{job_id}/index.html")
}

/// Publish `html` for `job_id` and return the retrievable URL.
///
/// The first write requests public-read access; a backend that forbids that
/// ACL gets one retry without it. Any other storage error escalates to the
/// caller.
pub async fn publish(
    store: &dyn ObjectStore,
    html: &str,
    job_id: &str,
) -> Result<String, StoreError> {
    let key = artifact_key(job_id);
    info!(key = %key, size = html.len(), "Uploading artifact to object storage");

    let with_acl = PutObjectRequest {
        key: &key,
        body: html.as_bytes(),
        content_type: "text/html",
        acl: Some(ObjectAcl::PublicRead),
    };

    match store.put_object(with_acl).await {
        Ok(()) => {
            info!(key = %key, "Uploaded artifact with public-read ACL");
        }
        Err(StoreError::AclUnsupported(msg)) => {
            warn!(
                key = %key,
                reason = %msg,
                "ACL not supported, retrying upload without ACL"
            );
            let without_acl = PutObjectRequest {
                key: &key,
                body: html.as_bytes(),
                content_type: "text/html",
                acl: None,
            };
            store.put_object(without_acl).await?;
            info!(key = %key, "Uploaded artifact without ACL");
        }
        Err(e) => {
            error!(key = %key, error = %e, "Artifact upload failed");
            return Err(e);
        }
    }

    let url = store.object_url(&key, URL_EXPIRY_SECS).await?;
    info!(key = %key, url = %url, "Artifact published");
    Ok(url)
}

/// Object store speaking plain HTTP against an S3-compatible endpoint:
/// objects are written with `PUT {endpoint}/{bucket}/{key}` and read back
/// under a public base URL.
pub struct HttpObjectStore {
    client: reqwest::Client,
    config: StorageConfig,
}

impl HttpObjectStore {
    /// Fails fast on missing configuration: no bucket, endpoint or access
    /// token means no job can ever publish, so this is not retryable.
    pub fn new(config: StorageConfig) -> Result<Self, StoreError> {
        if config.endpoint.trim().is_empty() {
            return Err(StoreError::Config("storage endpoint is not set".into()));
        }
        if config.bucket.trim().is_empty() {
            return Err(StoreError::Config("storage bucket is not set".into()));
        }
        if config.access_token.as_deref().unwrap_or("").is_empty() {
            return Err(StoreError::Config(
                "storage access token is not set".into(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            config,
        })
    }

    fn object_endpoint(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.bucket,
            key
        )
    }
}

#[async_trait::async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put_object<'a>(&self, req: PutObjectRequest<'a>) -> Result<(), StoreError> {
        let url = self.object_endpoint(req.key);
        let token = self
            .config
            .access_token
            .as_deref()
            .ok_or_else(|| StoreError::Config("storage access token is not set".into()))?;

        let mut request = self
            .client
            .put(&url)
            .bearer_auth(token)
            .header("content-type", req.content_type)
            .body(req.body.to_vec());
        if let Some(ObjectAcl::PublicRead) = req.acl {
            request = request.header("x-amz-acl", "public-read");
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<failed to decode response body>"));

        // Backends with ACLs disabled reject the x-amz-acl header; surface
        // that separately so the publisher can retry without it.
        if req.acl.is_some()
            && (status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_IMPLEMENTED)
            && (body.contains("AccessControlListNotSupported")
                || body.contains("InvalidRequest")
                || body.contains("NotSupported"))
        {
            return Err(StoreError::AclUnsupported(format!(
                "{status}: {body}"
            )));
        }

        error!(url = %url, status = %status, "Object store returned error. Response body: {body}");
        Err(StoreError::Other(
            format!("object store PUT {url} failed with {status}: {body}").into(),
        ))
    }

    async fn object_url(&self, key: &str, _expires_secs: u64) -> Result<String, StoreError> {
        // Unbounded public link; the bucket (or its policy) makes objects
        // readable under the public base URL.
        let base = match &self.config.public_base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!(
                "{}/{}",
                self.config.endpoint.trim_end_matches('/'),
                self.config.bucket
            ),
        };
        Ok(format!("{base}/{key}"))
    }
}
