//! # contract: trait seams for the pipeline's opaque collaborators
//!
//! This module defines the interfaces behind which every external capability
//! lives: the chat model that produces summaries, the object store that holds
//! the published artifact, and the status store that persists job records for
//! pollers.
//!
//! ## Interface & Extensibility
//! - Implement [`ChatModel`] to plug in a different model provider.
//! - Implement [`ObjectStore`] for a different storage backend.
//! - Implement [`StatusStore`] for a different result backend (Redis, SQL, ...).
//! - All methods are async, returning results with boxed error types, except
//!   where the caller needs to distinguish failure classes ([`StoreError`]).
//!
//! ## Mocking & Testing
//! - Each trait is annotated for `mockall` so consumers can generate
//!   deterministic mocks for unit/integration tests.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::job::JobRecord;

/// Uniform boxed error for trait boundaries that don't need typed failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Normalized interface to a chat-completion model: prompt in, plain text out.
///
/// Implementors are responsible for transport, authentication and for
/// flattening whatever response shape the provider returns into one string.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one prompt and return the model's text response.
    async fn complete(&self, prompt: &str) -> Result<String, BoxError>;
}

/// Access control requested for a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectAcl {
    PublicRead,
}

/// Request to write one object into the store.
pub struct PutObjectRequest<'a> {
    /// Object key relative to the bucket root, e.g. `{job_id}/index.html`.
    pub key: &'a str,
    /// Raw object bytes.
    pub body: &'a [u8],
    /// MIME type the backend should serve the object with.
    pub content_type: &'a str,
    /// Optional access control; backends may reject this.
    pub acl: Option<ObjectAcl>,
}

/// Error type for object-store operations.
///
/// `AclUnsupported` is split out because the publisher retries a rejected
/// ACL write without the ACL before giving up.
#[derive(Debug)]
pub enum StoreError {
    /// The backend refused the requested ACL but may accept the write without it.
    AclUnsupported(String),
    /// The store is not configured (missing bucket, endpoint or credentials).
    Config(String),
    /// Any other storage failure.
    Other(BoxError),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::AclUnsupported(msg) => write!(f, "ACL not supported: {msg}"),
            StoreError::Config(msg) => write!(f, "storage configuration error: {msg}"),
            StoreError::Other(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Other(Box::new(e))
    }
}

/// Trait for the object-storage backend holding published artifacts.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write one object. The write must replace any existing object at `key`.
    async fn put_object<'a>(&self, req: PutObjectRequest<'a>) -> Result<(), StoreError>;

    /// Return a URL under which the object at `key` can be retrieved without
    /// further calls to this system. A time-bounded link is acceptable if its
    /// expiry is at least `expires_secs` from now.
    async fn object_url(&self, key: &str, expires_secs: u64) -> Result<String, StoreError>;
}

/// Key-value store for per-job status records, keyed by job id.
///
/// Exactly one orchestrator writes a given record; any number of pollers read
/// it. Reads may observe a record mid-update (eventual consistency).
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Persist the current record for `job_id`, replacing any previous one.
    async fn put_record(&self, job_id: &str, record: &JobRecord) -> Result<(), BoxError>;

    /// Fetch the record for `job_id`, or `None` if the store has never seen it
    /// (or has evicted it after its retention window).
    async fn get_record(&self, job_id: &str) -> Result<Option<JobRecord>, BoxError>;
}
