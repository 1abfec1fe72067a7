//! 🔌 Backends: where the real I/O happens.
//!
//! 🚰 Sources pour posts in, the file sink puts them on disk, object stores
//! carry them off to a bucket. Everything in between is pure.
//!
//! 🎭 This module is the casting agency. Need posts from Reddit? From a
//! hand-written fixture in RAM? A bucket on AWS, or one that only lives in a
//! `HashMap` for the length of a test? We've got a backend for that.
//!
//! 🦆 The duck is here because every file must have one. This is law. Do not question the duck.

use std::path::Path;

use async_trait::async_trait;

use crate::common::RawPost;
use crate::errors::{SourceError, StoreError};

pub mod file;
pub mod in_mem;
pub mod reddit;
pub mod s3;

// 🎯 Re-export backend-specific configs so callers can do `backends::RedditConfig`
// instead of spelunking into `backends::reddit::RedditConfig`.
pub use reddit::RedditConfig;
pub use s3::StorageConfig;

/// 📁 Every remote object lives under this prefix. Fixed, not configurable.
pub const RAW_PREFIX: &str = "raw";

/// 🗝️ `raw/<remote_name>`. The one and only key layout.
pub fn remote_key(remote_name: &str) -> String {
    format!("{RAW_PREFIX}/{remote_name}")
}

// ===== Source Trait and Backend Enum =====

/// 🚰 A source of raw posts, one page at a time.
///
/// # Contract
/// - `next_page` returns `Some(posts)` while there is data and `None` once the
///   source is exhausted. After `None`, it keeps returning `None`.
/// - Posts come out in upstream ranking order. No reordering, no dedup.
/// - Finite and not restartable. Want the posts again? Build a new source.
#[async_trait]
pub trait Source: std::fmt::Debug + Send {
    async fn next_page(&mut self) -> Result<Option<Vec<RawPost>>, SourceError>;
}

/// 🎭 The many faces of a Source.
///
/// The enum dispatches via `impl Source for SourceBackend`, so the ETL stage
/// never needs to know whether the posts came from Reddit or from a test fixture.
#[derive(Debug)]
pub enum SourceBackend {
    Reddit(reddit::RedditSource),
    InMemory(in_mem::InMemorySource),
}

#[async_trait]
impl Source for SourceBackend {
    async fn next_page(&mut self) -> Result<Option<Vec<RawPost>>, SourceError> {
        match self {
            SourceBackend::Reddit(source) => source.next_page().await,
            SourceBackend::InMemory(source) => source.next_page().await,
        }
    }
}

// ===== ObjectStore Trait and Backend Enum =====

/// 🪣 What `ensure_bucket` found (or did).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketState {
    Created,
    AlreadyExists,
}

impl std::fmt::Display for BucketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BucketState::Created => write!(f, "created"),
            BucketState::AlreadyExists => write!(f, "already exists"),
        }
    }
}

/// 🪣 A place where artifacts go to be durable.
///
/// # Contract
/// - `ensure_bucket` is idempotent: absent becomes present, present stays present.
///   "Already exists" is an outcome, never an error.
/// - `put_object` copies the local file to `bucket/raw/<remote_name>` and returns
///   the key. A missing local file is `StoreError::NotFound`, and nothing remote changes.
#[async_trait]
pub trait ObjectStore: std::fmt::Debug + Send + Sync {
    async fn ensure_bucket(&self, bucket: &str) -> Result<BucketState, StoreError>;

    async fn put_object(
        &self,
        local_path: &Path,
        bucket: &str,
        remote_name: &str,
    ) -> Result<String, StoreError>;
}

/// 🎭 The many faces of an ObjectStore. Mirrors `SourceBackend` on the far end.
#[derive(Debug)]
pub enum StoreBackend {
    S3(s3::S3Store),
    InMemory(in_mem::InMemoryStore),
}

#[async_trait]
impl ObjectStore for StoreBackend {
    async fn ensure_bucket(&self, bucket: &str) -> Result<BucketState, StoreError> {
        match self {
            StoreBackend::S3(store) => store.ensure_bucket(bucket).await,
            StoreBackend::InMemory(store) => store.ensure_bucket(bucket).await,
        }
    }

    async fn put_object(
        &self,
        local_path: &Path,
        bucket: &str,
        remote_name: &str,
    ) -> Result<String, StoreError> {
        match self {
            StoreBackend::S3(store) => store.put_object(local_path, bucket, remote_name).await,
            StoreBackend::InMemory(store) => {
                store.put_object(local_path, bucket, remote_name).await
            }
        }
    }
}
