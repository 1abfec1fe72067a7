//! # Previously, on rdx...
//!
//! 🎬 Reddit was rate limiting. The bucket was in another account. The CI box
//! had no internet and no patience. Someone needed a subreddit that lived
//! entirely in RAM, and a bucket that was just a `HashMap` with ambition.
//!
//! `in_mem` provides an in-memory [`Source`] and [`ObjectStore`] for tests and
//! local development. [`InMemorySource`] hands out pre-built pages and then
//! nothing, optionally failing once the pages run out. [`InMemoryStore`] keeps
//! buckets and objects behind `Arc<Mutex<...>>` so a test can peek inside after
//! the pipeline is done with it.
//!
//! ⚠️ This is NOT for production. This is for tests.
//!
//! ✅ No network calls. No credentials. Just vibes and heap memory.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::backends::{BucketState, ObjectStore, Source, remote_key};
use crate::common::RawPost;
use crate::errors::{SourceError, StoreError};

/// 📦 A subreddit in a box.
#[derive(Debug, Default)]
pub struct InMemorySource {
    pages: VecDeque<Vec<RawPost>>,
    /// 💀 Served once, right after the last page. Then the source is just empty.
    failure: Option<SourceError>,
}

impl InMemorySource {
    pub fn new(pages: Vec<Vec<RawPost>>) -> Self {
        Self {
            pages: pages.into(),
            failure: None,
        }
    }

    /// 💀 Same pages, then an error instead of a clean end. For "Reddit died halfway" tests.
    pub fn failing_after(pages: Vec<Vec<RawPost>>, failure: SourceError) -> Self {
        Self {
            pages: pages.into(),
            failure: Some(failure),
        }
    }
}

#[async_trait]
impl Source for InMemorySource {
    async fn next_page(&mut self) -> Result<Option<Vec<RawPost>>, SourceError> {
        if let Some(page) = self.pages.pop_front() {
            return Ok(Some(page));
        }
        match self.failure.take() {
            Some(failure) => Err(failure),
            None => Ok(None),
        }
    }
}

/// 🪣 A bucket service that never leaves the process.
///
/// Clone-able because tests hand one clone to the pipeline and keep another to
/// inspect. The `Arc`s mean everyone shares the same buckets.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    pub buckets: Arc<Mutex<HashSet<String>>>,
    /// 🗝️ `(bucket, key) -> bytes`
    pub objects: Arc<Mutex<HashMap<(String, String), Vec<u8>>>>,
    /// 🔒 Simulates credentials that may PUT objects but may not look at buckets.
    deny_bucket_checks: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 🪣 Start with a bucket that is already there.
    pub fn with_bucket(bucket: &str) -> Self {
        let mut the_buckets = HashSet::new();
        the_buckets.insert(bucket.to_string());
        Self {
            buckets: Arc::new(Mutex::new(the_buckets)),
            ..Self::default()
        }
    }

    pub fn deny_bucket_checks(mut self) -> Self {
        self.deny_bucket_checks = true;
        self
    }

    pub async fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub async fn object_count(&self) -> usize {
        self.objects.lock().await.len()
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<BucketState, StoreError> {
        if self.deny_bucket_checks {
            return Err(StoreError::Bucket {
                bucket: bucket.to_string(),
                reason: "403 Forbidden".to_string(),
            });
        }
        // -- HashSet::insert says true when the value was new. that IS the state machine.
        if self.buckets.lock().await.insert(bucket.to_string()) {
            Ok(BucketState::Created)
        } else {
            Ok(BucketState::AlreadyExists)
        }
    }

    async fn put_object(
        &self,
        local_path: &Path,
        bucket: &str,
        remote_name: &str,
    ) -> Result<String, StoreError> {
        let the_bytes = match tokio::fs::read(local_path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    path: local_path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: local_path.to_path_buf(),
                    source,
                });
            }
        };

        let the_key = remote_key(remote_name);
        if !self.buckets.lock().await.contains(bucket) {
            return Err(StoreError::Transport {
                key: the_key,
                reason: format!("NoSuchBucket: '{bucket}'"),
            });
        }

        self.objects
            .lock()
            .await
            .insert((bucket.to_string(), the_key.clone()), the_bytes);
        Ok(the_key)
    }
}
