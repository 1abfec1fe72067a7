// ai
//! 🪣 S3 Backend: the last stop for every artifact.
//!
//! INT. AWS CONSOLE. NIGHT. A bucket that may or may not exist waits in
//! us-east-1. The gateway knocks (HEAD), builds it if nobody answers (CREATE),
//! and drops the CSV under `raw/` (PUT). Same thing tomorrow. Same key if the
//! date did not change, in which case yesterday's copy gets overwritten.
//!
//! 🧠 Knowledge graph:
//! - Config co-located: `StorageConfig` lives in `s3_store.rs`
//! - Trait impl: `impl ObjectStore for S3Store`
//! - Enum variant: `StoreBackend::S3(S3Store)`
//! - Works against MinIO/localstack through `endpoint` + `path_style`

mod s3_store;

pub use s3_store::{S3Store, StorageConfig};
