// ai
//! 📡 Reddit Backend: the only place in rdx that speaks OAuth.
//!
//! 🧠 Knowledge graph:
//! - Same pattern as `file/`, `s3/`, `in_mem/`
//! - Config co-located: `RedditConfig` lives in `reddit_source.rs`
//! - `RedditSession::connect` does the client-credentials dance once per run
//! - `RedditSession::top` hands out a `RedditSource`, which implements [`Source`](super::Source)
//! - Enum variant: `SourceBackend::Reddit(RedditSource)`
//!
//! 🦆 The duck has read the API terms. Twice. It still sends a user agent.

mod reddit_source;

pub use reddit_source::{RedditConfig, RedditSession, RedditSource};
