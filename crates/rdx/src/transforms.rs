// ai
//! 🔄 Transforms: the Rosetta Stone between the Reddit API and a CSV file 🎭
//!
//! ```text
//!   Reddit listing            Transformer              Sink
//!  ┌──────────────┐       ┌──────────────────┐     ┌──────────┐
//!  │ RawPost      │──────▶│ coerce per field │────▶│ PostTable│──▶ csv
//!  │ (Value soup) │       │ + batch `edited` │     │ (typed)  │
//!  └──────────────┘       │   majority vote  │     └──────────┘
//!                         └──────────────────┘
//! ```
//!
//! The transformer is the only part of rdx with real decisions in it, so it is
//! kept pure: a slice of raw posts goes in, a table comes out, nothing touches
//! the network or the disk. That makes it the easiest thing in the crate to
//! test, and the only thing worth benchmarking.
//!
//! ## Knowledge Graph 🧠
//! - `coerce.rs`: the per-field rules (truthy, text, integer, timestamp)
//! - `normalize.rs`: the batch pass, including the `edited` fallback
//! - Used by: `pipelines::etl_stage`, between the source and the csv sink
//!
//! ⚠️ The singularity will normalize its own posts. Until then, we coerce. 🦆

pub(crate) mod coerce;
mod normalize;

pub use normalize::{edited_fallback, normalize};
