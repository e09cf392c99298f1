//! Url file export
//!
//! Re-emits stored urls as plain-text files for load-generation tools
//! (one `domain + url` per line). Reading is paged so the full url corpus
//! is never held in memory.

pub mod filter;
pub mod partition;
pub mod writer;

pub use filter::UrlFilter;
pub use partition::{ips_per_file, ExportSummary, OutputTarget, PartitionPolicy, Partitioner};
pub use writer::{OutputFileSummary, OutputWriter, SEQUENCE_PLACEHOLDER};
