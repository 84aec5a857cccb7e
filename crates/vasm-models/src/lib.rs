//! Shared data models for the vasm media-assembly service.
//!
//! This crate provides Serde-serializable types for:
//! - Job identifiers and variant tags
//! - Artifact kinds
//! - Job request payloads and their validation
//! - Job result payloads
//! - Encoding defaults shared by the plan builders

pub mod artifact;
pub mod encoding;
pub mod job;
pub mod request;
pub mod response;

// Re-export common types
pub use artifact::ArtifactKind;
pub use encoding::EncodingConfig;
pub use job::{JobId, Variant};
pub use request::{
    AudioMixRequest, ProbeRequest, RequestError, SlideshowRequest, SubtitleBurnRequest,
    ThumbnailRequest,
};
pub use response::{JobMetrics, JobOutput, ProbeOutput, STATUS_SUCCESS};
