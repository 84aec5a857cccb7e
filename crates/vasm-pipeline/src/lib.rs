//! Media assembly pipeline.
//!
//! One job per request: a scoped workspace is opened, inputs are fetched
//! from object storage, durations probed, an encode plan built and run,
//! and the output published. Failures carry the identity of the input
//! that caused them.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod publisher;
pub mod workspace;

pub use config::PipelineConfig;
pub use error::{JobError, JobResult};
pub use fetcher::{Artifact, ArtifactFetcher};
pub use logging::JobLogger;
pub use pipeline::{JobRequest, Pipeline};
pub use publisher::ResultPublisher;
pub use workspace::Workspace;
