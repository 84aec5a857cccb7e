//! Object storage for job inputs and outputs.
//!
//! This crate provides:
//! - The `ObjectStore` trait the pipeline receives as an explicit collaborator
//! - An S3-compatible client (MinIO, R2, AWS) built on `aws-sdk-s3`
//! - An in-memory store for tests and local development

pub mod client;
pub mod error;
pub mod memory;
pub mod store;

pub use client::{S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use store::ObjectStore;
