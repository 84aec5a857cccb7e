//! Application state.

use std::sync::Arc;

use vasm_pipeline::{Pipeline, PipelineConfig};
use vasm_storage::{ObjectStore, S3Client};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Pipeline,
}

impl AppState {
    /// Build state backed by the S3 store configured in the environment.
    pub fn from_env(config: ApiConfig) -> anyhow::Result<Self> {
        let store = S3Client::from_env()?;
        Ok(Self::with_store(
            config,
            Arc::new(store),
            PipelineConfig::from_env(),
        ))
    }

    /// Build state around an explicit store.
    pub fn with_store(
        config: ApiConfig,
        store: Arc<dyn ObjectStore>,
        pipeline_config: PipelineConfig,
    ) -> Self {
        Self {
            config,
            pipeline: Pipeline::new(store, pipeline_config),
        }
    }
}
