//! Structured job logging.

use tracing::{error, info, warn, Span};
use vasm_models::{JobId, Variant};

/// Logs job lifecycle events with the job id and variant attached.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    variant: Variant,
}

impl JobLogger {
    pub fn new(job_id: &JobId, variant: Variant) -> Self {
        Self {
            job_id: job_id.to_string(),
            variant,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            variant = %self.variant,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            variant = %self.variant,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            variant = %self.variant,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, kind: &str, message: &str) {
        error!(
            job_id = %self.job_id,
            variant = %self.variant,
            kind = kind,
            "Job failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            variant = %self.variant,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Span covering the whole job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            variant = %self.variant
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let job_id = JobId::new();
        let logger = JobLogger::new(&job_id, Variant::AudioMix);

        assert_eq!(logger.job_id(), job_id.to_string());
        assert_eq!(logger.variant(), Variant::AudioMix);
    }
}
