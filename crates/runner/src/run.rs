//! The top-level run boundary
//!
//! Everything from config loading onward happens inside [`run`], so a
//! failed run always leaves an [`ErrorRecord`] behind.

use crate::config::{Credentials, PipelineConfig};
use crate::pipeline::LivePipeline;
use anyhow::{bail, Context, Result};
use flashroute_bundle::Journal;
use flashroute_models::ErrorRecord;
use std::future::Future;
use std::path::PathBuf;
use uuid::Uuid;

/// Command-line inputs to one run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config_path: PathBuf,
    pub catalog: Option<PathBuf>,
    pub artifacts: Option<PathBuf>,
    /// Errors log, used even when the config cannot be read
    pub errors_log: Option<PathBuf>,
    pub fetch_swap_data: bool,
}

impl RunOptions {
    /// Load the config file, or defaults when it is absent, and apply overrides
    pub fn resolve(&self) -> Result<PipelineConfig> {
        let mut config = if self.config_path.exists() {
            PipelineConfig::load_from(&self.config_path)
                .with_context(|| format!("Failed to load config from {:?}", self.config_path))?
        } else {
            tracing::warn!("Config file {:?} not found, using defaults", self.config_path);
            PipelineConfig::default()
        };

        if let Some(catalog) = &self.catalog {
            config.catalog_path = catalog.clone();
        }
        if let Some(artifacts) = &self.artifacts {
            config.artifacts_dir = artifacts.clone();
        }
        if let Some(errors_log) = &self.errors_log {
            config.errors_log = errors_log.clone();
        }
        if self.fetch_swap_data {
            config.fetch_swap_data = true;
        }

        Ok(config)
    }

    fn fallback_errors_log(&self) -> PathBuf {
        self.errors_log
            .clone()
            .unwrap_or_else(|| PipelineConfig::default().errors_log)
    }
}

/// Resolve the config and run `cycle`, recording any failure
pub async fn run<F, Fut>(options: RunOptions, cycle: F) -> Result<()>
where
    F: FnOnce(PipelineConfig, Uuid) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let run_id = Uuid::new_v4();
    tracing::info!("Starting flashroute run {}", run_id);

    let (errors_log, result) = match options.resolve() {
        Ok(config) => (config.errors_log.clone(), cycle(config, run_id).await),
        Err(e) => (options.fallback_errors_log(), Err(e)),
    };

    if let Err(e) = &result {
        tracing::error!("Run {} failed: {:#}", run_id, e);
        let errors = Journal::new(errors_log);
        if let Err(log_err) = errors.append(&ErrorRecord::new(run_id, format!("{:#}", e))) {
            tracing::error!("Failed to record error: {}", log_err);
        }
    }

    result
}

/// One live cycle: credentials, services, sample, prove, submit
pub async fn live_cycle(config: PipelineConfig, run_id: Uuid) -> Result<()> {
    let credentials = Credentials::from_env()?;
    let pipeline = LivePipeline::connect(config, &credentials, run_id)?;

    let outcome = pipeline.run_cycle().await?;
    if !outcome.is_sent() {
        bail!(
            "{} at block {}: {}",
            outcome.code(),
            outcome.target_block(),
            outcome.message()
        );
    }

    tracing::info!("Run {} complete: {}", run_id, outcome.message());
    Ok(())
}
