//! Cache warming over planned chunks.

use super::planner::{plan_chunks, ChunkPlan};
use super::types::{PreloadConfig, PreloadError, PreloadReport};
use crate::bundle::BundleBuilder;
use crate::cache::CacheStore;
use crate::manifest::ManifestLoader;
use crate::store::ObjectStore;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Builds every chunk of a version through the bundle builder, keeping a
/// bounded number of chunks in flight.
pub struct Preloader<S, C> {
    builder: Arc<BundleBuilder<S, C>>,
    manifest: Arc<ManifestLoader<S, C>>,
    config: PreloadConfig,
}

impl<S, C> Preloader<S, C>
where
    S: ObjectStore + 'static,
    C: CacheStore + 'static,
{
    pub fn new(
        builder: Arc<BundleBuilder<S, C>>,
        manifest: Arc<ManifestLoader<S, C>>,
        config: PreloadConfig,
    ) -> Result<Self, PreloadError> {
        if config.chunk_size == 0 {
            return Err(PreloadError::InvalidChunkSize);
        }
        if config.concurrency == 0 {
            return Err(PreloadError::InvalidConcurrency);
        }
        Ok(Self {
            builder,
            manifest,
            config,
        })
    }

    pub fn config(&self) -> &PreloadConfig {
        &self.config
    }

    /// Preloads `version` using the configured chunk size.
    pub async fn preload_version(&self, version: &str) -> Result<PreloadReport, PreloadError> {
        self.preload(version, self.config.chunk_size).await
    }

    /// Builds and caches a bundle for every chunk of `version`.
    ///
    /// Chunk failures are counted and logged; the run never stops early.
    pub async fn preload(
        &self,
        version: &str,
        chunk_size: u32,
    ) -> Result<PreloadReport, PreloadError> {
        self.preload_with_cancellation(version, chunk_size, CancellationToken::new())
            .await
    }

    /// Like [`preload`](Self::preload), but stops submitting chunks once
    /// `cancellation` fires. Chunks already in flight are allowed to finish.
    #[instrument(skip_all, fields(version = %version, chunk_size = chunk_size))]
    pub async fn preload_with_cancellation(
        &self,
        version: &str,
        chunk_size: u32,
        cancellation: CancellationToken,
    ) -> Result<PreloadReport, PreloadError> {
        let info = self.manifest.get_version_info(version).await?;
        let plans = plan_chunks(version, info.tile_count, chunk_size)?;
        let mut report = PreloadReport::new(version, plans.len());

        info!(
            tiles = info.tile_count,
            chunks = plans.len(),
            concurrency = self.config.concurrency,
            "Preload starting"
        );

        let mut pending = FuturesUnordered::new();
        let mut plans_iter = plans.iter().enumerate();

        if !cancellation.is_cancelled() {
            for (number, plan) in plans_iter.by_ref().take(self.config.concurrency) {
                pending.push(self.run_chunk(number, plan));
            }
        }

        while !pending.is_empty() {
            tokio::select! {
                biased;

                _ = cancellation.cancelled(), if !report.cancelled => {
                    report.cancelled = true;
                    info!(
                        completed = report.completed,
                        in_flight = pending.len(),
                        "Preload cancelled, draining in-flight chunks"
                    );
                }

                Some((number, outcome)) = pending.next() => {
                    match outcome {
                        Some(tiles) => {
                            report.completed += 1;
                            report.tiles_loaded += tiles;
                        }
                        None => report.failed += 1,
                    }
                    debug!(chunk = number, completed = report.completed, failed = report.failed, "Chunk finished");

                    if !report.cancelled {
                        if let Some((number, plan)) = plans_iter.next() {
                            pending.push(self.run_chunk(number, plan));
                        }
                    }
                }
            }
        }

        if cancellation.is_cancelled() {
            report.cancelled = true;
        }

        info!(
            completed = report.completed,
            failed = report.failed,
            tiles_loaded = report.tiles_loaded,
            cancelled = report.cancelled,
            "Preload finished"
        );
        Ok(report)
    }

    /// Builds one chunk, returning the number of tiles loaded or `None`.
    async fn run_chunk(&self, number: usize, plan: &ChunkPlan) -> (usize, Option<usize>) {
        match self.builder.build(&plan.version, &plan.tile_indices).await {
            Ok(bundle) => (number, Some(bundle.tile_count())),
            Err(e) => {
                warn!(
                    chunk = number,
                    version = %plan.version,
                    tiles = plan.len(),
                    error = %e,
                    "Chunk preload failed"
                );
                (number, None)
            }
        }
    }
}
