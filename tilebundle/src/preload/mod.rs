//! Chunk planning and cache preloading.
//!
//! [`plan_chunks`] splits a version into contiguous index slices;
//! [`Preloader`] builds a bundle per slice with a fixed window of chunks in
//! flight, so the bundle cache is warm before clients ask.

mod planner;
mod runner;
mod types;

pub use planner::{plan_chunks, ChunkPlan};
pub use runner::Preloader;
pub use types::{
    PreloadConfig, PreloadError, PreloadReport, DEFAULT_CHUNK_SIZE, DEFAULT_PRELOAD_CONCURRENCY,
};
