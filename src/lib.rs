//! Rank/phase/object workload model for distributed-runtime task visualization.
//!
//! Shards are ingested one rank at a time into a [`WorkloadBuilder`], which is
//! then frozen into a read-only [`Workload`] for the rendering stage.

pub mod diagnostics;
pub mod error;
pub mod ingest;
pub mod model;
pub mod view;

pub use error::ModelError;
pub use model::{
    CommMatrix, ObjectId, ObjectInfo, ObjectInfoMap, ObjectWork, PhaseId, PhaseWork, Rank, RankId,
    Workload, WorkloadBuilder,
};

pub type Result<T> = anyhow::Result<T>;
