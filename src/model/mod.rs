//! In-memory workload model: objects, per-phase work, ranks and the aggregate.

pub mod object;
pub mod phase;
pub mod rank;
pub mod workload;

pub use object::{ObjectInfo, ObjectInfoMap, ObjectWork};
pub use phase::PhaseWork;
pub use rank::{CommMatrix, Rank};
pub use workload::{Workload, WorkloadBuilder};

pub type ObjectId = u64;
pub type RankId = u64;
pub type PhaseId = u64;
