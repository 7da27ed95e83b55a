//! Recoverable data-level errors raised by the workload model.
//!
//! Caller-contract violations (duplicate rank insertion, lookup of a missing
//! rank) are panics instead and never show up here.

use crate::model::{ObjectId, PhaseId, RankId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Two ranks expose different phase-index sets.
    #[error(
        "inconsistent phases across ranks: rank {reference} has phases {expected:?} but rank {rank} has {found:?}"
    )]
    InconsistentPhases {
        reference: RankId,
        rank: RankId,
        expected: Vec<PhaseId>,
        found: Vec<PhaseId>,
    },

    /// A phase refers to an object that no shard described.
    #[error("rank {rank} phase {phase} references unknown object {object}")]
    UnknownObject {
        rank: RankId,
        phase: PhaseId,
        object: ObjectId,
    },

    /// One object ran on several ranks during the same phase.
    #[error("object {object} is placed on ranks {ranks:?} in phase {phase}")]
    DuplicatePlacement {
        object: ObjectId,
        phase: PhaseId,
        ranks: Vec<RankId>,
    },

    #[error("phase {phase} not present in workload (available: {available:?})")]
    PhaseNotFound {
        phase: PhaseId,
        available: Vec<PhaseId>,
    },
}
