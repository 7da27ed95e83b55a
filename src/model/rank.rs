use crate::model::{ObjectId, PhaseId, PhaseWork, RankId};
use std::collections::{BTreeMap, BTreeSet};

/// Bytes exchanged between object pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommMatrix {
    bytes: BTreeMap<(ObjectId, ObjectId), f64>,
}

impl CommMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, from: ObjectId, to: ObjectId, bytes: f64) {
        *self.bytes.entry((from, to)).or_insert(0.0) += bytes;
    }

    /// Add every edge of `other` into this matrix.
    pub fn merge(&mut self, other: &CommMatrix) {
        for (from, to, bytes) in other.edges() {
            self.record(from, to, bytes);
        }
    }

    pub fn bytes(&self, from: ObjectId, to: ObjectId) -> f64 {
        self.bytes.get(&(from, to)).copied().unwrap_or(0.0)
    }

    pub fn edges(&self) -> impl Iterator<Item = (ObjectId, ObjectId, f64)> + '_ {
        self.bytes.iter().map(|(&(f, t), &b)| (f, t, b))
    }

    pub fn total_bytes(&self) -> f64 {
        self.bytes.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One worker's complete timeline. Built fully formed; phases cannot be
/// appended afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Rank {
    id: RankId,
    phases: BTreeMap<PhaseId, PhaseWork>,
    communications: Option<CommMatrix>,
}

impl Rank {
    /// Phases are keyed by [`PhaseWork::phase`]. Panics if two share an index.
    pub fn new(id: RankId, phases: impl IntoIterator<Item = PhaseWork>) -> Self {
        let mut by_phase = BTreeMap::new();
        for work in phases {
            let phase = work.phase();
            assert!(
                by_phase.insert(phase, work).is_none(),
                "phase must be unique within a rank: phase {phase} repeated on rank {id}"
            );
        }
        Self {
            id,
            phases: by_phase,
            communications: None,
        }
    }

    /// Attach a timeline-wide communication summary.
    pub fn with_communications(mut self, comm: CommMatrix) -> Self {
        self.communications = Some(comm);
        self
    }

    pub fn id(&self) -> RankId {
        self.id
    }

    pub fn phase_work(&self) -> &BTreeMap<PhaseId, PhaseWork> {
        &self.phases
    }

    pub fn phase_ids(&self) -> BTreeSet<PhaseId> {
        self.phases.keys().copied().collect()
    }

    pub fn phase(&self, phase: PhaseId) -> Option<&PhaseWork> {
        self.phases.get(&phase)
    }

    pub fn communications(&self) -> Option<&CommMatrix> {
        self.communications.as_ref()
    }

    /// Load on this rank in `phase`; 0 when the rank has no such phase.
    pub fn load(&self, phase: PhaseId) -> f64 {
        self.phase(phase).map(PhaseWork::load).unwrap_or(0.0)
    }
}
