//! The workload aggregate.
//!
//! Population and querying are separate stages: shards are merged into a
//! [`WorkloadBuilder`], and [`WorkloadBuilder::finish`] yields a [`Workload`]
//! that only exposes read-only queries.

use crate::error::ModelError;
use crate::model::{ObjectId, ObjectInfo, ObjectInfoMap, PhaseId, Rank, RankId};
use std::collections::{BTreeMap, BTreeSet};

/// Mutable ingestion stage of the aggregate.
#[derive(Debug, Default)]
pub struct WorkloadBuilder {
    objects: ObjectInfoMap,
    ranks: BTreeMap<RankId, Rank>,
}

impl WorkloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one shard: its object table fragment plus its fully formed rank.
    ///
    /// Panics if the rank id is already present. Objects already known keep
    /// their first description.
    pub fn add_info(&mut self, objects: ObjectInfoMap, rank: Rank) {
        assert!(
            !self.ranks.contains_key(&rank.id()),
            "rank must not exist: rank {} was already added",
            rank.id()
        );

        merge_objects(&mut self.objects, objects, rank.id());
        tracing::debug!(
            rank = rank.id(),
            phases = rank.phase_work().len(),
            "added rank"
        );
        self.ranks.insert(rank.id(), rank);
    }

    pub fn contains_rank(&self, id: RankId) -> bool {
        self.ranks.contains_key(&id)
    }

    pub fn num_ranks(&self) -> usize {
        self.ranks.len()
    }

    pub fn finish(self) -> Workload {
        tracing::info!(
            ranks = self.ranks.len(),
            objects = self.objects.len(),
            "workload ingestion complete"
        );
        Workload {
            objects: self.objects,
            ranks: self.ranks,
        }
    }
}

fn merge_objects(table: &mut ObjectInfoMap, fragment: ObjectInfoMap, contributor: RankId) {
    for (id, info) in fragment {
        match table.get(&id) {
            None => {
                table.insert(id, info);
            }
            Some(existing) if existing.same_metadata(&info) => {}
            Some(existing) => {
                tracing::warn!(
                    object = id,
                    rank = contributor,
                    kept_home = existing.home,
                    ignored_home = info.home,
                    "conflicting metadata for object, keeping first description"
                );
            }
        }
    }
}

/// Complete, read-only workload. Safe to share between reader threads.
#[derive(Debug, Clone, Default)]
pub struct Workload {
    objects: ObjectInfoMap,
    ranks: BTreeMap<RankId, Rank>,
}

impl Workload {
    /// Build a workload in one step. Same contract as repeated
    /// [`WorkloadBuilder::add_info`] calls.
    pub fn from_parts(objects: ObjectInfoMap, ranks: impl IntoIterator<Item = Rank>) -> Self {
        let mut builder = WorkloadBuilder::new();
        builder.objects = objects;
        for rank in ranks {
            builder.add_info(ObjectInfoMap::new(), rank);
        }
        builder.finish()
    }

    pub fn num_ranks(&self) -> usize {
        self.ranks.len()
    }

    /// Phase-index set shared by every rank.
    ///
    /// Ranks are compared in ascending id order against the lowest rank; the
    /// first disagreement is reported. Empty for a workload without ranks.
    pub fn phase_ids(&self) -> Result<BTreeSet<PhaseId>, ModelError> {
        let mut iter = self.ranks.values();
        let Some(reference) = iter.next() else {
            return Ok(BTreeSet::new());
        };

        let expected = reference.phase_ids();
        for rank in iter {
            let found = rank.phase_ids();
            if found != expected {
                return Err(ModelError::InconsistentPhases {
                    reference: reference.id(),
                    rank: rank.id(),
                    expected: expected.into_iter().collect(),
                    found: found.into_iter().collect(),
                });
            }
        }
        Ok(expected)
    }

    /// Number of phases every rank agrees on (0 without ranks).
    pub fn num_phases(&self) -> Result<usize, ModelError> {
        self.phase_ids().map(|p| p.len())
    }

    pub fn rank_ids(&self) -> BTreeSet<RankId> {
        self.ranks.keys().copied().collect()
    }

    pub fn all_objects(&self) -> &ObjectInfoMap {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&ObjectInfo> {
        self.objects.get(&id)
    }

    /// Panics if no rank with `id` was ingested.
    pub fn rank(&self, id: RankId) -> &Rank {
        match self.ranks.get(&id) {
            Some(rank) => rank,
            None => panic!("rank must exist: rank {id} is not in the workload"),
        }
    }

    pub fn try_rank(&self, id: RankId) -> Option<&Rank> {
        self.ranks.get(&id)
    }

    pub fn ranks(&self) -> impl Iterator<Item = &Rank> {
        self.ranks.values()
    }

    /// Verify that every object named by a phase has an entry in the object
    /// table, and that no object runs on two ranks in the same phase.
    pub fn check_references(&self) -> Result<(), ModelError> {
        let mut phases = BTreeSet::new();
        for rank in self.ranks.values() {
            for (phase, work) in rank.phase_work() {
                if let Some(object) = work.object_ids().find(|id| !self.objects.contains_key(id)) {
                    return Err(ModelError::UnknownObject {
                        rank: rank.id(),
                        phase: *phase,
                        object,
                    });
                }
                phases.insert(*phase);
            }
        }

        for phase in phases {
            self.phase_objects(phase)?;
        }
        Ok(())
    }

    /// Load of `rank` in `phase`. Panics if the rank is missing.
    pub fn rank_load(&self, rank: RankId, phase: PhaseId) -> f64 {
        self.rank(rank).load(phase)
    }

    /// Highest rank load in `phase`; 0 without ranks.
    pub fn max_load(&self, phase: PhaseId) -> f64 {
        self.ranks
            .values()
            .map(|r| r.load(phase))
            .fold(0.0, f64::max)
    }

    /// Objects that own work in `phase`, with the rank they ran on.
    ///
    /// Fails when an object is placed on more than one rank in the phase.
    pub fn phase_objects(
        &self,
        phase: PhaseId,
    ) -> Result<BTreeMap<ObjectId, RankId>, ModelError> {
        let mut placed: BTreeMap<ObjectId, Vec<RankId>> = BTreeMap::new();
        for rank in self.ranks.values() {
            if let Some(work) = rank.phase(phase) {
                for id in work.object_ids() {
                    placed.entry(id).or_default().push(rank.id());
                }
            }
        }

        let mut out = BTreeMap::new();
        for (object, ranks) in placed {
            match ranks.as_slice() {
                [rank] => {
                    out.insert(object, *rank);
                }
                _ => {
                    return Err(ModelError::DuplicatePlacement {
                        object,
                        phase,
                        ranks,
                    });
                }
            }
        }
        Ok(out)
    }
}
