use crate::model::{CommMatrix, ObjectId, ObjectWork, PhaseId};
use std::collections::BTreeMap;

/// All work one rank performed during one phase.
///
/// Objects are keyed by their own id, so the map cannot disagree with the
/// records it holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseWork {
    phase: PhaseId,
    objects: BTreeMap<ObjectId, ObjectWork>,
    communications: CommMatrix,
}

impl PhaseWork {
    /// Panics if two records share an object id.
    pub fn new(phase: PhaseId, objects: impl IntoIterator<Item = ObjectWork>) -> Self {
        let mut by_id = BTreeMap::new();
        for work in objects {
            let id = work.id;
            assert!(
                by_id.insert(id, work).is_none(),
                "object must be unique within a phase: object {id} repeated in phase {phase}"
            );
        }
        Self {
            phase,
            objects: by_id,
            communications: CommMatrix::new(),
        }
    }

    pub fn with_communications(mut self, comm: CommMatrix) -> Self {
        self.communications = comm;
        self
    }

    pub fn phase(&self) -> PhaseId {
        self.phase
    }

    pub fn objects(&self) -> &BTreeMap<ObjectId, ObjectWork> {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&ObjectWork> {
        self.objects.get(&id)
    }

    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    /// Messages recorded during this phase.
    pub fn communications(&self) -> &CommMatrix {
        &self.communications
    }

    /// Sum of object loads in this phase.
    pub fn load(&self) -> f64 {
        self.objects.values().map(ObjectWork::load).sum()
    }

    /// Bytes sent by objects that ran in this phase. Received traffic is not counted.
    pub fn bytes_sent(&self) -> f64 {
        self.communications
            .edges()
            .filter(|(from, _, _)| self.objects.contains_key(from))
            .map(|(_, _, bytes)| bytes)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_object_ids() {
        let work = PhaseWork::new(
            3,
            [ObjectWork::with_load(8, 1.0), ObjectWork::with_load(2, 0.5)],
        );
        assert_eq!(work.phase(), 3);
        assert_eq!(work.object_ids().collect::<Vec<_>>(), vec![2, 8]);
        assert_eq!(work.object(8).map(|w| w.id), Some(8));
        assert_eq!(work.load(), 1.5);
    }

    #[test]
    #[should_panic(expected = "object must be unique within a phase")]
    fn repeated_object_panics() {
        PhaseWork::new(0, [ObjectWork::with_load(1, 1.0), ObjectWork::with_load(1, 2.0)]);
    }

    #[test]
    fn bytes_sent_skips_received_traffic() {
        let mut comm = CommMatrix::new();
        comm.record(1, 2, 40.0);
        comm.record(99, 1, 500.0);
        let work = PhaseWork::new(0, [ObjectWork::with_load(1, 1.0)]).with_communications(comm);

        assert_eq!(work.bytes_sent(), 40.0);
        assert_eq!(work.communications().total_bytes(), 540.0);
    }
}
