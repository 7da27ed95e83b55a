use crate::model::{ObjectId, RankId};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Metric under which an object's measured time is stored.
pub const LOAD_METRIC: &str = "load";

/// Static description of one workload object.
///
/// Equality and hashing look at the id only; use [`ObjectInfo::same_metadata`]
/// to compare the full record.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub id: ObjectId,
    /// Rank the object was created on.
    pub home: RankId,
    pub migratable: bool,
    /// Collection index path, empty for singleton objects.
    pub index: Vec<u64>,
}

impl ObjectInfo {
    pub fn new(id: ObjectId, home: RankId, migratable: bool, index: Vec<u64>) -> Self {
        Self {
            id,
            home,
            migratable,
            index,
        }
    }

    pub fn same_metadata(&self, other: &ObjectInfo) -> bool {
        self.id == other.id
            && self.home == other.home
            && self.migratable == other.migratable
            && self.index == other.index
    }
}

impl PartialEq for ObjectInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ObjectInfo {}

impl Hash for ObjectInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Object table keyed by id, as contributed by a shard or held globally.
pub type ObjectInfoMap = BTreeMap<ObjectId, ObjectInfo>;

/// Cost of one object during one phase on one rank.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectWork {
    pub id: ObjectId,
    pub metrics: BTreeMap<String, f64>,
    /// Per-subphase load, in subphase order.
    pub subphase_loads: Vec<f64>,
}

impl ObjectWork {
    pub fn new(id: ObjectId, metrics: BTreeMap<String, f64>, subphase_loads: Vec<f64>) -> Self {
        Self {
            id,
            metrics,
            subphase_loads,
        }
    }

    /// Shorthand for an object that only carries a load.
    pub fn with_load(id: ObjectId, load: f64) -> Self {
        let mut metrics = BTreeMap::new();
        metrics.insert(LOAD_METRIC.to_string(), load);
        Self::new(id, metrics, Vec::new())
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    pub fn load(&self) -> f64 {
        self.metric(LOAD_METRIC).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identity_ignores_metadata() {
        let a = ObjectInfo::new(7, 0, true, vec![1]);
        let b = ObjectInfo::new(7, 3, false, vec![]);
        assert_eq!(a, b);
        assert!(!a.same_metadata(&b));

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn load_defaults_to_zero() {
        let w = ObjectWork::new(1, BTreeMap::new(), vec![]);
        assert_eq!(w.load(), 0.0);
        assert_eq!(ObjectWork::with_load(1, 2.5).load(), 2.5);
    }
}
