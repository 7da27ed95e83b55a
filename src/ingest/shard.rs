//! Shard (LBDatafile) JSON parsing.
//!
//! JSON shape (fields not listed here are ignored):
//! {
//!   "metadata": { "rank": 0 },
//!   "phases": [
//!     {
//!       "id": 0,
//!       "tasks": [
//!         {
//!           "entity": { "id": 12, "home": 0, "migratable": true, "index": [3] },  // or "seq_id"
//!           "time": 0.25,                       // stored as the "load" metric
//!           "subphases": [ { "id": 0, "time": 0.1 } ],
//!           "user_defined": { "mem": 64.0 }     // numeric values become metrics
//!         }
//!       ],
//!       "communications": [
//!         { "from": { "id": 12 }, "to": { "id": 13 }, "bytes": 128.0 }
//!       ]
//!     }
//!   ]
//! }

use crate::Result;
use crate::diagnostics;
use crate::model::object::LOAD_METRIC;
use crate::model::{
    CommMatrix, ObjectId, ObjectInfo, ObjectInfoMap, ObjectWork, PhaseId, PhaseWork, Rank, RankId,
};

use anyhow::{Context, bail};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
struct RawShard {
    metadata: RawMetadata,

    #[serde(default)]
    phases: Vec<RawPhase>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawMetadata {
    rank: RankId,
}

#[derive(Debug, Clone, Deserialize)]
struct RawPhase {
    id: PhaseId,

    #[serde(default)]
    tasks: Vec<RawTask>,

    #[serde(default)]
    communications: Vec<RawComm>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawTask {
    entity: RawEntity,

    #[serde(default)]
    time: f64,

    #[serde(default)]
    subphases: Vec<RawSubphase>,

    #[serde(default)]
    user_defined: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawEntity {
    #[serde(default)]
    id: Option<ObjectId>,

    #[serde(default)]
    seq_id: Option<ObjectId>,

    #[serde(default)]
    home: Option<RankId>,

    #[serde(default)]
    migratable: bool,

    #[serde(default)]
    index: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSubphase {
    #[serde(default)]
    time: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct RawComm {
    from: RawEndpoint,
    to: RawEndpoint,

    #[serde(default)]
    bytes: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct RawEndpoint {
    #[serde(default)]
    id: Option<ObjectId>,

    #[serde(default)]
    seq_id: Option<ObjectId>,
}

/// Collection elements may carry only `seq_id`; `id` wins when both are present.
fn object_key(
    id: Option<ObjectId>,
    seq_id: Option<ObjectId>,
    origin: &str,
    phase: PhaseId,
) -> Result<ObjectId> {
    match id.or(seq_id) {
        Some(key) => Ok(key),
        None => bail!(
            "{}",
            diagnostics::error_message(format!(
                "shard {} phase {} has an entity without id or seq_id",
                origin, phase
            ))
        ),
    }
}

/// One parsed shard: the rank plus the objects it describes.
#[derive(Debug, Clone)]
pub struct ParsedShard {
    pub objects: ObjectInfoMap,
    pub rank: Rank,
}

/// Parse one shard document. `origin` names the source in error messages.
pub fn parse_shard(text: &str, origin: &str) -> Result<ParsedShard> {
    let raw: RawShard = serde_json::from_str(text)
        .with_context(|| diagnostics::error_message(format!("parse shard {}", origin)))?;
    let rank_id = raw.metadata.rank;

    let mut objects = ObjectInfoMap::new();
    let mut phases: BTreeMap<PhaseId, PhaseWork> = BTreeMap::new();
    let mut comm = CommMatrix::new();

    for phase in raw.phases {
        if phases.contains_key(&phase.id) {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "shard {} lists phase {} more than once",
                    origin, phase.id
                ))
            );
        }

        let mut work: BTreeMap<ObjectId, ObjectWork> = BTreeMap::new();
        for task in phase.tasks {
            let entity = task.entity;
            let object = object_key(entity.id, entity.seq_id, origin, phase.id)?;
            if work.contains_key(&object) {
                bail!(
                    "{}",
                    diagnostics::error_message(format!(
                        "shard {} phase {} lists object {} more than once",
                        origin, phase.id, object
                    ))
                );
            }

            let mut metrics = numeric_metrics(task.user_defined, object, origin);
            metrics.insert(LOAD_METRIC.to_string(), task.time);
            let subphase_loads = task.subphases.iter().map(|s| s.time).collect();
            work.insert(object, ObjectWork::new(object, metrics, subphase_loads));

            // An object appears in every phase it ran in; keep its first description.
            objects.entry(object).or_insert_with(|| {
                ObjectInfo::new(
                    object,
                    entity.home.unwrap_or(rank_id),
                    entity.migratable,
                    entity.index,
                )
            });
        }

        let mut phase_comm = CommMatrix::new();
        for c in phase.communications {
            let from = object_key(c.from.id, c.from.seq_id, origin, phase.id)?;
            let to = object_key(c.to.id, c.to.seq_id, origin, phase.id)?;
            phase_comm.record(from, to, c.bytes);
        }
        comm.merge(&phase_comm);

        phases.insert(
            phase.id,
            PhaseWork::new(phase.id, work.into_values()).with_communications(phase_comm),
        );
    }

    let mut rank = Rank::new(rank_id, phases.into_values());
    if !comm.is_empty() {
        rank = rank.with_communications(comm);
    }
    Ok(ParsedShard { objects, rank })
}

fn numeric_metrics(
    user_defined: BTreeMap<String, serde_json::Value>,
    object: ObjectId,
    origin: &str,
) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    for (key, value) in user_defined {
        match value.as_f64() {
            Some(v) => {
                out.insert(key, v);
            }
            None => {
                tracing::debug!(origin, object, key = %key, "skipping non-numeric user metric");
            }
        }
    }
    out
}
