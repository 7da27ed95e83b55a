//! Read-only summary handed to the rendering stage.

use crate::Result;
use crate::diagnostics;
use crate::error::ModelError;
use crate::model::{PhaseId, PhaseWork, RankId, Workload};

use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Which phases to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseSelector {
    #[default]
    All,
    Phase(PhaseId),
}

impl FromStr for PhaseSelector {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(PhaseSelector::All);
        }
        let phase = s.parse::<PhaseId>().with_context(|| {
            diagnostics::error_message(format!("phase must be a number or 'all', got {:?}", s))
        })?;
        Ok(PhaseSelector::Phase(phase))
    }
}

impl fmt::Display for PhaseSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseSelector::All => write!(f, "all"),
            PhaseSelector::Phase(p) => write!(f, "{}", p),
        }
    }
}

impl PhaseSelector {
    /// Phases selected in `workload`, checking that a single phase exists.
    pub fn resolve(&self, workload: &Workload) -> std::result::Result<Vec<PhaseId>, ModelError> {
        let available = workload.phase_ids()?;
        match self {
            PhaseSelector::All => Ok(available.into_iter().collect()),
            PhaseSelector::Phase(p) if available.contains(p) => Ok(vec![*p]),
            PhaseSelector::Phase(p) => Err(ModelError::PhaseNotFound {
                phase: *p,
                available: available.into_iter().collect(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankPhaseView {
    pub rank: RankId,
    pub load: f64,
    pub objects: usize,
    /// Bytes sent during this phase by objects that ran on this rank.
    pub bytes_sent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseView {
    pub phase: PhaseId,
    pub ranks: Vec<RankPhaseView>,
    pub max_load: f64,
    pub avg_load: f64,
    /// max / avg - 1; 0 when nothing ran.
    pub imbalance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsView {
    pub ranks: usize,
    pub phases: usize,
    pub objects: usize,
    pub migratable_objects: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryData {
    pub selector: String,
    pub totals: TotalsView,
    pub phases: BTreeMap<PhaseId, PhaseView>,
}

/// Build the summary for the selected phases. Validates phase consistency and
/// object references first.
pub fn build_summary(workload: &Workload, selector: PhaseSelector) -> Result<SummaryData> {
    let num_phases = workload.num_phases()?;
    workload.check_references()?;
    let selected = selector.resolve(workload)?;

    let mut phases = BTreeMap::new();
    for phase in selected {
        let ranks: Vec<RankPhaseView> = workload
            .ranks()
            .map(|rank| {
                let work = rank.phase(phase);
                RankPhaseView {
                    rank: rank.id(),
                    load: rank.load(phase),
                    objects: work.map(|w| w.objects().len()).unwrap_or(0),
                    bytes_sent: work.map(PhaseWork::bytes_sent).unwrap_or(0.0),
                }
            })
            .collect();

        let max_load = workload.max_load(phase);
        let avg_load = if ranks.is_empty() {
            0.0
        } else {
            ranks.iter().map(|r| r.load).sum::<f64>() / ranks.len() as f64
        };
        let imbalance = if avg_load > 0.0 {
            max_load / avg_load - 1.0
        } else {
            0.0
        };

        phases.insert(
            phase,
            PhaseView {
                phase,
                ranks,
                max_load,
                avg_load,
                imbalance,
            },
        );
    }

    let objects = workload.all_objects();
    Ok(SummaryData {
        selector: selector.to_string(),
        totals: TotalsView {
            ranks: workload.num_ranks(),
            phases: num_phases,
            objects: objects.len(),
            migratable_objects: objects.values().filter(|o| o.migratable).count(),
        },
        phases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest;
    use crate::model::{ObjectInfo, ObjectInfoMap, ObjectWork, Rank};
    use pretty_assertions::assert_eq;

    fn workload() -> Workload {
        let mut objects = ObjectInfoMap::new();
        for id in 0..3 {
            objects.insert(id, ObjectInfo::new(id, 0, id != 2, vec![]));
        }
        let phase = |p: PhaseId, work: &[(u64, f64)]| {
            PhaseWork::new(p, work.iter().map(|&(id, l)| ObjectWork::with_load(id, l)))
        };
        let r0 = Rank::new(0, [phase(0, &[(0, 3.0)]), phase(1, &[(0, 1.0)])]);
        let r1 = Rank::new(1, [phase(0, &[(1, 1.0)]), phase(1, &[(1, 1.0), (2, 0.0)])]);
        Workload::from_parts(objects, [r0, r1])
    }

    #[test]
    fn selector_parses() {
        assert_eq!("all".parse::<PhaseSelector>().unwrap(), PhaseSelector::All);
        assert_eq!(" 4 ".parse::<PhaseSelector>().unwrap(), PhaseSelector::Phase(4));
        assert!("-1".parse::<PhaseSelector>().is_err());
    }

    #[test]
    fn unknown_phase_is_rejected() {
        let err = PhaseSelector::Phase(9).resolve(&workload()).unwrap_err();
        assert_eq!(
            err,
            ModelError::PhaseNotFound {
                phase: 9,
                available: vec![0, 1],
            }
        );
    }

    #[test]
    fn summary_reports_imbalance() {
        let data = build_summary(&workload(), PhaseSelector::Phase(0)).unwrap();
        assert_eq!(data.totals.ranks, 2);
        assert_eq!(data.totals.phases, 2);
        assert_eq!(data.totals.migratable_objects, 2);
        assert_eq!(data.phases.len(), 1);

        let p0 = &data.phases[&0];
        assert_eq!(p0.max_load, 3.0);
        assert_eq!(p0.avg_load, 2.0);
        assert_eq!(p0.imbalance, 0.5);
    }

    #[test]
    fn summary_all_phases_counts_objects() {
        let data = build_summary(&workload(), PhaseSelector::All).unwrap();
        let counts: Vec<usize> = data.phases[&1].ranks.iter().map(|r| r.objects).collect();
        assert_eq!(counts, vec![1, 2]);
    }

    #[test]
    fn summary_refuses_inconsistent_workload() {
        let r0 = Rank::new(0, [PhaseWork::default()]);
        let r1 = Rank::new(1, []);
        let w = Workload::from_parts(ObjectInfoMap::new(), [r0, r1]);

        let err = build_summary(&w, PhaseSelector::All).unwrap_err();
        assert!(err.downcast_ref::<ModelError>().is_some());
    }

    #[test]
    fn summary_refuses_object_on_two_ranks() {
        let r0 = Rank::new(0, [PhaseWork::new(0, [ObjectWork::with_load(7, 1.0)])]);
        let r1 = Rank::new(1, [PhaseWork::new(0, [ObjectWork::with_load(7, 1.0)])]);
        let objects = [(7, ObjectInfo::new(7, 0, true, vec![]))].into_iter().collect();
        let w = Workload::from_parts(objects, [r0, r1]);

        let err = build_summary(&w, PhaseSelector::All).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModelError>(),
            Some(ModelError::DuplicatePlacement { object: 7, .. })
        ));
    }

    #[test]
    fn bytes_sent_is_per_phase_and_sender_side() {
        let shard = |rank: u64, comm: &str| {
            format!(
                r#"{{"metadata": {{"rank": {rank}}}, "phases": [
                    {{"id": 0, "tasks": [{{"entity": {{"id": {rank}}}, "time": 1.0}}], "communications": [{comm}]}},
                    {{"id": 1, "tasks": [{{"entity": {{"id": {rank}}}, "time": 1.0}}]}}
                ]}}"#
            )
        };
        let w = ingest::ingest_strings(&[
            shard(0, r#"{"from": {"id": 0}, "to": {"id": 1}, "bytes": 64.0}"#),
            shard(1, r#"{"from": {"id": 0}, "to": {"id": 1}, "bytes": 64.0}"#),
        ])
        .unwrap();
        let data = build_summary(&w, PhaseSelector::All).unwrap();

        let sent = |p: PhaseId| -> Vec<f64> {
            data.phases[&p].ranks.iter().map(|r| r.bytes_sent).collect()
        };
        assert_eq!(sent(0), vec![64.0, 0.0]);
        assert_eq!(sent(1), vec![0.0, 0.0]);
    }
}
