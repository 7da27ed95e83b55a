use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use workload_viz::view::{PhaseSelector, build_summary};
use workload_viz::{ModelError, WorkloadBuilder, ingest};

fn shard(rank: u64, phases: &[u64]) -> String {
    let phases: Vec<String> = phases
        .iter()
        .map(|p| {
            format!(
                r#"{{"id": {p}, "tasks": [{{"entity": {{"id": {id}, "home": {rank}, "migratable": true}}, "time": 2.0}}]}}"#,
                id = rank * 100 + p
            )
        })
        .collect();
    format!(
        r#"{{"type": "LBDatafile", "metadata": {{"rank": {rank}}}, "phases": [{}]}}"#,
        phases.join(",")
    )
}

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

#[test]
fn ingests_directory_in_rank_order() {
    let dir = tempfile::tempdir().unwrap();
    for rank in [2, 0, 1] {
        write(dir.path(), &format!("data.{rank}.json"), &shard(rank, &[0, 1]));
    }
    write(dir.path(), "notes.txt", "ignored");

    let found = ingest::discover_shards(dir.path()).unwrap();
    assert_eq!(found.iter().map(|f| f.rank).collect::<Vec<_>>(), vec![0, 1, 2]);

    let mut builder = WorkloadBuilder::new();
    assert_eq!(ingest::ingest_dir(dir.path(), &mut builder).unwrap(), 3);
    let w = builder.finish();

    assert_eq!(w.num_ranks(), 3);
    assert_eq!(w.num_phases(), Ok(2));
    assert_eq!(w.all_objects().len(), 6);
    assert_eq!(w.check_references(), Ok(()));
}

#[test]
fn rank_mismatch_with_file_name_fails() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "data.4.json", &shard(5, &[0]));

    let mut builder = WorkloadBuilder::new();
    let err = ingest::ingest_dir(dir.path(), &mut builder).unwrap_err();
    assert!(err.to_string().contains("declares rank 5"));
}

#[test]
fn two_files_for_one_rank_fail() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "data.0.json", &shard(0, &[0]));
    write(dir.path(), "other.0.json", &shard(0, &[0]));

    assert!(ingest::discover_shards(dir.path()).is_err());
}

#[test]
fn divergent_shards_surface_as_model_error() {
    let w = ingest::ingest_strings(&[shard(0, &[0]), shard(1, &[0, 1])]).unwrap();
    let err = build_summary(&w, PhaseSelector::All).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ModelError>(),
        Some(ModelError::InconsistentPhases { .. })
    ));
}

#[test]
fn summary_serializes_selected_phase() {
    let w = ingest::ingest_strings(&[shard(0, &[0, 1]), shard(1, &[0, 1])]).unwrap();
    let data = build_summary(&w, PhaseSelector::Phase(1)).unwrap();
    let json = serde_json::to_value(&data).unwrap();

    assert_eq!(json["selector"], "1");
    assert_eq!(json["totals"]["objects"], 4);
    assert_eq!(json["phases"]["1"]["max_load"], 2.0);
    assert_eq!(json["phases"]["1"]["imbalance"], 0.0);
}
