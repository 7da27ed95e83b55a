//! Ingestion of per-rank JSON data files ("LBDatafile" shards).
//!
//! Each shard describes one rank: its phases, the tasks (objects) that ran in
//! each phase and the messages they exchanged. Shards are merged into a
//! [`WorkloadBuilder`](crate::WorkloadBuilder) one at a time.

pub mod discover;
pub mod shard;

pub use discover::{ShardFile, discover_shards};
pub use shard::{ParsedShard, parse_shard};

use crate::Result;
use crate::diagnostics;
use crate::model::{Workload, WorkloadBuilder};

use anyhow::{Context, bail};
use std::fs;
use std::path::Path;

/// Read every shard in `dir` into `builder`.
///
/// Returns the number of shards ingested. Fails on an unreadable or malformed
/// shard, on a shard whose metadata rank disagrees with its file name, and on a
/// rank that was already ingested.
pub fn ingest_dir(dir: &Path, builder: &mut WorkloadBuilder) -> Result<usize> {
    let shards = discover_shards(dir)?;
    if shards.is_empty() {
        tracing::warn!(dir = %dir.display(), "no shard files found");
    }

    for file in &shards {
        let origin = file.path.display().to_string();
        let text = fs::read_to_string(&file.path)
            .with_context(|| diagnostics::error_message(format!("read shard {}", origin)))?;
        let parsed = parse_shard(&text, &origin)?;

        if parsed.rank.id() != file.rank {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "shard {} declares rank {} but its file name says rank {}",
                    origin,
                    parsed.rank.id(),
                    file.rank
                ))
            );
        }
        add_parsed(builder, parsed, &origin)?;
    }

    Ok(shards.len())
}

/// Ingest in-memory shards (one JSON document per rank) into a finished workload.
pub fn ingest_strings<S: AsRef<str>>(shards: &[S]) -> Result<Workload> {
    let mut builder = WorkloadBuilder::new();
    for (idx, text) in shards.iter().enumerate() {
        let origin = format!("<shard #{}>", idx);
        let parsed = parse_shard(text.as_ref(), &origin)?;
        add_parsed(&mut builder, parsed, &origin)?;
    }
    Ok(builder.finish())
}

fn add_parsed(builder: &mut WorkloadBuilder, parsed: ParsedShard, origin: &str) -> Result<()> {
    // Duplicate ranks are an input problem here; the builder treats them as a bug.
    if builder.contains_rank(parsed.rank.id()) {
        bail!(
            "{}",
            diagnostics::error_message(format!(
                "shard {} repeats rank {}, which was already ingested",
                origin,
                parsed.rank.id()
            ))
        );
    }

    tracing::debug!(
        origin,
        rank = parsed.rank.id(),
        objects = parsed.objects.len(),
        "ingesting shard"
    );
    builder.add_info(parsed.objects, parsed.rank);
    Ok(())
}
