use crate::Result;
use crate::diagnostics;
use crate::model::RankId;

use anyhow::{Context, bail};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A shard file on disk and the rank encoded in its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardFile {
    pub rank: RankId,
    pub path: PathBuf,
}

/// Find `<stem>.<rank>.json` files in `dir`, ordered by rank.
///
/// Example: data.0.json, data.1.json, ...
/// Two files naming the same rank (e.g. data.1.json and stats.1.json) are rejected.
pub fn discover_shards(dir: &Path) -> Result<Vec<ShardFile>> {
    const SHARD_NAME_RE: &str = r#"^(.+)\.(\d+)\.json$"#;
    let re = Regex::new(SHARD_NAME_RE)?;

    let entries = fs::read_dir(dir).with_context(|| {
        diagnostics::error_message(format!("read shard directory {}", dir.display()))
    })?;

    let mut by_rank: BTreeMap<RankId, PathBuf> = BTreeMap::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(caps) = re.captures(name) else {
            tracing::debug!(file = name, "skipping non-shard file");
            continue;
        };

        let rank: RankId = caps[2].parse().with_context(|| {
            diagnostics::error_message(format!("bad rank number in file name {}", name))
        })?;

        if let Some(prev) = by_rank.insert(rank, path.clone()) {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "rank {} has two shard files: {} and {}",
                    rank,
                    prev.display(),
                    path.display()
                ))
            );
        }
    }

    Ok(by_rank
        .into_iter()
        .map(|(rank, path)| ShardFile { rank, path })
        .collect())
}
