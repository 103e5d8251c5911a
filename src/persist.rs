//! Output persistence
//!
//! Writes the serialization-directory layout the downstream topic-model
//! trainer expects: sparse matrices (optionally sharded), the vocabulary
//! files, the background-frequency map, and the reference-corpus outputs.
//! Every writer is idempotent against a fresh directory; reruns overwrite.

use anyhow::{ensure, Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::sparse::CsrMatrix;

pub const TRAIN_FILE: &str = "train.npz";
pub const DEV_FILE: &str = "dev.npz";
pub const SHARD_DIR: &str = "shard";
pub const REFERENCE_DIR: &str = "reference";
pub const REFERENCE_FILE: &str = "ref.npz";
pub const REFERENCE_VOCAB_FILE: &str = "ref.vocab.json";
pub const BGFREQ_FILE: &str = "vampire.bgfreq";
pub const VOCABULARY_DIR: &str = "vocabulary";
pub const VOCAB_FILE: &str = "vampire.txt";
pub const NAMESPACE_FILE: &str = "non_padded_namespaces.txt";

/// Namespace marker content required by the downstream model-loading
/// framework.
pub const NON_PADDED_NAMESPACES: &[&str] = &["*tags", "*labels", "vampire"];

/// Write items as newline-delimited text, one per line.
fn write_list<I, S>(path: &Path, items: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for item in items {
        out.write_all(item.as_ref().as_bytes())?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Serialize `value` as JSON to `path`.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), value)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Save the train matrix, either whole or partitioned into `shard_count`
/// contiguous row blocks.
///
/// Shards are named by their starting row offset (`train.<offset>.npz`) with
/// a parallel `train.<offset>.id` file listing the original row indices. The
/// final shard absorbs any remainder, so the shards partition the matrix
/// exactly.
pub fn save_train(dir: &Path, train: &CsrMatrix, shard_count: Option<usize>) -> Result<()> {
    let Some(shards) = shard_count else {
        return train.save_npz(&dir.join(TRAIN_FILE));
    };
    ensure!(shards > 0, "--shard must be a positive count");
    ensure!(
        shards <= train.rows(),
        "cannot split {} rows into {} shards",
        train.rows(),
        shards
    );
    info!("sharding train matrix into {shards} blocks");
    let shard_dir = dir.join(SHARD_DIR);
    fs::create_dir_all(&shard_dir)
        .with_context(|| format!("failed to create {}", shard_dir.display()))?;
    let batch = train.rows() / shards;
    for i in 0..shards {
        let start = i * batch;
        let end = if i == shards - 1 {
            train.rows()
        } else {
            start + batch
        };
        train
            .slice_rows(start, end)
            .save_npz(&shard_dir.join(format!("train.{start}.npz")))?;
        write_list(
            &shard_dir.join(format!("train.{start}.id")),
            (start..end).map(|ix| ix.to_string()),
        )?;
    }
    Ok(())
}

pub fn save_dev(dir: &Path, dev: &CsrMatrix) -> Result<()> {
    dev.save_npz(&dir.join(DEV_FILE))
}

/// Save the reference matrix and its own vocabulary (JSON array).
pub fn save_reference(dir: &Path, matrix: &CsrMatrix, vocabulary: &[String]) -> Result<()> {
    let reference_dir = dir.join(REFERENCE_DIR);
    fs::create_dir_all(&reference_dir)
        .with_context(|| format!("failed to create {}", reference_dir.display()))?;
    matrix.save_npz(&reference_dir.join(REFERENCE_FILE))?;
    write_json(&reference_dir.join(REFERENCE_VOCAB_FILE), &vocabulary)
}

/// Save the background-frequency map as JSON with deterministic key order.
pub fn save_background_frequencies(
    dir: &Path,
    bgfreq: &std::collections::BTreeMap<String, f64>,
) -> Result<()> {
    write_json(&dir.join(BGFREQ_FILE), bgfreq)
}

/// Save the final vocabulary list and the fixed namespace marker file.
pub fn save_vocabulary(dir: &Path, vocabulary: &[String]) -> Result<()> {
    let vocabulary_dir = dir.join(VOCABULARY_DIR);
    fs::create_dir_all(&vocabulary_dir)
        .with_context(|| format!("failed to create {}", vocabulary_dir.display()))?;
    write_list(&vocabulary_dir.join(VOCAB_FILE), vocabulary)?;
    write_list(
        &vocabulary_dir.join(NAMESPACE_FILE),
        NON_PADDED_NAMESPACES.iter().copied(),
    )
}
