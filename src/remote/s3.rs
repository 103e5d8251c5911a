//! S3 re-upload of downloaded artifacts
//!
//! Pushes result files to the shared pretrained-models bucket, keyed by the
//! local output directory so repeated uploads of different runs stay
//! separated.

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::primitives::ByteStream;
use std::path::Path;
use tracing::info;

pub const DEFAULT_BUCKET: &str = "suching-dev";
pub const DEFAULT_REGION: &str = "us-west-2";
pub const KEY_PREFIX: &str = "pretrained-models";

/// Filename component of a dataset file path.
pub fn file_basename(file: &str) -> &str {
    file.rsplit('/').next().unwrap_or(file)
}

/// Object key for one uploaded file.
pub fn object_key(output_dir: &Path, file: &str) -> String {
    format!(
        "{}/{}/{}",
        KEY_PREFIX,
        output_dir.display(),
        file_basename(file)
    )
}

/// Upload each downloaded file to the bucket. Credentials come from the
/// environment (`AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`).
pub async fn upload_results(output_dir: &Path, files: &[String]) -> Result<()> {
    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(DEFAULT_REGION))
        .load()
        .await;
    let client = aws_sdk_s3::Client::new(&config);

    for file in files {
        let name = file_basename(file);
        let local = output_dir.join(name);
        let key = object_key(output_dir, file);
        info!("uploading {name} to s3://{DEFAULT_BUCKET}/{key}");
        let body = ByteStream::from_path(&local)
            .await
            .with_context(|| format!("failed to read {}", local.display()))?;
        client
            .put_object()
            .bucket(DEFAULT_BUCKET)
            .key(&key)
            .body(body)
            .send()
            .await
            .with_context(|| format!("failed to upload {name} to {DEFAULT_BUCKET}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn basename_drops_nested_directories() {
        assert_eq!(file_basename("model.tar.gz"), "model.tar.gz");
        assert_eq!(file_basename("run1/model.tar.gz"), "model.tar.gz");
    }

    #[test]
    fn object_keys_nest_under_the_prefix_and_output_dir() {
        let dir = PathBuf::from("results/run1");
        assert_eq!(
            object_key(&dir, "model.tar.gz"),
            "pretrained-models/results/run1/model.tar.gz"
        );
    }
}
