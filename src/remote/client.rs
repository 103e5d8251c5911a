//! Experiment-tracking service client
//!
//! Thin HTTP client for the result-artifact store: list the files in a
//! dataset, then fetch them one by one. Authentication is a bearer token.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_ADDRESS: &str = "http://beaker-internal.allenai.org";

/// One file entry in a dataset listing. The service reports more metadata
/// (sizes, digests); only the path matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetFile {
    pub path: String,
}

#[derive(Debug, Deserialize)]
struct FileListing {
    files: Vec<DatasetFile>,
}

/// Dataset paths come back rooted (`/model.tar.gz`); strip the leading
/// separator so they match the filenames callers pass in.
pub fn normalize_path(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Local destination for a dataset file. Nested dataset paths
/// (`logs/stdout`) keep their structure under `output_dir`.
pub fn local_destination(output_dir: &Path, file: &str) -> PathBuf {
    output_dir.join(normalize_path(file))
}

/// Validate that every requested filename appears in the remote listing.
///
/// Fails for the whole batch before anything is downloaded, rather than
/// erroring partway through.
pub fn resolve_requested(available: &[String], requested: &[String]) -> Result<()> {
    let missing: Vec<&str> = requested
        .iter()
        .filter(|name| !available.iter().any(|a| a == *name))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        bail!(
            "requested files not present in dataset: {} (available: {})",
            missing.join(", "),
            available.join(", ")
        );
    }
    Ok(())
}

pub struct TrackingClient {
    http: reqwest::Client,
    address: String,
    token: String,
}

impl TrackingClient {
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            address: address.into(),
            token: token.into(),
        }
    }

    /// List the dataset's files, leading separators stripped.
    pub async fn list_files(&self, dataset: &str) -> Result<Vec<String>> {
        let url = format!("{}/api/v3/datasets/{}/files", self.address, dataset);
        let listing: FileListing = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?
            .error_for_status()
            .with_context(|| format!("listing dataset {dataset} failed"))?
            .json()
            .await
            .with_context(|| format!("unexpected listing payload for dataset {dataset}"))?;
        Ok(listing
            .files
            .into_iter()
            .map(|f| normalize_path(&f.path).to_string())
            .collect())
    }

    /// Download one file into `output_dir`, returning the local path.
    pub async fn download_file(
        &self,
        dataset: &str,
        file: &str,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let url = format!(
            "{}/api/v3/datasets/{}/files/{}",
            self.address, dataset, file
        );
        info!("getting {file}");
        let bytes = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?
            .error_for_status()
            .with_context(|| format!("downloading {file} from dataset {dataset} failed"))?
            .bytes()
            .await
            .with_context(|| format!("failed to read body of {file}"))?;
        let dest = local_destination(output_dir, file);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&dest, &bytes)
            .await
            .with_context(|| format!("failed to write {}", dest.display()))?;
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_strips_a_single_leading_separator() {
        assert_eq!(normalize_path("/model.tar.gz"), "model.tar.gz");
        assert_eq!(normalize_path("model.tar.gz"), "model.tar.gz");
        assert_eq!(normalize_path("/nested/file.txt"), "nested/file.txt");
    }

    #[test]
    fn resolve_accepts_fully_available_requests() {
        let available = names(&["a.txt", "b.txt"]);
        assert!(resolve_requested(&available, &names(&["a.txt"])).is_ok());
        assert!(resolve_requested(&available, &names(&["a.txt", "b.txt"])).is_ok());
    }

    #[test]
    fn resolve_fails_fast_on_any_missing_file() {
        let available = names(&["a.txt", "b.txt"]);
        let err = resolve_requested(&available, &names(&["a.txt", "c.txt"])).unwrap_err();
        assert!(format!("{err}").contains("c.txt"));
    }

    #[test]
    fn nested_dataset_files_keep_their_structure_locally() {
        let out = Path::new("results");
        assert_eq!(
            local_destination(out, "model.tar.gz"),
            PathBuf::from("results/model.tar.gz")
        );
        assert_eq!(
            local_destination(out, "logs/stdout"),
            PathBuf::from("results/logs/stdout")
        );
        // Rooted listing paths land in the same place as their
        // normalized form.
        assert_eq!(
            local_destination(out, "/logs/stdout"),
            PathBuf::from("results/logs/stdout")
        );
    }

    #[test]
    fn listing_payload_deserializes() {
        let payload = r#"{"files":[{"path":"/model.tar.gz","size":1024},{"path":"/metrics.json"}]}"#;
        let listing: FileListing = serde_json::from_str(payload).unwrap();
        assert_eq!(listing.files.len(), 2);
        assert_eq!(normalize_path(&listing.files[0].path), "model.tar.gz");
        assert_eq!(normalize_path(&listing.files[1].path), "metrics.json");
    }
}
