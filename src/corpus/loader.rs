//! Corpus loading
//!
//! Reads a text or JSON-lines file into an ordered sequence of document
//! strings, one per input record. JSON-lines records must carry a `"text"`
//! field; any malformed line aborts the load.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

use super::tokenizer::{tokenize, TokenizerType};

/// Whether a path should be parsed as line-delimited JSON.
fn is_json_lines(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("jsonl") | Some("json")
    )
}

/// Load one document string per input record, in input order.
///
/// With `tokenize_text` set, each document is split by `tokenizer` and
/// rejoined with single spaces; otherwise the text passes through unchanged.
pub fn load_examples(
    path: &Path,
    tokenize_text: bool,
    tokenizer: TokenizerType,
) -> Result<Vec<String>> {
    info!("loading {}", path.display());
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let json_lines = is_json_lines(path);

    let mut examples = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        let text = if json_lines {
            let record: Value = serde_json::from_str(&line).with_context(|| {
                format!("malformed JSON on line {} of {}", line_no + 1, path.display())
            })?;
            record
                .get("text")
                .and_then(Value::as_str)
                .with_context(|| {
                    format!(
                        "missing \"text\" field on line {} of {}",
                        line_no + 1,
                        path.display()
                    )
                })?
                .to_string()
        } else {
            line
        };
        let text = if tokenize_text {
            tokenize(&text, tokenizer).join(" ")
        } else {
            text
        };
        examples.push(text);
    }
    info!("loaded {} examples from {}", examples.len(), path.display());
    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn plain_text_files_load_line_per_example() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "train.txt", "cat dog\ndog bird\n");
        let examples = load_examples(&path, false, TokenizerType::JustSpaces).unwrap();
        assert_eq!(examples, vec!["cat dog", "dog bird"]);
    }

    #[test]
    fn jsonl_files_extract_the_text_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "train.jsonl",
            "{\"text\":\"cat dog\",\"label\":1}\n{\"text\":\"dog bird\"}\n",
        );
        let examples = load_examples(&path, false, TokenizerType::JustSpaces).unwrap();
        assert_eq!(examples, vec!["cat dog", "dog bird"]);
    }

    #[test]
    fn tokenized_text_is_rejoined_with_single_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "train.txt", "cat,  dog!\n");
        let examples = load_examples(&path, true, TokenizerType::Words).unwrap();
        assert_eq!(examples, vec!["cat dog"]);
    }

    #[test]
    fn malformed_json_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "train.jsonl", "{\"text\":\"ok\"}\nnot json\n");
        let err = load_examples(&path, false, TokenizerType::JustSpaces).unwrap_err();
        assert!(format!("{err}").contains("line 2"));
    }

    #[test]
    fn missing_text_field_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "train.jsonl", "{\"label\":1}\n");
        let err = load_examples(&path, false, TokenizerType::JustSpaces).unwrap_err();
        assert!(format!("{err}").contains("\"text\""));
    }

    #[test]
    fn missing_file_is_fatal() {
        assert!(load_examples(
            Path::new("/nonexistent/train.jsonl"),
            false,
            TokenizerType::JustSpaces
        )
        .is_err());
    }
}
