//! Preprocessing pipeline
//!
//! Orchestrates the five stages: load train (+dev) text, fit the count
//! vectorizer, build sparse document-term matrices, fit the optional
//! reference corpus, and persist everything under the serialization
//! directory.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::corpus::{load_examples, TokenizerType};
use crate::persist;
use crate::sparse::CsrMatrix;
use crate::vectorize::CountVectorizer;


/// Sentinel vocabulary entry for tokens outside the fitted vocabulary.
/// Occupies index 0 of the persisted vocabulary unless fitting produced it.
pub const UNKNOWN_TOKEN: &str = "@@UNKNOWN@@";

/// Inputs and knobs for one preprocessing run. Mirrors the CLI surface.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    pub train_path: PathBuf,
    pub dev_path: Option<PathBuf>,
    pub vocab_path: Option<PathBuf>,
    pub serialization_dir: PathBuf,
    pub vocab_size: usize,
    pub shard: Option<usize>,
    pub tokenize: bool,
    pub tokenizer_type: TokenizerType,
    pub reference_corpus_path: Option<PathBuf>,
    pub tokenize_reference: bool,
    pub reference_tokenizer_type: TokenizerType,
}

/// What a run produced, for logging and assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessSummary {
    /// Length of the persisted vocabulary, unknown sentinel included.
    pub vocabulary_size: usize,
    pub train_docs: usize,
    pub dev_docs: usize,
    pub reference_docs: Option<usize>,
}

/// Read a newline-delimited vocabulary file, one term per line.
fn read_vocabulary_file(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open vocabulary {}", path.display()))?;
    BufReader::new(file)
        .lines()
        .map(|line| {
            line.map(|l| l.trim().to_string())
                .with_context(|| format!("failed to read {}", path.display()))
        })
        .collect()
}

/// Token -> summed-count / `vocab_size` over the combined train+dev matrix.
///
/// `offset` is 1 when a zero column was prepended for the unknown sentinel,
/// so each fitted feature maps to the sum of its own column.
///
/// `vocab_size` is the configured size: the `--vocab-size` cap when fitting,
/// or the vocabulary file's length in fixed-vocabulary mode. Fixed-mode runs
/// therefore normalize by the actual vocabulary length, never by the unused
/// cap.
fn background_frequencies(
    feature_names: &[String],
    master: &CsrMatrix,
    offset: usize,
    vocab_size: usize,
) -> BTreeMap<String, f64> {
    let sums = master.column_sums();
    feature_names
        .iter()
        .enumerate()
        .map(|(ix, name)| (name.clone(), sums[ix + offset] as f64 / vocab_size as f64))
        .collect()
}

/// Run the whole pipeline. Fatal on the first error; partial outputs may
/// remain in the serialization directory.
pub fn run(config: &PreprocessConfig) -> Result<PreprocessSummary> {
    fs::create_dir_all(&config.serialization_dir).with_context(|| {
        format!(
            "failed to create serialization dir {}",
            config.serialization_dir.display()
        )
    })?;

    let train_examples =
        load_examples(&config.train_path, config.tokenize, config.tokenizer_type)?;
    let dev_examples = config
        .dev_path
        .as_deref()
        .map(|path| load_examples(path, config.tokenize, config.tokenizer_type))
        .transpose()?;

    // The configured size used for background-frequency normalization: the
    // vocabulary file's length in fixed mode, the cap otherwise.
    let fixed_vocabulary = config
        .vocab_path
        .as_deref()
        .map(read_vocabulary_file)
        .transpose()?;
    let vocab_size = fixed_vocabulary
        .as_ref()
        .map_or(config.vocab_size, Vec::len);

    info!("fitting count vectorizer");
    let mut vectorizer = match &fixed_vocabulary {
        Some(vocab) => CountVectorizer::with_vocabulary(vocab.clone())?,
        None => CountVectorizer::bounded(Some(config.vocab_size)),
    };

    // Fit over train plus dev; train, dev, and the combined sequence stay
    // independent so no caller-visible list is mutated.
    let combined: Vec<String> = train_examples
        .iter()
        .chain(dev_examples.iter().flatten())
        .cloned()
        .collect();
    vectorizer.fit(&combined);
    let mut train_matrix = vectorizer.transform(&train_examples)?;
    let mut dev_matrix = dev_examples
        .as_deref()
        .map(|examples| vectorizer.transform(examples))
        .transpose()?;

    let reference = build_reference(config, &fixed_vocabulary, dev_examples.as_deref())?;

    // Reserve column 0 for the unknown token when fitting did not produce it.
    let prepend_unknown = !vectorizer.vocabulary_contains(UNKNOWN_TOKEN);
    if prepend_unknown {
        train_matrix.prepend_zero_column();
        if let Some(dev) = dev_matrix.as_mut() {
            dev.prepend_zero_column();
        }
    }

    let master = match &dev_matrix {
        Some(dev) => train_matrix.vstack(dev)?,
        None => train_matrix.clone(),
    };
    info!("generating background frequency");
    let offset = usize::from(prepend_unknown);
    let bgfreq = background_frequencies(vectorizer.feature_names(), &master, offset, vocab_size);

    info!("saving data");
    persist::save_train(&config.serialization_dir, &train_matrix, config.shard)?;
    if let Some(dev) = &dev_matrix {
        persist::save_dev(&config.serialization_dir, dev)?;
    }
    if let Some((matrix, vocabulary)) = &reference {
        persist::save_reference(&config.serialization_dir, matrix, vocabulary)?;
    }
    persist::save_background_frequencies(&config.serialization_dir, &bgfreq)?;

    let mut vocabulary: Vec<String> = Vec::new();
    if prepend_unknown {
        vocabulary.push(UNKNOWN_TOKEN.to_string());
    }
    vocabulary.extend_from_slice(vectorizer.feature_names());
    persist::save_vocabulary(&config.serialization_dir, &vocabulary)?;

    info!(
        "generated vocabulary of size {}",
        vectorizer.feature_names().len()
    );
    Ok(PreprocessSummary {
        vocabulary_size: vocabulary.len(),
        train_docs: train_examples.len(),
        dev_docs: dev_examples.map_or(0, |d| d.len()),
        reference_docs: reference.map(|(matrix, _)| matrix.rows()),
    })
}

/// Fit the reference corpus: an explicit reference path takes priority, the
/// dev split is the fallback, and with neither the reference is skipped.
///
/// The reference vectorizer is independent from the main one: fixed to the
/// same explicit vocabulary when one was given, otherwise unbounded.
fn build_reference(
    config: &PreprocessConfig,
    fixed_vocabulary: &Option<Vec<String>>,
    dev_examples: Option<&[String]>,
) -> Result<Option<(CsrMatrix, Vec<String>)>> {
    let examples: Vec<String> = match (&config.reference_corpus_path, dev_examples) {
        (Some(path), _) => {
            info!("loading reference corpus at {}", path.display());
            load_examples(
                path,
                config.tokenize_reference,
                config.reference_tokenizer_type,
            )?
        }
        (None, Some(dev)) => {
            info!("fitting reference corpus using development data");
            dev.to_vec()
        }
        (None, None) => {
            info!("skipping reference corpus construction");
            return Ok(None);
        }
    };

    let mut vectorizer = match fixed_vocabulary {
        Some(vocab) => CountVectorizer::with_vocabulary(vocab.clone())?,
        None => CountVectorizer::bounded(None),
    };
    let matrix = vectorizer.fit_transform(&examples)?;
    let vocabulary = vectorizer.feature_names().to_vec();
    Ok(Some((matrix, vocabulary)))
}
