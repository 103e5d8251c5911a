//! vampire-prep CLI
//!
//! Utilities supporting the VAMPIRE topic-modeling workflow.
//!
//! ## Quick Start
//!
//! ```bash
//! # Preprocess a corpus into sparse document-term matrices
//! vampire-prep preprocess \
//!     --train-path train.jsonl \
//!     --dev-path dev.jsonl \
//!     --serialization-dir out \
//!     --tokenize
//!
//! # Download experiment result files, re-uploading to S3
//! vampire-prep download -d ds_nc05x1bc54o5 -o results -f model.tar.gz -s
//! ```

mod corpus;
mod persist;
mod pipeline;
mod remote;
mod sparse;
mod vectorize;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use corpus::TokenizerType;
use pipeline::PreprocessConfig;
use remote::DownloadConfig;

#[derive(Parser)]
#[command(name = "vampire-prep")]
#[command(about = "Corpus preprocessing and result-artifact tooling for VAMPIRE topic models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preprocess a corpus into sparse document-term matrices and
    /// vocabulary files for topic-model training
    Preprocess {
        /// Path to the train file (text or jsonl)
        #[arg(long)]
        train_path: PathBuf,

        /// Path to the dev file (text or jsonl)
        #[arg(long)]
        dev_path: Option<PathBuf>,

        /// Path to a fixed vocabulary file (newline-delimited); overrides
        /// --vocab-size
        #[arg(long)]
        vocab_path: Option<PathBuf>,

        /// Directory to store the preprocessed output
        #[arg(long)]
        serialization_dir: PathBuf,

        /// Maximum vocabulary size when fitting without --vocab-path
        #[arg(long, default_value_t = 10_000)]
        vocab_size: usize,

        /// Partition the train matrix into this many row shards
        #[arg(long)]
        shard: Option<usize>,

        /// Tokenize input text before vectorization
        #[arg(long)]
        tokenize: bool,

        /// Tokenizer for train/dev text
        #[arg(long, value_enum, default_value = "just_spaces")]
        tokenizer_type: TokenizerType,

        /// Separate reference corpus for topic-coherence evaluation
        /// (falls back to the dev split when omitted)
        #[arg(long)]
        reference_corpus_path: Option<PathBuf>,

        /// Tokenize the reference corpus
        #[arg(long)]
        tokenize_reference: bool,

        /// Tokenizer for the reference corpus
        #[arg(long, value_enum, default_value = "just_spaces")]
        reference_tokenizer_type: TokenizerType,
    },

    /// Download result files from the experiment-tracking service
    Download {
        /// Dataset identifier (e.g. ds_nc05x1bc54o5)
        #[arg(short, long)]
        dataset: String,

        /// Local directory for the downloaded files
        #[arg(short, long = "output_dir")]
        output_dir: PathBuf,

        /// Filenames to download; all must exist in the dataset
        #[arg(short, long, num_args = 1.., required = true)]
        files: Vec<String>,

        /// Re-upload the downloaded files to S3
        #[arg(short, long)]
        s3: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Preprocess {
            train_path,
            dev_path,
            vocab_path,
            serialization_dir,
            vocab_size,
            shard,
            tokenize,
            tokenizer_type,
            reference_corpus_path,
            tokenize_reference,
            reference_tokenizer_type,
        } => {
            let config = PreprocessConfig {
                train_path,
                dev_path,
                vocab_path,
                serialization_dir,
                vocab_size,
                shard,
                tokenize,
                tokenizer_type,
                reference_corpus_path,
                tokenize_reference,
                reference_tokenizer_type,
            };
            let summary = pipeline::run(&config)?;
            println!(
                "Preprocessed {} train docs ({} dev) into a vocabulary of size {}",
                summary.train_docs, summary.dev_docs, summary.vocabulary_size
            );
        }

        Commands::Download {
            dataset,
            output_dir,
            files,
            s3,
        } => {
            let config = DownloadConfig {
                dataset,
                output_dir,
                files,
                s3,
            };
            remote::run(&config).await?;
        }
    }

    Ok(())
}
