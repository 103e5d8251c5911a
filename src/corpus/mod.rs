//! Corpus loading and tokenization
//!
//! Turns raw text or JSON-lines files into ordered document strings ready for
//! vectorization.

pub mod loader;
pub mod tokenizer;

pub use loader::load_examples;
pub use tokenizer::{tokenize, TokenizerType};
