//! Count vectorization
//!
//! Fits bag-of-words vocabularies and produces sparse document-term count
//! matrices. Two modes mirror the reference tooling: a fixed vocabulary read
//! from disk, or a frequency-bounded vocabulary with stop-word removal.

pub mod count_vectorizer;
pub mod stopwords;

pub use count_vectorizer::{CountVectorizer, TOKEN_PATTERN};
pub use stopwords::ENGLISH_STOP_WORDS;
