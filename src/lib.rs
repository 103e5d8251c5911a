//! vampire-prep library
//!
//! Corpus preprocessing and experiment-artifact tooling for VAMPIRE topic
//! models.

pub mod corpus;
pub mod persist;
pub mod pipeline;
pub mod remote;
pub mod sparse;
pub mod vectorize;
