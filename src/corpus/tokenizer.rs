//! Tokenizer selection for corpus loading
//!
//! Two tokenizers cover what the pipeline needs: plain whitespace splitting
//! (the default, for pre-tokenized corpora) and Unicode word-boundary
//! segmentation for raw text.

use clap::ValueEnum;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TokenizerType {
    /// Split on whitespace runs only.
    #[default]
    #[value(name = "just_spaces")]
    JustSpaces,
    /// Unicode word-boundary segmentation (UAX #29 words).
    #[value(name = "words")]
    Words,
}

/// Split `text` into tokens with the selected tokenizer.
pub fn tokenize(text: &str, tokenizer: TokenizerType) -> Vec<&str> {
    match tokenizer {
        TokenizerType::JustSpaces => text.split_whitespace().collect(),
        TokenizerType::Words => text.unicode_words().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn just_spaces_splits_on_whitespace_runs() {
        let tokens = tokenize("a  b\tc\nd", TokenizerType::JustSpaces);
        assert_eq!(tokens, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn just_spaces_keeps_punctuation_attached() {
        let tokens = tokenize("hello, world!", TokenizerType::JustSpaces);
        assert_eq!(tokens, vec!["hello,", "world!"]);
    }

    #[test]
    fn words_strips_punctuation() {
        let tokens = tokenize("hello, world! it's fine", TokenizerType::Words);
        assert_eq!(tokens, vec!["hello", "world", "it's", "fine"]);
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(tokenize("", TokenizerType::JustSpaces).is_empty());
        assert!(tokenize("   ", TokenizerType::Words).is_empty());
    }
}
