//! Compile-time errors, each carrying the byte offset in the pattern where
//! the problem was detected.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileError {
    #[error("invalid escape sequence at byte {pos}")]
    InvalidEscape { pos: usize },

    #[error("unclosed group starting before byte {pos}")]
    UnclosedGroup { pos: usize },

    #[error("empty group at byte {pos}")]
    EmptyGroup { pos: usize },

    #[error("unclosed character class at byte {pos}")]
    UnclosedClass { pos: usize },

    #[error("empty character class at byte {pos}")]
    EmptyClass { pos: usize },

    #[error("invalid character range at byte {pos}")]
    InvalidClassRange { pos: usize },

    #[error("non-numeric count at byte {pos}")]
    NonNumericCount { pos: usize },

    #[error("invalid count bounds {{{min},{max}}} at byte {pos}")]
    InvalidCountBounds { pos: usize, min: usize, max: usize },

    #[error("misplaced anchor at byte {pos}")]
    MisplacedAnchor { pos: usize },

    #[error("unmatched alternation at byte {pos}")]
    UnmatchedAlternation { pos: usize },

    #[error("invalid byte {byte:#04x} at byte {pos}")]
    InvalidByte { pos: usize, byte: u8 },

    #[error("pattern of length {len} exceeds the configured maximum of {max}")]
    PatternTooLong { len: usize, max: usize },
}
