//! A small Thompson-construction regex compiler and leftmost-match engine.
//!
//! [`compile`] turns pattern text into a [`Dfa`] through the usual pipeline
//! (parse to an NFA, eliminate epsilon transitions, subset-construct a DFA);
//! [`find_first`] then runs that DFA over input bytes. The supported syntax
//! and matching semantics are documented on the individual modules.

pub mod automata;
pub mod error;
pub mod matcher;
pub mod parser;

pub use automata::dfa::Dfa;
pub use error::CompileError;
pub use matcher::{find_first, Match};

/// Limits applied while compiling a pattern, so that a hostile or malformed
/// pattern can't make `compile` allocate unboundedly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    /// Patterns longer than this are rejected before parsing begins.
    pub max_pattern_len: usize,
    /// Upper bound on `n` in a counted repetition `X{m,n}`; also caps the
    /// number of deep copies `{m,n}` unrolling will make of its operand.
    pub max_repeat_unroll: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions { max_pattern_len: 4096, max_repeat_unroll: 1024 }
    }
}

/// Compiles `pattern` into a [`Dfa`] ready for repeated use with
/// [`find_first`].
pub fn compile(pattern: &[u8], options: &CompileOptions) -> Result<Dfa, CompileError> {
    log::debug!("compiling pattern of {} bytes", pattern.len());
    let nfa = parser::parse(pattern, options)?;
    log::trace!("parsed to an nfa with {} states", nfa.states.len());
    let nfa = automata::epsilon::eliminate(nfa);
    let dfa = Dfa::from_epsilon_free_nfa(&nfa);
    log::trace!("subset-constructed a dfa with {} states", dfa.states.len());
    Ok(dfa)
}
