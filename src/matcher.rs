//! Leftmost-first matching over a compiled [`Dfa`].
//!
//! The scanner feeds the automaton a synthetic symbol stream: a
//! [`symbol::LINE_START`] sentinel before the first real byte, the real
//! input bytes in order, then a [`symbol::LINE_END`] sentinel. Anchors are
//! just ordinary transitions on those two bytes, so `^`/`$` need no special
//! casing here. A signed cursor tracks position in that stream: `-1` is the
//! `LINE_START` slot, `0..input.len()` are real bytes, `input.len()` is the
//! `LINE_END` slot.

use crate::automata::dfa::Dfa;
use crate::automata::state::Behaviour;
use crate::automata::symbol;

/// A successful match: `input[start..start + len]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub len: usize,
}

/// Finds the leftmost match of `dfa` in `input`, preferring (for a given
/// start position) the outcome its greedy/lazy tagging calls for.
pub fn find_first(dfa: &Dfa, input: &[u8]) -> Option<Match> {
    let len = input.len() as isize;
    let mut anchor: isize = -1;
    while anchor <= len {
        if let Some(m) = attempt(dfa, input, len, anchor) {
            return Some(m);
        }
        anchor += 1;
    }
    None
}

fn attempt(dfa: &Dfa, input: &[u8], len: isize, anchor: isize) -> Option<Match> {
    let mut state = dfa.start();
    let mut match_start: Option<isize> = None;
    // Some(length) once a greedy accepting state has been reached and the
    // matcher should keep scanning, remembering that length as a fallback.
    let mut checkpoint: Option<usize> = None;

    // A pattern can already accept at its own start state without consuming
    // anything (`a*`, `()?`, the empty pattern). That can only be tested at
    // a real scan position, not at the virtual LINE_START slot (anchor -1),
    // since `^` must only ever succeed there.
    if anchor >= 0 && dfa.is_end(state) {
        let start_pos = real_pos(anchor, len);
        match dfa.behaviour(state) {
            Behaviour::Greedy => {
                match_start = Some(start_pos);
                checkpoint = Some(0);
            }
            Behaviour::Lazy | Behaviour::None => {
                return Some(Match { start: start_pos as usize, len: 0 });
            }
        }
    }

    let mut cursor = anchor;
    loop {
        if cursor > len {
            return checkpoint.map(|length| Match { start: match_start.unwrap() as usize, len: length });
        }
        let symbol = symbol_at(cursor, input, len);
        let next = match dfa.step(state, symbol) {
            Some(next) => next,
            None => {
                return checkpoint.map(|length| Match { start: match_start.unwrap() as usize, len: length });
            }
        };

        let consumed_at = real_pos(cursor, len);
        cursor += 1;

        if dfa.is_end(next) {
            if symbol == symbol::LINE_END {
                let start = match_start.unwrap_or(consumed_at);
                return Some(Match { start: start as usize, len: (consumed_at - start) as usize });
            }
            if match_start.is_none() {
                match_start = Some(consumed_at);
            }
            if dfa.behaviour(next) == Behaviour::Greedy {
                checkpoint = Some((consumed_at + 1 - match_start.unwrap()) as usize);
                state = next;
                continue;
            }
            return Some(Match {
                start: match_start.unwrap() as usize,
                len: (consumed_at + 1 - match_start.unwrap()) as usize,
            });
        }

        if match_start.is_none() {
            match_start = Some(consumed_at);
        }
        state = next;
    }
}

fn real_pos(cursor: isize, len: isize) -> isize {
    cursor.clamp(0, len)
}

fn symbol_at(cursor: isize, input: &[u8], len: isize) -> u8 {
    if cursor < 0 {
        symbol::LINE_START
    } else if cursor < len {
        input[cursor as usize]
    } else {
        symbol::LINE_END
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automata::dfa::Dfa;
    use crate::automata::epsilon;
    use crate::automata::nfa::Nfa;
    use crate::CompileOptions;

    fn compile(pattern: &str) -> Dfa {
        let options = CompileOptions::default();
        let nfa = crate::parser::parse(pattern.as_bytes(), &options).unwrap();
        Dfa::from_epsilon_free_nfa(&epsilon::eliminate(nfa))
    }

    #[test]
    fn greedy_star_consumes_as_much_as_possible() {
        let dfa = compile("a*");
        assert_eq!(find_first(&dfa, b"aaaab").map(|m| (m.start, m.len)), Some((0, 4)));
    }

    #[test]
    fn lazy_star_stops_immediately() {
        let dfa = compile("a*?");
        assert_eq!(find_first(&dfa, b"aaaab").map(|m| (m.start, m.len)), Some((0, 0)));
    }

    #[test]
    fn lazy_star_before_mandatory_byte_still_consumes_enough() {
        let dfa = compile("a*?b");
        assert_eq!(find_first(&dfa, b"aaab").map(|m| (m.start, m.len)), Some((0, 4)));
    }

    #[test]
    fn anchored_pattern_only_matches_at_start() {
        let dfa = compile("^a");
        assert_eq!(find_first(&dfa, b"xa"), None);
        assert_eq!(find_first(&dfa, b"ax").map(|m| (m.start, m.len)), Some((0, 1)));
    }

    #[test]
    fn end_anchored_pattern_only_matches_at_end() {
        let dfa = compile("a$");
        assert_eq!(find_first(&dfa, b"ax"), None);
        assert_eq!(find_first(&dfa, b"xa").map(|m| (m.start, m.len)), Some((1, 1)));
    }

    #[test]
    fn both_anchors_require_exact_match() {
        let dfa = compile("^ab$");
        assert_eq!(find_first(&dfa, b"ab").map(|m| (m.start, m.len)), Some((0, 2)));
        assert_eq!(find_first(&dfa, b"xab"), None);
        assert_eq!(find_first(&dfa, b"abx"), None);
    }

    #[test]
    fn empty_dollar_matches_empty_input() {
        let dfa = compile("^$");
        assert_eq!(find_first(&dfa, b"").map(|m| (m.start, m.len)), Some((0, 0)));
        assert_eq!(find_first(&dfa, b"x"), None);
    }

    #[test]
    fn alternation_picks_leftmost_branch() {
        let dfa = compile("(ab)|c");
        assert_eq!(find_first(&dfa, b"xxabyy").map(|m| (m.start, m.len)), Some((2, 2)));
    }

    #[test]
    fn counted_repetition_matches_exact_range() {
        let dfa = compile("a{2,5}b");
        assert_eq!(find_first(&dfa, b"aaaaab").map(|m| (m.start, m.len)), Some((0, 6)));
        assert_eq!(find_first(&dfa, b"ab"), None);
    }

    #[test]
    fn counted_repetition_greedy_vs_lazy_without_trailer() {
        let greedy = compile("a{2,5}");
        assert_eq!(find_first(&greedy, b"aaaaaa").map(|m| (m.start, m.len)), Some((0, 5)));
        let lazy = compile("a{2,5}?");
        assert_eq!(find_first(&lazy, b"aaaaaa").map(|m| (m.start, m.len)), Some((0, 2)));
    }

    #[test]
    fn no_match_returns_none() {
        let dfa = compile("a+b");
        assert_eq!(find_first(&dfa, b"b"), None);
    }

    #[test]
    fn empty_pattern_always_matches_at_zero() {
        let dfa = Dfa::from_epsilon_free_nfa(&epsilon::eliminate(Nfa::new_empty()));
        assert_eq!(find_first(&dfa, b"anything").map(|m| (m.start, m.len)), Some((0, 0)));
    }
}
