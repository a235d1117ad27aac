//! Turns pattern text into an [`Nfa`] via a stack of nesting frames, one per
//! currently-open group. Each frame tracks the chain built so far for the
//! current alternative and any alternatives already completed at this
//! nesting level.

use crate::automata::nfa::Nfa;
use crate::automata::symbol;
use crate::error::CompileError;
use crate::CompileOptions;
use std::collections::BTreeSet;

/// One nesting level of the pattern: either the implicit top-level frame or
/// an explicit `(...)` group.
#[derive(Default)]
struct Frame {
    /// The chain built so far for the alternative currently being scanned.
    sequence: Option<Nfa>,
    /// Alternatives completed via `|` at this nesting level, in order.
    alternatives: Vec<Nfa>,
    /// Whether any atom has been folded into this frame yet, used to tell
    /// a genuinely empty group (`()`) apart from a group whose content can
    /// itself match the empty string (`(a*)`).
    had_token: bool,
}

impl Frame {
    fn push(&mut self, fragment: Nfa) {
        self.had_token = true;
        self.sequence = Some(match self.sequence.take() {
            Some(seq) => seq.chain(fragment),
            None => fragment,
        });
    }

    fn close(self, is_group: bool, pos: usize) -> Result<Nfa, CompileError> {
        if !self.alternatives.is_empty() && self.sequence.is_none() {
            return Err(CompileError::UnmatchedAlternation { pos });
        }
        if self.alternatives.is_empty() {
            if is_group && !self.had_token {
                return Err(CompileError::EmptyGroup { pos });
            }
            return Ok(self.sequence.unwrap_or_else(Nfa::new_empty));
        }
        let mut alternatives = self.alternatives;
        alternatives.push(self.sequence.unwrap());
        let mut iter = alternatives.into_iter();
        let first = iter.next().unwrap();
        Ok(iter.fold(first, |acc, next| acc.alternative(next)))
    }
}

struct Parser<'p> {
    input: &'p [u8],
    pos: usize,
    options: &'p CompileOptions,
    frames: Vec<Frame>,
}

/// Compiles `pattern` down to an epsilon-carrying [`Nfa`]. The pattern ends
/// at the first NUL or `\n` byte, or at the end of the slice, whichever
/// comes first; bytes after the terminator are ignored.
pub fn parse(pattern: &[u8], options: &CompileOptions) -> Result<Nfa, CompileError> {
    if pattern.len() > options.max_pattern_len {
        return Err(CompileError::PatternTooLong { len: pattern.len(), max: options.max_pattern_len });
    }
    let mut parser = Parser { input: pattern, pos: 0, options, frames: vec![Frame::default()] };
    parser.run()
}

impl<'p> Parser<'p> {
    fn at_end(&self) -> bool {
        self.is_end_at(self.pos)
    }

    fn is_end_at(&self, pos: usize) -> bool {
        pos >= self.input.len() || self.input[pos] == 0 || self.input[pos] == b'\n'
    }

    fn peek(&self) -> u8 {
        self.input[self.pos]
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn run(&mut self) -> Result<Nfa, CompileError> {
        while !self.at_end() {
            match self.peek() {
                b'(' => {
                    self.advance();
                    self.frames.push(Frame::default());
                }
                b')' => {
                    let pos = self.pos;
                    self.advance();
                    if self.frames.len() <= 1 {
                        return Err(CompileError::InvalidByte { pos, byte: b')' });
                    }
                    let frame = self.frames.pop().unwrap();
                    let fragment = frame.close(true, self.pos)?;
                    self.frames.last_mut().unwrap().push(fragment);
                }
                b'|' => {
                    let pos = self.pos;
                    self.advance();
                    let frame = self.frames.last_mut().unwrap();
                    match frame.sequence.take() {
                        Some(seq) => frame.alternatives.push(seq),
                        None => return Err(CompileError::UnmatchedAlternation { pos }),
                    }
                }
                _ => {
                    let fragment = self.parse_quantified_atom()?;
                    self.frames.last_mut().unwrap().push(fragment);
                }
            }
        }
        if self.frames.len() != 1 {
            return Err(CompileError::UnclosedGroup { pos: self.pos });
        }
        self.frames.pop().unwrap().close(false, self.pos)
    }

    fn parse_quantified_atom(&mut self) -> Result<Nfa, CompileError> {
        let atom_pos = self.pos;
        let atom = self.parse_atom()?;
        if self.at_end() {
            return Ok(atom);
        }
        match self.peek() {
            b'?' => {
                self.advance();
                Ok(self.finish_quantifier(atom.optional()))
            }
            b'*' => {
                self.advance();
                Ok(self.finish_quantifier(atom.repeat()))
            }
            b'+' => {
                self.advance();
                let plus = atom.clone().chain(atom.repeat());
                Ok(self.finish_quantifier(plus))
            }
            b'{' => self.parse_counted(atom, atom_pos),
            _ => Ok(atom),
        }
    }

    /// Consumes a trailing `?` (lazy) if present and tags the accepting
    /// states of `built` greedy or lazy accordingly.
    fn finish_quantifier(&mut self, built: Nfa) -> Nfa {
        if !self.at_end() && self.peek() == b'?' {
            self.advance();
            built.make_lazy()
        } else {
            built.make_greedy()
        }
    }

    fn parse_counted(&mut self, atom: Nfa, start_pos: usize) -> Result<Nfa, CompileError> {
        self.advance(); // consume '{'
        let lo = self.parse_optional_number()?;
        let has_comma = !self.at_end() && self.peek() == b',';
        if has_comma {
            self.advance();
        }
        let hi = if has_comma { self.parse_optional_number()? } else { None };
        if self.at_end() || self.peek() != b'}' {
            return Err(CompileError::NonNumericCount { pos: start_pos });
        }
        self.advance(); // consume '}'

        // A missing bound defaults to whichever bound was actually given,
        // collapsing `{m,}`/`{,n}` to an exact count: this grammar has no
        // notion of an unbounded upper bound.
        let (min, max) = match (lo, has_comma, hi) {
            (Some(m), false, _) => (m, m),
            (Some(m), true, Some(n)) => (m, n),
            (Some(m), true, None) => (m, m),
            (None, true, Some(n)) => (n, n),
            _ => return Err(CompileError::NonNumericCount { pos: start_pos }),
        };
        if max < 1 || min > max {
            return Err(CompileError::InvalidCountBounds { pos: start_pos, min, max });
        }
        if max > self.options.max_repeat_unroll {
            return Err(CompileError::PatternTooLong { len: max, max: self.options.max_repeat_unroll });
        }

        let mut factors: Vec<Nfa> = Vec::with_capacity(max);
        for i in 0..max {
            let mut factor = atom.clone();
            if i >= min {
                factor = factor.optional();
            }
            factors.push(factor);
        }
        let mut iter = factors.into_iter();
        let mut result = iter.next().unwrap();
        for factor in iter {
            result = result.chain(factor);
        }
        if min == 0 {
            result = result.optional();
        }
        Ok(self.finish_quantifier(result))
    }

    fn parse_optional_number(&mut self) -> Result<Option<usize>, CompileError> {
        let start = self.pos;
        let mut value: Option<usize> = None;
        while !self.at_end() && self.peek().is_ascii_digit() {
            let digit = (self.peek() - b'0') as usize;
            value = Some(value.unwrap_or(0) * 10 + digit);
            self.advance();
        }
        if self.pos == start {
            return Ok(None);
        }
        Ok(value)
    }

    fn parse_atom(&mut self) -> Result<Nfa, CompileError> {
        let pos = self.pos;
        match self.peek() {
            b'^' => {
                if pos != 0 {
                    return Err(CompileError::MisplacedAnchor { pos });
                }
                self.advance();
                Ok(Nfa::new_single_symbol(symbol::LINE_START))
            }
            b'$' => {
                if self.frames.len() != 1 || !self.is_end_at(pos + 1) {
                    return Err(CompileError::MisplacedAnchor { pos });
                }
                self.advance();
                Ok(Nfa::new_single_symbol(symbol::LINE_END))
            }
            b'.' => {
                self.advance();
                Ok(Nfa::from_symbols(all_symbols()))
            }
            b'[' => self.parse_class(),
            b'\\' => self.parse_escape(),
            byte => {
                self.advance();
                Ok(Nfa::new_single_symbol(byte))
            }
        }
    }

    fn parse_escape(&mut self) -> Result<Nfa, CompileError> {
        let pos = self.pos;
        self.advance(); // consume backslash
        if self.at_end() {
            return Err(CompileError::InvalidEscape { pos });
        }
        let escaped = self.peek();
        self.advance();
        match unescape(escaped) {
            Some(byte) => Ok(Nfa::new_single_symbol(byte)),
            None => Err(CompileError::InvalidEscape { pos }),
        }
    }

    fn parse_class(&mut self) -> Result<Nfa, CompileError> {
        let start_pos = self.pos;
        self.advance(); // consume '['
        let inverted = !self.at_end() && self.peek() == b'^';
        if inverted {
            self.advance();
        }

        let mut bytes: BTreeSet<u8> = BTreeSet::new();
        loop {
            if self.at_end() {
                return Err(CompileError::UnclosedClass { pos: start_pos });
            }
            if self.peek() == b']' {
                self.advance();
                break;
            }
            let lo = self.parse_class_byte(start_pos)?;
            if !self.at_end() && self.peek() == b'-' {
                let save = self.pos;
                self.advance(); // tentatively consume '-'
                if !self.at_end() && self.peek() != b']' {
                    let hi = self.parse_class_byte(start_pos)?;
                    if lo > hi || !same_categorical_run(lo, hi) {
                        return Err(CompileError::InvalidClassRange { pos: start_pos });
                    }
                    bytes.extend(lo..=hi);
                    continue;
                }
                self.pos = save; // '-' was a literal, not a range
            }
            bytes.insert(lo);
        }

        if bytes.is_empty() {
            return Err(CompileError::EmptyClass { pos: start_pos });
        }
        if inverted {
            Ok(Nfa::from_symbols(all_symbols().filter(|b| !bytes.contains(b)).collect::<Vec<_>>()))
        } else {
            Ok(Nfa::from_symbols(bytes))
        }
    }

    fn parse_class_byte(&mut self, class_start: usize) -> Result<u8, CompileError> {
        if self.at_end() {
            return Err(CompileError::UnclosedClass { pos: class_start });
        }
        let pos = self.pos;
        let byte = self.peek();
        if byte == b'\\' {
            self.advance();
            if self.at_end() {
                return Err(CompileError::InvalidEscape { pos });
            }
            let escaped = self.peek();
            self.advance();
            return unescape(escaped).ok_or(CompileError::InvalidEscape { pos });
        }
        self.advance();
        Ok(byte)
    }
}

fn same_categorical_run(lo: u8, hi: u8) -> bool {
    (lo.is_ascii_lowercase() && hi.is_ascii_lowercase())
        || (lo.is_ascii_uppercase() && hi.is_ascii_uppercase())
        || (lo.is_ascii_digit() && hi.is_ascii_digit())
}

fn unescape(c: u8) -> Option<u8> {
    match c {
        b'-' | b'^' | b'$' | b'(' | b')' | b'[' | b']' | b'{' | b'}' | b'\\' | b'*' | b'+' | b'?' | b'.' | b'|' => {
            Some(c)
        }
        _ => None,
    }
}

/// The fixed alphabet used by `.` and by inverted classes: every byte except
/// the two anchor sentinels, which must never occur in real input.
fn all_symbols() -> impl Iterator<Item = u8> {
    (0u8..=255).filter(|&b| b != symbol::LINE_START && b != symbol::LINE_END)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automata::dfa::Dfa;
    use crate::automata::epsilon;
    use crate::matcher::find_first;

    fn compile(pattern: &str) -> Result<Dfa, CompileError> {
        let options = CompileOptions::default();
        let nfa = parse(pattern.as_bytes(), &options)?;
        Ok(Dfa::from_epsilon_free_nfa(&epsilon::eliminate(nfa)))
    }

    #[test]
    fn literal_concatenation() {
        let dfa = compile("ab").unwrap();
        assert_eq!(find_first(&dfa, b"xaby").map(|m| (m.start, m.len)), Some((1, 2)));
    }

    #[test]
    fn empty_pattern_matches_empty_prefix_everywhere() {
        let dfa = compile("").unwrap();
        assert_eq!(find_first(&dfa, b"xyz").map(|m| (m.start, m.len)), Some((0, 0)));
    }

    #[test]
    fn unclosed_group_is_an_error() {
        assert_eq!(compile("(a"), Err(CompileError::UnclosedGroup { pos: 2 }));
    }

    #[test]
    fn empty_group_is_an_error() {
        assert_eq!(compile("()"), Err(CompileError::EmptyGroup { pos: 2 }));
    }

    #[test]
    fn group_matching_empty_is_not_an_empty_group_error() {
        assert!(compile("(a*)").is_ok());
    }

    #[test]
    fn trailing_pipe_is_unmatched_alternation() {
        assert_eq!(compile("a|"), Err(CompileError::UnmatchedAlternation { pos: 2 }));
    }

    #[test]
    fn leading_pipe_is_unmatched_alternation() {
        assert_eq!(compile("|a"), Err(CompileError::UnmatchedAlternation { pos: 0 }));
    }

    #[test]
    fn caret_outside_position_zero_is_misplaced() {
        assert_eq!(compile("a^b"), Err(CompileError::MisplacedAnchor { pos: 1 }));
    }

    #[test]
    fn caret_inside_group_is_misplaced() {
        assert_eq!(compile("(^a)"), Err(CompileError::MisplacedAnchor { pos: 1 }));
    }

    #[test]
    fn dollar_mid_pattern_is_misplaced() {
        assert_eq!(compile("a$b"), Err(CompileError::MisplacedAnchor { pos: 1 }));
    }

    #[test]
    fn dollar_inside_open_group_is_misplaced() {
        assert_eq!(compile("(a$)"), Err(CompileError::MisplacedAnchor { pos: 2 }));
    }

    #[test]
    fn unescaped_meta_in_class_range_end_is_literal_dash() {
        let dfa = compile("[a-]").unwrap();
        assert!(find_first(&dfa, b"-").is_some());
        assert!(find_first(&dfa, b"a").is_some());
    }

    #[test]
    fn invalid_class_range_crosses_categories() {
        assert_eq!(compile("[a-9]"), Err(CompileError::InvalidClassRange { pos: 0 }));
    }

    #[test]
    fn empty_class_is_an_error() {
        assert_eq!(compile("[]"), Err(CompileError::EmptyClass { pos: 0 }));
    }

    #[test]
    fn unclosed_class_is_an_error() {
        assert_eq!(compile("[ab"), Err(CompileError::UnclosedClass { pos: 0 }));
    }

    #[test]
    fn non_numeric_count_is_an_error() {
        assert_eq!(compile("a{x}"), Err(CompileError::NonNumericCount { pos: 1 }));
    }

    #[test]
    fn invalid_count_bounds_rejected() {
        assert_eq!(compile("a{5,2}"), Err(CompileError::InvalidCountBounds { pos: 1, min: 5, max: 2 }));
    }

    #[test]
    fn trailing_garbage_escape_is_invalid() {
        assert_eq!(compile("a\\q"), Err(CompileError::InvalidEscape { pos: 1 }));
    }
}
