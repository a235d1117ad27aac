//! Thompson-construction composition primitives for building an NFA out of
//! smaller NFAs.
//!
//! Every primitive takes its operand(s) by value and returns a new `Nfa`:
//! the right-hand operand's states are folded into the left-hand one's
//! vector and re-indexed, so there is never a question of which automaton
//! owns a state, and nothing is left half-consumed on a panic.

use crate::automata::state::{Behaviour, Role, State, StateId, Transition};
use crate::automata::symbol::Symbol;
use std::collections::BTreeSet;

/// An automaton still carrying epsilon transitions, as produced by the
/// parser's composition primitives below. State 0 is always the start
/// state, with role [`Role::Start`] or [`Role::StartEnd`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Nfa {
    pub states: Vec<State>,
}

impl Nfa {
    fn start_role(&self) -> Role {
        self.states[0].role
    }

    /// Deep copy: the clone shares no indices or storage with `self`. Used
    /// by counted-repetition unrolling, which needs several independent
    /// instances of the same sub-pattern.
    pub fn deep_copy(&self) -> Nfa {
        self.clone()
    }

    /// Accepts only the empty string.
    pub fn new_empty() -> Nfa {
        Nfa { states: vec![State::with_role(Role::StartEnd)] }
    }

    /// Accepts exactly the one-byte string `[symbol]`.
    pub fn new_single_symbol(symbol: Symbol) -> Nfa {
        let mut states = vec![State::with_role(Role::Start), State::with_role(Role::End)];
        states[0].transitions.push(Transition::active(symbol, StateId(1)));
        Nfa { states }
    }

    /// Accepts any one-byte string whose byte is in `symbols`. Used for `.`
    /// and for character classes, which both reduce to "one of a set of
    /// bytes".
    pub fn from_symbols(symbols: impl IntoIterator<Item = Symbol>) -> Nfa {
        let mut states = vec![State::with_role(Role::Start), State::with_role(Role::End)];
        let target = StateId(1);
        let mut seen = BTreeSet::new();
        for symbol in symbols {
            if seen.insert(symbol) {
                states[0].transitions.push(Transition::active(symbol, target));
            }
        }
        Nfa { states }
    }

    /// Re-indexes every transition target by `offset`, without touching
    /// roles. Used internally by `chain`/`alternative` to make room for a
    /// folded-in operand.
    fn shifted(mut self, offset: usize) -> Nfa {
        if offset != 0 {
            for state in &mut self.states {
                for transition in &mut state.transitions {
                    transition.target = StateId(transition.target.index() + offset);
                }
            }
        }
        self
    }

    /// Sequencing: accepts `self` followed by `other`. Every accepting state
    /// of `self` gains an epsilon edge into `other`'s (re-indexed) start
    /// state and stops being accepting on its own; `other`'s start state
    /// stops being a start state since it is no longer entered first.
    pub fn chain(mut self, other: Nfa) -> Nfa {
        debug_assert!(self.start_role().is_start(), "left operand's state 0 must be a start state");
        debug_assert!(other.start_role().is_start(), "right operand's state 0 must be a start state");
        let offset = self.states.len();
        let other = other.shifted(offset);
        let other_start = StateId(offset);
        let other_start_role = other.states[0].role;

        self.states.extend(other.states);
        self.states[other_start.index()].role = other_start_role.demote_from_start();

        for state in &mut self.states[..offset] {
            if state.role.is_end() {
                state.transitions.push(Transition::epsilon(other_start));
                state.role = state.role.demote_from_end();
            }
        }
        self
    }

    /// Choice: accepts whatever `self` accepts or whatever `other` accepts.
    /// A fresh start state is prepended with epsilon edges to both
    /// (re-indexed) former start states, which are demoted since they are
    /// no longer themselves the overall start.
    pub fn alternative(self, other: Nfa) -> Nfa {
        debug_assert!(self.start_role().is_start(), "left operand's state 0 must be a start state");
        debug_assert!(other.start_role().is_start(), "right operand's state 0 must be a start state");
        let self_len = self.states.len();
        let self_shifted = self.shifted(1);
        let other_shifted = other.shifted(self_len + 1);

        let self_start = StateId(1);
        let other_start = StateId(self_len + 1);
        let self_start_role = self_shifted.states[0].role;
        let other_start_role = other_shifted.states[0].role;

        let mut states = Vec::with_capacity(1 + self_shifted.states.len() + other_shifted.states.len());
        states.push(State::with_role(Role::Start));
        states.extend(self_shifted.states);
        states.extend(other_shifted.states);

        states[self_start.index()].role = self_start_role.demote_from_start();
        states[other_start.index()].role = other_start_role.demote_from_start();
        states[0].transitions.push(Transition::epsilon(self_start));
        states[0].transitions.push(Transition::epsilon(other_start));

        Nfa { states }
    }

    /// `self?`: the start state also accepts the empty string.
    pub fn optional(mut self) -> Nfa {
        if self.start_role() == Role::Start {
            self.states[0].role = Role::StartEnd;
        }
        self
    }

    /// `self*`: zero or more repetitions. Built as `optional` plus a
    /// loop-back epsilon edge from every non-`StartEnd` accepting state to
    /// the start; `StartEnd` states are excluded since looping from a state
    /// that already accepts empty would only add redundant paths.
    pub fn repeat(mut self) -> Nfa {
        self = self.optional();
        let start = StateId(0);
        for state in &mut self.states {
            if state.role == Role::End {
                state.transitions.push(Transition::epsilon(start));
            }
        }
        self
    }

    /// Tags every currently-accepting state as greedy: on reaching it with
    /// more input left, the matcher should keep scanning for a longer
    /// match before falling back.
    pub fn make_greedy(mut self) -> Nfa {
        self.tag_behaviour(Behaviour::Greedy);
        self
    }

    /// Tags every currently-accepting state as lazy: the matcher stops as
    /// soon as it reaches one.
    pub fn make_lazy(mut self) -> Nfa {
        self.tag_behaviour(Behaviour::Lazy);
        self
    }

    fn tag_behaviour(&mut self, behaviour: Behaviour) {
        for state in &mut self.states {
            if state.role.is_end() {
                state.behaviour = behaviour;
            }
        }
    }
}
