//! Subset construction: turns an epsilon-free [`Nfa`] into a [`Dfa`] whose
//! states are canonicalized sets of NFA states, each with at most one
//! active transition per symbol.

use crate::automata::nfa::Nfa;
use crate::automata::state::{Behaviour, Role, State, StateId, Transition};
use crate::automata::symbol::Symbol;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// A deterministic automaton: every state has at most one active transition
/// per symbol. Produced exclusively by [`Dfa::from_epsilon_free_nfa`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dfa {
    pub states: Vec<State>,
}

impl Dfa {
    pub fn start(&self) -> StateId {
        StateId(0)
    }

    pub fn is_end(&self, state: StateId) -> bool {
        self.states[state.index()].role.is_end()
    }

    pub fn behaviour(&self, state: StateId) -> Behaviour {
        self.states[state.index()].behaviour
    }

    /// The unique active transition out of `state` on `symbol`, if any.
    pub fn step(&self, state: StateId, symbol: Symbol) -> Option<StateId> {
        let transitions = &self.states[state.index()].transitions;
        debug_assert!(
            transitions.iter().filter(|t| t.is_active() && t.symbol == symbol).count() <= 1,
            "dfa state has two active transitions on the same symbol",
        );
        transitions.iter().find(|t| t.is_active() && t.symbol == symbol).map(|t| t.target)
    }

    /// Subset construction over an NFA that has already had `epsilon::eliminate`
    /// run on it (its only live transitions must be `Active`).
    pub fn from_epsilon_free_nfa(nfa: &Nfa) -> Dfa {
        let alphabet: BTreeSet<Symbol> = nfa
            .states
            .iter()
            .flat_map(|s| s.transitions.iter().filter(|t| t.is_active()).map(|t| t.symbol))
            .collect();

        let start_subset: Vec<usize> = vec![0];
        let mut subsets: Vec<Vec<usize>> = vec![start_subset.clone()];
        let mut index_of: HashMap<Vec<usize>, usize> = HashMap::new();
        index_of.insert(start_subset.clone(), 0);

        let mut dfa_states: Vec<State> = vec![make_dfa_state(nfa, &start_subset)];
        let mut work: VecDeque<usize> = VecDeque::new();
        work.push_back(0);

        while let Some(dfa_ix) = work.pop_front() {
            let subset = subsets[dfa_ix].clone();
            for &symbol in &alphabet {
                let mut targets: BTreeSet<usize> = BTreeSet::new();
                for &member in &subset {
                    for transition in &nfa.states[member].transitions {
                        if transition.is_active() && transition.symbol == symbol {
                            targets.insert(transition.target.index());
                        }
                    }
                }
                if targets.is_empty() {
                    continue;
                }
                let canonical: Vec<usize> = targets.into_iter().collect();
                let target_ix = *index_of.entry(canonical.clone()).or_insert_with(|| {
                    let ix = subsets.len();
                    subsets.push(canonical.clone());
                    dfa_states.push(make_dfa_state(nfa, &canonical));
                    work.push_back(ix);
                    ix
                });
                dfa_states[dfa_ix].transitions.push(Transition::active(symbol, StateId(target_ix)));
            }
        }

        Dfa { states: dfa_states }
    }
}

fn make_dfa_state(nfa: &Nfa, subset: &[usize]) -> State {
    let is_start = subset.contains(&0);
    let is_end = subset.iter().any(|&s| nfa.states[s].role.is_end());
    let role = match (is_start, is_end) {
        (true, true) => Role::StartEnd,
        (true, false) => Role::Start,
        (false, true) => Role::End,
        (false, false) => Role::Middle,
    };

    let mut any_greedy = false;
    let mut any_lazy = false;
    for &member in subset {
        match nfa.states[member].behaviour {
            Behaviour::Greedy => any_greedy = true,
            Behaviour::Lazy => any_lazy = true,
            Behaviour::None => {}
        }
    }
    let behaviour = if any_greedy {
        Behaviour::Greedy
    } else if any_lazy {
        Behaviour::Lazy
    } else {
        Behaviour::None
    };

    State { transitions: Vec::new(), behaviour, role }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automata::epsilon;

    fn compile(nfa: Nfa) -> Dfa {
        Dfa::from_epsilon_free_nfa(&epsilon::eliminate(nfa))
    }

    #[test]
    fn single_symbol_has_two_states() {
        let dfa = compile(Nfa::new_single_symbol(b'a'));
        assert_eq!(dfa.states.len(), 2);
        assert_eq!(dfa.step(dfa.start(), b'a'), Some(StateId(1)));
        assert!(dfa.is_end(StateId(1)));
    }

    #[test]
    fn alternative_determinizes_to_one_branch_point() {
        let dfa = compile(Nfa::new_single_symbol(b'a').alternative(Nfa::new_single_symbol(b'b')));
        assert!(dfa.step(dfa.start(), b'a').is_some());
        assert!(dfa.step(dfa.start(), b'b').is_some());
        assert!(dfa.step(dfa.start(), b'c').is_none());
    }

    #[test]
    fn star_collapses_loop_to_a_single_self_transition() {
        let dfa = compile(Nfa::new_single_symbol(b'a').repeat());
        assert!(dfa.is_end(dfa.start()));
        let next = dfa.step(dfa.start(), b'a').unwrap();
        assert_eq!(dfa.step(next, b'a'), Some(next));
    }

    #[test]
    fn every_state_has_at_most_one_transition_per_symbol() {
        let dfa = compile(
            Nfa::new_single_symbol(b'a')
                .repeat()
                .chain(Nfa::new_single_symbol(b'a').alternative(Nfa::new_single_symbol(b'b'))),
        );
        for state in &dfa.states {
            let mut seen = std::collections::HashSet::new();
            for t in state.transitions.iter().filter(|t| t.is_active()) {
                assert!(seen.insert(t.symbol), "duplicate transition on {:?}", t.symbol);
            }
        }
    }
}
