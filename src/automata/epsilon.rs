//! Epsilon elimination: rewrites an [`Nfa`] so that every active transition
//! already accounts for the epsilon edges reachable from its source,
//! and marks the epsilon edges `Dead` rather than removing them so that
//! state indices recorded elsewhere (e.g. by the caller) stay valid.

use crate::automata::nfa::Nfa;
use crate::automata::state::{Role, Transition, TransitionStatus};
use crate::automata::symbol::Symbol;
use std::collections::BTreeSet;

/// The epsilon closure of a single state: every state reachable from it
/// using zero or more epsilon edges, including itself.
fn epsilon_closure(nfa: &Nfa, start: usize) -> BTreeSet<usize> {
    let mut closure = BTreeSet::new();
    let mut stack = vec![start];
    closure.insert(start);
    while let Some(state) = stack.pop() {
        for transition in &nfa.states[state].transitions {
            if transition.is_epsilon() && closure.insert(transition.target.index()) {
                stack.push(transition.target.index());
            }
        }
    }
    closure
}

/// Runs epsilon elimination over `nfa`, returning an automaton with the same
/// state count whose only live transitions are `Active`. The result is
/// still generally non-deterministic (a state can have more than one active
/// transition on the same symbol); determinizing it is [`super::dfa`]'s job.
pub fn eliminate(nfa: Nfa) -> Nfa {
    let state_count = nfa.states.len();
    let closures: Vec<BTreeSet<usize>> = (0..state_count).map(|s| epsilon_closure(&nfa, s)).collect();

    let alphabet: BTreeSet<Symbol> = nfa
        .states
        .iter()
        .flat_map(|s| s.transitions.iter().filter(|t| t.is_active()).map(|t| t.symbol))
        .collect();

    let original_states = nfa.states.clone();
    let mut result = nfa;

    for state_ix in 0..state_count {
        if closures[state_ix].iter().any(|&t| original_states[t].role.is_end()) {
            result.states[state_ix].role = match result.states[state_ix].role {
                Role::Start => Role::StartEnd,
                Role::Middle => Role::End,
                other => other,
            };
        }

        for &symbol in &alphabet {
            let mut reachable: BTreeSet<usize> = BTreeSet::new();
            for &member in &closures[state_ix] {
                for transition in &original_states[member].transitions {
                    if transition.is_active() && transition.symbol == symbol {
                        reachable.extend(closures[transition.target.index()].iter());
                    }
                }
            }

            let already_direct: BTreeSet<usize> = result.states[state_ix]
                .transitions
                .iter()
                .filter(|t| t.is_active() && t.symbol == symbol)
                .map(|t| t.target.index())
                .collect();

            for target in reachable {
                if !already_direct.contains(&target) {
                    result.states[state_ix].transitions.push(Transition::active(symbol, target.into()));
                }
            }
        }

        for transition in &mut result.states[state_ix].transitions {
            if transition.status == TransitionStatus::Epsilon {
                transition.status = TransitionStatus::Dead;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automata::state::StateId;

    #[test]
    fn eliminates_epsilon_in_a_chain() {
        let nfa = Nfa::new_single_symbol(b'a').chain(Nfa::new_single_symbol(b'b'));
        let elim = eliminate(nfa);
        assert!(elim.states.iter().all(|s| s.transitions.iter().all(|t| t.status != TransitionStatus::Epsilon)));
        // start state still only reaches on 'a'
        assert_eq!(elim.states[0].transitions.iter().filter(|t| t.is_active()).count(), 1);
        assert_eq!(elim.states[0].transitions[0].symbol, b'a');
    }

    #[test]
    fn star_upgrades_start_to_accepting_and_loops() {
        let nfa = Nfa::new_single_symbol(b'a').repeat();
        let elim = eliminate(nfa);
        assert_eq!(elim.states[0].role, Role::StartEnd);
        let active: Vec<_> = elim.states[0].transitions.iter().filter(|t| t.is_active()).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].symbol, b'a');
    }

    #[test]
    fn alternative_both_branches_reachable_from_new_start() {
        let nfa = Nfa::new_single_symbol(b'a').alternative(Nfa::new_single_symbol(b'b'));
        let elim = eliminate(nfa);
        let mut symbols: Vec<Symbol> =
            elim.states[0].transitions.iter().filter(|t| t.is_active()).map(|t| t.symbol).collect();
        symbols.sort_unstable();
        assert_eq!(symbols, vec![b'a', b'b']);
    }

    #[test]
    fn dead_transitions_keep_indices_stable() {
        let nfa = Nfa::new_single_symbol(b'a').chain(Nfa::new_single_symbol(b'b'));
        let before = nfa.states.len();
        let elim = eliminate(nfa);
        assert_eq!(elim.states.len(), before);
        assert!(elim.states[1].transitions.iter().any(|t| t.status == TransitionStatus::Dead
            && t.target == StateId(2)));
    }
}
