//! # Illustrative Finite Automata
//!
//! Two fixed deterministic automata used for diagnostic tracing of a payload.
//! They play no part in the enforcement decision.
//!
//! ```text
//!   Boolean DFA:   q0 ──'──▶ q1 ──OR──▶ q2 ──'──▶ ((q3))
//!   Comment DFA:   q0 ──'──▶ q1 ──--──▶ ((q2))
//!                             └───#───▶ ((q2))
//! ```
//!
//! ## Simulation Semantics
//!
//! Simulation feeds the payload one character at a time. When the current
//! state has a transition on the character it is followed; when it has none,
//! the step is a no-op and the automaton stays where it is. This is not
//! standard DFA rejection and there is no backtracking. Multi-character
//! symbols (`OR`, `--`) are part of the definition but are never consumed by
//! single-character steps.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

use crate::models::AutomatonError;

/// Which built-in automaton to simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutomatonKind {
    Boolean,
    Comment,
}

impl AutomatonKind {
    pub const ALL: [AutomatonKind; 2] = [AutomatonKind::Boolean, AutomatonKind::Comment];
}

/// Result of running an automaton over a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simulation {
    pub automaton: String,
    pub accepted: bool,
    pub final_state: String,
    /// Start state followed by the state after each character.
    pub trace: Vec<String>,
}

/// An immutable deterministic finite automaton over string symbols.
#[derive(Debug, Clone)]
pub struct Dfa {
    name: String,
    states: BTreeSet<String>,
    start: String,
    accepting: BTreeSet<String>,
    /// state -> symbol -> next state
    transitions: BTreeMap<String, BTreeMap<String, String>>,
}

impl Dfa {
    pub fn builder(name: &str) -> DfaBuilder {
        DfaBuilder {
            name: name.to_string(),
            states: Vec::new(),
            start: None,
            accepting: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_state(&self) -> &str {
        &self.start
    }

    pub fn is_accepting(&self, state: &str) -> bool {
        self.accepting.contains(state)
    }

    /// δ(state, symbol), if defined.
    pub fn next(&self, state: &str, symbol: &str) -> Option<&str> {
        self.transitions
            .get(state)
            .and_then(|row| row.get(symbol))
            .map(String::as_str)
    }

    /// Run from the start state over `input`, one character per step.
    pub fn simulate(&self, input: &str) -> Simulation {
        let mut current = self.start.as_str();
        let mut trace = Vec::with_capacity(input.chars().count() + 1);
        trace.push(current.to_string());

        let mut buf = [0u8; 4];
        for c in input.chars() {
            let symbol: &str = c.encode_utf8(&mut buf);
            if let Some(next) = self.next(current, symbol) {
                current = next;
            }
            trace.push(current.to_string());
        }

        Simulation {
            automaton: self.name.clone(),
            accepted: self.is_accepting(current),
            final_state: current.to_string(),
            trace,
        }
    }
}

impl fmt::Display for Dfa {
    /// Formal definition: Q, q0, F and δ.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(", ");

        writeln!(f, "{}:", self.name)?;
        writeln!(f, "  Q  = {{{}}}", join(&self.states))?;
        writeln!(f, "  q0 = {}", self.start)?;
        writeln!(f, "  F  = {{{}}}", join(&self.accepting))?;
        writeln!(f, "  δ:")?;
        for (from, row) in &self.transitions {
            for (symbol, to) in row {
                writeln!(f, "    δ({}, '{}') = {}", from, symbol, to)?;
            }
        }
        Ok(())
    }
}

/// Incremental construction of a [`Dfa`]. Validated on [`DfaBuilder::build`].
pub struct DfaBuilder {
    name: String,
    states: Vec<String>,
    start: Option<String>,
    accepting: Vec<String>,
    transitions: Vec<(String, String, String)>,
}

impl DfaBuilder {
    pub fn state(mut self, name: &str) -> Self {
        self.states.push(name.to_string());
        self
    }

    pub fn start(mut self, name: &str) -> Self {
        self.start = Some(name.to_string());
        self
    }

    pub fn accepting(mut self, name: &str) -> Self {
        self.accepting.push(name.to_string());
        self
    }

    pub fn transition(mut self, from: &str, symbol: &str, to: &str) -> Self {
        self.transitions
            .push((from.to_string(), symbol.to_string(), to.to_string()));
        self
    }

    pub fn build(self) -> Result<Dfa, AutomatonError> {
        let states: BTreeSet<String> = self.states.into_iter().collect();
        let unknown = |state: &str| AutomatonError::UnknownState {
            automaton: self.name.clone(),
            state: state.to_string(),
        };

        let start = self
            .start
            .ok_or_else(|| AutomatonError::MissingStart(self.name.clone()))?;
        if !states.contains(&start) {
            return Err(unknown(&start));
        }

        let mut accepting = BTreeSet::new();
        for state in self.accepting {
            if !states.contains(&state) {
                return Err(unknown(&state));
            }
            accepting.insert(state);
        }

        let mut transitions: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for (from, symbol, to) in self.transitions {
            for state in [&from, &to] {
                if !states.contains(state) {
                    return Err(unknown(state));
                }
            }
            transitions.entry(from).or_default().insert(symbol, to);
        }

        Ok(Dfa {
            name: self.name,
            states,
            start,
            accepting,
            transitions,
        })
    }
}

/// ' OR ' recognizer.
fn boolean_dfa() -> Result<Dfa, AutomatonError> {
    Dfa::builder("Boolean_DFA")
        .state("q0")
        .state("q1")
        .state("q2")
        .state("q3")
        .start("q0")
        .accepting("q3")
        .transition("q0", "'", "q1")
        .transition("q1", "OR", "q2")
        .transition("q2", "'", "q3")
        .build()
}

/// '-- / '# recognizer.
fn comment_dfa() -> Result<Dfa, AutomatonError> {
    Dfa::builder("Comment_DFA")
        .state("q0")
        .state("q1")
        .state("q2")
        .start("q0")
        .accepting("q2")
        .transition("q0", "'", "q1")
        .transition("q1", "--", "q2")
        .transition("q1", "#", "q2")
        .build()
}

static BOOLEAN: LazyLock<Dfa> =
    LazyLock::new(|| boolean_dfa().expect("boolean automaton is well-formed"));
static COMMENT: LazyLock<Dfa> =
    LazyLock::new(|| comment_dfa().expect("comment automaton is well-formed"));

/// The built-in automaton for `kind`.
pub fn automaton(kind: AutomatonKind) -> &'static Dfa {
    match kind {
        AutomatonKind::Boolean => &BOOLEAN,
        AutomatonKind::Comment => &COMMENT,
    }
}

/// Simulate the chosen built-in automaton over `payload`.
pub fn simulate_automaton(payload: &str, kind: AutomatonKind) -> Simulation {
    automaton(kind).simulate(payload)
}
