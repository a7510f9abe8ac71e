//! Table-driven recognizers: token automata, LL(1) and canonical LR(1) parsers
//! built from grammar descriptions.

pub mod action;
pub mod automaton;
pub mod grammar;
pub mod ll;
pub mod lr1;
pub mod symbol;
pub mod types;
pub mod util;

pub use crate::util::chars;
