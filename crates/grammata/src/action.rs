//! The contract between the engines and task-specific semantic actions.

use std::fmt;

/// A closed set of semantic actions.
///
/// Action names found in a description are resolved once, while the
/// automaton or the parse table is built, and unknown names are rejected
/// there.
pub trait Action: Copy + Eq + fmt::Debug {
    /// Resolve an action name.
    fn from_name(name: &str) -> Option<Self>;
}

/// Where an action is being invoked from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Context<'a> {
    /// The automaton is leaving the given state.
    Automaton { state: &'a str },
    /// The LL(1) parser is at the given table row.
    LL { row: usize },
    /// The LR(1) parser is at the given state.
    LR { state: usize },
}

/// The receiver of semantic actions during a parse.
///
/// Each `parse` call starts with `reset`, then calls `invoke` for every
/// action on the way. Returning `false` from `invoke` aborts the parse as
/// a recognition failure. The results accumulated by a dispatcher are
/// exposed through its own accessors.
pub trait Dispatcher {
    type Action: Action;

    /// Clear all accumulated state.
    fn reset(&mut self);

    /// Perform `action`.
    ///
    /// `token` is the current input token, or `None` at the end of input.
    fn invoke(&mut self, cx: Context<'_>, token: Option<&str>, action: Self::Action) -> bool;
}

impl<D: ?Sized + Dispatcher> Dispatcher for &mut D {
    type Action = D::Action;

    fn reset(&mut self) {
        (**self).reset()
    }

    fn invoke(&mut self, cx: Context<'_>, token: Option<&str>, action: Self::Action) -> bool {
        (**self).invoke(cx, token, action)
    }
}

/// An action type accepting every name and meaning nothing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ignored;

impl Action for Ignored {
    fn from_name(_: &str) -> Option<Self> {
        Some(Ignored)
    }
}

/// A dispatcher that only recognizes its input.
#[derive(Debug, Default, Copy, Clone)]
pub struct Recognizer;

impl Dispatcher for Recognizer {
    type Action = Ignored;

    fn reset(&mut self) {}

    fn invoke(&mut self, _: Context<'_>, _: Option<&str>, _: Ignored) -> bool {
        true
    }
}
