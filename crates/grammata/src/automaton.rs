//! Table-driven finite-state token automaton.

use crate::{
    action::{Action, Context, Dispatcher},
    types::{Map, Set},
    util::token_str,
};
use std::marker::PhantomData;

/// The end-state sentinel of a transition.
pub const HALT: &str = "HALT";

/// The reserved token group matching the end of the token stream.
pub const END: &str = "$end";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateID {
    raw: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct GroupID {
    raw: usize,
}

impl GroupID {
    /// The group of the synthetic end-of-stream token.
    pub const END: Self = Self::new(0);

    #[inline]
    const fn new(raw: usize) -> Self {
        Self { raw }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Target {
    State(StateID),
    Halt,
}

#[derive(Debug, Copy, Clone)]
pub struct Transition<A> {
    pub target: Target,
    pub action: Option<A>,
}

/// A finite-state machine over a token alphabet partitioned into named groups.
#[derive(Debug)]
pub struct Automaton<A> {
    states: Set<String>,
    groups: Set<String>,
    tokens: Map<String, GroupID>,
    start: StateID,
    transitions: Map<(StateID, GroupID), Transition<A>>,
}

impl<A: Action> Automaton<A> {
    /// Define an automaton using the specified function.
    pub fn define<F>(f: F) -> Result<Self, AutomatonError>
    where
        F: FnOnce(&mut AutomatonDef<'_, A>) -> Result<(), AutomatonError>,
    {
        let mut groups = Set::default();
        groups.insert(END.to_owned());

        let mut def = AutomatonDef {
            states: Set::default(),
            groups,
            tokens: Map::default(),
            start: None,
            transitions: Map::default(),
            _marker: PhantomData,
        };
        f(&mut def)?;
        def.end()
    }

    pub fn start_state(&self) -> &str {
        &self.states[self.start.raw]
    }

    pub fn states(&self) -> impl Iterator<Item = &str> + '_ {
        self.states.iter().map(String::as_str)
    }

    /// Return the name of the group the token belongs to.
    pub fn group_of(&self, token: &str) -> Option<&str> {
        self.tokens
            .get(token)
            .map(|group| self.groups[group.raw].as_str())
    }

    /// Feed the token stream through the automaton.
    ///
    /// The stream is followed by one synthetic end-of-stream token, and the
    /// input is accepted when that token has a transition. Unknown tokens,
    /// missing transitions and failed actions reject the input.
    pub fn parse<D, I>(&self, dispatcher: &mut D, tokens: I) -> bool
    where
        D: Dispatcher<Action = A>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        dispatcher.reset();

        let mut current = self.start;
        let mut tokens = tokens.into_iter();
        loop {
            let next = tokens.next();
            let token = token_str(&next);

            let group = match token {
                Some(token) => match self.tokens.get(token) {
                    Some(group) => *group,
                    None => {
                        tracing::trace!("token {:?} is not in the alphabet", token);
                        return false;
                    }
                },
                None => GroupID::END,
            };

            let transition = match self.transitions.get(&(current, group)) {
                Some(transition) => transition,
                None => {
                    tracing::trace!(
                        "no transition from `{}' on group `{}'",
                        self.states[current.raw],
                        self.groups[group.raw]
                    );
                    return false;
                }
            };

            if let Some(action) = transition.action {
                let cx = Context::Automaton {
                    state: &self.states[current.raw],
                };
                if !dispatcher.invoke(cx, token, action) {
                    return false;
                }
            }

            match (transition.target, token) {
                (_, None) => return true,
                (Target::State(next), Some(..)) => current = next,
                (Target::Halt, Some(..)) => return false,
            }
        }
    }
}

/// The contextual values for building an `Automaton`.
#[derive(Debug)]
pub struct AutomatonDef<'def, A> {
    states: Set<String>,
    groups: Set<String>,
    tokens: Map<String, GroupID>,
    start: Option<String>,
    transitions: Map<(StateID, GroupID), (String, Option<A>)>,
    _marker: PhantomData<&'def mut ()>,
}

impl<'def, A: Action> AutomatonDef<'def, A> {
    /// Declare a state.
    pub fn state(&mut self, name: &str) -> Result<(), AutomatonError> {
        if name.is_empty() || name == HALT {
            return Err(AutomatonError::Malformed {
                msg: format!("incorrect state name: `{}'", name),
            });
        }
        if !self.states.insert(name.to_owned()) {
            return Err(AutomatonError::DuplicateState(name.to_owned()));
        }
        Ok(())
    }

    /// Specify the start state.
    pub fn start_state(&mut self, name: &str) -> Result<(), AutomatonError> {
        self.start.replace(name.to_owned());
        Ok(())
    }

    /// Declare a token group.
    ///
    /// A group without members stands for the single token spelled as the
    /// group name.
    pub fn token_group<'t, I>(&mut self, name: &str, members: I) -> Result<(), AutomatonError>
    where
        I: IntoIterator<Item = &'t str>,
    {
        if name.is_empty() || name == END {
            return Err(AutomatonError::Malformed {
                msg: format!("incorrect token group name: `{}'", name),
            });
        }
        let (index, added) = self.groups.insert_full(name.to_owned());
        if !added {
            return Err(AutomatonError::DuplicateGroup(name.to_owned()));
        }
        let id = GroupID::new(index);

        let mut is_empty = true;
        for token in members {
            is_empty = false;
            if token.is_empty() {
                return Err(AutomatonError::Malformed {
                    msg: format!("empty token in group `{}'", name),
                });
            }
            if self.tokens.insert(token.to_owned(), id).is_some() {
                return Err(AutomatonError::DuplicateToken(token.to_owned()));
            }
        }

        if is_empty && self.tokens.insert(name.to_owned(), id).is_some() {
            return Err(AutomatonError::EmptyGroupCollision(name.to_owned()));
        }

        Ok(())
    }

    /// Declare the transition from `state` on a token of `group`.
    ///
    /// `end` is either a state name or `HALT`, which may also be declared
    /// after this call.
    pub fn transition(
        &mut self,
        state: &str,
        group: &str,
        end: &str,
        action: Option<&str>,
    ) -> Result<(), AutomatonError> {
        let state_id = self
            .states
            .get_index_of(state)
            .map(|raw| StateID { raw })
            .ok_or_else(|| AutomatonError::UnknownState(state.to_owned()))?;
        let group_id = self
            .groups
            .get_index_of(group)
            .map(GroupID::new)
            .ok_or_else(|| AutomatonError::UnknownGroup(group.to_owned()))?;

        let action = match action {
            Some(name) => Some(
                A::from_name(name).ok_or_else(|| AutomatonError::UnknownAction(name.to_owned()))?,
            ),
            None => None,
        };

        if self.transitions.contains_key(&(state_id, group_id)) {
            return Err(AutomatonError::AmbiguousTransition {
                state: state.to_owned(),
                group: group.to_owned(),
            });
        }
        self.transitions
            .insert((state_id, group_id), (end.to_owned(), action));

        Ok(())
    }

    fn end(self) -> Result<Automaton<A>, AutomatonError> {
        let start = match self.start {
            Some(start) => self
                .states
                .get_index_of(&start)
                .map(|raw| StateID { raw })
                .ok_or(AutomatonError::UnknownStartState(start))?,
            None => return Err(AutomatonError::MissingStartState),
        };

        let mut transitions = Map::default();
        for ((state, group), (end, action)) in self.transitions {
            let target = match self.states.get_index_of(&end) {
                Some(raw) => Target::State(StateID { raw }),
                None if end == HALT || group == GroupID::END => Target::Halt,
                None => return Err(AutomatonError::UnknownEndState(end)),
            };
            transitions.insert((state, group), Transition { target, action });
        }

        if !transitions.keys().any(|(_, group)| *group == GroupID::END) {
            return Err(AutomatonError::MissingHaltTransition);
        }

        tracing::debug!(
            "automaton: {} states, {} token groups, {} transitions",
            self.states.len(),
            self.groups.len(),
            transitions.len()
        );

        Ok(Automaton {
            states: self.states,
            groups: self.groups,
            tokens: self.tokens,
            start,
            transitions,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AutomatonError {
    #[error("malformed description: {}", msg)]
    Malformed { msg: String },

    #[error("encountered duplicate state: `{}'", _0)]
    DuplicateState(String),

    #[error("encountered duplicate token group: `{}'", _0)]
    DuplicateGroup(String),

    #[error("encountered duplicate token: `{}'", _0)]
    DuplicateToken(String),

    #[error("group `{}' cannot be empty: token `{}' exists", _0, _0)]
    EmptyGroupCollision(String),

    #[error("state not in state set: `{}'", _0)]
    UnknownState(String),

    #[error("token group not declared: `{}'", _0)]
    UnknownGroup(String),

    #[error("end state is neither a state nor HALT: `{}'", _0)]
    UnknownEndState(String),

    #[error("transition ambiguity encountered at (`{}', `{}')", state, group)]
    AmbiguousTransition { state: String, group: String },

    #[error("start state not in state set: `{}'", _0)]
    UnknownStartState(String),

    #[error("the start state is not specified")]
    MissingStartState,

    #[error("HALT transition missing")]
    MissingHaltTransition,

    #[error("unknown action: `{}'", _0)]
    UnknownAction(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Ignored, Recognizer};

    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum Act {
        Push,
        Fail,
    }
    impl Action for Act {
        fn from_name(name: &str) -> Option<Self> {
            match name {
                "push" => Some(Self::Push),
                "fail" => Some(Self::Fail),
                _ => None,
            }
        }
    }

    #[derive(Debug, Default)]
    struct Collect {
        seen: Vec<(String, String)>,
    }
    impl Dispatcher for Collect {
        type Action = Act;
        fn reset(&mut self) {
            self.seen.clear();
        }
        fn invoke(&mut self, cx: Context<'_>, token: Option<&str>, action: Act) -> bool {
            let state = match cx {
                Context::Automaton { state } => state.to_owned(),
                _ => unreachable!(),
            };
            self.seen.push((state, token.unwrap_or("$").to_owned()));
            action == Act::Push
        }
    }

    /// `a b` followed by the end of the stream.
    fn ab<A: Action>(action: Option<&str>) -> Automaton<A> {
        Automaton::define(|def| {
            def.state("q0")?;
            def.state("q1")?;
            def.state("q2")?;
            def.start_state("q0")?;
            def.token_group("a", None)?;
            def.token_group("b", None)?;
            def.transition("q0", "a", "q1", action)?;
            def.transition("q1", "b", "q2", action)?;
            def.transition("q2", END, HALT, None)?;
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn accepts_ab() {
        let automaton = ab::<Ignored>(None);
        assert!(automaton.parse(&mut Recognizer, ["a", "b"]));
        assert!(!automaton.parse(&mut Recognizer, ["a", "a"]));
        assert!(!automaton.parse(&mut Recognizer, ["a"]));
        assert!(!automaton.parse(&mut Recognizer, ["a", "b", "b"]));
        assert!(!automaton.parse(&mut Recognizer, ["a", "c"]));
    }

    #[test]
    fn dispatches_actions() {
        let automaton = ab::<Act>(Some("push"));
        let mut collect = Collect::default();
        assert!(automaton.parse(&mut collect, ["a", "b"]));
        assert_eq!(
            collect.seen,
            [("q0".into(), "a".into()), ("q1".into(), "b".into())]
        );

        let first = collect.seen.clone();
        assert!(automaton.parse(&mut collect, ["a", "b"]));
        assert_eq!(collect.seen, first);

        let automaton = ab::<Act>(Some("fail"));
        assert!(!automaton.parse(&mut collect, ["a", "b"]));
        assert_eq!(collect.seen.len(), 1);
    }

    #[test]
    fn token_groups() {
        let automaton = Automaton::<Ignored>::define(|def| {
            def.state("s")?;
            def.start_state("s")?;
            def.token_group("digit", ["0", "1", "2"])?;
            def.token_group("x", [])?;
            def.transition("s", "digit", "s", None)?;
            def.transition("s", END, HALT, None)?;
            Ok(())
        })
        .unwrap();
        assert_eq!(automaton.group_of("1"), Some("digit"));
        assert_eq!(automaton.group_of("x"), Some("x"));
        assert!(automaton.parse(&mut Recognizer, ["0", "2", "1"]));
        assert!(automaton.parse(&mut Recognizer, Vec::<&str>::new()));
        assert!(!automaton.parse(&mut Recognizer, ["0", "x"]));
    }

    #[test]
    fn halt_before_end_rejects() {
        let automaton = Automaton::<Ignored>::define(|def| {
            def.state("s")?;
            def.start_state("s")?;
            def.token_group("a", None)?;
            def.transition("s", "a", HALT, None)?;
            def.transition("s", END, HALT, None)?;
            Ok(())
        })
        .unwrap();
        assert!(automaton.parse(&mut Recognizer, Vec::<String>::new()));
        assert!(!automaton.parse(&mut Recognizer, ["a"]));
    }

    fn define(
        f: impl FnOnce(&mut AutomatonDef<'_, Ignored>) -> Result<(), AutomatonError>,
    ) -> AutomatonError {
        Automaton::<Ignored>::define(|def| {
            def.state("s")?;
            def.start_state("s")?;
            def.token_group("a", None)?;
            f(def)?;
            def.transition("s", END, HALT, None)
        })
        .unwrap_err()
    }

    #[test]
    fn description_errors() {
        assert!(matches!(
            define(|def| def.state("s")),
            AutomatonError::DuplicateState(s) if s == "s"
        ));
        assert!(matches!(
            define(|def| def.token_group("b", ["a"])),
            AutomatonError::DuplicateToken(t) if t == "a"
        ));
        assert!(matches!(
            define(|def| def.token_group("a", ["z"])),
            AutomatonError::DuplicateGroup(..)
        ));
        assert!(matches!(
            define(|def| {
                def.token_group("b", ["c"])?;
                def.token_group("c", [])
            }),
            AutomatonError::EmptyGroupCollision(..)
        ));
        assert!(matches!(
            define(|def| {
                def.transition("s", "a", "s", None)?;
                def.transition("s", "a", HALT, None)
            }),
            AutomatonError::AmbiguousTransition { .. }
        ));
        assert!(matches!(
            define(|def| def.transition("t", "a", "s", None)),
            AutomatonError::UnknownState(..)
        ));
        assert!(matches!(
            define(|def| def.transition("s", "b", "s", None)),
            AutomatonError::UnknownGroup(..)
        ));
        assert!(matches!(
            define(|def| def.transition("s", "a", "nowhere", None)),
            AutomatonError::UnknownEndState(..)
        ));
        assert!(matches!(
            define(|def| def.state("")),
            AutomatonError::Malformed { .. }
        ));
    }

    #[test]
    fn missing_halt_transition() {
        let err = Automaton::<Ignored>::define(|def| {
            def.state("s")?;
            def.start_state("s")?;
            def.token_group("a", None)?;
            def.transition("s", "a", "s", None)
        })
        .unwrap_err();
        assert!(matches!(err, AutomatonError::MissingHaltTransition));
    }

    #[test]
    fn start_state_errors() {
        let err = Automaton::<Ignored>::define(|def| {
            def.state("s")?;
            def.token_group("a", None)?;
            def.transition("s", END, HALT, None)
        })
        .unwrap_err();
        assert!(matches!(err, AutomatonError::MissingStartState));

        let err = Automaton::<Ignored>::define(|def| {
            def.state("s")?;
            def.start_state("t")?;
            def.transition("s", END, HALT, None)
        })
        .unwrap_err();
        assert!(matches!(err, AutomatonError::UnknownStartState(s) if s == "t"));
    }

    #[test]
    fn unknown_action() {
        let err = Automaton::<Act>::define(|def| {
            def.state("s")?;
            def.start_state("s")?;
            def.token_group("a", None)?;
            def.transition("s", "a", "s", Some("jump"))
        })
        .unwrap_err();
        assert!(matches!(err, AutomatonError::UnknownAction(name) if name == "jump"));
    }
}
