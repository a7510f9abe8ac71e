//! Detects duplicated names in a stream of declaration tokens.

use grammata::{
    action::{Action, Context, Dispatcher},
    types::Set,
};
use std::mem;

pub const GRAMMAR: &str = include_str!("../../grammars/declarations.gram");

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeclarationAction {
    Advance,
    StartName,
    AddChar,
    CheckId,
}

impl Action for DeclarationAction {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "advance" => Some(Self::Advance),
            "start_name" => Some(Self::StartName),
            "add_char" => Some(Self::AddChar),
            "check_id" => Some(Self::CheckId),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Declarations {
    counter: usize,
    name_start: usize,
    buffer: String,
    names: Set<String>,
    duplicate: Option<String>,
}

impl Declarations {
    /// The index of the token the parse stopped at.
    ///
    /// For a duplicated name this is the first token of its second declaration.
    pub fn error_token(&self) -> usize {
        self.counter
    }

    pub fn duplicate(&self) -> Option<&str> {
        self.duplicate.as_deref()
    }

    /// The declared names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }
}

impl Dispatcher for Declarations {
    type Action = DeclarationAction;

    fn reset(&mut self) {
        self.counter = 0;
        self.name_start = 0;
        self.buffer.clear();
        self.names.clear();
        self.duplicate = None;
    }

    fn invoke(&mut self, _: Context<'_>, token: Option<&str>, action: DeclarationAction) -> bool {
        match action {
            DeclarationAction::Advance => self.counter += 1,
            DeclarationAction::StartName => {
                self.name_start = self.counter;
                self.buffer.clear();
                self.counter += 1;
            }
            DeclarationAction::AddChar => {
                self.buffer.push_str(token.unwrap_or_default());
                self.counter += 1;
            }
            DeclarationAction::CheckId => {
                let name = mem::take(&mut self.buffer);
                if self.names.contains(&name) {
                    tracing::debug!("duplicated name: {}", name);
                    self.duplicate = Some(name);
                    self.counter = self.name_start;
                    return false;
                }
                self.names.insert(name);
            }
        }
        true
    }
}
