//! Splits C source text into the token stream of the declaration checker.

use grammata::{
    action::{Action, Context, Dispatcher},
    types::Set,
};
use std::{fmt, mem};

pub const GRAMMAR: &str = include_str!("../../grammars/c_lexer.gram");

/// Words passed through as they are; any other word becomes `nkw`
/// followed by one token per character.
pub const KEYWORDS: &[&str] = &[
    "bool", "char", "double", "float", "int", "long", "short", "signed", "unsigned",
];

const NOT_KEYWORD: &str = "nkw";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LexerAction {
    AddChar,
    Append,
    DelimChar,
    Flush,
}

impl Action for LexerAction {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "add_char" => Some(Self::AddChar),
            "append" => Some(Self::Append),
            "delim_char" => Some(Self::DelimChar),
            "flush" => Some(Self::Flush),
            _ => None,
        }
    }
}

/// A 1-based line and column.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    const START: Self = Self { line: 1, column: 1 };
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug)]
pub struct Lexer {
    keywords: Set<String>,
    tokens: Vec<String>,
    positions: Vec<Position>,
    buffer: String,
    start: Position,
    current: Position,
}

impl Lexer {
    pub fn new<'k, I>(keywords: I) -> Self
    where
        I: IntoIterator<Item = &'k str>,
    {
        Self {
            keywords: keywords.into_iter().map(ToOwned::to_owned).collect(),
            tokens: vec![],
            positions: vec![],
            buffer: String::new(),
            start: Position::START,
            current: Position::START,
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens[..]
    }

    /// The position of each token, index by index.
    pub fn positions(&self) -> &[Position] {
        &self.positions[..]
    }

    /// The position of the character the lexer stopped at.
    pub fn position(&self) -> Position {
        self.current
    }

    /// The position of a token, or the end position past the last one.
    pub fn position_of(&self, index: usize) -> Position {
        self.positions.get(index).copied().unwrap_or(self.current)
    }

    fn advance(&mut self, ch: &str) {
        if ch == "\n" {
            self.current.line += 1;
            self.current.column = 1;
        } else {
            self.current.column += 1;
        }
    }

    fn push_word(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let word = mem::take(&mut self.buffer);
        if self.keywords.contains(&word) {
            self.tokens.push(word);
            self.positions.push(self.start);
            return;
        }

        self.tokens.push(NOT_KEYWORD.to_owned());
        self.positions.push(self.start);
        let mut pos = self.start;
        for ch in grammata::chars(&word) {
            self.tokens.push(ch.to_owned());
            self.positions.push(pos);
            pos.column += 1;
        }
    }
}

impl Dispatcher for Lexer {
    type Action = LexerAction;

    fn reset(&mut self) {
        self.tokens.clear();
        self.positions.clear();
        self.buffer.clear();
        self.start = Position::START;
        self.current = Position::START;
    }

    fn invoke(&mut self, _: Context<'_>, token: Option<&str>, action: LexerAction) -> bool {
        match (action, token) {
            (LexerAction::AddChar, Some(ch)) => {
                if self.buffer.is_empty() {
                    self.start = self.current;
                }
                self.buffer.push_str(ch);
                self.advance(ch);
            }
            (LexerAction::Append, Some(ch)) => {
                self.push_word();
                self.tokens.push(ch.to_owned());
                self.positions.push(self.current);
                self.advance(ch);
            }
            (LexerAction::DelimChar, Some(ch)) => {
                self.push_word();
                self.advance(ch);
            }
            (LexerAction::Flush, _) => self.push_word(),
            (_, None) => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{Engine, Table};

    fn lex(engine: Engine, input: &str) -> Option<Lexer> {
        let table = Table::<LexerAction>::from_source(engine, GRAMMAR).unwrap();
        let mut lexer = Lexer::new(KEYWORDS.iter().copied());
        table
            .parse(&mut lexer, grammata::chars(input))
            .then_some(lexer)
    }

    #[test]
    fn smoketest() {
        for engine in [Engine::Ll, Engine::Lr] {
            let lexer = lex(engine, "int ab,\n *c[2];").unwrap();
            assert_eq!(
                lexer.tokens(),
                ["int", "nkw", "a", "b", ",", "*", "nkw", "c", "[", "nkw", "2", "]", ";"]
            );
            let at = |line, column| Position { line, column };
            assert_eq!(
                lexer.positions(),
                [
                    at(1, 1),
                    at(1, 5),
                    at(1, 5),
                    at(1, 6),
                    at(1, 7),
                    at(2, 2),
                    at(2, 3),
                    at(2, 3),
                    at(2, 4),
                    at(2, 5),
                    at(2, 5),
                    at(2, 6),
                    at(2, 7),
                ]
            );
            assert_eq!(lexer.position(), at(2, 8));
        }
    }

    #[test]
    fn stops_at_unknown_characters() {
        for engine in [Engine::Ll, Engine::Lr] {
            let table = Table::<LexerAction>::from_source(engine, GRAMMAR).unwrap();
            let mut lexer = Lexer::new(KEYWORDS.iter().copied());
            assert!(!table.parse(&mut lexer, grammata::chars("int\n  a@b;")));
            assert_eq!(lexer.position(), Position { line: 2, column: 4 });
        }
    }

    #[test]
    fn reset_between_runs() {
        let table = Table::<LexerAction>::from_source(Engine::Ll, GRAMMAR).unwrap();
        let mut lexer = Lexer::new(KEYWORDS.iter().copied());
        assert!(table.parse(&mut lexer, grammata::chars("long x;")));
        let first = lexer.tokens().to_vec();
        assert!(table.parse(&mut lexer, grammata::chars("long x;")));
        assert_eq!(lexer.tokens(), first);
    }
}
