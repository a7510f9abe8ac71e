//! Task-specific dispatchers and the pipelines driving them.

pub mod declarations;
pub mod lexer;
pub mod rpn;

use self::{
    declarations::{DeclarationAction, Declarations},
    lexer::{Lexer, LexerAction},
};
use grammata::{
    action::{Action, Dispatcher},
    grammar::RuleSet,
    ll::LLTable,
    lr1::LRTable,
    util::display_fn,
};
use std::fmt;

/// The table generator used to build a recognizer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum Engine {
    /// LL(1) table with deferred return actions.
    Ll,
    /// Canonical LR(1) table.
    Lr,
}

/// A parse table built by either engine.
#[derive(Debug)]
pub enum Table<A> {
    LL(LLTable<A>),
    LR(LRTable<A>),
}

impl<A: Action> Table<A> {
    pub fn build(engine: Engine, grammar: &RuleSet) -> anyhow::Result<Self> {
        Ok(match engine {
            Engine::Ll => Self::LL(LLTable::build(grammar)?),
            Engine::Lr => Self::LR(LRTable::build(grammar)?),
        })
    }

    /// Parse a grammar description and build the table for it.
    pub fn from_source(engine: Engine, source: &str) -> anyhow::Result<Self> {
        let grammar = RuleSet::from_str(source)?;
        tracing::trace!("grammar:\n{}", grammar);
        Self::build(engine, &grammar)
    }

    pub fn parse<D, I>(&self, dispatcher: &mut D, tokens: I) -> bool
    where
        D: Dispatcher<Action = A>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        match self {
            Self::LL(table) => table.parse(dispatcher, tokens),
            Self::LR(table) => table.parse(dispatcher, tokens),
        }
    }

    /// Count the shift/reduce collisions resolved while building the table.
    pub fn num_conflicts(&self) -> usize {
        match self {
            Self::LL(..) => 0,
            Self::LR(table) => table.conflicts().len(),
        }
    }
}

impl<A: Action> fmt::Display for Table<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LL(table) => table.fmt(f),
            Self::LR(table) => table.fmt(f),
        }
    }
}

/// The outcome of checking a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect {
        line: usize,
        column: usize,
    },
    Duplicate {
        name: String,
        line: usize,
        column: usize,
    },
    NotGrammar,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Correct => f.write_str("CORRECT"),
            Self::Incorrect { line, column } => write!(f, "INCORRECT {}:{}", line, column),
            Self::Duplicate { name, line, column } => {
                write!(f, "DUPLICATE {} {}:{}", name, line, column)
            }
            Self::NotGrammar => f.write_str("NOT GRAMMAR"),
        }
    }
}

/// Two-stage pipeline: characters to tokens, then tokens to declarations.
#[derive(Debug)]
pub struct Checker {
    lexer: Table<LexerAction>,
    syntax: Table<DeclarationAction>,
    keywords: Vec<String>,
}

impl Checker {
    pub fn new(
        engine: Engine,
        lexer: &str,
        syntax: &str,
        keywords: Vec<String>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            lexer: Table::from_source(engine, lexer)?,
            syntax: Table::from_source(engine, syntax)?,
            keywords,
        })
    }

    pub fn lexer_table(&self) -> &Table<LexerAction> {
        &self.lexer
    }

    pub fn syntax_table(&self) -> &Table<DeclarationAction> {
        &self.syntax
    }

    pub fn check(&self, input: &str) -> Verdict {
        let mut lexer = if self.keywords.is_empty() {
            Lexer::new(lexer::KEYWORDS.iter().copied())
        } else {
            Lexer::new(self.keywords.iter().map(String::as_str))
        };
        if !self.lexer.parse(&mut lexer, grammata::chars(input)) {
            let pos = lexer.position();
            return Verdict::Incorrect {
                line: pos.line,
                column: pos.column,
            };
        }
        tracing::debug!(
            "tokens: {}",
            display_fn(|f| {
                for (token, pos) in lexer.tokens().iter().zip(lexer.positions()) {
                    write!(f, "{}@{} ", token, pos)?;
                }
                Ok(())
            })
        );

        let mut declarations = Declarations::default();
        if self.syntax.parse(&mut declarations, lexer.tokens()) {
            tracing::debug!("declared: {:?}", declarations.names().collect::<Vec<_>>());
            return Verdict::Correct;
        }

        let pos = lexer.position_of(declarations.error_token());
        match declarations.duplicate() {
            Some(name) => Verdict::Duplicate {
                name: name.to_owned(),
                line: pos.line,
                column: pos.column,
            },
            None => Verdict::Incorrect {
                line: pos.line,
                column: pos.column,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(engine: Engine) -> Checker {
        Checker::new(engine, lexer::GRAMMAR, declarations::GRAMMAR, vec![]).unwrap()
    }

    fn check_all(input: &str) -> Verdict {
        let ll = checker(Engine::Ll).check(input);
        let lr = checker(Engine::Lr).check(input);
        assert_eq!(ll, lr, "engines disagree on {:?}", input);
        ll
    }

    #[test]
    fn correct_declarations() {
        assert_eq!(check_all("int a, b;\nlong long c[10][2];\n"), Verdict::Correct);
        assert_eq!(check_all("unsigned short *p, x_1;"), Verdict::Correct);
        assert_eq!(check_all(""), Verdict::Correct);
    }

    #[test]
    fn duplicate_names() {
        assert_eq!(
            check_all("int a;\nint a;"),
            Verdict::Duplicate {
                name: "a".into(),
                line: 2,
                column: 5,
            }
        );
        assert_eq!(
            check_all("char abc, *abc;"),
            Verdict::Duplicate {
                name: "abc".into(),
                line: 1,
                column: 12,
            }
        );
    }

    #[test]
    fn incorrect_positions() {
        // a name cannot start with a digit
        assert_eq!(check_all("int 1a;"), Verdict::Incorrect { line: 1, column: 5 });
        // missing semicolon
        assert_eq!(check_all("int a"), Verdict::Incorrect { line: 1, column: 6 });
        // rejected by the lexer
        assert_eq!(check_all("int a$;"), Verdict::Incorrect { line: 1, column: 6 });
        // unknown type
        assert_eq!(
            check_all("int a;\n  foo b;"),
            Verdict::Incorrect { line: 2, column: 3 }
        );
    }

    #[test]
    fn custom_keywords() {
        let checker = Checker::new(
            Engine::Ll,
            lexer::GRAMMAR,
            declarations::GRAMMAR,
            vec!["int".into()],
        )
        .unwrap();
        assert_eq!(checker.check("int a;"), Verdict::Correct);
        assert_eq!(
            checker.check("long a;"),
            Verdict::Incorrect { line: 1, column: 1 }
        );
    }

    #[test]
    fn not_a_grammar() {
        assert!(Checker::new(Engine::Lr, "A -: a", declarations::GRAMMAR, vec![]).is_err());
        assert!(Checker::new(Engine::Ll, lexer::GRAMMAR, "A -: A a | b ;", vec![]).is_err());
    }

    #[test]
    fn verdict_format() {
        assert_eq!(Verdict::Correct.to_string(), "CORRECT");
        assert_eq!(
            Verdict::Duplicate {
                name: "x".into(),
                line: 3,
                column: 7,
            }
            .to_string(),
            "DUPLICATE x 3:7"
        );
        assert_eq!(Verdict::NotGrammar.to_string(), "NOT GRAMMAR");
    }
}
