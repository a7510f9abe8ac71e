//! Grammar types.

mod description;

pub use self::description::DescriptionParser;

use crate::{action::Action, symbol::Symbol, types::Set, util::display_fn};
use std::{fmt, fs, io, path::Path};

/// A production rule together with its semantic actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    left: String,
    right: Vec<Symbol>,
    left_action: Option<String>,
    right_actions: Vec<Option<String>>,
}

impl Rule {
    pub fn new(left: impl Into<String>, left_action: Option<&str>) -> Self {
        Self {
            left: left.into(),
            right: vec![],
            left_action: left_action.map(ToOwned::to_owned),
            right_actions: vec![],
        }
    }

    /// Append a symbol to the right-hand side.
    pub fn push(&mut self, symbol: Symbol, action: Option<&str>) {
        self.right.push(symbol);
        self.right_actions.push(action.map(ToOwned::to_owned));
    }

    pub fn with(mut self, symbol: Symbol, action: Option<&str>) -> Self {
        self.push(symbol, action);
        self
    }

    /// Return the left-hand side of this production.
    pub fn left(&self) -> &str {
        &self.left
    }

    /// Return the right-hand side of this production.
    pub fn right(&self) -> &[Symbol] {
        &self.right[..]
    }

    pub fn left_action(&self) -> Option<&str> {
        self.left_action.as_deref()
    }

    /// Return the actions attached to the right-hand symbols, position by position.
    pub fn right_actions(&self) -> impl ExactSizeIterator<Item = Option<&str>> + '_ {
        self.right_actions.iter().map(Option::as_deref)
    }

    pub(crate) fn right_action(&self, index: usize) -> Option<&str> {
        self.right_actions.get(index).and_then(Option::as_deref)
    }

    // `"Left <act> -: a <act> B"`
    pub fn display(&self) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            f.write_str(&self.left)?;
            if let Some(action) = &self.left_action {
                write!(f, " <{}>", action)?;
            }
            f.write_str(" -:")?;
            for (symbol, action) in self.right.iter().zip(&self.right_actions) {
                write!(f, " {}", symbol)?;
                if let Some(action) = action {
                    write!(f, " <{}>", action)?;
                }
            }
            Ok(())
        })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display().fmt(f)
    }
}

/// An ordered list of rules.
///
/// The left-hand side of the first rule is the start symbol. A rule with
/// nothing on its right-hand side is stored as the empty production `A -: ~`.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    nonterminals: Set<String>,
    symbols: Set<Symbol>,
}

impl RuleSet {
    pub fn new<I>(rules: I) -> Result<Self, GrammarError>
    where
        I: IntoIterator<Item = Rule>,
    {
        let rules: Vec<Rule> = rules
            .into_iter()
            .map(|rule| {
                if rule.right.is_empty() {
                    rule.with(Symbol::Epsilon, None)
                } else {
                    rule
                }
            })
            .collect();
        if rules.is_empty() {
            return Err(GrammarError::Empty);
        }

        let nonterminals: Set<String> = rules.iter().map(|rule| rule.left.clone()).collect();

        let mut symbols = Set::default();
        for rule in &rules {
            symbols.insert(Symbol::Nonterminal(rule.left.clone()));
            for symbol in &rule.right {
                match symbol {
                    Symbol::Nonterminal(name) if !nonterminals.contains(name) => {
                        return Err(GrammarError::UndefinedNonterminal(name.clone()));
                    }
                    Symbol::EndOfInput => {
                        return Err(GrammarError::ReservedSymbol {
                            left: rule.left.clone(),
                        });
                    }
                    Symbol::Epsilon => (),
                    symbol => {
                        symbols.insert(symbol.clone());
                    }
                }
            }
        }

        Ok(Self {
            rules,
            nonterminals,
            symbols,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GrammarError> {
        let source = fs::read_to_string(path).map_err(GrammarError::IO)?;
        Self::from_str(&source)
    }

    /// Parse a grammar description with the shared description parser.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(source: &str) -> Result<Self, GrammarError> {
        Self::parse_with(DescriptionParser::get(), source)
    }

    pub fn parse_with(parser: &DescriptionParser, source: &str) -> Result<Self, GrammarError> {
        parser.parse(source)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules[..]
    }

    /// Return the start symbol.
    pub fn start(&self) -> &str {
        self.rules[0].left()
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &str> + '_ {
        self.nonterminals.iter().map(String::as_str)
    }

    pub fn is_nonterminal(&self, name: &str) -> bool {
        self.nonterminals.contains(name)
    }

    /// Return every symbol occurring in the rules, except the empty marker.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.symbols.iter()
    }

    /// Iterate over the rules whose left-hand side is `name`, with their indices.
    pub fn rules_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = (usize, &'a Rule)> + 'a {
        self.rules
            .iter()
            .enumerate()
            .filter(move |(_, rule)| rule.left() == name)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## nonterminals:")?;
        for nonterminal in &self.nonterminals {
            write!(f, "{}", nonterminal)?;
            if nonterminal == self.start() {
                write!(f, " (start)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## rules:")?;
        for (i, rule) in self.rules.iter().enumerate() {
            writeln!(f, "[{:02}] {}", i, rule)?;
        }

        Ok(())
    }
}

/// Resolve an optional action name against the closed action set `A`.
pub(crate) fn resolve_action<A: Action>(name: Option<&str>) -> Result<Option<A>, GrammarError> {
    name.map(|name| A::from_name(name).ok_or_else(|| GrammarError::UnknownAction(name.to_owned())))
        .transpose()
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("IO error: {}", _0)]
    IO(io::Error),

    #[error("not a grammar: unexpected input at {}:{}", line, column)]
    NotGrammar { line: usize, column: usize },

    #[error("invalid action name `{}' at {}:{}", name, line, column)]
    InvalidActionName {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("the grammar has no rules")]
    Empty,

    #[error("nonterminal without any rules: `{}'", _0)]
    UndefinedNonterminal(String),

    #[error("the end of input cannot occur in the rules of `{}'", left)]
    ReservedSymbol { left: String },

    #[error("unknown action: `{}'", _0)]
    UnknownAction(String),
}

fn verify_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if is_ident_start(first) => chars.all(is_ident_continue),
        _ => false,
    }
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || unicode_ident::is_xid_start(ch)
}

fn is_ident_continue(ch: char) -> bool {
    unicode_ident::is_xid_continue(ch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{CharRange, CharSet};

    fn rule(left: &str, right: &[Symbol]) -> Rule {
        right
            .iter()
            .fold(Rule::new(left, None), |rule, symbol| rule.with(symbol.clone(), None))
    }

    #[test]
    fn smoketest() {
        let grammar = RuleSet::from_str(
            r#"
            # expressions
            E <expr> -: T Tail ;
            Tail -: + <plus> T Tail | ~ ;
            T -: [0-9] <digit> ;
            "#,
        )
        .unwrap();

        assert_eq!(grammar.start(), "E");
        assert_eq!(grammar.nonterminals().collect::<Vec<_>>(), ["E", "Tail", "T"]);
        assert_eq!(grammar.rules().len(), 4);

        let first = &grammar.rules()[0];
        assert_eq!(first.left_action(), Some("expr"));
        assert_eq!(
            first.right(),
            [Symbol::nonterminal("T"), Symbol::nonterminal("Tail")]
        );

        let plus = &grammar.rules()[1];
        assert_eq!(plus.left_action(), None);
        assert_eq!(plus.right()[0], Symbol::terminal("+"));
        assert_eq!(
            plus.right_actions().collect::<Vec<_>>(),
            [Some("plus"), None, None]
        );

        assert_eq!(grammar.rules()[2].right(), [Symbol::Epsilon]);

        let digits = CharSet::new([CharRange::new('0', '9').unwrap()]);
        assert_eq!(grammar.rules()[3].right(), [Symbol::CharSet(digits)]);
        assert_eq!(grammar.rules_of("Tail").count(), 2);
    }

    #[test]
    fn actions_stay_aligned() {
        let mut rule = Rule::new("A", None);
        rule.push(Symbol::terminal("a"), None);
        rule.push(Symbol::terminal("b"), Some("b"));
        rule.push(Symbol::nonterminal("A"), None);
        assert_eq!(rule.right().len(), rule.right_actions().len());
        assert_eq!(rule.right_action(1), Some("b"));
        assert_eq!(rule.to_string(), "A -: 'a' 'b' <b> A");
    }

    #[test]
    fn rule_set_errors() {
        assert!(matches!(RuleSet::new(vec![]), Err(GrammarError::Empty)));
        assert!(matches!(
            RuleSet::new(vec![rule("A", &[Symbol::nonterminal("B")])]),
            Err(GrammarError::UndefinedNonterminal(name)) if name == "B"
        ));
        assert!(matches!(
            RuleSet::new(vec![rule("A", &[Symbol::EndOfInput])]),
            Err(GrammarError::ReservedSymbol { .. })
        ));
    }

    #[test]
    fn scattered_rules_and_empty_productions() {
        let grammar = RuleSet::new(vec![
            rule("A", &[Symbol::terminal("a"), Symbol::nonterminal("B")]),
            rule("B", &[Symbol::terminal("b")]),
            rule("A", &[]),
        ])
        .unwrap();
        assert_eq!(grammar.nonterminals().collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(grammar.rules_of("A").map(|(i, _)| i).collect::<Vec<_>>(), [0, 2]);
        assert_eq!(grammar.rules()[2].right(), [Symbol::Epsilon]);
        assert_eq!(grammar.rules()[2].right_actions().len(), 1);
    }

    #[test]
    fn verify_action_names() {
        assert!(verify_ident("add_char"));
        assert!(verify_ident("_x1"));
        assert!(!verify_ident(""));
        assert!(!verify_ident("1x"));
        assert!(!verify_ident("a-b"));
    }
}
