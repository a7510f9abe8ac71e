//! The grammar description language, recognized by a token automaton.
//!
//! ```text
//! # comment
//! Left <main> -: <alt> atom <act> atom | ~ | [a-z_] ;
//! ```

use super::{verify_ident, GrammarError, Rule, RuleSet};
use crate::{
    action::{Action, Context, Dispatcher},
    automaton::{Automaton, AutomatonDef, AutomatonError, END, HALT},
    symbol::{CharRange, CharSet, Symbol},
    types::Set,
    util::{chars, unescape},
};
use once_cell::sync::Lazy;
use std::mem;

const WS: &str = "ws";
const NL: &str = "nl";
const LT: &str = "lt";
const GT: &str = "gt";
const BAR: &str = "bar";
const SEMI: &str = "semi";
const LBR: &str = "lbr";
const RBR: &str = "rbr";
const BS: &str = "bs";
const TILDE: &str = "tilde";
const HASH: &str = "hash";
const MINUS: &str = "minus";
const COLON: &str = "colon";
const CHAR: &str = "char";

const SPECIALS: &[(&str, &[&str])] = &[
    (WS, &[" ", "\t", "\r"]),
    (NL, &["\n"]),
    (LT, &["<"]),
    (GT, &[">"]),
    (BAR, &["|"]),
    (SEMI, &[";"]),
    (LBR, &["["]),
    (RBR, &["]"]),
    (BS, &["\\"]),
    (TILDE, &["~"]),
    (HASH, &["#"]),
    (MINUS, &["-"]),
    (COLON, &[":"]),
];

const GROUPS: &[&str] = &[
    WS, NL, LT, GT, BAR, SEMI, LBR, RBR, BS, TILDE, HASH, MINUS, COLON, CHAR,
];

static PARSER: Lazy<DescriptionParser> = Lazy::new(|| {
    DescriptionParser::new().expect("the description automaton must be well-formed")
});

/// The parser of grammar descriptions.
#[derive(Debug)]
pub struct DescriptionParser {
    automaton: Automaton<DescriptionAction>,
}

impl DescriptionParser {
    /// Return the process-wide parser instance.
    pub fn get() -> &'static DescriptionParser {
        &PARSER
    }

    pub fn new() -> Result<Self, AutomatonError> {
        let automaton = Automaton::define(define_description_automaton)?;
        Ok(Self { automaton })
    }

    pub fn parse(&self, source: &str) -> Result<RuleSet, GrammarError> {
        let mut dispatcher = DescriptionDispatcher::new();
        if !self.automaton.parse(&mut dispatcher, chars(source)) {
            return Err(dispatcher.error.take().unwrap_or(GrammarError::NotGrammar {
                line: dispatcher.line,
                column: dispatcher.column,
            }));
        }
        dispatcher.finish()
    }
}

fn define_description_automaton(
    def: &mut AutomatonDef<'_, DescriptionAction>,
) -> Result<(), AutomatonError> {
    for (name, members) in SPECIALS {
        def.token_group(name, members.iter().copied())?;
    }
    let others: Vec<String> = (0x21u8..0x7f)
        .map(char::from)
        .map(String::from)
        .filter(|ch| SPECIALS.iter().all(|(_, members)| !members.contains(&ch.as_str())))
        .collect();
    def.token_group(CHAR, others.iter().map(String::as_str))?;

    for state in [
        "stmt",
        "comment",
        "left",
        "left_esc",
        "left_done",
        "main_act",
        "main_done",
        "arrow",
        "alt_start",
        "alt_act",
        "seq",
        "atom",
        "atom_esc",
        "after_atom",
        "atom_act",
        "set_start",
        "set_char",
        "set_dash",
        "set_esc",
        "set_range_esc",
    ] {
        def.state(state)?;
    }
    def.start_state("stmt")?;

    // between statements
    def.transition("stmt", WS, "stmt", Some("skip"))?;
    def.transition("stmt", NL, "stmt", Some("skip"))?;
    def.transition("stmt", HASH, "comment", Some("skip"))?;
    def.transition("stmt", CHAR, "left", Some("add_char"))?;
    def.transition("stmt", COLON, "left", Some("add_char"))?;
    def.transition("stmt", BS, "left_esc", Some("skip"))?;
    def.transition("stmt", END, HALT, None)?;

    for group in GROUPS.iter().filter(|g| **g != NL) {
        def.transition("comment", group, "comment", Some("skip"))?;
    }
    def.transition("comment", NL, "stmt", Some("skip"))?;
    def.transition("comment", END, HALT, None)?;

    // left-hand side and the main action
    def.transition("left", CHAR, "left", Some("add_char"))?;
    def.transition("left", COLON, "left", Some("add_char"))?;
    def.transition("left", BS, "left_esc", Some("skip"))?;
    def.transition("left", WS, "left_done", Some("add_left"))?;
    def.transition("left", NL, "left_done", Some("add_left"))?;
    def.transition("left", LT, "main_act", Some("add_left"))?;
    def.transition("left", MINUS, "arrow", Some("add_left"))?;
    for group in GROUPS {
        def.transition("left_esc", group, "left", Some("escape"))?;
    }

    def.transition("left_done", WS, "left_done", Some("skip"))?;
    def.transition("left_done", NL, "left_done", Some("skip"))?;
    def.transition("left_done", LT, "main_act", Some("skip"))?;
    def.transition("left_done", MINUS, "arrow", Some("skip"))?;

    def.transition("main_act", CHAR, "main_act", Some("add_char"))?;
    def.transition("main_act", GT, "main_done", Some("add_main_action"))?;
    def.transition("main_done", WS, "main_done", Some("skip"))?;
    def.transition("main_done", NL, "main_done", Some("skip"))?;
    def.transition("main_done", MINUS, "arrow", Some("skip"))?;

    def.transition("arrow", COLON, "alt_start", Some("skip"))?;

    // alternatives
    def.transition("alt_start", WS, "alt_start", Some("skip"))?;
    def.transition("alt_start", NL, "alt_start", Some("skip"))?;
    def.transition("alt_start", LT, "alt_act", Some("skip"))?;
    def.transition("alt_act", CHAR, "alt_act", Some("add_char"))?;
    def.transition("alt_act", GT, "seq", Some("add_action_left"))?;

    def.transition("seq", WS, "seq", Some("skip"))?;
    def.transition("seq", NL, "seq", Some("skip"))?;

    def.transition("after_atom", WS, "after_atom", Some("skip"))?;
    def.transition("after_atom", NL, "after_atom", Some("skip"))?;
    def.transition("after_atom", LT, "atom_act", Some("skip"))?;
    def.transition("atom_act", CHAR, "atom_act", Some("add_char"))?;
    def.transition("atom_act", GT, "seq", Some("add_action"))?;

    for state in ["alt_start", "seq", "after_atom"] {
        define_atom_start(def, state)?;
        def.transition(state, BAR, "alt_start", Some("add_alt"))?;
        def.transition(state, SEMI, "stmt", Some("add_rule"))?;
    }

    // words
    for group in [CHAR, COLON, MINUS] {
        def.transition("atom", group, "atom", Some("add_char"))?;
    }
    def.transition("atom", BS, "atom_esc", Some("skip"))?;
    def.transition("atom", WS, "after_atom", Some("end_atom"))?;
    def.transition("atom", NL, "after_atom", Some("end_atom"))?;
    def.transition("atom", LT, "atom_act", Some("end_atom"))?;
    def.transition("atom", BAR, "alt_start", Some("add_alt"))?;
    def.transition("atom", SEMI, "stmt", Some("add_rule"))?;
    for group in GROUPS {
        def.transition("atom_esc", group, "atom", Some("escape"))?;
    }

    // character sets
    for group in GROUPS.iter().filter(|g| ![RBR, BS].contains(*g)) {
        def.transition("set_start", group, "set_char", Some("set_left_char"))?;
    }
    def.transition("set_start", BS, "set_esc", Some("skip"))?;
    def.transition("set_start", RBR, "after_atom", Some("add_range"))?;

    for group in GROUPS.iter().filter(|g| ![RBR, BS, MINUS].contains(*g)) {
        def.transition("set_char", group, "set_char", Some("set_left_char"))?;
    }
    def.transition("set_char", BS, "set_esc", Some("skip"))?;
    def.transition("set_char", MINUS, "set_dash", Some("skip"))?;
    def.transition("set_char", RBR, "after_atom", Some("add_range"))?;

    for group in GROUPS.iter().filter(|g| ![RBR, BS].contains(*g)) {
        def.transition("set_dash", group, "set_start", Some("set_range"))?;
    }
    def.transition("set_dash", BS, "set_range_esc", Some("skip"))?;

    for group in GROUPS {
        def.transition("set_esc", group, "set_char", Some("set_left_char_esc"))?;
        def.transition("set_range_esc", group, "set_start", Some("set_range_esc"))?;
    }

    Ok(())
}

fn define_atom_start(
    def: &mut AutomatonDef<'_, DescriptionAction>,
    state: &str,
) -> Result<(), AutomatonError> {
    for group in [CHAR, COLON, MINUS] {
        def.transition(state, group, "atom", Some("add_char"))?;
    }
    def.transition(state, BS, "atom_esc", Some("skip"))?;
    def.transition(state, TILDE, "after_atom", Some("add_empty"))?;
    def.transition(state, LBR, "set_start", Some("start_charset"))?;
    Ok(())
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum DescriptionAction {
    Skip,
    AddChar,
    Escape,
    AddLeft,
    AddMainAction,
    AddActionLeft,
    EndAtom,
    AddAction,
    AddEmpty,
    AddAlt,
    AddRule,
    StartCharset,
    SetLeftChar,
    SetLeftCharEsc,
    SetRange,
    SetRangeEsc,
    AddRange,
}

impl Action for DescriptionAction {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "skip" => Self::Skip,
            "add_char" => Self::AddChar,
            "escape" => Self::Escape,
            "add_left" => Self::AddLeft,
            "add_main_action" => Self::AddMainAction,
            "add_action_left" => Self::AddActionLeft,
            "end_atom" => Self::EndAtom,
            "add_action" => Self::AddAction,
            "add_empty" => Self::AddEmpty,
            "add_alt" => Self::AddAlt,
            "add_rule" => Self::AddRule,
            "start_charset" => Self::StartCharset,
            "set_left_char" => Self::SetLeftChar,
            "set_left_char_esc" => Self::SetLeftCharEsc,
            "set_range" => Self::SetRange,
            "set_range_esc" => Self::SetRangeEsc,
            "add_range" => Self::AddRange,
            _ => return None,
        })
    }
}

#[derive(Debug)]
enum Atom {
    Word(String),
    Set(CharSet),
    Empty,
}

#[derive(Debug)]
struct Statement {
    left: String,
    left_action: Option<String>,
    atoms: Vec<(Atom, Option<String>)>,
}

/// Collects the statements of a description, one character at a time.
#[derive(Debug)]
struct DescriptionDispatcher {
    line: usize,
    column: usize,
    buffer: String,
    statements: Vec<Statement>,
    main_action: Option<String>,
    pending: Option<char>,
    ranges: Vec<CharRange>,
    error: Option<GrammarError>,
}

impl DescriptionDispatcher {
    fn new() -> Self {
        Self {
            line: 1,
            column: 1,
            buffer: String::new(),
            statements: vec![],
            main_action: None,
            pending: None,
            ranges: vec![],
            error: None,
        }
    }

    fn take_action_name(&mut self) -> Option<String> {
        let name = mem::take(&mut self.buffer);
        if !verify_ident(&name) {
            self.error = Some(GrammarError::InvalidActionName {
                name,
                line: self.line,
                column: self.column,
            });
            return None;
        }
        Some(name)
    }

    fn push_atom(&mut self, atom: Atom) -> bool {
        match self.statements.last_mut() {
            Some(statement) => {
                statement.atoms.push((atom, None));
                true
            }
            None => false,
        }
    }

    fn end_word(&mut self) -> bool {
        if self.buffer.is_empty() {
            return true;
        }
        let word = mem::take(&mut self.buffer);
        self.push_atom(Atom::Word(word))
    }

    fn set_left_char(&mut self, ch: char) -> bool {
        if let Some(prev) = self.pending.replace(ch) {
            self.ranges.push(CharRange::single(prev));
        }
        true
    }

    fn set_range(&mut self, high: char) -> bool {
        let low = match self.pending.take() {
            Some(low) => low,
            None => return false,
        };
        match CharRange::new(low, high) {
            Ok(range) => {
                self.ranges.push(range);
                true
            }
            Err(..) => false,
        }
    }

    fn add_range(&mut self) -> bool {
        if let Some(ch) = self.pending.take() {
            self.ranges.push(CharRange::single(ch));
        }
        if self.ranges.is_empty() {
            return false;
        }
        let set = CharSet::new(self.ranges.drain(..));
        self.push_atom(Atom::Set(set))
    }

    fn perform(&mut self, ch: char, action: DescriptionAction) -> bool {
        use DescriptionAction::*;
        match action {
            Skip => true,
            AddChar => {
                self.buffer.push(ch);
                true
            }
            Escape => {
                self.buffer.push(unescape(ch));
                true
            }
            AddLeft => {
                let left = mem::take(&mut self.buffer);
                self.main_action = None;
                self.statements.push(Statement {
                    left,
                    left_action: None,
                    atoms: vec![],
                });
                true
            }
            AddMainAction | AddActionLeft => {
                let name = match self.take_action_name() {
                    Some(name) => name,
                    None => return false,
                };
                if action == AddMainAction {
                    self.main_action = Some(name.clone());
                }
                match self.statements.last_mut() {
                    Some(statement) => {
                        statement.left_action = Some(name);
                        true
                    }
                    None => false,
                }
            }
            EndAtom | AddRule => self.end_word(),
            AddAction => {
                let name = match self.take_action_name() {
                    Some(name) => name,
                    None => return false,
                };
                match self
                    .statements
                    .last_mut()
                    .and_then(|statement| statement.atoms.last_mut())
                {
                    Some((_, action @ None)) => {
                        *action = Some(name);
                        true
                    }
                    _ => false,
                }
            }
            AddEmpty => self.push_atom(Atom::Empty),
            AddAlt => {
                if !self.end_word() {
                    return false;
                }
                let left = match self.statements.last() {
                    Some(statement) => statement.left.clone(),
                    None => return false,
                };
                self.statements.push(Statement {
                    left,
                    left_action: self.main_action.clone(),
                    atoms: vec![],
                });
                true
            }
            StartCharset => {
                self.pending = None;
                self.ranges.clear();
                true
            }
            SetLeftChar => self.set_left_char(ch),
            SetLeftCharEsc => self.set_left_char(unescape(ch)),
            SetRange => self.set_range(ch),
            SetRangeEsc => self.set_range(unescape(ch)),
            AddRange => self.add_range(),
        }
    }

    fn finish(self) -> Result<RuleSet, GrammarError> {
        let lefts: Set<String> = self
            .statements
            .iter()
            .map(|statement| statement.left.clone())
            .collect();

        let rules = self.statements.into_iter().map(|statement| {
            let mut rule = Rule::new(statement.left, statement.left_action.as_deref());
            for (atom, action) in statement.atoms {
                let symbol = match atom {
                    Atom::Word(word) if lefts.contains(&word) => Symbol::Nonterminal(word),
                    Atom::Word(word) => Symbol::Terminal(word),
                    Atom::Set(set) => Symbol::CharSet(set),
                    Atom::Empty => Symbol::Epsilon,
                };
                rule.push(symbol, action.as_deref());
            }
            rule
        });

        RuleSet::new(rules)
    }
}

impl Dispatcher for DescriptionDispatcher {
    type Action = DescriptionAction;

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn invoke(&mut self, _: Context<'_>, token: Option<&str>, action: DescriptionAction) -> bool {
        let ch = match token.and_then(|token| token.chars().next()) {
            Some(ch) => ch,
            None => return true,
        };
        if !self.perform(ch, action) {
            return false;
        }
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<RuleSet, GrammarError> {
        DescriptionParser::get().parse(source)
    }

    #[test]
    fn meta_automaton_is_well_formed() {
        DescriptionParser::new().unwrap();
    }

    #[test]
    fn alternatives_inherit_main_action() {
        let grammar = parse("S <main> -: a | <other> b | c <act> ;").unwrap();
        let rules = grammar.rules();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].left_action(), Some("main"));
        assert_eq!(rules[1].left_action(), Some("other"));
        assert_eq!(rules[2].left_action(), Some("main"));
        assert_eq!(rules[2].right_actions().collect::<Vec<_>>(), [Some("act")]);
    }

    #[test]
    fn consecutive_statements_share_left() {
        let grammar = parse("S -: a S ;\nS -: ;\n").unwrap();
        assert_eq!(grammar.rules().len(), 2);
        assert_eq!(grammar.rules()[1].right(), [Symbol::Epsilon]);
        let grammar = parse("S -: A ;\nA -: a ;\nS -: b ;").unwrap();
        assert_eq!(grammar.rules_of("S").count(), 2);
    }

    #[test]
    fn escapes_and_sets() {
        let grammar = parse(r"S -: \; \n [\]a-c\-] [\t] ;").unwrap();
        let right = grammar.rules()[0].right();
        assert_eq!(right[0], Symbol::terminal(";"));
        assert_eq!(right[1], Symbol::terminal("\n"));
        let set = CharSet::new([
            CharRange::single(']'),
            CharRange::new('a', 'c').unwrap(),
            CharRange::single('-'),
        ]);
        assert_eq!(right[2], Symbol::CharSet(set));
        assert_eq!(right[3], Symbol::CharSet(CharSet::new([CharRange::single('\t')])));
    }

    #[test]
    fn reports_position() {
        assert!(matches!(
            parse("S -: a ;\nT -: b\n"),
            Err(GrammarError::NotGrammar { line: 3, column: 1 })
        ));
        assert!(matches!(
            parse("S -: a ;\nT = b ;"),
            Err(GrammarError::NotGrammar { line: 2, column: 3 })
        ));
        assert!(matches!(
            parse("S -: [z-a] ;"),
            Err(GrammarError::NotGrammar { line: 1, column: 9 })
        ));
        assert!(matches!(
            parse("S -: a <1st> ;"),
            Err(GrammarError::InvalidActionName { name, line: 1, column: 12 }) if name == "1st"
        ));
        assert!(matches!(
            parse("S -: a <x> <y> ;"),
            Err(GrammarError::NotGrammar { line: 1, column: 12 })
        ));
    }

    #[test]
    fn comments_and_empty_descriptions() {
        assert!(matches!(parse("# nothing here\n"), Err(GrammarError::Empty)));
        assert!(matches!(parse(""), Err(GrammarError::Empty)));
        let grammar = parse("# leading\nS -: s ;\n# trailing").unwrap();
        assert_eq!(grammar.rules()[0].right(), [Symbol::terminal("s")]);
    }
}
