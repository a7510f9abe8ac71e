//! LL(1) table construction and table-driven parsing.

use crate::{
    action::{Action, Context, Dispatcher},
    grammar::{resolve_action, GrammarError, Rule, RuleSet},
    symbol::Symbol,
    types::{Map, Set},
    util::{display_fn, token_str},
};
use std::{fmt, path::Path};

/// A row of the flattened parse table.
#[derive(Debug, Clone)]
pub struct TableRow<A> {
    terminals: Set<Symbol>,
    action: Option<A>,
    jump: Option<usize>,
    accept: bool,
    on_stack: bool,
    is_error: bool,
}

impl<A: Action> TableRow<A> {
    /// The lookahead symbols selecting this row.
    pub fn terminals(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.terminals.iter()
    }

    pub fn action(&self) -> Option<A> {
        self.action
    }

    /// The row to move to, or `None` to return from the current rule.
    pub fn jump(&self) -> Option<usize> {
        self.jump
    }

    /// Whether the row consumes the lookahead token.
    pub fn is_accept(&self) -> bool {
        self.accept
    }

    /// Whether the row pushes a return frame.
    pub fn is_on_stack(&self) -> bool {
        self.on_stack
    }

    /// Whether a lookahead mismatch fails the parse instead of trying the next row.
    pub fn is_error(&self) -> bool {
        self.is_error
    }

    fn selects(&self, token: Option<&str>) -> bool {
        self.terminals.iter().any(|symbol| symbol.matches(token))
    }
}

/// A pending return in the LL(1) parser.
#[derive(Debug)]
struct Frame<A> {
    ret: Option<usize>,
    actions: Vec<A>,
}

/// An LL(1) parse table.
#[derive(Debug)]
pub struct LLTable<A> {
    rows: Vec<TableRow<A>>,
    first_sets: Vec<Set<Symbol>>,
    follow_sets: Map<String, Set<Symbol>>,
    term_sets: Vec<Set<Symbol>>,
}

impl<A: Action> LLTable<A> {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LLError> {
        Self::build(&RuleSet::from_file(path)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(source: &str) -> Result<Self, LLError> {
        Self::build(&RuleSet::from_str(source)?)
    }

    pub fn build(grammar: &RuleSet) -> Result<Self, LLError> {
        verify_contiguous(grammar)?;

        let sets = LookaheadSets::new(grammar);
        sets.verify()?;
        let rows = flatten(grammar, &sets)?;

        tracing::debug!(
            "LL(1) table: {} rules flattened into {} rows",
            grammar.rules().len(),
            rows.len()
        );

        Ok(Self {
            rows,
            first_sets: sets.first_sets,
            follow_sets: sets.follow_sets,
            term_sets: sets.term_sets,
        })
    }

    pub fn rows(&self) -> &[TableRow<A>] {
        &self.rows[..]
    }

    /// FIRST of each rule's right-hand side, in rule order.
    pub fn first_sets(&self) -> &[Set<Symbol>] {
        &self.first_sets[..]
    }

    /// FOLLOW of each nonterminal.
    pub fn follow_sets(&self) -> &Map<String, Set<Symbol>> {
        &self.follow_sets
    }

    /// The lookahead set selecting each rule, in rule order.
    pub fn term_sets(&self) -> &[Set<Symbol>] {
        &self.term_sets[..]
    }

    /// Parse the token stream, dispatching the row actions.
    pub fn parse<D, I>(&self, dispatcher: &mut D, tokens: I) -> bool
    where
        D: Dispatcher<Action = A>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        dispatcher.reset();

        let mut tokens = tokens.into_iter();
        let mut lookahead = tokens.next();
        let mut stack = vec![Frame {
            ret: None,
            actions: vec![],
        }];
        let mut row = 0;

        loop {
            let entry = match self.rows.get(row) {
                Some(entry) => entry,
                None => return false,
            };
            let cx = Context::LL { row };

            if !entry.selects(token_str(&lookahead)) {
                if entry.is_error {
                    tracing::trace!("row {}: no match for {:?}", row, token_str(&lookahead));
                    return false;
                }
                row += 1;
                continue;
            }

            if entry.accept {
                if let Some(action) = entry.action {
                    if !dispatcher.invoke(cx, token_str(&lookahead), action) {
                        return false;
                    }
                }
                lookahead = tokens.next();
            }

            if entry.on_stack {
                stack.push(Frame {
                    ret: Some(row),
                    actions: entry.action.into_iter().collect(),
                });
            }

            let token = token_str(&lookahead);
            match entry.jump {
                Some(jump) => {
                    if !entry.accept && !entry.on_stack {
                        if let Some(top) = stack.last_mut() {
                            top.actions.extend(entry.action);
                        }
                    }
                    tracing::trace!("row {}: jump to {}", row, jump);
                    row = jump;
                }
                None => {
                    if !entry.accept {
                        if let Some(action) = entry.action {
                            if !dispatcher.invoke(cx, token, action) {
                                return false;
                            }
                        }
                    }

                    let frame = match stack.pop() {
                        Some(frame) => frame,
                        None => return false,
                    };
                    for action in frame.actions.into_iter().rev() {
                        if !dispatcher.invoke(cx, token, action) {
                            return false;
                        }
                    }

                    match frame.ret {
                        Some(ret) => {
                            tracing::trace!("row {}: return to {}", row, ret + 1);
                            row = ret + 1;
                        }
                        None => return token.is_none() && stack.is_empty(),
                    }
                }
            }
        }
    }
}

impl<A: Action> fmt::Display for LLTable<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "row\tterminals\taction\tjump\taccept\tstack\terror")?;
        for (i, row) in self.rows.iter().enumerate() {
            let terminals = display_fn(|f| {
                f.write_str("{")?;
                for (i, symbol) in row.terminals.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", symbol)?;
                }
                f.write_str("}")
            });
            let action = display_fn(|f| match &row.action {
                Some(action) => write!(f, "{:?}", action),
                None => f.write_str("-"),
            });
            let jump = display_fn(|f| match row.jump {
                Some(jump) => write!(f, "{}", jump),
                None => f.write_str("-1"),
            });
            writeln!(
                f,
                "{:03}\t{}\t{}\t{}\t{}\t{}\t{}",
                i, terminals, action, jump, row.accept, row.on_stack, row.is_error
            )?;
        }
        Ok(())
    }
}

/// FIRST, FOLLOW and per-rule lookahead sets of a grammar.
#[derive(Debug)]
struct LookaheadSets<'g> {
    grammar: &'g RuleSet,
    first_sets: Vec<Set<Symbol>>,
    follow_sets: Map<String, Set<Symbol>>,
    term_sets: Vec<Set<Symbol>>,
}

impl<'g> LookaheadSets<'g> {
    fn new(grammar: &'g RuleSet) -> Self {
        let mut sets = Self {
            grammar,
            first_sets: vec![Set::default(); grammar.rules().len()],
            follow_sets: Map::default(),
            term_sets: vec![],
        };
        sets.compute_first_sets();
        sets.compute_follow_sets();
        sets.compute_term_sets();
        sets
    }

    /// `First(X)` for a single symbol.
    fn first_of(&self, symbol: &Symbol) -> Set<Symbol> {
        match symbol {
            Symbol::Nonterminal(name) => self
                .grammar
                .rules_of(name)
                .flat_map(|(i, _)| self.first_sets[i].iter().cloned())
                .collect(),
            symbol => Some(symbol.clone()).into_iter().collect(),
        }
    }

    /// `First(X1 X2 ... Xn)`, containing the empty marker when every `Xi` may vanish.
    fn first_of_chain(&self, chain: &[Symbol]) -> Set<Symbol> {
        let mut res = Set::default();
        let mut nullable = true;
        for symbol in chain {
            let first = self.first_of(symbol);
            res.extend(first.iter().filter(|s| **s != Symbol::Epsilon).cloned());
            if !first.contains(&Symbol::Epsilon) {
                nullable = false;
                break;
            }
        }
        if nullable {
            res.insert(Symbol::Epsilon);
        }
        res
    }

    /// The lookahead selecting the suffix `right[k..]` of a rule.
    fn lookahead(&self, rule: &Rule, k: usize) -> Set<Symbol> {
        let mut res = self.first_of_chain(&rule.right()[k..]);
        if res.swap_remove(&Symbol::Epsilon) {
            if let Some(follow) = self.follow_sets.get(rule.left()) {
                res.extend(follow.iter().cloned());
            }
        }
        res
    }

    fn compute_first_sets(&mut self) {
        let grammar = self.grammar;
        let mut changed = true;
        while changed {
            changed = false;
            for (i, rule) in grammar.rules().iter().enumerate() {
                let added = self.first_of_chain(rule.right());
                for symbol in added {
                    if self.first_sets[i].insert(symbol) {
                        changed = true;
                    }
                }
            }
        }
    }

    fn compute_follow_sets(&mut self) {
        let grammar = self.grammar;
        for name in grammar.nonterminals() {
            self.follow_sets.insert(name.to_owned(), Set::default());
        }
        if let Some(start) = self.follow_sets.get_mut(grammar.start()) {
            start.insert(Symbol::EndOfInput);
        }

        let mut changed = true;
        while changed {
            changed = false;
            for rule in grammar.rules() {
                for (i, symbol) in rule.right().iter().enumerate() {
                    let name = match symbol {
                        Symbol::Nonterminal(name) => name,
                        _ => continue,
                    };
                    let added = self.lookahead(rule, i + 1);
                    let follow = match self.follow_sets.get_mut(name.as_str()) {
                        Some(follow) => follow,
                        None => continue,
                    };
                    for symbol in added {
                        if follow.insert(symbol) {
                            changed = true;
                        }
                    }
                }
            }
        }
    }

    fn compute_term_sets(&mut self) {
        self.term_sets = self
            .grammar
            .rules()
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                let mut term = self.first_sets[i].clone();
                if term.swap_remove(&Symbol::Epsilon) {
                    if let Some(follow) = self.follow_sets.get(rule.left()) {
                        term.extend(follow.iter().cloned());
                    }
                }
                term
            })
            .collect();
    }

    /// Check that the rules sharing a left-hand side have disjoint lookahead sets.
    fn verify(&self) -> Result<(), LLError> {
        let rules = self.grammar.rules();
        for (i, r1) in rules.iter().enumerate() {
            for (j, r2) in rules.iter().enumerate().skip(i + 1) {
                if r1.left() != r2.left() {
                    continue;
                }
                let overlapped = self.term_sets[i]
                    .iter()
                    .any(|s1| self.term_sets[j].iter().any(|s2| s1.overlaps(s2)));
                if overlapped {
                    return Err(LLError::NotLL1 {
                        left: r1.left().to_owned(),
                        first: i,
                        second: j,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Lay out the rules in one table: for each run of rules sharing a left-hand
/// side, first one row per rule, then the right-hand sides one after another.
fn flatten<A: Action>(
    grammar: &RuleSet,
    sets: &LookaheadSets<'_>,
) -> Result<Vec<TableRow<A>>, LLError> {
    let rules = grammar.rules();
    let mut nleft = vec![0; rules.len()];
    let mut nright = vec![0; rules.len()];

    let mut count = 0;
    let mut i = 0;
    while i < rules.len() {
        let mut j = i;
        while j < rules.len() && rules[j].left() == rules[i].left() {
            nleft[j] = count;
            count += 1;
            j += 1;
        }
        for k in i..j {
            nright[k] = count;
            count += rules[k].right().len();
        }
        i = j;
    }

    let lefts: Set<usize> = nleft.iter().copied().collect();
    let entry_of = |name: &str| grammar.rules_of(name).next().map(|(i, _)| nleft[i]);

    let mut rows: Vec<Option<TableRow<A>>> = (0..count).map(|_| None).collect();
    for (i, rule) in rules.iter().enumerate() {
        let n = nleft[i];
        rows[n] = Some(TableRow {
            terminals: sets.term_sets[i].clone(),
            action: resolve_action(rule.left_action())?,
            jump: Some(nright[i]),
            accept: false,
            on_stack: false,
            is_error: !lefts.contains(&(n + 1)),
        });

        let last = rule.right().len().saturating_sub(1);
        for (k, symbol) in rule.right().iter().enumerate() {
            let n = nright[i] + k;
            let terminals = match symbol {
                Symbol::Terminal(..) | Symbol::CharSet(..) => Some(symbol.clone()).into_iter().collect(),
                _ => sets.lookahead(rule, k),
            };
            let jump = match symbol {
                Symbol::Nonterminal(name) => entry_of(name),
                _ if k == last => None,
                _ => Some(n + 1),
            };
            rows[n] = Some(TableRow {
                terminals,
                action: resolve_action(rule.right_action(k))?,
                jump,
                accept: symbol.is_token_class(),
                on_stack: symbol.is_nonterminal() && k != last,
                is_error: true,
            });
        }
    }

    Ok(rows.into_iter().flatten().collect())
}

/// The rows of a nonterminal are laid out as one block, so its rules must be adjacent.
fn verify_contiguous(grammar: &RuleSet) -> Result<(), LLError> {
    let mut seen = Set::default();
    let mut prev = None;
    for rule in grammar.rules() {
        if prev != Some(rule.left()) {
            if !seen.insert(rule.left()) {
                return Err(LLError::NonContiguous {
                    name: rule.left().to_owned(),
                });
            }
            prev = Some(rule.left());
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum LLError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(
        "not an LL(1) grammar: the lookahead sets of rules {} and {} for `{}' intersect",
        first,
        second,
        left
    )]
    NotLL1 {
        left: String,
        first: usize,
        second: usize,
    },

    #[error("the rules for `{}' must be declared contiguously", name)]
    NonContiguous { name: String },
}
