//! Canonical LR(1) automaton and shift-reduce parsing.

use crate::{
    action::{Action, Context, Dispatcher},
    grammar::{resolve_action, GrammarError, RuleSet},
    symbol::Symbol,
    types::{Map, Queue, Set},
    util::{display_fn, token_str},
};
use std::{
    collections::BTreeMap,
    fmt,
    path::Path,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: usize,
}
impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self::new(0);

    #[inline]
    const fn new(raw: usize) -> Self {
        Self { raw }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID {
    raw: usize,
}
impl NonterminalID {
    /// The fresh start symbol of the augmented grammar.
    pub const START: Self = Self::new(0);

    #[inline]
    const fn new(raw: usize) -> Self {
        Self { raw }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct RuleID {
    raw: usize,
}
impl RuleID {
    /// The rule `Start' -: Start` of the augmented grammar.
    pub const ACCEPT: Self = Self::new(0);

    #[inline]
    const fn new(raw: usize) -> Self {
        Self { raw }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateID {
    raw: usize,
}
impl StateID {
    pub const START: Self = Self::new(0);

    #[inline]
    const fn new(raw: usize) -> Self {
        Self { raw }
    }

    pub fn index(self) -> usize {
        self.raw
    }
}
impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.raw)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct TerminalSet {
    inner: bit_set::BitSet,
}
impl TerminalSet {
    fn union_with(&mut self, other: &Self) {
        self.inner.union_with(&other.inner)
    }
    fn is_superset(&self, other: &Self) -> bool {
        self.inner.is_superset(&other.inner)
    }
    fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner.iter().map(TerminalID::new)
    }
}
impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.raw).collect(),
        }
    }
}

/// A production of the augmented grammar, with its actions resolved.
///
/// Only terminal positions carry an action. The actions of nonterminal and
/// empty atoms are moved into marker productions.
#[derive(Debug)]
struct Production<A> {
    left: NonterminalID,
    right: Vec<SymbolID>,
    right_actions: Vec<Option<A>>,
    left_action: Option<A>,
}

/// The augmented grammar with interned symbols.
#[derive(Debug)]
struct Grammar<A> {
    terminals: Set<Symbol>,
    nonterminals: Set<String>,
    rules: Vec<Production<A>>,
}

impl<A: Action> Grammar<A> {
    fn new(source: &RuleSet) -> Result<Self, LRError> {
        let mut start = format!("{}'", source.start());
        while source.is_nonterminal(&start)
            || source
                .symbols()
                .any(|s| matches!(s, Symbol::Terminal(text) if *text == start))
        {
            start.push('\'');
        }

        let mut nonterminals = Set::default();
        nonterminals.insert(start);
        nonterminals.extend(source.nonterminals().map(ToOwned::to_owned));

        let mut terminals = Set::default();
        terminals.insert(Symbol::EndOfInput);
        terminals.extend(source.symbols().filter(|s| s.is_token_class()).cloned());

        let nonterminal = |name: &str| {
            nonterminals
                .get_index_of(name)
                .map(NonterminalID::new)
                .ok_or_else(|| GrammarError::UndefinedNonterminal(name.to_owned()))
        };

        let mut rules = vec![Production {
            left: NonterminalID::START,
            right: vec![SymbolID::N(nonterminal(source.start())?)],
            right_actions: vec![None],
            left_action: None,
        }];
        // `X -: a B <act> c` is read as `X -: a B M c` with `M <act> -: ~`,
        // one `M` per action name.
        let mut markers: Map<&str, NonterminalID> = Map::default();
        let mut marker_rules = vec![];
        for rule in source.rules() {
            let mut right = vec![];
            let mut right_actions = vec![];
            for (symbol, name) in rule.right().iter().zip(rule.right_actions()) {
                let action = resolve_action::<A>(name)?;
                match symbol {
                    Symbol::Epsilon => (),
                    Symbol::Nonterminal(n) => {
                        right.push(SymbolID::N(nonterminal(n)?));
                        right_actions.push(None);
                    }
                    symbol => {
                        if let Some(raw) = terminals.get_index_of(symbol) {
                            right.push(SymbolID::T(TerminalID::new(raw)));
                            right_actions.push(action);
                        }
                        continue;
                    }
                }

                if let (Some(action), Some(name)) = (action, name) {
                    let next = NonterminalID::new(nonterminals.len() + markers.len());
                    let marker = *markers.entry(name).or_insert_with(|| {
                        marker_rules.push(Production {
                            left: next,
                            right: vec![],
                            right_actions: vec![],
                            left_action: Some(action),
                        });
                        next
                    });
                    right.push(SymbolID::N(marker));
                    right_actions.push(None);
                }
            }
            rules.push(Production {
                left: nonterminal(rule.left())?,
                right,
                right_actions,
                left_action: resolve_action(rule.left_action())?,
            });
        }
        rules.extend(marker_rules);
        nonterminals.extend(
            markers
                .keys()
                .enumerate()
                .map(|(i, name)| format!("<{}>#{}", name, i)),
        );

        let grammar = Self {
            terminals,
            nonterminals,
            rules,
        };
        grammar.check_overlaps()?;
        Ok(grammar)
    }

    /// Reject terminal classes that share an input token.
    fn check_overlaps(&self) -> Result<(), LRError> {
        for (i, t1) in self.terminals.iter().enumerate() {
            for t2 in self.terminals.iter().skip(i + 1) {
                if t1.overlaps(t2) {
                    return Err(LRError::Overlap {
                        first: t1.to_string(),
                        second: t2.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn rule(&self, id: RuleID) -> &Production<A> {
        &self.rules[id.raw]
    }

    fn rules(&self) -> impl Iterator<Item = (RuleID, &Production<A>)> + '_ {
        self.rules
            .iter()
            .enumerate()
            .map(|(raw, rule)| (RuleID::new(raw), rule))
    }

    fn terminal(&self, id: TerminalID) -> &Symbol {
        &self.terminals[id.raw]
    }

    fn nonterminal(&self, id: NonterminalID) -> &str {
        &self.nonterminals[id.raw]
    }

    fn symbol(&self, id: SymbolID) -> impl fmt::Display + '_ {
        display_fn(move |f| match id {
            SymbolID::T(t) => write!(f, "{}", self.terminal(t)),
            SymbolID::N(n) => f.write_str(self.nonterminal(n)),
        })
    }

    // `"LHS -: R1 R2 R3"`
    fn display_rule(&self, id: RuleID) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            let rule = self.rule(id);
            write!(f, "{} -:", self.nonterminal(rule.left))?;
            for symbol in &rule.right {
                write!(f, " {}", self.symbol(*symbol))?;
            }
            Ok(())
        })
    }
}

#[derive(Debug)]
struct FirstSets {
    nulls: Set<NonterminalID>,
    map: Map<SymbolID, TerminalSet>,
}

impl FirstSets {
    fn new<A: Action>(grammar: &Grammar<A>) -> Self {
        let nulls = nulls_set(grammar);

        let mut map: Map<SymbolID, TerminalSet> = Map::default();
        for raw in 0..grammar.terminals.len() {
            let id = TerminalID::new(raw);
            map.insert(SymbolID::T(id), Some(id).into_iter().collect());
        }
        for raw in 0..grammar.nonterminals.len() {
            map.insert(SymbolID::N(NonterminalID::new(raw)), TerminalSet::default());
        }

        // For `X -: Y1 Y2 ... Yn`, First(X) includes First(Yi) up to the
        // first non-nullable Yi.
        #[derive(Debug)]
        struct Constraint {
            sup: SymbolID,
            sub: SymbolID,
        }
        let mut constraints = vec![];
        for (_, rule) in grammar.rules() {
            for symbol in &rule.right {
                if *symbol != SymbolID::N(rule.left) {
                    constraints.push(Constraint {
                        sup: SymbolID::N(rule.left),
                        sub: *symbol,
                    });
                }
                if !matches!(symbol, SymbolID::N(n) if nulls.contains(n)) {
                    break;
                }
            }
        }

        let mut changed = true;
        while changed {
            changed = false;
            for Constraint { sup, sub } in &constraints {
                let subset = match map.get(sub) {
                    Some(subset) => subset.clone(),
                    None => continue,
                };
                if let Some(superset) = map.get_mut(sup) {
                    if !superset.is_superset(&subset) {
                        superset.union_with(&subset);
                        changed = true;
                    }
                }
            }
        }

        Self { nulls, map }
    }

    fn is_nullable(&self, id: NonterminalID) -> bool {
        self.nulls.contains(&id)
    }

    /// `First(prefix lookaheads)`
    fn get(&self, prefix: &[SymbolID], lookaheads: &TerminalSet) -> TerminalSet {
        let mut res = TerminalSet::default();
        for symbol in prefix {
            if let Some(first) = self.map.get(symbol) {
                res.union_with(first);
            }
            if !matches!(symbol, SymbolID::N(n) if self.nulls.contains(n)) {
                return res;
            }
        }
        res.union_with(lookaheads);
        res
    }
}

/// Calculate the set of nullable symbols in this grammar.
fn nulls_set<A: Action>(grammar: &Grammar<A>) -> Set<NonterminalID> {
    let mut nulls: Set<NonterminalID> = grammar
        .rules()
        .filter_map(|(_, rule)| rule.right.is_empty().then_some(rule.left))
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for (_, rule) in grammar.rules() {
            if nulls.contains(&rule.left) {
                continue;
            }
            let is_rhs_nullable = rule
                .right
                .iter()
                .all(|s| matches!(s, SymbolID::N(n) if nulls.contains(n)));
            if is_rhs_nullable {
                changed = true;
                nulls.insert(rule.left);
            }
        }
    }

    nulls
}

// LR(1) item core: `X -: Y1 ... Ym . Ym+1 ... Yn`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct LRItemCore {
    rule: RuleID,
    marker: usize,
}

// Items sharing a core are kept together, keyed by the core.
type LRItemSet = BTreeMap<LRItemCore, TerminalSet>;

#[derive(Debug)]
struct StateExtractor<'g, A> {
    grammar: &'g Grammar<A>,
    first_sets: FirstSets,
}

impl<A: Action> StateExtractor<'_, A> {
    fn expand_closures(&self, items: &mut LRItemSet) {
        let mut changed = true;
        while changed {
            changed = false;

            let mut added: Map<LRItemCore, TerminalSet> = Map::default();
            for (core, lookaheads) in &*items {
                let rule = self.grammar.rule(core.rule);

                // [X -: ... . Y beta]
                let (y_symbol, beta) = match &rule.right[core.marker..] {
                    [SymbolID::N(y_symbol), beta @ ..] => (*y_symbol, beta),
                    _ => continue,
                };

                let x = self.first_sets.get(beta, lookaheads);
                for (id, rule) in self.grammar.rules() {
                    if rule.left != y_symbol {
                        continue;
                    }
                    added
                        .entry(LRItemCore {
                            rule: id,
                            marker: 0,
                        })
                        .or_default()
                        .union_with(&x);
                }
            }

            for (core, x) in added {
                let lookaheads = items.entry(core).or_insert_with(|| {
                    changed = true;
                    TerminalSet::default()
                });
                if !lookaheads.is_superset(&x) {
                    lookaheads.union_with(&x);
                    changed = true;
                }
            }
        }
    }

    /// Extract the unclosed successors of an item set, by label.
    fn extract_transitions(&self, items: &LRItemSet) -> Map<SymbolID, LRItemSet> {
        let mut item_sets: Map<SymbolID, LRItemSet> = Map::default();
        for (core, lookaheads) in items {
            let rule = self.grammar.rule(core.rule);
            let label = match rule.right.get(core.marker) {
                Some(label) => *label,
                None => continue,
            };
            item_sets.entry(label).or_default().insert(
                LRItemCore {
                    marker: core.marker + 1,
                    ..*core
                },
                lookaheads.clone(),
            );
        }
        item_sets
    }
}

/// Build the canonical collection of LR(1) item sets and the labelled edges between them.
fn canonical_collection<A: Action>(
    extractor: &StateExtractor<'_, A>,
) -> Vec<(LRItemSet, Map<SymbolID, StateID>)> {
    let mut start = LRItemSet::new();
    start.insert(
        LRItemCore {
            rule: RuleID::ACCEPT,
            marker: 0,
        },
        Some(TerminalID::EOI).into_iter().collect(),
    );
    extractor.expand_closures(&mut start);

    let mut ids: Map<LRItemSet, StateID> = Map::default();
    ids.insert(start.clone(), StateID::START);
    let mut states = vec![(start, Map::default())];
    let mut pending: Queue<StateID> = Some(StateID::START).into_iter().collect();

    while let Some(id) = pending.pop() {
        let transitions = extractor.extract_transitions(&states[id.raw].0);
        let mut edges = Map::default();
        for (label, mut item_set) in transitions {
            extractor.expand_closures(&mut item_set);
            let target = match ids.get(&item_set) {
                Some(target) => *target,
                None => {
                    let target = StateID::new(states.len());
                    ids.insert(item_set.clone(), target);
                    states.push((item_set, Map::default()));
                    pending.push(target);
                    target
                }
            };
            edges.insert(label, target);
        }
        states[id.raw].1 = edges;
    }

    states
}

/// The action that the LR automaton in a state performs on a particular
/// lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LRAction<A> {
    /// Read the lookahead symbol and transition to the specified state.
    Shift { target: StateID, action: Option<A> },

    /// Reduce by the specified production rule.
    Reduce(RuleID),

    /// Accept the input.
    Halt,
}

#[derive(Debug)]
pub struct LRState<A> {
    items: LRItemSet,
    actions: Map<TerminalID, LRAction<A>>,
    gotos: Map<NonterminalID, StateID>,
}

impl<A: Action> LRState<A> {
    pub fn actions(&self) -> impl Iterator<Item = (TerminalID, &LRAction<A>)> + '_ {
        self.actions.iter().map(|(t, action)| (*t, action))
    }

    pub fn gotos(&self) -> impl Iterator<Item = (NonterminalID, StateID)> + '_ {
        self.gotos.iter().map(|(n, target)| (*n, *target))
    }
}

/// A shift/reduce collision resolved in favour of the reduce.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Conflict {
    pub state: StateID,
    pub terminal: String,
    pub shift: StateID,
    pub reduce: String,
}

/// A canonical LR(1) parse table.
#[derive(Debug)]
pub struct LRTable<A> {
    grammar: Grammar<A>,
    states: Vec<LRState<A>>,
    conflicts: Vec<Conflict>,
}

impl<A: Action> LRTable<A> {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LRError> {
        Self::build(&RuleSet::from_file(path)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(source: &str) -> Result<Self, LRError> {
        Self::build(&RuleSet::from_str(source)?)
    }

    pub fn build(source: &RuleSet) -> Result<Self, LRError> {
        let grammar = Grammar::<A>::new(source)?;
        let extractor = StateExtractor {
            grammar: &grammar,
            first_sets: FirstSets::new(&grammar),
        };
        let accepts_empty = extractor.first_sets.is_nullable(NonterminalID::START);
        let collection = canonical_collection(&extractor);

        let mut states = Vec::with_capacity(collection.len());
        let mut conflicts = vec![];
        for (raw, (items, edges)) in collection.into_iter().enumerate() {
            let id = StateID::new(raw);
            let mut actions: Map<TerminalID, LRAction<A>> = Map::default();
            let seeded = id == StateID::START && accepts_empty;
            if seeded {
                actions.insert(TerminalID::EOI, LRAction::Halt);
            }

            // reduce, accept
            for (core, lookaheads) in &items {
                let rule = grammar.rule(core.rule);
                if core.marker < rule.right.len() {
                    continue;
                }
                for lookahead in lookaheads.iter() {
                    let new = if core.rule == RuleID::ACCEPT {
                        LRAction::Halt
                    } else {
                        LRAction::Reduce(core.rule)
                    };
                    match (actions.get(&lookahead).copied(), new) {
                        (None, new) => {
                            actions.insert(lookahead, new);
                        }
                        (Some(LRAction::Halt), LRAction::Halt) => (),
                        (Some(LRAction::Halt), LRAction::Reduce(..)) if seeded => (),
                        (Some(LRAction::Reduce(r1)), LRAction::Reduce(r2)) => {
                            if r1 != r2 {
                                return Err(LRError::ReduceReduce {
                                    state: raw,
                                    first: grammar.display_rule(r1).to_string(),
                                    second: grammar.display_rule(r2).to_string(),
                                });
                            }
                        }
                        (Some(LRAction::Reduce(r)), _) | (Some(_), LRAction::Reduce(r)) => {
                            return Err(LRError::ReduceAccept {
                                state: raw,
                                rule: grammar.display_rule(r).to_string(),
                            });
                        }
                        (Some(..), _) => (),
                    }
                }
            }

            // shift, goto
            let mut gotos = Map::default();
            for (label, target) in edges {
                let t = match label {
                    SymbolID::T(t) => t,
                    SymbolID::N(n) => {
                        gotos.insert(n, target);
                        continue;
                    }
                };
                match actions.get(&t).copied() {
                    None => {
                        let action = shift_action(&grammar, &items, t).ok_or_else(|| {
                            LRError::ShiftActions {
                                state: raw,
                                terminal: grammar.terminal(t).to_string(),
                            }
                        })?;
                        actions.insert(t, LRAction::Shift { target, action });
                    }
                    Some(existing) => {
                        let reduce = match existing {
                            LRAction::Reduce(r) => grammar.display_rule(r).to_string(),
                            _ => "accept".to_owned(),
                        };
                        tracing::warn!(
                            "shift/reduce conflict in state {} on {}: keeping `{}'",
                            id,
                            grammar.terminal(t),
                            reduce
                        );
                        conflicts.push(Conflict {
                            state: id,
                            terminal: grammar.terminal(t).to_string(),
                            shift: target,
                            reduce,
                        });
                    }
                }
            }

            states.push(LRState {
                items,
                actions,
                gotos,
            });
        }

        tracing::debug!(
            "LR(1) table: {} states, {} conflicts",
            states.len(),
            conflicts.len()
        );

        Ok(Self {
            grammar,
            states,
            conflicts,
        })
    }

    pub fn states(&self) -> &[LRState<A>] {
        &self.states[..]
    }

    /// The shift/reduce collisions found while building the table.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts[..]
    }

    /// Return the terminal class of the interned symbol.
    pub fn terminal(&self, id: TerminalID) -> &Symbol {
        self.grammar.terminal(id)
    }

    pub fn nonterminal(&self, id: NonterminalID) -> &str {
        self.grammar.nonterminal(id)
    }

    /// Parse the token stream, dispatching the shift and reduce actions.
    pub fn parse<D, I>(&self, dispatcher: &mut D, tokens: I) -> bool
    where
        D: Dispatcher<Action = A>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        dispatcher.reset();

        let mut tokens = tokens.into_iter();
        let mut lookahead = tokens.next();
        let mut state_stack = vec![StateID::START];
        let mut symbol_stack: Vec<SymbolID> = vec![];

        loop {
            let current = match state_stack.last() {
                Some(current) => *current,
                None => return false,
            };
            let state = &self.states[current.raw];
            let cx = Context::LR { state: current.raw };
            let token = token_str(&lookahead);

            let (terminal, action) = match state
                .actions
                .iter()
                .find(|(t, _)| self.grammar.terminal(**t).matches(token))
            {
                Some((terminal, action)) => (*terminal, action),
                None => {
                    tracing::trace!("state {}: no action for {:?}", current, token);
                    return false;
                }
            };

            match action {
                LRAction::Halt => return true,

                LRAction::Shift { target, action } => {
                    tracing::trace!("state {}: shift {:?} to {}", current, token, target);
                    state_stack.push(*target);
                    symbol_stack.push(SymbolID::T(terminal));
                    if let Some(action) = action {
                        if !dispatcher.invoke(cx, token, *action) {
                            return false;
                        }
                    }
                    lookahead = tokens.next();
                }

                LRAction::Reduce(rule_id) => {
                    let rule = self.grammar.rule(*rule_id);
                    tracing::trace!(
                        "state {}: reduce by {}",
                        current,
                        self.grammar.display_rule(*rule_id)
                    );
                    let n = rule.right.len();
                    if n >= state_stack.len() || n > symbol_stack.len() {
                        return false;
                    }
                    state_stack.truncate(state_stack.len() - n);
                    symbol_stack.truncate(symbol_stack.len() - n);

                    let top = match state_stack.last() {
                        Some(top) => *top,
                        None => return false,
                    };
                    let target = match self.states[top.raw].gotos.get(&rule.left) {
                        Some(target) => *target,
                        None => return false,
                    };
                    state_stack.push(target);
                    symbol_stack.push(SymbolID::N(rule.left));

                    if let Some(action) = rule.left_action {
                        if !dispatcher.invoke(cx, token, action) {
                            return false;
                        }
                    }
                }
            }
        }
    }
}

/// The action run when the state shifts `terminal`.
///
/// Returns `None` if the items shifting it disagree on the action.
fn shift_action<A: Action>(
    grammar: &Grammar<A>,
    items: &LRItemSet,
    terminal: TerminalID,
) -> Option<Option<A>> {
    let mut found = None;
    for core in items.keys() {
        let rule = grammar.rule(core.rule);
        if rule.right.get(core.marker) != Some(&SymbolID::T(terminal)) {
            continue;
        }
        let action = rule.right_actions[core.marker];
        match found {
            None => found = Some(action),
            Some(prev) if prev != action => return None,
            Some(..) => (),
        }
    }
    Some(found.flatten())
}

impl<A: Action> fmt::Display for LRTable<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = &self.grammar;
        for (i, state) in self.states.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }

            writeln!(f, "#### State {}", StateID::new(i))?;
            writeln!(f, "## items")?;
            for (core, lookaheads) in &state.items {
                let rule = g.rule(core.rule);
                write!(f, "- ({} -:", g.nonterminal(rule.left))?;
                for (i, symbol) in rule.right.iter().enumerate() {
                    if i == core.marker {
                        f.write_str(" .")?;
                    }
                    write!(f, " {}", g.symbol(*symbol))?;
                }
                if core.marker == rule.right.len() {
                    f.write_str(" .")?;
                }
                f.write_str(")  [")?;
                for (i, lookahead) in lookaheads.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", g.terminal(lookahead))?;
                }
                f.write_str("]\n")?;
            }

            writeln!(f, "## actions")?;
            for (terminal, action) in &state.actions {
                let terminal = g.terminal(*terminal);
                match action {
                    LRAction::Shift { target, .. } => {
                        writeln!(f, "- {} => shift({})", terminal, target)?
                    }
                    LRAction::Reduce(rule) => {
                        writeln!(f, "- {} => reduce({})", terminal, g.display_rule(*rule))?
                    }
                    LRAction::Halt => writeln!(f, "- {} => halt", terminal)?,
                }
            }

            writeln!(f, "## gotos")?;
            for (symbol, target) in &state.gotos {
                writeln!(f, "- {} => goto({})", g.nonterminal(*symbol), target)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LRError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error("terminal classes overlap: {} and {}", first, second)]
    Overlap { first: String, second: String },

    #[error(
        "reduce/reduce conflict in state {}: `{}' and `{}'",
        state,
        first,
        second
    )]
    ReduceReduce {
        state: usize,
        first: String,
        second: String,
    },

    #[error("reduce/accept conflict in state {}: `{}'", state, rule)]
    ReduceAccept { state: usize, rule: String },

    /// Items of one state shift the same terminal but attach different
    /// actions to it. The grammar itself may still be LR(1); the actions
    /// have to agree for the shift to be performed once.
    #[error(
        "action clash in state {} on {}: the items shifting it carry different actions",
        state,
        terminal
    )]
    ShiftActions { state: usize, terminal: String },
}
