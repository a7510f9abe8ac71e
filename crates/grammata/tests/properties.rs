use grammata::{
    action::{Action, Context, Dispatcher},
    grammar::RuleSet,
    ll::LLTable,
    lr1::LRTable,
    symbol::{CharRange, CharSet, Symbol},
    types::Set,
};
use proptest::{collection, prelude::*};

fn char_ranges() -> impl Strategy<Value = Vec<(char, char)>> {
    collection::vec(
        (0u8..26, 0u8..6).prop_map(|(low, len)| {
            let low = b'a' + low;
            let high = low.saturating_add(len).min(b'z');
            (low as char, high as char)
        }),
        0..6,
    )
}

fn charset(ranges: &[(char, char)]) -> CharSet {
    CharSet::new(ranges.iter().map(|&(low, high)| CharRange::new(low, high).unwrap()))
}

proptest! {
    #[test]
    fn charset_contains_the_union(ranges in char_ranges()) {
        let set = charset(&ranges);
        for ch in 'a'..='z' {
            let expected = ranges.iter().any(|&(low, high)| low <= ch && ch <= high);
            prop_assert_eq!(set.contains(ch), expected, "{} in {}", ch, set);
        }
    }

    #[test]
    fn charset_ignores_range_order(ranges in char_ranges()) {
        let mut reversed = ranges.clone();
        reversed.reverse();
        prop_assert_eq!(charset(&ranges), charset(&reversed));
    }

    #[test]
    fn charset_ranges_are_sorted_and_apart(ranges in char_ranges()) {
        let set = charset(&ranges);
        for pair in set.ranges().windows(2) {
            prop_assert!((pair[0].high() as u32) + 1 < pair[1].low() as u32, "{}", set);
        }
    }
}

const ATOMS: &[&str] = &["a", "b", "c", "N0", "N1", "N2"];

/// Descriptions of three-nonterminal grammars over `a`, `b` and `c`.
fn grammar_source() -> impl Strategy<Value = String> {
    let alternative = collection::vec(0..ATOMS.len(), 0..4);
    let rules = collection::vec(collection::vec(alternative, 1..4), 3);
    rules.prop_map(|rules| {
        let mut source = String::new();
        for (n, alternatives) in rules.iter().enumerate() {
            source += &format!("N{} -:", n);
            for (i, atoms) in alternatives.iter().enumerate() {
                if i > 0 {
                    source += " |";
                }
                if atoms.is_empty() {
                    source += " ~";
                }
                for &atom in atoms {
                    source += " ";
                    source += ATOMS[atom];
                    if atom < 3 {
                        source += " <t>";
                    }
                }
            }
            source += " ;\n";
        }
        source
    })
}

fn first_of(table: &LLTable<Token>, grammar: &RuleSet, symbol: &Symbol) -> Set<Symbol> {
    match symbol {
        Symbol::Nonterminal(name) => grammar
            .rules_of(name)
            .flat_map(|(i, _)| table.first_sets()[i].iter().cloned())
            .collect(),
        symbol => Some(symbol.clone()).into_iter().collect(),
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Token;

impl Action for Token {
    fn from_name(name: &str) -> Option<Self> {
        (name == "t").then_some(Token)
    }
}

/// Records the tokens passed to the actions.
#[derive(Debug, Default)]
struct Trace(Vec<String>);

impl Dispatcher for Trace {
    type Action = Token;

    fn reset(&mut self) {
        self.0.clear();
    }

    fn invoke(&mut self, _: Context<'_>, token: Option<&str>, _: Token) -> bool {
        self.0.extend(token.map(str::to_owned));
        true
    }
}

proptest! {
    #[test]
    fn ll_follow_sets_are_closed(source in grammar_source()) {
        let grammar = RuleSet::from_str(&source).unwrap();
        let table = match LLTable::<Token>::build(&grammar) {
            Ok(table) => table,
            Err(..) => return Ok(()),
        };

        let follow = |name: &str| table.follow_sets().get(name).cloned().unwrap_or_default();
        prop_assert!(follow("N0").contains(&Symbol::EndOfInput));

        for rule in grammar.rules() {
            let right = rule.right();
            for (k, symbol) in right.iter().enumerate() {
                let name = match symbol {
                    Symbol::Nonterminal(name) => name,
                    _ => continue,
                };
                let follow_k = follow(name);
                let mut nullable = true;
                for next in &right[k + 1..] {
                    let first = first_of(&table, &grammar, next);
                    for t in first.iter().filter(|t| **t != Symbol::Epsilon) {
                        prop_assert!(follow_k.contains(t), "{} not in FOLLOW({})\n{}", t, name, source);
                    }
                    if !first.contains(&Symbol::Epsilon) {
                        nullable = false;
                        break;
                    }
                }
                if nullable {
                    for t in follow(rule.left()).iter() {
                        prop_assert!(follow_k.contains(t), "{} not in FOLLOW({})\n{}", t, name, source);
                    }
                }
            }
        }
    }

    #[test]
    fn ll_first_sets_cover_the_leading_symbol(source in grammar_source()) {
        let grammar = RuleSet::from_str(&source).unwrap();
        let table = match LLTable::<Token>::build(&grammar) {
            Ok(table) => table,
            Err(..) => return Ok(()),
        };
        for (i, rule) in grammar.rules().iter().enumerate() {
            let first = &table.first_sets()[i];
            match rule.right().first() {
                Some(Symbol::Epsilon) | None => prop_assert!(first.contains(&Symbol::Epsilon)),
                Some(symbol) => {
                    for t in first_of(&table, &grammar, symbol).iter().filter(|t| **t != Symbol::Epsilon) {
                        prop_assert!(first.contains(t), "{} not in FIRST of rule {}\n{}", t, i, source);
                    }
                }
            }
        }
    }

    #[test]
    fn lr_parse_is_repeatable(
        source in grammar_source(),
        input in collection::vec(prop_oneof![Just("a"), Just("b"), Just("c")], 0..8),
    ) {
        let table = match LRTable::<Token>::from_str(&source) {
            Ok(table) if table.conflicts().is_empty() => table,
            _ => return Ok(()),
        };

        let mut trace = Trace::default();
        let accepted = table.parse(&mut trace, &input);
        let first = std::mem::take(&mut trace.0);
        prop_assert_eq!(table.parse(&mut trace, &input), accepted);
        prop_assert_eq!(&trace.0, &first);
        if accepted {
            prop_assert_eq!(&first, &input);
        }
    }
}
