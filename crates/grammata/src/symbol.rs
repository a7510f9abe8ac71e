//! Symbols shared by both grammar engines.

use crate::util::{display_fn, escape_debug};
use std::fmt;

/// An inclusive range of characters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharRange {
    low: char,
    high: char,
}

impl CharRange {
    pub fn new(low: char, high: char) -> Result<Self, SymbolError> {
        if low > high {
            return Err(SymbolError::OutOfOrder { low, high });
        }
        Ok(Self { low, high })
    }

    pub const fn single(ch: char) -> Self {
        Self { low: ch, high: ch }
    }

    pub fn low(&self) -> char {
        self.low
    }

    pub fn high(&self) -> char {
        self.high
    }

    pub fn contains(&self, ch: char) -> bool {
        self.low <= ch && ch <= self.high
    }
}

impl fmt::Display for CharRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; 4];
        write!(f, "{}", escape_debug(self.low.encode_utf8(&mut buf)))?;
        if self.low != self.high {
            write!(f, "-{}", escape_debug(self.high.encode_utf8(&mut buf)))?;
        }
        Ok(())
    }
}

/// A union of character ranges.
///
/// The ranges are kept sorted and merged, so two sets compare equal exactly
/// when they cover the same characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharSet {
    ranges: Vec<CharRange>,
}

impl CharSet {
    pub fn new<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = CharRange>,
    {
        let mut ranges: Vec<CharRange> = ranges.into_iter().collect();
        ranges.sort();

        let mut merged: Vec<CharRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if (range.low as u32) <= (last.high as u32).saturating_add(1) => {
                    if range.high > last.high {
                        last.high = range.high;
                    }
                }
                _ => merged.push(range),
            }
        }

        Self { ranges: merged }
    }

    pub fn ranges(&self) -> &[CharRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, ch: char) -> bool {
        self.ranges.iter().any(|range| range.contains(ch))
    }

    pub fn is_disjoint(&self, other: &CharSet) -> bool {
        self.ranges.iter().all(|r1| {
            other
                .ranges
                .iter()
                .all(|r2| r1.high < r2.low || r2.high < r1.low)
        })
    }
}

impl fmt::Display for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for range in &self.ranges {
            write!(f, "{}", range)?;
        }
        f.write_str("]")
    }
}

/// A grammar symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    /// A literal token.
    Terminal(String),
    /// A reference to the rules sharing this left-hand side.
    Nonterminal(String),
    /// Any single-character token covered by the set.
    CharSet(CharSet),
    /// The empty string.
    Epsilon,
    /// The end of the input stream.
    EndOfInput,
}

impl Symbol {
    pub fn terminal(text: impl Into<String>) -> Self {
        Self::Terminal(text.into())
    }

    pub fn nonterminal(name: impl Into<String>) -> Self {
        Self::Nonterminal(name.into())
    }

    pub fn is_nonterminal(&self) -> bool {
        matches!(self, Self::Nonterminal(..))
    }

    /// Whether this symbol consumes one input token.
    pub fn is_token_class(&self) -> bool {
        matches!(self, Self::Terminal(..) | Self::CharSet(..))
    }

    /// Check if the lookahead token belongs to this symbol.
    ///
    /// `None` stands for the end of input.
    pub fn matches(&self, token: Option<&str>) -> bool {
        match (self, token) {
            (Self::Terminal(text), Some(token)) => text == token,
            (Self::CharSet(set), Some(token)) => {
                single_char(token).map_or(false, |ch| set.contains(ch))
            }
            (Self::EndOfInput, None) => true,
            _ => false,
        }
    }

    /// Check if some input token would match both symbols.
    pub fn overlaps(&self, other: &Symbol) -> bool {
        match (self, other) {
            (Self::CharSet(s1), Self::CharSet(s2)) => !s1.is_disjoint(s2),
            (Self::CharSet(set), Self::Terminal(text))
            | (Self::Terminal(text), Self::CharSet(set)) => {
                single_char(text).map_or(false, |ch| set.contains(ch))
            }
            _ => self == other,
        }
    }

    pub fn display(&self) -> impl fmt::Display + '_ {
        display_fn(move |f| match self {
            Self::Terminal(text) => write!(f, "'{}'", escape_debug(text)),
            Self::Nonterminal(name) => f.write_str(name),
            Self::CharSet(set) => write!(f, "{}", set),
            Self::Epsilon => f.write_str("~"),
            Self::EndOfInput => f.write_str("$eoi"),
        })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display().fmt(f)
    }
}

fn single_char(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SymbolError {
    #[error("characters are out of order: `{}' > `{}'", .low.escape_debug(), .high.escape_debug())]
    OutOfOrder { low: char, high: char },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(ranges: &[(char, char)]) -> CharSet {
        CharSet::new(ranges.iter().map(|&(l, h)| CharRange::new(l, h).unwrap()))
    }

    #[test]
    fn range_out_of_order() {
        assert!(matches!(
            CharRange::new('z', 'a'),
            Err(SymbolError::OutOfOrder { low: 'z', high: 'a' })
        ));
    }

    #[test]
    fn charset_equality_is_coverage() {
        assert_eq!(set(&[('a', 'c'), ('d', 'f')]), set(&[('a', 'f')]));
        assert_eq!(set(&[('x', 'x'), ('a', 'b')]), set(&[('a', 'b'), ('x', 'x')]));
        assert_ne!(set(&[('a', 'c')]), set(&[('a', 'd')]));
    }

    #[test]
    fn matching_tokens() {
        let digits = Symbol::CharSet(set(&[('0', '9')]));
        assert!(digits.matches(Some("7")));
        assert!(!digits.matches(Some("77")));
        assert!(!digits.matches(None));
        assert!(Symbol::terminal("int").matches(Some("int")));
        assert!(Symbol::EndOfInput.matches(None));
        assert!(!Symbol::nonterminal("int").matches(Some("int")));
    }

    #[test]
    fn overlapping_classes() {
        let lower = Symbol::CharSet(set(&[('a', 'z')]));
        let hex = Symbol::CharSet(set(&[('0', '9'), ('a', 'f')]));
        let digits = Symbol::CharSet(set(&[('0', '9')]));
        assert!(lower.overlaps(&hex));
        assert!(!lower.overlaps(&digits));
        assert!(lower.overlaps(&Symbol::terminal("q")));
        assert!(!lower.overlaps(&Symbol::terminal("if")));
        assert!(!Symbol::terminal("a").overlaps(&Symbol::terminal("b")));
    }

    proptest! {
        #[test]
        fn charset_membership_is_preserved(
            ranges in proptest::collection::vec((0x20u32..0x7f, 0u32..8), 1..6),
            probe in 0x20u32..0x88,
        ) {
            let ranges: Vec<CharRange> = ranges
                .into_iter()
                .map(|(low, len)| {
                    let low = char::from_u32(low).unwrap();
                    let high = char::from_u32(low as u32 + len).unwrap();
                    CharRange::new(low, high).unwrap()
                })
                .collect();
            let probe = char::from_u32(probe).unwrap();
            let expected = ranges.iter().any(|r| r.contains(probe));
            let normalized = CharSet::new(ranges.iter().copied());
            prop_assert_eq!(normalized.contains(probe), expected);
            prop_assert_eq!(CharSet::new(ranges.into_iter().rev()), normalized);
        }
    }
}
