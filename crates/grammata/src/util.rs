use std::fmt;

pub fn display_fn(f: impl Fn(&mut fmt::Formatter<'_>) -> fmt::Result) -> impl fmt::Display {
    DisplayFn(f)
}

struct DisplayFn<F>(F);
impl<F> fmt::Display for DisplayFn<F>
where
    F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.0)(formatter)
    }
}

/// Split a text into single-character tokens.
pub fn chars(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.char_indices()
        .map(move |(i, ch)| &text[i..i + ch.len_utf8()])
}

/// Borrow the current token of a stream, `None` standing for the end of input.
pub(crate) fn token_str<T: AsRef<str>>(token: &Option<T>) -> Option<&str> {
    token.as_ref().map(|token| token.as_ref())
}

/// Resolve the escape sequence `\ch`.
pub(crate) fn unescape(ch: char) -> char {
    match ch {
        'n' => '\n',
        't' => '\t',
        ch => ch,
    }
}

pub(crate) fn escape_debug(s: &str) -> impl fmt::Display + '_ {
    display_fn(move |f| {
        for ch in s.chars() {
            match ch {
                '\n' => f.write_str("\\n")?,
                '\t' => f.write_str("\\t")?,
                ch => write!(f, "{}", ch)?,
            }
        }
        Ok(())
    })
}
