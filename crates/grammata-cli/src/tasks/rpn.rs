//! Translates infix arithmetic into postfix notation.

use super::{Engine, Table};
use grammata::action::{Action, Context, Dispatcher};
use std::{fmt, mem};

pub const GRAMMAR: &str = include_str!("../../grammars/rpn.gram");

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RpnAction {
    Digit,
    Number,
    Operator,
    Finish,
}

impl Action for RpnAction {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "digit" => Some(Self::Digit),
            "number" => Some(Self::Number),
            "operator" => Some(Self::Operator),
            "finish" => Some(Self::Finish),
            _ => None,
        }
    }
}

fn precedence(op: &str) -> usize {
    match op {
        "+" | "-" => 1,
        "*" | "/" => 2,
        _ => 0,
    }
}

/// Shunting-yard translator driven by the token actions.
#[derive(Debug, Default)]
pub struct Rpn {
    output: Vec<String>,
    operators: Vec<String>,
    number: String,
}

impl Rpn {
    pub fn output(&self) -> &[String] {
        &self.output[..]
    }

    fn operator(&mut self, op: &str) -> bool {
        match op {
            "(" => self.operators.push(op.to_owned()),
            ")" => loop {
                match self.operators.pop() {
                    Some(top) if top == "(" => break,
                    Some(top) => self.output.push(top),
                    None => return false,
                }
            },
            op => {
                while let Some(top) = self.operators.last() {
                    if top == "(" || precedence(top) < precedence(op) {
                        break;
                    }
                    self.output.extend(self.operators.pop());
                }
                self.operators.push(op.to_owned());
            }
        }
        true
    }
}

impl Dispatcher for Rpn {
    type Action = RpnAction;

    fn reset(&mut self) {
        self.output.clear();
        self.operators.clear();
        self.number.clear();
    }

    fn invoke(&mut self, _: Context<'_>, token: Option<&str>, action: RpnAction) -> bool {
        match action {
            RpnAction::Digit => self.number.push_str(token.unwrap_or_default()),
            RpnAction::Number => self.output.push(mem::take(&mut self.number)),
            RpnAction::Operator => match token {
                Some(op) => return self.operator(op),
                None => return false,
            },
            RpnAction::Finish => {
                while let Some(op) = self.operators.pop() {
                    if op == "(" {
                        return false;
                    }
                    self.output.push(op);
                }
            }
        }
        true
    }
}

impl fmt::Display for Rpn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.output.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(item)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Translator {
    table: Table<RpnAction>,
}

impl Translator {
    pub fn new(engine: Engine, grammar: &str) -> anyhow::Result<Self> {
        Ok(Self {
            table: Table::from_source(engine, grammar)?,
        })
    }

    pub fn table(&self) -> &Table<RpnAction> {
        &self.table
    }

    /// Return the postfix form of `expr`, or `None` if it is not an expression.
    pub fn translate(&self, expr: &str) -> Option<String> {
        let mut rpn = Rpn::default();
        let tokens = expr.chars().filter(|ch| !ch.is_whitespace()).map(String::from);
        self.table
            .parse(&mut rpn, tokens)
            .then(|| rpn.to_string())
    }
}
