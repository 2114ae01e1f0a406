//! Calculator plugin
//!
//! Evaluates arithmetic expressions such as `(1 + 2) * 3 ^ 2`. The model is
//! expected to turn a spoken description ("one plus two") into an
//! expression before calling the plugin.

use super::{require_string, Args, Plugin};
use crate::error::PluginError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::iter::Peekable;
use std::str::Chars;

const NAME: &str = "Calculator";
const DESCRIPTION: &str = "A calculator, capable of performing mathematical calculations, \
where the input is a description of a mathematical expression and the return is the result \
of the calculation. For example: the input is: one plus two, the return is three.";
const INPUT_EXAMPLE: &str = r#"{"input": "1+2"}"#;

/// Deepest nesting of parentheses, signs and exponents accepted
const MAX_DEPTH: usize = 256;

/// Largest integer an f64 represents exactly
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Arithmetic expression evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct Calculator;

impl Calculator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Plugin for Calculator {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn input_example(&self) -> &str {
        INPUT_EXAMPLE
    }

    async fn invoke(&self, args: Args) -> Result<Args, PluginError> {
        let input = require_string(&args, "input")?;
        let value = evaluate(input)?;

        let mut result = Args::new();
        result.insert("result".to_string(), json!(true));
        result.insert("message".to_string(), number(value));
        Ok(result)
    }
}

/// Integral results are emitted as JSON integers
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INT {
        json!(value as i64)
    } else {
        json!(value)
    }
}

/// Evaluate an arithmetic expression
pub(crate) fn evaluate(expr: &str) -> Result<f64, PluginError> {
    let mut parser = ExprParser {
        chars: expr.chars().peekable(),
        depth: 0,
    };

    let value = parser.expression()?;
    parser.skip_whitespace();
    if let Some(c) = parser.chars.peek() {
        return Err(syntax(format!("unexpected character '{}'", c)));
    }
    if !value.is_finite() {
        return Err(PluginError::Execution(format!(
            "calculate failed: result of '{}' is not a finite number",
            expr
        )));
    }

    Ok(value)
}

fn syntax(message: String) -> PluginError {
    PluginError::Execution(format!("calculate failed: {}", message))
}

/// Recursive-descent parser; `^` binds tighter than unary minus and is
/// right-associative.
struct ExprParser<'a> {
    chars: Peekable<Chars<'a>>,
    depth: usize,
}

impl ExprParser<'_> {
    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        self.chars.next_if_eq(&expected).is_some()
    }

    fn expression(&mut self) -> Result<f64, PluginError> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64, PluginError> {
        let mut value = self.unary()?;
        loop {
            if self.eat('*') {
                value *= self.unary()?;
            } else if self.eat('/') {
                let divisor = self.unary()?;
                if divisor == 0.0 {
                    return Err(syntax("division by zero".to_string()));
                }
                value /= divisor;
            } else if self.eat('%') {
                let divisor = self.unary()?;
                if divisor == 0.0 {
                    return Err(syntax("modulo by zero".to_string()));
                }
                value %= divisor;
            } else {
                return Ok(value);
            }
        }
    }

    /// Every nested subexpression passes through here, so the depth check
    /// bounds recursion for parentheses, signs and `^` chains alike.
    fn unary(&mut self) -> Result<f64, PluginError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(syntax("expression nested too deeply".to_string()));
        }

        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64, PluginError> {
        if self.eat('-') {
            Ok(-self.unary()?)
        } else if self.eat('+') {
            self.unary()
        } else {
            self.power()
        }
    }

    fn power(&mut self) -> Result<f64, PluginError> {
        let base = self.primary()?;
        if self.eat('^') {
            let exponent = self.unary()?;
            Ok(base.powf(exponent))
        } else {
            Ok(base)
        }
    }

    fn primary(&mut self) -> Result<f64, PluginError> {
        if self.eat('(') {
            let value = self.expression()?;
            if !self.eat(')') {
                return Err(syntax("missing closing parenthesis".to_string()));
            }
            return Ok(value);
        }

        self.skip_whitespace();
        let mut literal = String::new();
        while let Some(c) = self.chars.next_if(|c| c.is_ascii_digit() || *c == '.') {
            literal.push(c);
        }

        if !literal.is_empty() {
            return literal
                .parse::<f64>()
                .map_err(|_| syntax(format!("invalid number '{}'", literal)));
        }

        match self.chars.peek() {
            Some(c) => Err(syntax(format!("unexpected character '{}'", c))),
            None => Err(syntax("unexpected end of expression".to_string())),
        }
    }
}
