//! Calculator tool: evaluates arithmetic expressions.
//!
//! Grammar: `+ - * / %`, right-associative `^`, parentheses, unary minus
//! and decimal literals. Evaluated by a small recursive-descent parser.

use async_trait::async_trait;
use harkaam_core::error::ToolError;
use harkaam_core::tool::{ParameterType, Tool, ToolParameter, ToolResult};
use std::iter::Peekable;
use std::str::Chars;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression, e.g. calculator: (2 + 3) * 4"
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::new(
            "expression",
            ParameterType::String,
            "The arithmetic expression to evaluate",
        )]
    }

    async fn execute(&self, input: &str) -> Result<ToolResult, ToolError> {
        let value = evaluate(input).map_err(|reason| ToolError::ExecutionFailed {
            tool_name: "calculator".into(),
            reason,
        })?;
        Ok(ToolResult::ok(format_number(value)).with_data(serde_json::json!({ "result": value })))
    }
}

/// Render integers without a trailing `.0`.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

// ── Evaluator ──────────────────────────────────────────────────────────────

/// Evaluate an arithmetic expression.
pub fn evaluate(expr: &str) -> Result<f64, String> {
    let mut eval = Evaluator { chars: expr.chars().peekable() };
    let value = eval.sum()?;
    eval.skip_ws();
    match eval.chars.peek() {
        None => Ok(value),
        Some(c) => Err(format!("Unexpected character: '{c}'")),
    }
}

struct Evaluator<'a> {
    chars: Peekable<Chars<'a>>,
}

impl Evaluator<'_> {
    fn skip_ws(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        self.chars.next_if_eq(&expected).is_some()
    }

    // sum = product (('+' | '-') product)*
    fn sum(&mut self) -> Result<f64, String> {
        let mut acc = self.product()?;
        loop {
            if self.eat('+') {
                acc += self.product()?;
            } else if self.eat('-') {
                acc -= self.product()?;
            } else {
                return Ok(acc);
            }
        }
    }

    // product = power (('*' | '/' | '%') power)*
    fn product(&mut self) -> Result<f64, String> {
        let mut acc = self.power()?;
        loop {
            if self.eat('*') {
                acc *= self.power()?;
            } else if self.eat('/') {
                let rhs = self.power()?;
                if rhs == 0.0 {
                    return Err("Division by zero".into());
                }
                acc /= rhs;
            } else if self.eat('%') {
                let rhs = self.power()?;
                if rhs == 0.0 {
                    return Err("Modulo by zero".into());
                }
                acc %= rhs;
            } else {
                return Ok(acc);
            }
        }
    }

    // power = unary ('^' power)?
    fn power(&mut self) -> Result<f64, String> {
        let base = self.unary()?;
        if self.eat('^') {
            let exp = self.power()?;
            return Ok(base.powf(exp));
        }
        Ok(base)
    }

    // unary = '-' unary | atom
    fn unary(&mut self) -> Result<f64, String> {
        if self.eat('-') {
            return Ok(-self.unary()?);
        }
        self.atom()
    }

    // atom = NUMBER | '(' sum ')'
    fn atom(&mut self) -> Result<f64, String> {
        if self.eat('(') {
            let inner = self.sum()?;
            if !self.eat(')') {
                return Err("Expected closing parenthesis".into());
            }
            return Ok(inner);
        }
        self.skip_ws();
        let mut literal = String::new();
        while let Some(c) = self.chars.next_if(|c| c.is_ascii_digit() || *c == '.') {
            literal.push(c);
        }
        if literal.is_empty() {
            return match self.chars.peek() {
                Some(c) => Err(format!("Unexpected character: '{c}'")),
                None => Err("Unexpected end of expression".into()),
            };
        }
        literal
            .parse()
            .map_err(|_| format!("Invalid number: {literal}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("((1 + 2) * (3 + 4))").unwrap(), 21.0);
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(evaluate("-2 ^ 2").unwrap(), 4.0);
    }

    #[test]
    fn modulo_and_division() {
        assert_eq!(evaluate("10 % 4").unwrap(), 2.0);
        assert_eq!(evaluate("10 / 4").unwrap(), 2.5);
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("1 % 0").is_err());
    }

    #[test]
    fn malformed_input() {
        assert!(evaluate("").is_err());
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("2 $ 3").is_err());
        assert!(evaluate("1.2.3").is_err());
    }

    #[test]
    fn integer_formatting() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[tokio::test]
    async fn tool_execute() {
        let result = CalculatorTool.execute("15 * 4").await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "60");
        assert_eq!(result.data.unwrap()["result"], 60.0);
    }

    #[tokio::test]
    async fn tool_reports_bad_expression() {
        let err = CalculatorTool.execute("two plus two").await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }
}
