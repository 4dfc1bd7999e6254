//! Parsing and evaluation of chained arithmetic from path segments.
//!
//! An expression has one or two *stages*. Stages are applied strictly left-to-right with no
//! operator precedence, so `2 plus 3 into 4` is `(2 + 3) * 4`.
use super::{
    reply::{self, Reply},
    Response,
};
use hyper::StatusCode;
use serde::{Deserialize, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// An error encountered while validating an expression.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum EvalError {
    /// An operand segment is not a number.
    #[error("Invalid numbers provided")]
    InvalidNumber,

    /// An operation segment is not one of `plus`, `minus`, `into` or `divide`.
    #[error("Invalid operation")]
    InvalidOperation,
}

impl Reply for EvalError {
    #[inline]
    fn into_response(self) -> Response {
        reply::error(StatusCode::BAD_REQUEST, &self.to_string())
    }
}

/// A binary arithmetic operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// `plus`, rendered as `+`.
    Plus,
    /// `minus`, rendered as `-`.
    Minus,
    /// `into`, rendered as `*`.
    Into,
    /// `divide`, rendered as `/`.
    Divide,
}

impl FromStr for Operation {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plus" => Ok(Operation::Plus),
            "minus" => Ok(Operation::Minus),
            "into" => Ok(Operation::Into),
            "divide" => Ok(Operation::Divide),
            _ => Err(EvalError::InvalidOperation),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Operation {
    /// The symbol used when rendering a question.
    pub const fn symbol(self) -> &'static str {
        match self {
            Operation::Plus => "+",
            Operation::Minus => "-",
            Operation::Into => "*",
            Operation::Divide => "/",
        }
    }

    /// Apply this operation. Division follows IEEE-754, so dividing by zero yields an infinity
    /// or NaN rather than an error.
    #[inline]
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Operation::Plus => lhs + rhs,
            Operation::Minus => lhs - rhs,
            Operation::Into => lhs * rhs,
            Operation::Divide => lhs / rhs,
        }
    }
}

/// Parse an operand segment. The whole segment must be a number. `Infinity` and `-Infinity` are
/// the only spellings of a non-finite number; `inf`, `nan` and friends are rejected.
pub fn parse_number(s: &str) -> Result<f64, EvalError> {
    let unsigned = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);

    if unsigned.starts_with(char::is_alphabetic) && unsigned != "Infinity" {
        return Err(EvalError::InvalidNumber);
    }

    s.parse::<f64>().map_err(|_| EvalError::InvalidNumber)
}

/// Renders a number the way the history has always shown them: integral values without a
/// fraction, `Infinity`/`NaN` spelled out, negative zero as `0`, and exponent notation outside
/// of `1e-6 <= |n| < 1e21`.
///
/// ```
/// use hypercalc::eval::Num;
///
/// assert_eq!("6", Num(6.0).to_string());
/// assert_eq!("1.5", Num(1.5).to_string());
/// assert_eq!("-Infinity", Num(f64::NEG_INFINITY).to_string());
/// assert_eq!("1e+21", Num(1e21).to_string());
/// assert_eq!("1e-7", Num(1e-7).to_string());
/// ```
#[derive(Copy, Clone, Debug)]
pub struct Num(pub f64);

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0;

        if n.is_nan() {
            return f.write_str("NaN");
        }
        if n.is_infinite() {
            return f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
        }
        if n == 0.0 {
            return f.write_str("0");
        }

        let abs = n.abs();
        if (1e-6..1e21).contains(&abs) {
            return write!(f, "{}", n);
        }

        let exp = format!("{:e}", n);
        match exp.find('e') {
            Some(i) if !exp[i + 1..].starts_with('-') => {
                write!(f, "{}e+{}", &exp[..i], &exp[i + 1..])
            }
            _ => f.write_str(&exp),
        }
    }
}

/// The outcome of a successful evaluation.
///
/// In json, integral answers are written without a fraction and non-finite answers as `null`.
///
/// ```
/// use hypercalc::eval::Expression;
///
/// let expr = Expression { question: "4 / 0".into(), answer: f64::INFINITY };
/// assert_eq!(r#"{"question":"4 / 0","answer":null}"#, serde_json::to_string(&expr).unwrap());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    /// The rendered expression, e.g. `"3 + 4 - 2"`.
    pub question: String,
    /// The computed result.
    #[serde(serialize_with = "serialize_answer")]
    pub answer: f64,
}

fn serialize_answer<S: Serializer>(n: &f64, s: S) -> Result<S::Ok, S::Error> {
    // largest integer an f64 holds exactly
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;

    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        s.serialize_i64(*n as i64)
    } else {
        s.serialize_f64(*n)
    }
}

/// The raw (percent-decoded) segments of an arithmetic request.
#[derive(Copy, Clone, Debug, Default)]
pub struct Segments<'a> {
    pub num1: &'a str,
    pub operation: &'a str,
    pub num2: &'a str,
    pub operation2: Option<&'a str>,
    pub num3: Option<&'a str>,
}

/// Whether a third operand takes part in the second stage.
///
/// A third operand of zero has always been treated as if it were missing, which skips the
/// second stage entirely.
#[inline]
fn engages_second_stage(num3: f64) -> bool {
    num3 != 0.0
}

/// Validate and evaluate `input`.
///
/// Operands are validated before operations, and the second stage only runs when both
/// `operation2` and a non-zero `num3` are present.
///
/// ```
/// use hypercalc::eval::{evaluate, Segments};
///
/// let expr = evaluate(&Segments {
///     num1: "5",
///     operation: "plus",
///     num2: "3",
///     operation2: Some("minus"),
///     num3: Some("2"),
/// })
/// .unwrap();
///
/// assert_eq!("5 + 3 - 2", expr.question);
/// assert_eq!(6.0, expr.answer);
/// ```
pub fn evaluate(input: &Segments<'_>) -> Result<Expression, EvalError> {
    let num1 = parse_number(input.num1)?;
    let num2 = parse_number(input.num2)?;
    let num3 = input.num3.map(parse_number).transpose()?;

    let op = input.operation.parse::<Operation>()?;

    let mut answer = op.apply(num1, num2);
    let mut question = format!("{} {} {}", Num(num1), op, Num(num2));

    if let (Some(num3), Some(op2)) = (num3.filter(|n| engages_second_stage(*n)), input.operation2)
    {
        let op2 = op2.parse::<Operation>()?;

        answer = op2.apply(answer, num3);
        question = format!("{} {} {}", question, op2, Num(num3));
    }

    Ok(Expression { question, answer })
}
