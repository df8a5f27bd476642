use crate::ast::LineNumber;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    IO(#[from] std::io::Error),
    #[error("syntax error{}: {}", at_line(.line), join(.errors))]
    Parser {
        line: Option<LineNumber>,
        errors: Vec<SyntaxError>,
    },
    #[error("runtime error at line {line}: {kind}")]
    Runtime { line: LineNumber, kind: RuntimeError },
    #[error("unknown command '{0}' (use RUN, LIST, NEW or a line-numbered statement)")]
    UnknownCommand(String),
    #[error("missing line number: '{0}'")]
    MissingLineNumber(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("unexpected token {0}")]
    UnexpectedToken(String),
    #[error("unexpected identifier \"{0}\"")]
    UnexpectedIdentifier(String),
    #[error("illegal token: {0}")]
    IllegalToken(String),
    #[error("{0} requires identifier")]
    ExpectedIdentifier(&'static str),
    #[error("expected '=' after identifier")]
    ExpectedEqual,
    #[error("THEN requires statement or line number")]
    ExpectedThen,
    #[error("expected ')'")]
    ExpectedRightParen,
    #[error("{0} requires line number")]
    ExpectedLineNumber(&'static str),
    #[error("invalid number \"{0}\"")]
    InvalidNumber(String),
    #[error("invalid line number \"{0}\"")]
    InvalidLineNumber(String),
    #[error("unexpected {0} after end of statement")]
    TrailingInput(String),
}

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("type mismatch: {name} is a {expected} variable")]
    VariableType { name: String, expected: ValueKind },
    #[error("{operator} requires numeric operands")]
    OperandType { operator: &'static str },
    #[error("type mismatch in comparison")]
    ComparisonType,
    #[error("IF condition must be numeric")]
    ConditionType,
    #[error("division by zero")]
    DivisionByZero,
    #[error("undefined line {0}")]
    UndefinedLine(LineNumber),
    #[error("INPUT expects a number, got \"{0}\"")]
    InputFormat(String),
    #[error("end of input while reading INPUT")]
    EndOfInput,
    #[error("step limit of {0} exceeded (possible infinite loop)")]
    StepLimitExceeded(usize),
    #[error("io error: {0}")]
    IO(#[from] std::io::Error),
}

/// The kind of a runtime value, fixed for a variable by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    String,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Number => write!(f, "numeric"),
            ValueKind::String => write!(f, "string"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

fn at_line(line: &Option<LineNumber>) -> String {
    line.map(|line| format!(" at line {}", line))
        .unwrap_or_default()
}

fn join(errors: &[SyntaxError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
