use crate::{
    ast::{BinaryOp, Branch, Expr, LineNumber, Literal, Stmt, UnaryOp},
    environment::{kind_of, Environment},
    error::{Error, Result, RuntimeError, ValueKind},
    program::Program,
};
use log::{debug, trace};
use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
    io::{BufRead, Write},
};

pub const DEFAULT_MAX_STEPS: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    String(String),
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

/// Shortest round-trip digits, switching to `1e+21` / `1e-05` style exponents
/// outside `1e-4 <= |n| < 1e21`.
fn format_number(n: f64) -> String {
    let magnitude = n.abs();
    if magnitude != 0.0 && !(1e-4..1e21).contains(&magnitude) {
        let formatted = format!("{:e}", n);
        if let Some((mantissa, exponent)) = formatted.split_once('e') {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            return format!("{}e{}{:0>2}", mantissa, sign, digits);
        }
    }
    n.to_string()
}

/// Where execution continues after a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next(usize),
    Halt,
}

/// Executes a [`Program`] against its own variable environment.
///
/// Program output goes to `output`; `INPUT` statements read lines from
/// `input`. A run counts every executed statement and gives up once
/// `max_steps` is exceeded (`0` means no limit).
pub struct Interpreter<R, W> {
    environment: Environment,
    input: R,
    output: W,
    max_steps: usize,
}

impl<R: BufRead, W: Write> Interpreter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Interpreter {
            environment: Environment::new(),
            input,
            output,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn reset_environment(&mut self) {
        self.environment = Environment::new();
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn run(&mut self, program: &Program) -> Result<()> {
        let order = program.ordered_lines();
        let line_index: HashMap<LineNumber, usize> = order
            .iter()
            .enumerate()
            .map(|(index, line)| (*line, index))
            .collect();

        debug!("running {} lines", order.len());

        let mut pc = 0;
        let mut steps = 0;
        while let Some(&line) = order.get(pc) {
            steps += 1;
            if self.max_steps > 0 && steps > self.max_steps {
                return Err(Error::Runtime {
                    line,
                    kind: RuntimeError::StepLimitExceeded(self.max_steps),
                });
            }

            let Some(entry) = program.get(line) else {
                break;
            };
            trace!("{} {}", line, entry.statement);

            match self.execute(&entry.statement, pc, &line_index) {
                Ok(Flow::Next(next)) => pc = next,
                Ok(Flow::Halt) => {
                    debug!("END at line {} after {} steps", line, steps);
                    break;
                }
                Err(kind) => {
                    debug!("run aborted at line {}: {}", line, kind);
                    return Err(Error::Runtime { line, kind });
                }
            }
        }

        self.output.flush()?;
        Ok(())
    }

    fn execute(
        &mut self,
        stmt: &Stmt,
        pc: usize,
        line_index: &HashMap<LineNumber, usize>,
    ) -> std::result::Result<Flow, RuntimeError> {
        let next = Flow::Next(pc + 1);

        match stmt {
            Stmt::Comment => Ok(next),
            Stmt::Assignment { name, value } => {
                let value = self.evaluate(value)?;
                self.environment.set(name, value)?;
                Ok(next)
            }
            Stmt::Print(exprs) => {
                // Evaluate everything first so a failure prints nothing
                let parts = exprs
                    .iter()
                    .map(|expr| self.evaluate(expr).map(|value| value.to_string()))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                writeln!(self.output, "{}", parts.join(" "))?;
                Ok(next)
            }
            Stmt::Input { name } => {
                let line = self.read_line()?;
                let value = match (kind_of(name), line) {
                    // exhausted input leaves a string variable empty
                    (ValueKind::String, line) => Value::String(line.unwrap_or_default()),
                    (ValueKind::Number, None) => return Err(RuntimeError::EndOfInput),
                    (ValueKind::Number, Some(line)) => Value::Number(
                        line.trim()
                            .parse()
                            .map_err(|_| RuntimeError::InputFormat(line.clone()))?,
                    ),
                };
                self.environment.set(name, value)?;
                Ok(next)
            }
            Stmt::If {
                condition,
                then_branch,
            } => {
                let truthy = match self.evaluate(condition)? {
                    Value::Number(n) => n != 0.0,
                    Value::String(_) => return Err(RuntimeError::ConditionType),
                };

                if !truthy {
                    return Ok(next);
                }

                match then_branch {
                    Branch::Jump(target) => jump(*target, line_index),
                    Branch::Statement(stmt) => self.execute(stmt, pc, line_index),
                }
            }
            Stmt::Goto(target) => jump(*target, line_index),
            Stmt::End => Ok(Flow::Halt),
        }
    }

    /// Prompts with `? ` and reads one line without its line ending, or
    /// `None` once the input is exhausted.
    fn read_line(&mut self) -> std::result::Result<Option<String>, RuntimeError> {
        write!(self.output, "? ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    pub fn evaluate(&self, expr: &Expr) -> std::result::Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(Literal::Number(n)) => Ok(Value::Number(*n)),
            Expr::Literal(Literal::String(s)) => Ok(Value::String(s.clone())),
            Expr::Variable(name) => Ok(self.environment.get(name)),
            Expr::Unary { operator, right } => evaluate_unary(*operator, self.evaluate(right)?),
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                evaluate_binary(left_val, *operator, right_val)
            }
        }
    }
}

fn jump(
    target: LineNumber,
    line_index: &HashMap<LineNumber, usize>,
) -> std::result::Result<Flow, RuntimeError> {
    debug!("jump to line {}", target);
    line_index
        .get(&target)
        .map(|index| Flow::Next(*index))
        .ok_or(RuntimeError::UndefinedLine(target))
}

fn evaluate_unary(operator: UnaryOp, right: Value) -> std::result::Result<Value, RuntimeError> {
    match (operator, right) {
        (UnaryOp::Plus, Value::Number(n)) => Ok(Value::Number(n)),
        (UnaryOp::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
        (operator, Value::String(_)) => Err(RuntimeError::OperandType {
            operator: operator.symbol(),
        }),
    }
}

fn evaluate_binary(
    left: Value,
    operator: BinaryOp,
    right: Value,
) -> std::result::Result<Value, RuntimeError> {
    match operator {
        BinaryOp::Equal | BinaryOp::NotEqual => {
            let equal = match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => a == b,
                (Value::String(a), Value::String(b)) => a == b,
                _ => return Err(RuntimeError::ComparisonType),
            };
            Ok(truth(equal == (operator == BinaryOp::Equal)))
        }
        _ => {
            let (Value::Number(a), Value::Number(b)) = (left, right) else {
                return Err(RuntimeError::OperandType {
                    operator: operator.symbol(),
                });
            };

            match operator {
                BinaryOp::Add => Ok(Value::Number(a + b)),
                BinaryOp::Subtract => Ok(Value::Number(a - b)),
                BinaryOp::Multiply => Ok(Value::Number(a * b)),
                BinaryOp::Divide if b == 0.0 => Err(RuntimeError::DivisionByZero),
                BinaryOp::Divide => Ok(Value::Number(a / b)),
                BinaryOp::Less => Ok(truth(a < b)),
                BinaryOp::LessEqual => Ok(truth(a <= b)),
                BinaryOp::Greater => Ok(truth(a > b)),
                BinaryOp::GreaterEqual => Ok(truth(a >= b)),
                BinaryOp::Equal | BinaryOp::NotEqual => unreachable!(),
            }
        }
    }
}

fn truth(b: bool) -> Value {
    Value::Number(if b { 1.0 } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use std::io::{empty, Cursor, Empty};

    fn load_program(lines: &[(LineNumber, &str)]) -> Result<Program> {
        let mut program = Program::new();
        for (line, source) in lines {
            program.set(*line, *source, parse(source)?);
        }
        Ok(program)
    }

    fn run_with_input(lines: &[(LineNumber, &str)], input: &str) -> (Result<()>, String) {
        let mut interpreter = Interpreter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let result = load_program(lines).and_then(|program| interpreter.run(&program));
        let output = String::from_utf8_lossy(interpreter.output()).into_owned();
        (result, output)
    }

    fn run(lines: &[(LineNumber, &str)]) -> (Result<()>, String) {
        run_with_input(lines, "")
    }

    fn eval(source: &str) -> std::result::Result<Value, RuntimeError> {
        let interpreter: Interpreter<Empty, Vec<u8>> = Interpreter::new(empty(), Vec::new());
        match parse(&format!("PRINT {}", source)) {
            Ok(Stmt::Print(exprs)) => interpreter.evaluate(&exprs[0]),
            other => panic!("Expected PRINT, got {:?}", other),
        }
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3").ok(), Some(Value::Number(7.0)));
        assert_eq!(eval("2 - 3 - 4").ok(), Some(Value::Number(-5.0)));
        assert_eq!(eval("-(2 + 3) * +2").ok(), Some(Value::Number(-10.0)));
        assert_eq!(eval("7 / 2").ok(), Some(Value::Number(3.5)));
        assert!(matches!(eval("1 / 0"), Err(RuntimeError::DivisionByZero)));
        assert!(matches!(
            eval("\"A\" + 1"),
            Err(RuntimeError::OperandType { operator: "+" })
        ));
        assert!(matches!(
            eval("-\"A\""),
            Err(RuntimeError::OperandType { operator: "-" })
        ));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval("1 = 1").ok(), Some(Value::Number(1.0)));
        assert_eq!(eval("1 <> 1").ok(), Some(Value::Number(0.0)));
        assert_eq!(eval("\"A\" = \"A\"").ok(), Some(Value::Number(1.0)));
        assert_eq!(eval("\"A\" <> \"B\"").ok(), Some(Value::Number(1.0)));
        assert_eq!(eval("2 < 3").ok(), Some(Value::Number(1.0)));
        assert_eq!(eval("3 <= 3").ok(), Some(Value::Number(1.0)));
        assert_eq!(eval("2 > 3").ok(), Some(Value::Number(0.0)));
        assert_eq!(eval("3 >= 3").ok(), Some(Value::Number(1.0)));
        assert_eq!(eval("5 >= -5").ok(), Some(Value::Number(1.0)));
        assert_eq!(eval("1 >= 2").ok(), Some(Value::Number(0.0)));
        assert!(matches!(eval("1 = \"1\""), Err(RuntimeError::ComparisonType)));
        assert!(matches!(
            eval("\"A\" < \"B\""),
            Err(RuntimeError::OperandType { operator: "<" })
        ));
    }

    #[test]
    fn test_unset_variables() {
        assert_eq!(eval("X + 1").ok(), Some(Value::Number(1.0)));
        assert_eq!(eval("A$ = \"\"").ok(), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_print() {
        let (result, output) = run(&[(10, "PRINT \"A\", 1.5, X"), (20, "PRINT")]);
        assert!(result.is_ok());
        assert_eq!(output, "A 1.5 0\n\n");
    }

    #[test]
    fn test_print_fails_without_partial_output() {
        let (result, output) = run(&[(10, "PRINT 1, 2 / 0")]);
        assert!(matches!(
            result,
            Err(Error::Runtime {
                line: 10,
                kind: RuntimeError::DivisionByZero
            })
        ));
        assert_eq!(output, "");
    }

    #[test]
    fn test_assignment_type_mismatch() {
        let (result, _) = run(&[(10, "LET X = \"TEXT\"")]);
        assert!(matches!(
            result,
            Err(Error::Runtime {
                line: 10,
                kind: RuntimeError::VariableType { .. }
            })
        ));
    }

    #[test]
    fn test_goto_and_end() {
        let (result, output) = run(&[
            (10, "GOTO 30"),
            (20, "PRINT \"SKIPPED\""),
            (30, "PRINT \"HERE\""),
            (40, "END"),
            (50, "PRINT \"AFTER END\""),
        ]);
        assert!(result.is_ok());
        assert_eq!(output, "HERE\n");
    }

    #[test]
    fn test_undefined_jump_target() {
        let (result, output) = run(&[(10, "PRINT 1"), (20, "GOTO 99")]);
        assert!(matches!(
            result,
            Err(Error::Runtime {
                line: 20,
                kind: RuntimeError::UndefinedLine(99)
            })
        ));
        assert_eq!(output, "1\n");

        let (result, _) = run(&[(10, "IF 1 THEN 99")]);
        assert!(matches!(
            result,
            Err(Error::Runtime {
                line: 10,
                kind: RuntimeError::UndefinedLine(99)
            })
        ));

        // a false condition never resolves its target
        let (result, _) = run(&[(10, "IF 0 THEN 99")]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_embedded_statements() {
        let (result, output) = run(&[
            (10, "IF 1 THEN PRINT \"YES\""),
            (20, "IF 0 THEN PRINT \"NO\""),
            (30, "IF 1 THEN GOTO 50"),
            (40, "PRINT \"SKIPPED\""),
            (50, "IF 1 THEN IF 1 THEN END"),
            (60, "PRINT \"AFTER END\""),
        ]);
        assert!(result.is_ok());
        assert_eq!(output, "YES\n");
    }

    #[test]
    fn test_condition_must_be_numeric() {
        let (result, _) = run(&[(10, "IF \"A\" THEN 10")]);
        assert!(matches!(
            result,
            Err(Error::Runtime {
                line: 10,
                kind: RuntimeError::ConditionType
            })
        ));
    }

    #[test]
    fn test_step_limit() {
        let mut interpreter = Interpreter::new(empty(), Vec::new()).with_max_steps(100);
        let program = load_program(&[(10, "GOTO 10")]).expect("program parses");
        assert!(matches!(
            interpreter.run(&program),
            Err(Error::Runtime {
                line: 10,
                kind: RuntimeError::StepLimitExceeded(100)
            })
        ));

        // exactly at the budget is fine
        let mut interpreter = Interpreter::new(empty(), Vec::new()).with_max_steps(3);
        let program = load_program(&[(10, "REM"), (20, "REM"), (30, "REM")]).expect("program parses");
        assert!(interpreter.run(&program).is_ok());
    }

    #[test]
    fn test_input() {
        let (result, output) = run_with_input(
            &[(10, "INPUT N"), (20, "INPUT S$"), (30, "PRINT N * 2, S$")],
            " 21 \r\n  hello there\n",
        );
        assert!(result.is_ok());
        assert_eq!(output, "? ? 42   hello there\n");

        let (result, _) = run_with_input(&[(10, "INPUT N")], "abc\n");
        assert!(matches!(
            result,
            Err(Error::Runtime {
                line: 10,
                kind: RuntimeError::InputFormat(ref line)
            }) if line == "abc"
        ));

        let (result, _) = run_with_input(&[(10, "INPUT N")], "");
        assert!(matches!(
            result,
            Err(Error::Runtime {
                line: 10,
                kind: RuntimeError::EndOfInput
            })
        ));
    }

    #[test]
    fn test_input_exhausted_string_target() {
        let (result, output) = run_with_input(
            &[
                (10, "LET A$ = \"OLD\""),
                (20, "INPUT A$"),
                (30, "PRINT \"[\", A$, \"]\""),
            ],
            "",
        );
        assert!(result.is_ok());
        assert_eq!(output, "? [  ]\n");
    }

    #[test]
    fn test_reset_environment() -> Result<()> {
        let program = load_program(&[(10, "LET X = X + 1"), (20, "PRINT X")])?;
        let mut interpreter = Interpreter::new(empty(), Vec::new());

        interpreter.run(&program)?;
        interpreter.run(&program)?;
        assert_eq!(interpreter.environment().get("X"), Value::Number(2.0));

        interpreter.reset_environment();
        assert!(interpreter.environment().is_empty());
        interpreter.run(&program)?;
        assert_eq!(interpreter.output().as_slice(), b"1\n2\n1\n");
        Ok(())
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Number(6.0).to_string(), "6");
        assert_eq!(Value::Number(-0.5).to_string(), "-0.5");
        assert_eq!(Value::Number(0.1 + 0.2).to_string(), "0.30000000000000004");
        assert_eq!(Value::Number(123456789.0).to_string(), "123456789");
        assert_eq!(Value::Number(0.0001).to_string(), "0.0001");
        assert_eq!(Value::Number(1e300).to_string(), "1e+300");
        assert_eq!(Value::Number(1e21).to_string(), "1e+21");
        assert_eq!(Value::Number(-1.5e-7).to_string(), "-1.5e-07");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "inf");
        assert_eq!(Value::String("hi".to_string()).to_string(), "hi");
    }
}
