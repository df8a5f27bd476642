use std::fmt::{self, Display, Formatter};

/// Positive integer key of a program line.
pub type LineNumber = u32;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Comment,
    Assignment {
        name: String,
        value: Expr,
    },
    Print(Vec<Expr>),
    Input {
        name: String,
    },
    If {
        condition: Expr,
        then_branch: Branch,
    },
    Goto(LineNumber),
    End,
}

/// What a true `IF` condition does: jump to a line, or run one embedded statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Branch {
    Jump(LineNumber),
    Statement(Box<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Variable(String),
    Unary {
        operator: UnaryOp,
        right: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Negate => "-",
        }
    }
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "<>",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
        }
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Stmt::Comment => write!(f, "REM"),
            Stmt::Assignment { name, value } => write!(f, "LET {} = {}", name, value),
            Stmt::Print(exprs) => {
                write!(f, "PRINT")?;
                for (i, expr) in exprs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {}", expr)?;
                }
                Ok(())
            }
            Stmt::Input { name } => write!(f, "INPUT {}", name),
            Stmt::If {
                condition,
                then_branch: Branch::Jump(line),
            } => write!(f, "IF {} THEN {}", condition, line),
            Stmt::If {
                condition,
                then_branch: Branch::Statement(stmt),
            } => write!(f, "IF {} THEN {}", condition, stmt),
            Stmt::Goto(line) => write!(f, "GOTO {}", line),
            Stmt::End => write!(f, "END"),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Expr::Literal(Literal::Number(n)) => write!(f, "{}", n),
            Expr::Literal(Literal::String(s)) => write!(f, "\"{}\"", s),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Unary { operator, right } => write!(f, "({}{})", operator.symbol(), right),
            Expr::Binary {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator.symbol(), right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(n: f64) -> Box<Expr> {
        Box::new(Expr::Literal(Literal::Number(n)))
    }

    #[test]
    fn test_expression_display() {
        let expr = Expr::Binary {
            left: number(1.0),
            operator: BinaryOp::Add,
            right: Box::new(Expr::Binary {
                left: number(2.5),
                operator: BinaryOp::Multiply,
                right: Box::new(Expr::Unary {
                    operator: UnaryOp::Negate,
                    right: Box::new(Expr::Variable("X".to_string())),
                }),
            }),
        };
        assert_eq!(expr.to_string(), "(1 + (2.5 * (-X)))");
        assert_eq!(number(0.1).to_string(), "0.1");
        assert_eq!(
            Expr::Literal(Literal::String("HI THERE".to_string())).to_string(),
            "\"HI THERE\""
        );
    }

    #[test]
    fn test_statement_display() {
        assert_eq!(Stmt::Comment.to_string(), "REM");
        assert_eq!(Stmt::Print(vec![]).to_string(), "PRINT");
        assert_eq!(
            Stmt::Print(vec![*number(1.0), Expr::Variable("A$".to_string())]).to_string(),
            "PRINT 1, A$"
        );
        assert_eq!(
            Stmt::If {
                condition: Expr::Variable("X".to_string()),
                then_branch: Branch::Jump(40),
            }
            .to_string(),
            "IF X THEN 40"
        );
        assert_eq!(
            Stmt::If {
                condition: Expr::Variable("X".to_string()),
                then_branch: Branch::Statement(Box::new(Stmt::Goto(10))),
            }
            .to_string(),
            "IF X THEN GOTO 10"
        );
        assert_eq!(
            Stmt::Assignment {
                name: "N".to_string(),
                value: *number(3.0),
            }
            .to_string(),
            "LET N = 3"
        );
    }
}
