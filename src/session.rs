use crate::{
    ast::{LineNumber, Stmt},
    error::{Error, Result},
    parser::Parser,
    program::Program,
    runtime::Interpreter,
    tokenizer::{tokenize, Token},
};
use log::{debug, info};
use std::io::{BufRead, Write};

/// One line typed at the prompt (or read from a file), classified.
#[derive(Debug)]
enum Entry<'a> {
    Blank,
    Delete(LineNumber),
    Store(LineNumber, &'a str, Stmt),
    Command(&'a str),
}

/// Splits `"10 PRINT X"` into `(10, " PRINT X")`.
///
/// The number may be preceded by spaces and must be followed by a space, a
/// tab, or the end of the line. Zero is not a line number.
pub fn split_leading_line_number(line: &str) -> Option<(LineNumber, &str)> {
    let trimmed = line.trim_start_matches(' ');
    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let (number, rest) = trimmed.split_at(digits);
    if !(rest.is_empty() || rest.starts_with([' ', '\t'])) {
        return None;
    }

    match number.parse::<LineNumber>() {
        Ok(line) if line > 0 => Some((line, rest)),
        _ => None,
    }
}

fn classify(line: &str) -> Result<Entry<'_>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(Entry::Blank);
    }

    let Some((number, rest)) = split_leading_line_number(line) else {
        return Ok(Entry::Command(line.trim()));
    };

    let body = rest.trim();
    if body.is_empty() {
        return Ok(Entry::Delete(number));
    }

    let mut parser = Parser::new(body);
    match parser.parse_statement() {
        Some(stmt) => Ok(Entry::Store(number, body, stmt)),
        None => Err(Error::Parser {
            line: Some(number),
            errors: parser.errors().to_vec(),
        }),
    }
}

/// Parses every line of a program file, collecting all errors instead of
/// stopping at the first one.
pub fn check_source(source: &str) -> std::result::Result<Program, Vec<Error>> {
    let mut program = Program::new();
    let mut errors = Vec::new();

    for line in source.lines() {
        match classify(line) {
            Ok(Entry::Blank) => (),
            Ok(Entry::Delete(number)) => program.delete(number),
            Ok(Entry::Store(number, body, stmt)) => program.set(number, body, stmt),
            Ok(Entry::Command(text)) => errors.push(Error::MissingLineNumber(text.to_string())),
            Err(err) => errors.push(err),
        }
    }

    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}

/// A stored program together with the interpreter that runs it.
///
/// Numbered lines edit the program, anything else is a command.
pub struct Session<R, W> {
    program: Program,
    interpreter: Interpreter<R, W>,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(interpreter: Interpreter<R, W>) -> Self {
        Session {
            program: Program::new(),
            interpreter,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn interpreter(&self) -> &Interpreter<R, W> {
        &self.interpreter
    }

    pub fn enter(&mut self, line: &str) -> Result<()> {
        let entry = classify(line)?;
        self.apply(entry)
    }

    /// Enters every line of a program file. Each non-blank line must be numbered.
    pub fn load(&mut self, source: &str) -> Result<()> {
        for line in source.lines() {
            match classify(line)? {
                Entry::Command(text) => return Err(Error::MissingLineNumber(text.to_string())),
                entry => self.apply(entry)?,
            }
        }
        Ok(())
    }

    fn apply(&mut self, entry: Entry) -> Result<()> {
        match entry {
            Entry::Blank => Ok(()),
            Entry::Delete(number) => {
                debug!("delete line {}", number);
                self.program.delete(number);
                Ok(())
            }
            Entry::Store(number, body, stmt) => {
                debug!("set line {}: {}", number, stmt);
                self.program.set(number, body, stmt);
                Ok(())
            }
            Entry::Command(text) => self.command(text),
        }
    }

    fn command(&mut self, text: &str) -> Result<()> {
        match tokenize(text).as_slice() {
            [Token::Run, Token::EOF] => self.run(),
            [Token::List, Token::EOF] => self.list(),
            [Token::New, Token::EOF] => {
                info!("NEW");
                self.program.clear();
                self.interpreter.reset_environment();
                Ok(())
            }
            _ => Err(Error::UnknownCommand(text.to_string())),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        info!("RUN");
        self.interpreter.reset_environment();
        self.interpreter.run(&self.program)
    }

    pub fn list(&mut self) -> Result<()> {
        info!("LIST");
        let output = self.interpreter.output_mut();
        for (number, line) in self.program.iter() {
            writeln!(output, "{} {}", number, line.source)?;
        }
        output.flush()?;
        Ok(())
    }
}
