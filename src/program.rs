use crate::ast::{LineNumber, Stmt};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramLine {
    pub source: String,
    pub statement: Stmt,
}

/// Stored program, always iterated in ascending line order.
#[derive(Debug, Default, Clone)]
pub struct Program {
    lines: BTreeMap<LineNumber, ProgramLine>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a line, replacing any previous entry with the same number.
    pub fn set(&mut self, line: LineNumber, source: impl Into<String>, statement: Stmt) {
        self.lines.insert(
            line,
            ProgramLine {
                source: source.into(),
                statement,
            },
        );
    }

    pub fn delete(&mut self, line: LineNumber) {
        self.lines.remove(&line);
    }

    pub fn get(&self, line: LineNumber) -> Option<&ProgramLine> {
        self.lines.get(&line)
    }

    pub fn ordered_lines(&self) -> Vec<LineNumber> {
        self.lines.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LineNumber, &ProgramLine)> {
        self.lines.iter().map(|(line, entry)| (*line, entry))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
