//! Reader for the compact tree notation used by fixtures and tests.
//!
//! ```text
//! (TypeDeclaration (SimpleName "Example") (FieldDeclaration ...))
//! ```
//!
//! A node is a parenthesized kind name, an optional double-quoted label and
//! its children. Kind names are interned into the grammar given to
//! [`parse_sexp`], node ranges are the byte offsets of the parentheses.

use super::{Grammar, SourceRange, SynTree, TreeBuilder};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SexpError {
    #[error("empty tree notation")]
    Empty,

    #[error("unexpected end of input, {open} node(s) left open")]
    UnexpectedEnd { open: usize },

    #[error("unexpected `{found}` at byte {offset}")]
    Unexpected { offset: usize, found: char },

    #[error("missing kind name at byte {offset}")]
    MissingKind { offset: usize },

    #[error("trailing input at byte {offset}")]
    TrailingInput { offset: usize },
}

struct Reader<'s> {
    text: &'s str,
    pos: usize,
}

impl<'s> Reader<'s> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.bump();
        }
    }

    fn expect_open(&mut self) -> Result<usize, SexpError> {
        self.skip_whitespace();
        let offset = self.pos;
        match self.bump() {
            Some('(') => Ok(offset),
            Some(found) => Err(SexpError::Unexpected { offset, found }),
            None => Err(SexpError::Empty),
        }
    }

    fn kind_name(&mut self) -> Result<&'s str, SexpError> {
        self.skip_whitespace();
        let start = self.pos;
        while self
            .peek()
            .map_or(false, |ch| !ch.is_whitespace() && !matches!(ch, '(' | ')' | '"'))
        {
            self.bump();
        }
        if start == self.pos {
            return Err(SexpError::MissingKind { offset: start });
        }
        Ok(&self.text[start..self.pos])
    }

    fn label(&mut self, open: usize) -> Result<Option<String>, SexpError> {
        self.skip_whitespace();
        if self.peek() != Some('"') {
            return Ok(None);
        }
        self.bump();
        let mut label = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(Some(label)),
                Some('\\') => match self.bump() {
                    Some(escaped) => label.push(escaped),
                    None => return Err(SexpError::UnexpectedEnd { open }),
                },
                Some(ch) => label.push(ch),
                None => return Err(SexpError::UnexpectedEnd { open }),
            }
        }
    }
}

pub fn parse_sexp(grammar: &mut Grammar, text: &str) -> Result<SynTree, SexpError> {
    let mut reader = Reader { text, pos: 0 };

    let root_start = reader.expect_open()?;
    let kind = grammar.intern(reader.kind_name()?);
    let label = reader.label(1)?;
    let mut builder = TreeBuilder::new(kind, label, SourceRange::new(root_start, root_start));
    // Start offsets of the open nodes, the root included
    let mut open_starts = vec![root_start];

    while let Some(&start) = open_starts.last() {
        reader.skip_whitespace();
        let offset = reader.pos;
        match reader.peek() {
            Some(')') => {
                reader.bump();
                open_starts.pop();
                close_with_range(&mut builder, start, reader.pos);
            }
            Some('(') => {
                reader.bump();
                let kind = grammar.intern(reader.kind_name()?);
                let label = reader.label(open_starts.len() + 1)?;
                builder.open(kind, label, SourceRange::new(offset, offset));
                open_starts.push(offset);
            }
            Some(found) => return Err(SexpError::Unexpected { offset, found }),
            None => {
                return Err(SexpError::UnexpectedEnd {
                    open: open_starts.len(),
                })
            }
        }
    }

    reader.skip_whitespace();
    if reader.pos < text.len() {
        return Err(SexpError::TrailingInput { offset: reader.pos });
    }
    Ok(builder.finish())
}

fn close_with_range(builder: &mut TreeBuilder, start: usize, end: usize) {
    if let Some(id) = builder.current() {
        builder.set_range(id, SourceRange::new(start, end));
    }
    builder.close();
}
