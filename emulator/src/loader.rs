//! Program loading.
//!
//! A program is a text file holding one byte per line, written as an 8 digit
//! binary literal. Anything after a `#` is a comment, and lines without a
//! literal are skipped. The parsing is handled by the `nom` library.

use camino::{Utf8Path, Utf8PathBuf};
use miette::{Diagnostic, NamedSource, SourceSpan};
use nom::{
    bytes::complete::take_while_m_n,
    character::complete::{char, space0},
    combinator::{all_consuming, map_res, opt, rest},
    sequence::{delimited, pair, preceded},
    IResult, Offset,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::constants::{Word, MEMORY_SIZE};

#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("could not read program {path}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid byte literal on line {line}")]
    #[diagnostic(help("each line holds one 8 digit binary literal, like 10000010"))]
    Syntax {
        line: usize,

        #[source_code]
        source_code: NamedSource<String>,

        #[label("expected 8 binary digits")]
        span: SourceSpan,
    },

    #[error("program is {size} bytes long, but the memory only holds {max}", max = MEMORY_SIZE)]
    TooLarge { size: usize },
}

/// A loaded program, ready to be copied in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    bytes: Vec<Word>,
}

impl Program {
    /// Read and parse a program file
    ///
    /// # Errors
    ///
    /// Fails if the file can't be read or isn't a valid program.
    pub fn from_path(path: &Utf8Path) -> Result<Self, LoadError> {
        info!(%path, "Reading program");
        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_owned(),
            source,
        })?;
        parse_named(path.as_str(), &source)
    }

    #[must_use]
    pub fn bytes(&self) -> &[Word] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn is_bin_digit(c: char) -> bool {
    c.is_digit(2)
}

/// Parse an 8 digit binary literal
fn parse_byte(input: &str) -> IResult<&str, Word> {
    map_res(take_while_m_n(8, 8, is_bin_digit), |digits: &str| {
        Word::from_str_radix(digits, 2)
    })(input)
}

fn parse_comment(input: &str) -> IResult<&str, &str> {
    preceded(char('#'), rest)(input)
}

/// Parse a whole line, which may or may not hold a byte
fn parse_line(input: &str) -> IResult<&str, Option<Word>> {
    all_consuming(delimited(
        space0,
        opt(parse_byte),
        pair(space0, opt(parse_comment)),
    ))(input)
}

/// Parse a program from its source
///
/// # Errors
///
/// Fails on the first line that is not a valid byte literal, or if the
/// program does not fit in memory.
pub fn parse_program(source: &str) -> Result<Program, LoadError> {
    parse_named("<program>", source)
}

fn parse_named(name: &str, source: &str) -> Result<Program, LoadError> {
    let mut bytes = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let (_, byte) = parse_line(line).map_err(|_| {
            // Point at what is left once comments and spaces are removed
            let literal = line.split('#').next().unwrap_or_default().trim();
            LoadError::Syntax {
                line: index + 1,
                source_code: NamedSource::new(name, source.to_owned()),
                span: (source.offset(literal), literal.len()).into(),
            }
        })?;

        bytes.extend(byte);
    }

    if bytes.len() > MEMORY_SIZE {
        return Err(LoadError::TooLarge { size: bytes.len() });
    }

    debug!(size = bytes.len(), "Parsed program");
    Ok(Program { bytes })
}
