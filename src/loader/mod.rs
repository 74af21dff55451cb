//! The program loader for LS-8.
//!
//! Programs are plain text with one byte per line, written as an 8-bit binary
//! literal. Everything from a `#` to the end of the line is a comment, and lines
//! that are empty once comments and whitespace are removed are skipped.
//!
//! ```text
//! # print8.ls8
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! ```

use std::{fs, path::Path};

use anyhow::{Context, Result};
use nom::{
    bytes::complete::{take_till, take_while1},
    character::complete::{char, line_ending},
    combinator::{all_consuming, map_res, opt},
    sequence::{pair, preceded, terminated},
    IResult,
};
use nom_locate::LocatedSpan;
use thiserror::Error;

use crate::plat::MEMORY_SIZE;

pub type Span<'a> = LocatedSpan<&'a str>;

/// An error for the loader module of LS-8.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("malformed instruction on line {line}: {text:?}")]
    MalformedInstruction { line: u32, text: String },
    #[error("program is {0} bytes long but memory only holds {} bytes", MEMORY_SIZE)]
    TooLarge(usize),
}

/// Splits one physical line off the input, returning its code portion with any comment removed.
fn line(inp: Span) -> IResult<Span, Span> {
    terminated(
        take_till(|c: char| c == '#' || c == '\n'),
        pair(
            opt(preceded(char('#'), take_till(|c: char| c == '\n'))),
            opt(line_ending),
        ),
    )(inp)
}

/// An 8-bit binary literal, e.g. `10000010`.
fn byte(inp: &str) -> IResult<&str, u8> {
    all_consuming(map_res(
        take_while1(|c: char| c == '0' || c == '1'),
        |digits: &str| u8::from_str_radix(digits, 2),
    ))(inp)
}

/// Parses program text into the memory image it describes.
///
/// # Errors
///
/// This function will return an error on the first line that is not a valid
/// binary byte, or if the program would not fit in memory.
pub fn parse_program(src: &str) -> Result<Vec<u8>, LoadError> {
    let mut inp = Span::new(src);
    let mut image = Vec::new();
    while !inp.fragment().is_empty() {
        let (rest, code) = line(inp).map_err(|_| LoadError::MalformedInstruction {
            line: inp.location_line(),
            text: inp.fragment().lines().next().unwrap_or_default().to_owned(),
        })?;
        let text = code.fragment().trim();
        if !text.is_empty() {
            let (_, value) = byte(text).map_err(|_| LoadError::MalformedInstruction {
                line: code.location_line(),
                text: text.to_owned(),
            })?;
            image.push(value);
        }
        if rest.location_offset() == inp.location_offset() {
            break;
        }
        inp = rest;
    }
    if image.len() > MEMORY_SIZE {
        return Err(LoadError::TooLarge(image.len()));
    }
    Ok(image)
}

/// Reads and parses the program file at `path`.
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let src = fs::read_to_string(path)
        .with_context(|| format!("failed to read program file {}", path.display()))?;
    let image =
        parse_program(&src).with_context(|| format!("failed to load {}", path.display()))?;
    log::info!("parsed {} bytes from {}", image.len(), path.display());
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_program() {
        let program = "
# print8.ls8
10000010 # LDI R0,8
00000000
00001000

01000111 # PRN R0
   00000000
00000001 # HLT
";
        let image = parse_program(program).unwrap();
        assert_eq!(image, [0b1000_0010, 0, 8, 0b0100_0111, 0, 1]);
    }

    #[test]
    fn test_crlf_and_no_trailing_newline() {
        let image = parse_program("00000001\r\n# c\r\n11111111").unwrap();
        assert_eq!(image, [1, 0xFF]);
    }

    #[test]
    fn test_comment_without_space() {
        let image = parse_program("10100000#ADD\n#\n").unwrap();
        assert_eq!(image, [0b1010_0000]);
    }

    #[test]
    fn test_empty_program() {
        assert!(parse_program("").unwrap().is_empty());
        assert!(parse_program("\n\n  # nothing here\n").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_instruction() {
        let err = parse_program("00000001\n\n00000002 # not binary\n").unwrap_err();
        assert_eq!(
            err,
            LoadError::MalformedInstruction {
                line: 3,
                text: "00000002".to_owned()
            }
        );
    }

    #[test]
    fn test_too_wide() {
        let err = parse_program("100000000").unwrap_err();
        assert!(matches!(err, LoadError::MalformedInstruction { line: 1, .. }));
    }

    #[test]
    fn test_too_large() {
        let program = "00000000\n".repeat(MEMORY_SIZE + 1);
        assert_eq!(
            parse_program(&program),
            Err(LoadError::TooLarge(MEMORY_SIZE + 1))
        );
        assert!(parse_program(&"00000000\n".repeat(MEMORY_SIZE)).is_ok());
    }

    #[test]
    fn test_load_file_missing() {
        assert!(load_file("definitely/not/here.ls8").is_err());
    }
}
