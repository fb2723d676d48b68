// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Line-oriented text descriptions of object graphs.
//!
//! Lets tooling and tests stand up a [`HeapGraph`] without a live
//! snapshot store:
//!
//! ```text
//! # three objects, one gc root
//! object 0x1 r pairlist 32
//! object 0x2 r vector 128
//! object 0x3 js string 16
//! ref 0x1 0x2
//! root 0x1
//! ```
//!
//! Object ids are hexadecimal with an optional `0x` prefix; shallow sizes
//! are decimal bytes. Blank lines and `#` comments are ignored.

use std::error::Error;
use std::fmt;

use nom::branch::alt;
use nom::bytes::complete::{tag, take_till, take_till1, take_while1};
use nom::character::complete::{digit1, line_ending, space1};
use nom::combinator::{eof, map_res, opt};
use nom::multi::many0;
use nom::IResult;

use anyhow::Result;

use crate::graph::{GraphBuilder, HeapGraph};
use crate::ObjectId;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GraphTextError {
    InvalidFormat,
}

impl From<nom::Err<nom::error::Error<&str>>> for GraphTextError {
    fn from(_: nom::Err<nom::error::Error<&str>>) -> Self {
        GraphTextError::InvalidFormat
    }
}

impl Error for GraphTextError {}

impl fmt::Display for GraphTextError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "invalid graph description")
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Entry {
    Object {
        id: ObjectId,
        tag: String,
        type_name: String,
        shallow_size: u64,
    },
    Reference {
        from: ObjectId,
        to: ObjectId,
    },
    GcRoot {
        id: ObjectId,
    },
    Ignored,
}

/// Parse a text graph description into a ready [`HeapGraph`].
///
/// # Errors
///
/// [`GraphTextError`] for malformed lines; construction errors (duplicate
/// ids, references to unknown objects) surface from the graph builder.
pub fn parse(input: &str) -> Result<HeapGraph> {
    let entries = parse_entries(input)?;

    let mut builder = GraphBuilder::new();
    for entry in entries {
        match entry {
            Entry::Object {
                id,
                tag,
                type_name,
                shallow_size,
            } => builder.object(id, &tag, &type_name, shallow_size),
            Entry::Reference { from, to } => builder.reference(from, to),
            Entry::GcRoot { id } => builder.gc_root(id),
            Entry::Ignored => {}
        }
    }

    builder.build()
}

fn parse_entries(input: &str) -> Result<Vec<Entry>, GraphTextError> {
    let (input, entries) = many0(parse_entry)(input)?;
    let (_, _) = eof(input)?;

    debug!("parsed {} graph entries", entries.len());

    Ok(entries)
}

fn parse_entry(input: &str) -> IResult<&str, Entry> {
    alt((parse_blank, parse_line))(input)
}

fn parse_blank(input: &str) -> IResult<&str, Entry> {
    let (input, _) = line_ending(input)?;

    Ok((input, Entry::Ignored))
}

fn parse_line(input: &str) -> IResult<&str, Entry> {
    let (input, entry) = alt((parse_comment, parse_object, parse_reference, parse_gc_root))(input)?;
    let (input, _) = opt(line_ending)(input)?;

    Ok((input, entry))
}

fn parse_comment(input: &str) -> IResult<&str, Entry> {
    let (input, _) = tag("#")(input)?;
    let (input, _) = take_till(|c| c == '\r' || c == '\n')(input)?;

    Ok((input, Entry::Ignored))
}

fn parse_object(input: &str) -> IResult<&str, Entry> {
    let (input, _) = tag("object")(input)?;
    let (input, _) = space1(input)?;
    let (input, id) = parse_id(input)?;
    let (input, _) = space1(input)?;
    let (input, tag) = parse_word(input)?;
    let (input, _) = space1(input)?;
    let (input, type_name) = parse_word(input)?;
    let (input, _) = space1(input)?;
    let (input, shallow_size) = parse_size(input)?;

    Ok((
        input,
        Entry::Object {
            id,
            tag,
            type_name,
            shallow_size,
        },
    ))
}

fn parse_reference(input: &str) -> IResult<&str, Entry> {
    let (input, _) = tag("ref")(input)?;
    let (input, _) = space1(input)?;
    let (input, from) = parse_id(input)?;
    let (input, _) = space1(input)?;
    let (input, to) = parse_id(input)?;

    Ok((input, Entry::Reference { from, to }))
}

fn parse_gc_root(input: &str) -> IResult<&str, Entry> {
    let (input, _) = tag("root")(input)?;
    let (input, _) = space1(input)?;
    let (input, id) = parse_id(input)?;

    Ok((input, Entry::GcRoot { id }))
}

fn parse_id(input: &str) -> IResult<&str, ObjectId> {
    let (input, _) = opt(tag("0x"))(input)?;
    let (input, id) = map_res(take_while1(is_hex_digit), from_hex)(input)?;

    Ok((input, ObjectId(id)))
}

fn parse_size(input: &str) -> IResult<&str, u64> {
    map_res(digit1, str::parse)(input)
}

fn parse_word(input: &str) -> IResult<&str, String> {
    let (input, word) = take_till1(|c: char| c.is_ascii_whitespace())(input)?;

    Ok((input, word.to_owned()))
}

fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

fn from_hex(input: &str) -> Result<u64, std::num::ParseIntError> {
    u64::from_str_radix(input, 16)
}
