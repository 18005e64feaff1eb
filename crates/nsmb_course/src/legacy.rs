//! Importer for metadata written by old editor releases
//!
//! Those releases stored a pickled string dictionary instead of `MD2_`. Only enough of the pickle
//! machine is emulated to recover the strings: literals are pushed onto a stack, the memo is
//! honoured, and everything that builds containers or calls objects is skipped. The strings left on
//! the stack are then read as alternating keys and values.

use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};
use winnow::binary::{le_u16, le_u32, le_u64, le_u8, length_take};
use winnow::combinator::{dispatch, empty, fail, terminated};
use winnow::prelude::*;
use winnow::token::{any, take, take_until};
use winnow::PResult;

use crate::error::{Error, Result};
use crate::metadata::{decode_latin1, Metadata};

/// Keys every legacy dictionary holds, no more and no less
pub const LEGACY_KEYS: [&str; 5] = ["Author", "Group", "Password", "Title", "Webpage"];

/// Strings pushed by the encoding machinery of newer pickles rather than by the dictionary
const SENTINELS: [&str; 2] = ["latin1", "utf-8"];

#[derive(Debug, Clone, PartialEq)]
enum Op {
    /// Push a string
    Str(String),
    /// Push a value that is not a string
    Value,
    /// Push an opaque reference to a global
    Global,
    /// Store the top of the stack in the memo
    Put(u64),
    /// Store the top of the stack in the next free memo slot
    Memoize,
    /// Push a value from the memo
    Get(u64),
    /// No effect on the stack
    Nop,
    /// End of the pickle
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Str(String),
    Opaque,
}

fn line<'i>(input: &mut &'i [u8]) -> PResult<&'i [u8]> {
    terminated(take_until(0.., b'\n'), b'\n').parse_next(input)
}

fn decimal_line(input: &mut &[u8]) -> PResult<u64> {
    line.try_map(|l: &[u8]| decode_latin1(l).trim().parse::<u64>())
        .parse_next(input)
}

fn hex_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, count: usize) -> Option<u32> {
    let mut value = 0;
    for _ in 0..count {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

/// Undo the quoting of a protocol 0 string literal
fn unquote(raw: &[u8]) -> String {
    let text = decode_latin1(raw);
    let inner = match text.as_bytes() {
        [b'\'', .., b'\''] | [b'"', .., b'"'] => &text[1..text.len() - 1],
        _ => text.as_str(),
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('x') => match hex_digits(&mut chars, 2).and_then(char::from_u32) {
                Some(c) => out.push(c),
                None => out.push_str("\\x"),
            },
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Undo the raw-unicode-escape encoding of a protocol 0 unicode literal
fn unescape_unicode(raw: &[u8]) -> String {
    let text = decode_latin1(raw);
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let digits = match (c, chars.peek()) {
            ('\\', Some('u')) => 4,
            ('\\', Some('U')) => 8,
            _ => {
                out.push(c);
                continue;
            }
        };

        let mut lookahead = chars.clone();
        lookahead.next();
        match hex_digits(&mut lookahead, digits).and_then(char::from_u32) {
            Some(decoded) => {
                out.push(decoded);
                chars = lookahead;
            }
            None => out.push(c),
        }
    }
    out
}

fn utf8(data: &[u8]) -> core::result::Result<String, std::str::Utf8Error> {
    std::str::from_utf8(data).map(str::to_owned)
}

fn op(input: &mut &[u8]) -> PResult<Op> {
    dispatch! {any;
        // strings
        b'S' => line.map(|l| Op::Str(unquote(l))),
        b'V' => line.map(|l| Op::Str(unescape_unicode(l))),
        b'T' => length_take(le_u32).map(|d| Op::Str(decode_latin1(d))),
        b'U' => length_take(le_u8).map(|d| Op::Str(decode_latin1(d))),
        b'X' => length_take(le_u32).try_map(utf8).map(Op::Str),
        0x8C => length_take(le_u8).try_map(utf8).map(Op::Str),
        0x8D => length_take(le_u64).try_map(utf8).map(Op::Str),
        // memo
        b'p' => decimal_line.map(Op::Put),
        b'q' => le_u8.map(|i| Op::Put(i.into())),
        b'r' => le_u32.map(|i| Op::Put(i.into())),
        0x94 => empty.value(Op::Memoize),
        b'g' => decimal_line.map(Op::Get),
        b'h' => le_u8.map(|i| Op::Get(i.into())),
        b'j' => le_u32.map(|i| Op::Get(i.into())),
        // globals
        b'c' => (line, line).value(Op::Global),
        b'i' => (line, line).value(Op::Nop),
        0x93 => empty.value(Op::Global),
        // other values
        b'I' | b'L' | b'F' => line.value(Op::Value),
        b'J' => le_u32.value(Op::Value),
        b'K' => le_u8.value(Op::Value),
        b'M' => le_u16.value(Op::Value),
        b'G' => take(8usize).value(Op::Value),
        0x8A => length_take(le_u8).value(Op::Value),
        0x8B => length_take(le_u32).value(Op::Value),
        b'C' => length_take(le_u8).value(Op::Value),
        b'B' => length_take(le_u32).value(Op::Value),
        0x8E => length_take(le_u64).value(Op::Value),
        b'N' | b'}' | b']' | b')' | 0x88 | 0x89 | 0x8F => empty.value(Op::Value),
        // framing
        0x80 => le_u8.value(Op::Nop),
        0x95 => le_u64.value(Op::Nop),
        // containers, calls and stack shuffling
        b'(' | b'd' | b'l' | b't' | b's' | b'u' | b'a' | b'e' | b'0' | b'1' | b'2'
            | b'R' | b'b' | b'o' | 0x81 | 0x85 | 0x86 | 0x87 | 0x90 | 0x91 | 0x92 => {
            empty.value(Op::Nop)
        },
        b'.' => empty.value(Op::Stop),
        _ => fail,
    }
    .parse_next(input)
}

/// Run the pickle and return the strings left on the stack, minus the sentinels
fn strings(data: &[u8]) -> Result<Vec<String>> {
    let mut input = data;
    let mut stack: Vec<Value> = Vec::new();
    let mut memo: HashMap<u64, Value> = HashMap::new();

    while !input.is_empty() {
        let offset = data.len() - input.len();
        let next = op(&mut input)
            .map_err(|err| Error::InvalidLegacyMetadata(format!("at {offset:#x}: {err}")))?;
        trace!(offset, op = ?next);

        match next {
            Op::Str(s) => stack.push(Value::Str(s)),
            Op::Value | Op::Global => stack.push(Value::Opaque),
            Op::Put(index) => {
                if let Some(top) = stack.last() {
                    memo.insert(index, top.clone());
                }
            }
            Op::Memoize => {
                if let Some(top) = stack.last() {
                    memo.insert(memo.len() as u64, top.clone());
                }
            }
            Op::Get(index) => stack.push(memo.get(&index).cloned().unwrap_or(Value::Opaque)),
            Op::Nop => {}
            Op::Stop => break,
        }
    }

    Ok(stack
        .into_iter()
        .filter_map(|value| match value {
            Value::Str(s) if !SENTINELS.contains(&s.as_str()) => Some(s),
            _ => None,
        })
        .collect())
}

/// Import a legacy pickled dictionary
///
/// Fails with [`Error::InvalidLegacyMetadata`] unless the pickle holds exactly the
/// [`LEGACY_KEYS`]. `Website` is added as a copy of `Webpage`.
pub fn import(data: &[u8]) -> Result<Metadata> {
    let strings = strings(data)?;
    debug!(count = strings.len(), "legacy strings");

    if strings.len() != LEGACY_KEYS.len() * 2 {
        return Err(Error::InvalidLegacyMetadata(format!(
            "expected {} strings, found {}",
            LEGACY_KEYS.len() * 2,
            strings.len()
        )));
    }

    let pairs: Vec<(&str, &str)> = strings
        .chunks_exact(2)
        .map(|pair| (pair[0].as_str(), pair[1].as_str()))
        .collect();
    let keys: HashSet<&str> = pairs.iter().map(|(key, _)| *key).collect();
    if keys != HashSet::from(LEGACY_KEYS) {
        return Err(Error::InvalidLegacyMetadata(format!(
            "unexpected keys {:?}",
            pairs.iter().map(|(key, _)| key).collect::<Vec<_>>()
        )));
    }

    let mut metadata = Metadata::new();
    for (key, value) in &pairs {
        metadata.set_string(*key, value)?;
    }
    if metadata.string("Website").is_none() {
        if let Some(webpage) = metadata.string("Webpage") {
            metadata.set_string("Website", &webpage)?;
        }
    }

    Ok(metadata)
}
