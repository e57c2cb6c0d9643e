use crate::value::{is_integral, Value};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::io;

/// Largest magnitude still printed as a plain integer.
const INTEGER_LIMIT: f64 = 1e15;

/// Output layout for the canonical writer.
///
/// `indent` is the number of spaces per nesting level; `0` writes everything
/// on one line with no insignificant whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializeOptions {
    pub indent: usize,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        SerializeOptions { indent: 2 }
    }
}

impl SerializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact() -> Self {
        SerializeOptions { indent: 0 }
    }

    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    fn is_compact(&self) -> bool {
        self.indent == 0
    }
}

/// Writes `value` as canonical JSON text to any `fmt::Write` sink.
///
/// Object members come out in key order. Strings are written as stored, so
/// their escapes are reproduced exactly. Non-finite numbers have no JSON
/// spelling and are written as `null`. The writer recurses once per nesting
/// level, so it shares the stack limits noted on [`Value`].
pub fn write_value<W: Write>(value: &Value, out: &mut W, options: SerializeOptions) -> fmt::Result {
    write_node(value, out, options, 0)
}

/// Writes `value` to an `io::Write` sink.
///
/// # Errors
///
/// Propagates the sink's I/O errors.
pub fn to_writer<W: io::Write>(
    value: &Value,
    mut writer: W,
    options: SerializeOptions,
) -> io::Result<()> {
    writer.write_all(to_string(value, options).as_bytes())?;
    writer.flush()
}

/// Canonical text of `value`; see [`write_value`].
pub fn to_string(value: &Value, options: SerializeOptions) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_node(value, &mut out, options, 0);
    out
}

pub fn to_string_pretty(value: &Value) -> String {
    to_string(value, SerializeOptions::default())
}

fn write_node<W: Write>(
    value: &Value,
    out: &mut W,
    options: SerializeOptions,
    level: usize,
) -> fmt::Result {
    match value {
        Value::Null => out.write_str("null"),
        Value::Boolean(b) => out.write_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(*n, out),
        Value::String(s) => write!(out, "\"{s}\""),
        Value::Array(items) => {
            if items.is_empty() {
                return out.write_str("[]");
            }
            out.write_char('[')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.write_char(',')?;
                }
                newline(out, options, level + 1)?;
                write_node(item, out, options, level + 1)?;
            }
            newline(out, options, level)?;
            out.write_char(']')
        }
        Value::Object(map) => {
            if map.is_empty() {
                return out.write_str("{}");
            }
            out.write_char('{')?;
            for (i, (key, member)) in map.iter().enumerate() {
                if i > 0 {
                    out.write_char(',')?;
                }
                newline(out, options, level + 1)?;
                write!(out, "\"{key}\":")?;
                if !options.is_compact() {
                    out.write_char(' ')?;
                }
                write_node(member, out, options, level + 1)?;
            }
            newline(out, options, level)?;
            out.write_char('}')
        }
    }
}

fn write_number<W: Write>(n: f64, out: &mut W) -> fmt::Result {
    if !n.is_finite() {
        out.write_str("null")
    } else if is_integral(n) && n.abs() < INTEGER_LIMIT {
        write!(out, "{}", n as i64)
    } else {
        // Debug gives the shortest text that parses back to the same f64.
        write!(out, "{n:?}")
    }
}

fn newline<W: Write>(out: &mut W, options: SerializeOptions, level: usize) -> fmt::Result {
    if options.is_compact() {
        return Ok(());
    }
    out.write_char('\n')?;
    for _ in 0..options.indent * level {
        out.write_char(' ')?;
    }
    Ok(())
}

/// `{}` is compact, `{:#}` is indented by two spaces.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = if f.alternate() {
            SerializeOptions::default()
        } else {
            SerializeOptions::compact()
        };
        write_value(self, f, options)
    }
}
