use crate::error::{BuildError, JsonError};
use crate::event::{Event, EventKind, Span};
use crate::parser::{Parser, ParserOptions};
use crate::personality::Personality;
use crate::value::{Map, Value};
use log::{trace, warn};

#[derive(Debug)]
enum Frame {
    Array(Vec<Value>),
    Object {
        members: Map,
        pending_key: Option<String>,
    },
}

impl Frame {
    fn name(&self) -> &'static str {
        match self {
            Frame::Array(_) => "array",
            Frame::Object { .. } => "object",
        }
    }
}

/// Reduces a parser event stream into one owned [`Value`] tree.
///
/// One container is pushed per begin event and popped per end event; scalars
/// attach to the innermost open container. Inside an object, a string event
/// with no key pending is the key for the next value.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    stack: Vec<Frame>,
    root: Option<Value>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of containers currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// True once a full root value has been built.
    pub fn is_complete(&self) -> bool {
        self.stack.is_empty() && self.root.is_some()
    }

    /// Feeds one event.
    ///
    /// # Errors
    ///
    /// Returns a `BuildError` when the event does not fit the stream so far.
    pub fn handle_event(&mut self, event: &Event<'_>) -> Result<(), BuildError> {
        trace!("builder event {event}");
        let offset = event.span.start;
        match event.kind {
            EventKind::ObjectBegin => {
                self.check_slot(event.span)?;
                self.stack.push(Frame::Object {
                    members: Map::new(),
                    pending_key: None,
                });
                Ok(())
            }
            EventKind::ArrayBegin => {
                self.check_slot(event.span)?;
                self.stack.push(Frame::Array(Vec::new()));
                Ok(())
            }
            EventKind::ObjectEnd => match self.stack.pop() {
                Some(Frame::Object {
                    members,
                    pending_key: None,
                }) => self.attach(Value::Object(members), event.span),
                Some(Frame::Object {
                    pending_key: Some(key),
                    ..
                }) => Err(BuildError::DanglingKey {
                    offset,
                    key,
                    span: event.span.into(),
                }),
                Some(frame) => Err(BuildError::MismatchedEnd {
                    offset,
                    expected: frame.name(),
                    span: event.span.into(),
                }),
                None => Err(BuildError::UnbalancedEnd {
                    offset,
                    span: event.span.into(),
                }),
            },
            EventKind::ArrayEnd => match self.stack.pop() {
                Some(Frame::Array(items)) => self.attach(Value::Array(items), event.span),
                Some(frame) => Err(BuildError::MismatchedEnd {
                    offset,
                    expected: frame.name(),
                    span: event.span.into(),
                }),
                None => Err(BuildError::UnbalancedEnd {
                    offset,
                    span: event.span.into(),
                }),
            },
            EventKind::String => {
                let text = strip_quotes(event.text);
                if let Some(Frame::Object {
                    pending_key: pending @ None,
                    ..
                }) = self.stack.last_mut()
                {
                    *pending = Some(text);
                    return Ok(());
                }
                self.attach(Value::String(text), event.span)
            }
            EventKind::Number => {
                let text = String::from_utf8_lossy(event.text);
                let n = decode_number(&text).ok_or_else(|| BuildError::InvalidNumber {
                    offset,
                    text: text.to_string(),
                    span: event.span.into(),
                })?;
                self.attach(Value::Number(n), event.span)
            }
            EventKind::Boolean => self.attach(Value::Boolean(event.text == b"true"), event.span),
            EventKind::None => self.attach(Value::Null, event.span),
        }
    }

    /// Returns the finished tree.
    ///
    /// # Errors
    ///
    /// Fails if containers are still open or no value was seen.
    pub fn finish(self) -> Result<Value, BuildError> {
        if !self.stack.is_empty() {
            return Err(BuildError::Unterminated {
                depth: self.stack.len(),
            });
        }
        self.root.ok_or(BuildError::Empty)
    }

    /// A new container may only open where a value is expected.
    fn check_slot(&self, span: Span) -> Result<(), BuildError> {
        match self.stack.last() {
            None if self.root.is_some() => Err(BuildError::MultipleRoots {
                offset: span.start,
                span: span.into(),
            }),
            Some(Frame::Object {
                pending_key: None, ..
            }) => Err(BuildError::MissingKey {
                offset: span.start,
                span: span.into(),
            }),
            _ => Ok(()),
        }
    }

    fn attach(&mut self, value: Value, span: Span) -> Result<(), BuildError> {
        match self.stack.last_mut() {
            None => {
                if self.root.is_some() {
                    return Err(BuildError::MultipleRoots {
                        offset: span.start,
                        span: span.into(),
                    });
                }
                self.root = Some(value);
                Ok(())
            }
            Some(Frame::Array(items)) => {
                items.push(value);
                Ok(())
            }
            Some(Frame::Object {
                members,
                pending_key,
            }) => {
                let key = pending_key.take().ok_or(BuildError::MissingKey {
                    offset: span.start,
                    span: span.into(),
                })?;
                if members.contains_key(&key) {
                    warn!("duplicate object key `{key}` at offset {}; last value wins", span.start);
                }
                members.insert(key, value);
                Ok(())
            }
        }
    }
}

/// String events carry their quotes; relaxed bare words do not.
fn strip_quotes(text: &[u8]) -> String {
    let inner = match text {
        [b'"', inner @ .., b'"'] => inner,
        _ => text,
    };
    String::from_utf8_lossy(inner).into_owned()
}

/// Decodes a number token from either grammar into an `f64`.
///
/// Handles the relaxed forms too: a leading `+`, `0x`/`0b` prefixes, bare
/// octal (`017`), an empty fraction (`1.`) and a digit-less exponent (`1e`).
pub fn decode_number(text: &str) -> Option<f64> {
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let magnitude = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        radix_value(hex, 16)?
    } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        radix_value(bin, 2)?
    } else if body.len() > 1 && body.starts_with('0') && body.bytes().all(|c| (b'0'..=b'7').contains(&c)) {
        radix_value(&body[1..], 8)?
    } else {
        let trimmed = body
            .trim_end_matches(['+', '-'])
            .trim_end_matches(['e', 'E']);
        if !trimmed.bytes().next().is_some_and(|c| c.is_ascii_digit()) {
            return None;
        }
        trimmed.parse::<f64>().ok()?
    };

    Some(if negative { -magnitude } else { magnitude })
}

fn radix_value(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
    })
}

/// Parses exactly one document from `input`: one value, optional trailing
/// whitespace, nothing else.
///
/// # Errors
///
/// Parse faults, build faults, and `BuildError::TrailingData` when bytes
/// remain after the root value.
pub fn build_document<P: Personality>(
    input: &[u8],
    personality: P,
    options: ParserOptions,
) -> Result<Value, JsonError> {
    let (value, end) = build_prefix(input, personality, options)?;
    if end < input.len() {
        return Err(BuildError::TrailingData {
            offset: end,
            span: (end, input.len() - end).into(),
        }
        .into());
    }
    Ok(value)
}

/// Parses one value from the front of `input` and returns it with the offset
/// where the next value (if any) starts.
///
/// # Errors
///
/// Parse faults and build faults.
pub fn build_prefix<P: Personality>(
    input: &[u8],
    personality: P,
    options: ParserOptions,
) -> Result<(Value, usize), JsonError> {
    let mut builder = DocumentBuilder::new();
    let mut first_error: Option<BuildError> = None;

    let end = Parser::with_personality(input, personality)
        .with_options(options)
        .parse(|event| {
            if first_error.is_none() {
                if let Err(err) = builder.handle_event(&event) {
                    first_error = Some(err);
                }
            }
        })?;

    if let Some(err) = first_error {
        return Err(err.into());
    }
    Ok((builder.finish()?, end))
}
