// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fmt;

use chrono::{Duration, NaiveDateTime, Timelike};
use serde_yaml::{Mapping, Value};

use crate::errors::{ResolveError, TimedeltaParseError};
use crate::utils::value_to_string;

/// Ancestor chain of a placeholder's point of occurrence, root first.
/// The last element is the container holding the placeholder string.
pub struct ResolverContext<'a> {
    pub ancestors: &'a [&'a Value],
}

/// A resolver receives its expanded positional arguments plus the
/// context of the placeholder it replaces.
pub type ResolverFn =
    Box<dyn Fn(&[Value], &ResolverContext<'_>) -> Result<Value, ResolveError> + Send + Sync>;

/// Table of `${name:args}` resolvers applied during document expansion.
///
/// Expansion walks the raw document tree before any node wrapping takes
/// place. A string consisting of exactly one placeholder is replaced by
/// the resolver's value, keeping its type; placeholders embedded in
/// longer strings are stringified and spliced in. Resolver arguments
/// may themselves contain placeholders and are expanded first, so
/// `${a:${b:x}}` resolves `b` before `a`. Resolver output is taken
/// as-is and not expanded again.
pub struct ResolverRegistry {
    resolvers: HashMap<String, ResolverFn>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }

    /// A registry with the built-in `meta.get` and
    /// `meta.subtract-timedelta` resolvers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("meta.get", Box::new(meta_get));
        registry.register("meta.subtract-timedelta", Box::new(meta_subtract_timedelta));
        registry
    }

    /// Register a resolver under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &str, resolver: ResolverFn) {
        self.resolvers.insert(name.to_string(), resolver);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    /// Expand every placeholder in `document`, returning a new tree.
    pub fn expand(&self, document: &Value) -> Result<Value, ResolveError> {
        let mut ancestors: Vec<&Value> = Vec::new();
        self.expand_value(document, &mut ancestors)
    }

    fn expand_value<'a>(
        &self,
        value: &'a Value,
        ancestors: &mut Vec<&'a Value>,
    ) -> Result<Value, ResolveError> {
        match value {
            Value::Mapping(mapping) => {
                ancestors.push(value);
                let mut expanded = Mapping::new();
                for (key, entry) in mapping {
                    expanded.insert(key.clone(), self.expand_value(entry, ancestors)?);
                }
                ancestors.pop();
                Ok(Value::Mapping(expanded))
            }
            Value::Sequence(sequence) => {
                ancestors.push(value);
                let mut expanded = Vec::with_capacity(sequence.len());
                for entry in sequence {
                    expanded.push(self.expand_value(entry, ancestors)?);
                }
                ancestors.pop();
                Ok(Value::Sequence(expanded))
            }
            Value::String(text) => self.expand_string(text, ancestors),
            other => Ok(other.clone()),
        }
    }

    fn expand_string(
        &self,
        text: &str,
        ancestors: &[&Value],
    ) -> Result<Value, ResolveError> {
        if !text.contains("${") {
            return Ok(Value::from(text));
        }

        enum Piece<'t> {
            Text(&'t str),
            Resolved(Value),
        }

        let mut pieces: Vec<Piece<'_>> = Vec::new();
        let mut cursor = 0;
        while let Some(offset) = text[cursor..].find("${") {
            let open = cursor + offset;
            if open > cursor {
                pieces.push(Piece::Text(&text[cursor..open]));
            }
            let close = find_closing_brace(text, open).ok_or_else(|| {
                ResolveError::UnterminatedPlaceholder {
                    text: text.to_string(),
                }
            })?;
            let body = &text[open + 2..close];
            pieces.push(Piece::Resolved(self.resolve_placeholder(body, ancestors)?));
            cursor = close + 1;
        }
        if cursor < text.len() {
            pieces.push(Piece::Text(&text[cursor..]));
        }

        // a lone placeholder keeps the resolved value's type
        if let [Piece::Resolved(_)] = pieces.as_slice() {
            if let Some(Piece::Resolved(value)) = pieces.pop() {
                return Ok(value);
            }
        }

        let mut rendered = String::new();
        for piece in &pieces {
            match piece {
                Piece::Text(text) => rendered.push_str(text),
                Piece::Resolved(value) => rendered.push_str(&value_to_string(value)),
            }
        }
        Ok(Value::from(rendered))
    }

    fn resolve_placeholder(
        &self,
        body: &str,
        ancestors: &[&Value],
    ) -> Result<Value, ResolveError> {
        let (name, args_text) = match body.find(':') {
            Some(colon) => (&body[..colon], Some(&body[colon + 1..])),
            None => (body, None),
        };
        let name = name.trim();
        let resolver =
            self.resolvers
                .get(name)
                .ok_or_else(|| ResolveError::UnknownResolver {
                    name: name.to_string(),
                })?;

        let mut args = Vec::new();
        if let Some(args_text) = args_text {
            for arg in split_toplevel_args(args_text) {
                args.push(self.expand_string(arg.trim(), ancestors)?);
            }
        }

        let context = ResolverContext { ancestors };
        resolver(&args, &context)
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ResolverRegistry")
            .field("resolvers", &names)
            .finish()
    }
}

// `open` points at the `$` of a `${`; returns the index of the matching
// `}`, honoring nested placeholders.
fn find_closing_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"${") {
            depth += 1;
            i += 2;
        } else if bytes[i] == b'}' {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
            i += 1;
        } else {
            i += 1;
        }
    }
    None
}

// Split on commas outside of nested `${...}` placeholders.
fn split_toplevel_args(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"${") {
            depth += 1;
            i += 2;
            continue;
        }
        match bytes[i] {
            b'}' if depth > 0 => depth -= 1,
            b',' if depth == 0 => {
                args.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    args.push(&body[start..]);
    args
}

/// `${meta.get:name}`: nearest inherited value for `name`.
///
/// The walk starts at the **parent** of the placeholder's containing
/// container (looking the key up in the container itself would find the
/// placeholder again) and checks each enclosing mapping, nearest first.
/// Sequences along the chain are skipped. Absence yields null.
fn meta_get(args: &[Value], context: &ResolverContext<'_>) -> Result<Value, ResolveError> {
    if args.len() != 1 {
        return Err(ResolveError::Arity {
            name: "meta.get",
            expected: 1,
            got: args.len(),
        });
    }
    let key = value_to_string(&args[0]);
    for ancestor in context.ancestors.iter().rev().skip(1) {
        if let Value::Mapping(mapping) = ancestor {
            if let Some(found) = mapping.get(key.as_str()) {
                return Ok(found.clone());
            }
        }
    }
    Ok(Value::Null)
}

/// `${meta.subtract-timedelta:timestamp,delta}`: shift a timestamp
/// backwards and render it with the shortest lossless precision.
fn meta_subtract_timedelta(
    args: &[Value],
    _context: &ResolverContext<'_>,
) -> Result<Value, ResolveError> {
    if args.len() != 2 {
        return Err(ResolveError::Arity {
            name: "meta.subtract-timedelta",
            expected: 2,
            got: args.len(),
        });
    }
    let timestamp = value_to_string(&args[0]);
    let delta = value_to_string(&args[1]);

    let parsed = parse_timestamp(&timestamp).ok_or(ResolveError::BadTimestamp {
        input: timestamp.clone(),
    })?;
    let duration = parse_timedelta(&delta)?;
    Ok(Value::from(render_timestamp(parsed - duration)))
}

fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input.trim(), format).ok())
}

const ATTOS_PER_SECOND: i128 = 1_000_000_000_000_000_000;
const ATTOS_PER_NANO: i128 = 1_000_000_000;

/// Parse a fixed-duration delta: one number followed by one unit out of
/// `D h m s ms us ns ps fs as`, whitespace tolerated. Calendar units
/// (years, months) are not durations of fixed length and are rejected.
/// Sub-nanosecond amounts are floored to whole nanoseconds.
fn parse_timedelta(input: &str) -> Result<Duration, TimedeltaParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimedeltaParseError::Empty);
    }

    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    if digits_end == 0 {
        return Err(TimedeltaParseError::MissingNumber {
            input: input.to_string(),
        });
    }
    let count: i128 = trimmed[..digits_end]
        .parse()
        .map_err(|_| TimedeltaParseError::OutOfRange {
            input: input.to_string(),
        })?;

    let unit = trimmed[digits_end..].trim();
    if unit.is_empty() {
        return Err(TimedeltaParseError::MissingUnit {
            input: input.to_string(),
        });
    }
    let attos_per_unit = match unit {
        "D" => 86_400 * ATTOS_PER_SECOND,
        "h" => 3_600 * ATTOS_PER_SECOND,
        "m" => 60 * ATTOS_PER_SECOND,
        "s" => ATTOS_PER_SECOND,
        "ms" => ATTOS_PER_SECOND / 1_000,
        "us" => ATTOS_PER_SECOND / 1_000_000,
        "ns" => ATTOS_PER_NANO,
        "ps" => 1_000_000,
        "fs" => 1_000,
        "as" => 1,
        _ => {
            return Err(TimedeltaParseError::UnknownUnit {
                input: input.to_string(),
                unit: unit.to_string(),
            })
        }
    };

    let attos = count
        .checked_mul(attos_per_unit)
        .ok_or_else(|| TimedeltaParseError::OutOfRange {
            input: input.to_string(),
        })?;
    let nanos =
        i64::try_from(attos.div_euclid(ATTOS_PER_NANO)).map_err(|_| {
            TimedeltaParseError::OutOfRange {
                input: input.to_string(),
            }
        })?;
    Ok(Duration::nanoseconds(nanos))
}

// Shortest rendering that loses nothing: minutes when the seconds and
// fraction are zero, otherwise seconds, with a 3, 6 or 9 digit fraction
// as needed.
fn render_timestamp(timestamp: NaiveDateTime) -> String {
    let nanos = timestamp.nanosecond();
    let format = if nanos == 0 {
        if timestamp.second() == 0 {
            "%Y-%m-%dT%H:%M"
        } else {
            "%Y-%m-%dT%H:%M:%S"
        }
    } else if nanos % 1_000_000 == 0 {
        "%Y-%m-%dT%H:%M:%S%.3f"
    } else if nanos % 1_000 == 0 {
        "%Y-%m-%dT%H:%M:%S%.6f"
    } else {
        "%Y-%m-%dT%H:%M:%S%.9f"
    };
    timestamp.format(format).to_string()
}
