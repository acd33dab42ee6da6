//! JSON Pointer (RFC 6901) extraction over the dynamic [`Value`] tree.
//!
//! This is the Record Extractor of spec §4.13: applies a pointer to a response
//! body to obtain the record array/object, or to a single record to obtain a
//! chaining value or a snapshot key. A missing path is not an error; it yields
//! `None` so callers can distinguish "zero records" from "malformed pointer".

use crate::Value;
use thiserror::Error;

/// An invalid JSON pointer string (spec: "escaping per the pointer RFC").
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PointerError {
    /// A non-root pointer did not start with `/`.
    #[error("json pointer must be empty or start with '/': {0:?}")]
    MissingLeadingSlash(String),
}

/// Splits a JSON pointer into its unescaped reference tokens.
///
/// `~1` decodes to `/` and `~0` decodes to `~`; per RFC 6901 §4 the `~1`
/// substitution must happen after `~0`, otherwise `~01` would incorrectly
/// decode to `/` instead of `~1`.
fn tokens(pointer: &str) -> Result<Vec<String>, PointerError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    if !pointer.starts_with('/') {
        return Err(PointerError::MissingLeadingSlash(pointer.to_string()));
    }
    Ok(pointer[1..]
        .split('/')
        .map(|tok| tok.replace("~1", "/").replace("~0", "~"))
        .collect())
}

/// Resolves `pointer` against `root`, returning `None` if any segment is
/// missing (array index out of bounds, object key absent, or indexing into a
/// scalar) rather than an error.
pub fn extract<'a>(root: &'a Value, pointer: &str) -> Result<Option<&'a Value>, PointerError> {
    let mut current = root;
    for token in tokens(pointer)? {
        match current {
            Value::Object(map) => match map.get(&token) {
                Some(v) => current = v,
                None => return Ok(None),
            },
            Value::Array(items) => {
                if token == "-" {
                    return Ok(None);
                }
                match token.parse::<usize>() {
                    Ok(index) => match items.get(index) {
                        Some(v) => current = v,
                        None => return Ok(None),
                    },
                    Err(_) => return Ok(None),
                }
            }
            _ => return Ok(None),
        }
    }
    Ok(Some(current))
}
