//! Placeholder grammar and document scanning.
//!
//! A placeholder is any `((...))` span in a document. The text between the
//! delimiters is a [`Handle`] addressing a secret:
//!
//! ```text
//! ((entry/field))            whole value of a field
//! ((entry/field/subfield))   one top-level key of a YAML document stored in a field
//! ```
//!
//! The scanner is non-greedy: a placeholder ends at the first `))` after its
//! `((`, so several placeholders on one line stay separate. The `.` in the
//! pattern does not cross newlines, so a placeholder never spans lines.
//!
//! # Examples
//!
//! ```rust
//! use lpass_resolve::placeholder::{Handle, find_placeholders};
//!
//! let doc = "user: ((db/Username))\npass: ((db/Password))\n";
//! let handles: Vec<&str> = find_placeholders(doc).map(|p| p.handle).collect();
//! assert_eq!(handles, ["db/Username", "db/Password"]);
//!
//! let handle: Handle = "secrets/Notes/api_key".parse().unwrap();
//! assert_eq!(handle.entry(), "secrets");
//! assert_eq!(handle.subfield(), Some("api_key"));
//! ```

use regex::Regex;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::core::ResolveError;

/// Matches `((content))`, capturing `content` up to the first `))`.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\((.*?)\)\)").expect("placeholder pattern is valid"));

/// Separator between handle components.
pub const HANDLE_SEPARATOR: char = '/';

/// One placeholder occurrence inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Byte range of the whole match, delimiters included
    pub span: (usize, usize),
    /// Raw text between the delimiters
    pub handle: &'a str,
}

impl Placeholder<'_> {
    /// Byte range of the whole placeholder as a [`Range`].
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.span.0..self.span.1
    }
}

/// Iterate over every placeholder in `document`, left to right.
pub fn find_placeholders(document: &str) -> impl Iterator<Item = Placeholder<'_>> {
    PLACEHOLDER.captures_iter(document).filter_map(|caps| {
        let whole = caps.get(0)?;
        let inner = caps.get(1)?;
        Some(Placeholder {
            span: (whole.start(), whole.end()),
            handle: inner.as_str(),
        })
    })
}

/// Whether `document` contains at least one placeholder.
#[must_use]
pub fn has_placeholders(document: &str) -> bool {
    PLACEHOLDER.is_match(document)
}

/// A parsed `entry/field[/subfield]` address.
///
/// Parsing rules:
/// - fewer than two components, or more than three, is malformed
/// - an empty `entry` or `field` is malformed
/// - an empty `subfield` (`entry/field/`) is treated as no subfield
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Handle {
    entry: String,
    field: String,
    subfield: Option<String>,
}

impl Handle {
    /// Parse a raw handle string.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::MalformedHandle`] when the handle does not follow
    /// the rules listed on [`Handle`].
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let malformed = |reason: &str| ResolveError::MalformedHandle {
            handle: raw.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = raw.split(HANDLE_SEPARATOR).collect();
        let (entry, field, subfield) = match parts.as_slice() {
            [entry, field] => (*entry, *field, None),
            [entry, field, subfield] => (*entry, *field, Some(*subfield)),
            [_] => return Err(malformed("expected entry/field or entry/field/subfield")),
            _ => return Err(malformed("too many '/' separated components (at most 3)")),
        };

        if entry.is_empty() {
            return Err(malformed("entry name is empty"));
        }
        if field.is_empty() {
            return Err(malformed("field name is empty"));
        }

        Ok(Self {
            entry: entry.to_string(),
            field: field.to_string(),
            subfield: subfield.filter(|s| !s.is_empty()).map(str::to_string),
        })
    }

    /// The store entry name.
    #[must_use]
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// The field of the entry.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The key to extract from a structured field, if any.
    #[must_use]
    pub fn subfield(&self) -> Option<&str> {
        self.subfield.as_deref()
    }
}

impl FromStr for Handle {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{HANDLE_SEPARATOR}{}", self.entry, self.field)?;
        if let Some(subfield) = &self.subfield {
            write!(f, "{HANDLE_SEPARATOR}{subfield}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_components() {
        let handle = Handle::parse("secrets/Password").unwrap();
        assert_eq!(handle.entry(), "secrets");
        assert_eq!(handle.field(), "Password");
        assert_eq!(handle.subfield(), None);
        assert_eq!(handle.to_string(), "secrets/Password");
    }

    #[test]
    fn test_parse_three_components() {
        let handle: Handle = "secrets/Notes/api_key".parse().unwrap();
        assert_eq!(handle.field(), "Notes");
        assert_eq!(handle.subfield(), Some("api_key"));
        assert_eq!(handle.to_string(), "secrets/Notes/api_key");
    }

    #[test]
    fn test_parse_trailing_slash_means_no_subfield() {
        let handle = Handle::parse("secrets/Notes/").unwrap();
        assert_eq!(handle.subfield(), None);
        assert_eq!(handle, Handle::parse("secrets/Notes").unwrap());
    }

    #[test]
    fn test_parse_single_component_is_malformed() {
        let err = Handle::parse("secrets").unwrap_err();
        match err {
            ResolveError::MalformedHandle { handle, .. } => assert_eq!(handle, "secrets"),
            other => panic!("Expected MalformedHandle, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for raw in ["", "/Password", "secrets/", "a/b/c/d", "//"] {
            assert!(
                matches!(Handle::parse(raw), Err(ResolveError::MalformedHandle { .. })),
                "expected '{raw}' to be malformed"
            );
        }
    }

    #[test]
    fn test_find_placeholders_non_greedy() {
        let doc = "a: ((x/Password)) b: ((y/Username))";
        let found: Vec<Placeholder<'_>> = find_placeholders(doc).collect();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].handle, "x/Password");
        assert_eq!(found[1].handle, "y/Username");
        assert_eq!(&doc[found[0].range()], "((x/Password))");
    }

    #[test]
    fn test_find_placeholders_does_not_cross_lines() {
        let doc = "((open\nclose))";
        assert_eq!(find_placeholders(doc).count(), 0);
        assert!(!has_placeholders(doc));
    }

    #[test]
    fn test_find_placeholders_empty_and_plain_text() {
        assert_eq!(find_placeholders("no markers here (just parens)").count(), 0);
        let found: Vec<_> = find_placeholders("(())").collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].handle, "");
    }
}
