//! Segment paths addressing a member inside an object graph.
//!
//! ## Syntax
//!
//! - Segments are separated by `/`. A single leading `/` is ignored, so
//!   `""` and `"/"` both name the whole object.
//! - `!` escapes the next character: `!/` is a literal `/`, `!!` a literal
//!   `!`. A trailing lone `!` is kept as is.
//! - An empty segment, or a segment that is exactly an unescaped `*`, is a
//!   wildcard matching every child at that level. A `*` anywhere else is an
//!   ordinary character; `!*` names a key that is just `*`.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::value::Value;

// -----------------------------------------------------------------------------
// PathParseError

/// A path text or path value that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid path at offset {offset}: {reason}")]
pub struct PathParseError {
    /// Byte offset in the path text, or element index for an array path.
    pub offset: usize,
    pub reason: Cow<'static, str>,
}

// -----------------------------------------------------------------------------
// Segment

/// One navigation step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// An attribute name, map key or index, in text form.
    Key(String),
    /// Every child at this level.
    Wildcard,
}

impl Segment {
    #[inline]
    pub fn key(key: impl Into<String>) -> Self {
        Segment::Key(key.into())
    }

    #[inline]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(key) => Some(key),
            Segment::Wildcard => None,
        }
    }

    #[inline]
    pub const fn is_wildcard(&self) -> bool {
        matches!(self, Segment::Wildcard)
    }
}

impl fmt::Display for Segment {
    /// Writes the escaped form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;

        match self {
            Segment::Wildcard => f.write_char('*'),
            Segment::Key(key) if key == "*" => f.write_str("!*"),
            Segment::Key(key) => {
                for c in key.chars() {
                    if matches!(c, '!' | '/') {
                        f.write_char('!')?;
                    }
                    f.write_char(c)?;
                }
                Ok(())
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Path

/// An ordered list of [`Segment`]s. The empty path is the whole object.
///
/// # Examples
///
/// ```
/// use vc_convert::path::{Path, Segment};
///
/// let path: Path = "/users/*/name!/alias".parse().unwrap();
/// assert_eq!(
///     path.segments(),
///     [Segment::key("users"), Segment::Wildcard, Segment::key("name/alias")],
/// );
/// assert_eq!(path.to_string(), "users/*/name!/alias");
///
/// assert!(Path::parse("/").unwrap().is_empty());
/// assert_eq!(Path::parse("a*b").unwrap().segments(), [Segment::key("a*b")]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Segment>);

impl Path {
    /// The empty path.
    #[inline]
    pub const fn root() -> Self {
        Path(Vec::new())
    }

    /// Parses path text, see the [module docs](self) for the syntax.
    pub fn parse(text: &str) -> Result<Self, PathParseError> {
        let body = text.strip_prefix('/').unwrap_or(text);
        if body.is_empty() {
            return Ok(Path::root());
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        // Whether the current segment holds an unescaped `*`.
        let mut star = false;
        let mut chars = body.chars();

        while let Some(c) = chars.next() {
            match c {
                '!' => match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => current.push('!'),
                },
                '/' => segments.push(finish_segment(&mut current, &mut star)),
                '*' => {
                    star = true;
                    current.push('*');
                }
                _ => current.push(c),
            }
        }
        segments.push(finish_segment(&mut current, &mut star));

        Ok(Path(segments))
    }

    /// Builds a path from a [`Value`]: either path text, or an array whose
    /// elements are taken as literal segments (`null` or `"*"` being a
    /// wildcard).
    ///
    /// ```
    /// use vc_convert::path::{Path, Segment};
    /// use vc_convert::value::Value;
    ///
    /// let value = Value::from(vec![Value::from("a/b"), Value::Null, Value::from(3_u8)]);
    /// let path = Path::from_value(&value).unwrap();
    /// assert_eq!(path.segments(), [Segment::key("a/b"), Segment::Wildcard, Segment::key("3")]);
    /// ```
    pub fn from_value(value: &Value) -> Result<Self, PathParseError> {
        match value {
            Value::Null => Ok(Path::root()),
            Value::String(text) => Path::parse(text),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(offset, item)| match item {
                    Value::Null => Ok(Segment::Wildcard),
                    Value::String(s) if s == "*" => Ok(Segment::Wildcard),
                    Value::String(s) => Ok(Segment::key(s.as_str())),
                    Value::Number(n) => Ok(Segment::key(alloc::format!("{n}"))),
                    other => Err(PathParseError {
                        offset,
                        reason: Cow::Owned(alloc::format!(
                            "a path element must be a string or number, found {}",
                            other.kind_name()
                        )),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Path),
            other => Err(PathParseError {
                offset: 0,
                reason: Cow::Owned(alloc::format!(
                    "a path must be a string or an array, found {}",
                    other.kind_name()
                )),
            }),
        }
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if any segment is a wildcard.
    #[inline]
    pub fn has_wildcard(&self) -> bool {
        self.0.iter().any(Segment::is_wildcard)
    }

    #[inline]
    pub fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    /// Appends `segment` and returns the path.
    #[inline]
    pub fn join(mut self, segment: Segment) -> Self {
        self.0.push(segment);
        self
    }
}

fn finish_segment(current: &mut String, star: &mut bool) -> Segment {
    let segment = core::mem::take(current);
    let star = core::mem::take(star);
    if segment.is_empty() || (star && segment == "*") {
        return Segment::Wildcard;
    }
    Segment::Key(segment)
}

impl FromStr for Path {
    type Err = PathParseError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl From<Vec<Segment>> for Path {
    #[inline]
    fn from(segments: Vec<Segment>) -> Self {
        Path(segments)
    }
}

impl FromIterator<Segment> for Path {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("/")?;
            }
            fmt::Display::fmt(segment, f)?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::{Path, Segment};

    fn keys(path: &str) -> Path {
        Path::parse(path).unwrap()
    }

    #[test]
    fn empty_and_root_are_the_whole_object() {
        assert!(keys("").is_empty());
        assert!(keys("/").is_empty());
    }

    #[test]
    fn escapes() {
        assert_eq!(keys("a!/b").segments(), [Segment::key("a/b")]);
        assert_eq!(keys("a!!b").segments(), [Segment::key("a!b")]);
        assert_eq!(keys("!x").segments(), [Segment::key("x")]);
        assert_eq!(keys("a!").segments(), [Segment::key("a!")]);
        assert_eq!(keys("!*").segments(), [Segment::key("*")]);
    }

    #[test]
    fn wildcards() {
        assert_eq!(
            keys("a//b").segments(),
            [Segment::key("a"), Segment::Wildcard, Segment::key("b")]
        );
        assert_eq!(keys("*/x").segments(), [Segment::Wildcard, Segment::key("x")]);
        assert_eq!(keys("a/").segments(), [Segment::key("a"), Segment::Wildcard]);
        assert!(keys("a/*").has_wildcard());
    }

    #[test]
    fn leading_slash_is_dropped_once() {
        assert_eq!(keys("/a").segments(), [Segment::key("a")]);
        assert_eq!(keys("//a").segments(), [Segment::Wildcard, Segment::key("a")]);
    }

    #[test]
    fn embedded_star_is_a_literal() {
        assert_eq!(keys("/ab/c*d").segments(), [Segment::key("ab"), Segment::key("c*d")]);
        assert_eq!(keys("**").segments(), [Segment::key("**")]);
        assert_eq!(keys("a*/*").segments(), [Segment::key("a*"), Segment::Wildcard]);
        assert_eq!(keys("c*d").to_string(), "c*d");
        assert_eq!(keys("!*").to_string(), "!*");
    }

    #[test]
    fn display_reparses_to_same_path() {
        for text in ["a!/b/*/c!!d", "x/!*/y", "plain", "g*b/*"] {
            let path = keys(text);
            assert_eq!(keys(&path.to_string()), path);
        }
    }
}
