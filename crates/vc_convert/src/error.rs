use alloc::borrow::Cow;
use alloc::string::String;

use vc_reflect::Reflect;

use crate::path::{PathParseError, Segment};
use crate::value::Value;

// -----------------------------------------------------------------------------
// ValueParseError

/// A [`Value`] that could not be turned into the requested type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot convert `{found}` into `{target}`: {reason}")]
pub struct ValueParseError {
    /// Path of the target type.
    pub target: &'static str,
    /// The rejected input, as text.
    pub found: String,
    pub reason: Cow<'static, str>,
}

impl ValueParseError {
    pub fn new(target: &'static str, found: &Value, reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            target,
            found: found.to_text().into_owned(),
            reason: reason.into(),
        }
    }

    /// Like [`new`](Self::new), for input that is not a [`Value`].
    pub fn from_text(
        target: &'static str,
        found: impl Into<String>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            target,
            found: found.into(),
            reason: reason.into(),
        }
    }
}

// -----------------------------------------------------------------------------
// ConvertError

/// Errors of [`Converter`](crate::Converter) reads and writes.
///
/// Cycles, depth and object budgets never show up here, they are reported
/// in-band as placeholder strings.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    InvalidPath(#[from] PathParseError),
    /// A concrete read segment names no member.
    #[error("no member `{segment}` in `{type_path}`")]
    PathNotFound {
        segment: String,
        type_path: &'static str,
    },
    /// A segment asks for keyed or indexed access the value does not support.
    #[error("segment `{segment}` cannot be applied to `{type_path}`")]
    TypeMismatch {
        segment: String,
        type_path: &'static str,
    },
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    /// A write target that is read-only or cannot be reached mutably.
    #[error("`{target}` is not writable")]
    NotWritable { target: String },
    /// A concrete write segment names no member.
    #[error("no attribute `{segment}` in `{type_path}`")]
    AttributeNotFound {
        segment: String,
        type_path: &'static str,
    },
    #[error(transparent)]
    Conversion(#[from] ValueParseError),
}

impl ConvertError {
    #[inline]
    pub(crate) fn path_not_found(segment: &str, value: &dyn Reflect) -> Self {
        ConvertError::PathNotFound {
            segment: segment.into(),
            type_path: value.type_path(),
        }
    }

    #[inline]
    pub(crate) fn type_mismatch(segment: &Segment, value: &dyn Reflect) -> Self {
        ConvertError::TypeMismatch {
            segment: alloc::format!("{segment}"),
            type_path: value.type_path(),
        }
    }

    #[inline]
    pub(crate) fn not_writable(target: impl Into<String>) -> Self {
        ConvertError::NotWritable {
            target: target.into(),
        }
    }

    /// Rewrites a read-side miss as the write-side error.
    pub(crate) fn into_write_error(self) -> Self {
        match self {
            ConvertError::PathNotFound { segment, type_path } => {
                ConvertError::AttributeNotFound { segment, type_path }
            }
            other => other,
        }
    }

    /// A short stable name for the variant, used as `error_type` in responses.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConvertError::InvalidPath(_) => "InvalidPath",
            ConvertError::PathNotFound { .. } => "PathNotFound",
            ConvertError::TypeMismatch { .. } => "TypeMismatch",
            ConvertError::IndexOutOfRange { .. } => "IndexOutOfRange",
            ConvertError::NotWritable { .. } => "NotWritable",
            ConvertError::AttributeNotFound { .. } => "AttributeNotFound",
            ConvertError::Conversion(_) => "ConversionError",
        }
    }
}
