//! What happens when a fan-out child cannot be read.

use log::debug;

use crate::error::ConvertError;
use crate::value::Value;

/// The outcome chosen by a [`FaultHandler`] for a failed fan-out child.
#[derive(Debug, Clone, PartialEq)]
pub enum FaultAction {
    /// Drop the child from the assembled container.
    Omit,
    /// Keep the child, with this value in its place.
    Substitute(Value),
}

/// A strategy consulted when a child of a wildcard fan-out fails.
///
/// Errors outside a fan-out always propagate, whatever the handler.
///
/// # Examples
///
/// A handler that keeps failed children as their error message:
///
/// ```
/// use vc_convert::error::ConvertError;
/// use vc_convert::fault::{FaultAction, FaultHandler};
/// use vc_convert::value::Value;
///
/// struct Annotate;
///
/// impl FaultHandler for Annotate {
///     fn handle(&self, err: ConvertError) -> Result<FaultAction, ConvertError> {
///         Ok(FaultAction::Substitute(Value::from(err.to_string())))
///     }
/// }
/// ```
pub trait FaultHandler: Send + Sync {
    fn handle(&self, err: ConvertError) -> Result<FaultAction, ConvertError>;
}

/// Propagates the first error, aborting the call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Throwing;

impl FaultHandler for Throwing {
    #[inline]
    fn handle(&self, err: ConvertError) -> Result<FaultAction, ConvertError> {
        Err(err)
    }
}

/// Drops children that fail, logging each at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct Filtering;

impl FaultHandler for Filtering {
    fn handle(&self, err: ConvertError) -> Result<FaultAction, ConvertError> {
        debug!("dropping fan-out child: {err}");
        Ok(FaultAction::Omit)
    }
}

/// Selects one of the built-in handlers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FaultMode {
    #[default]
    Throwing,
    Filtering,
}

impl FaultMode {
    #[inline]
    pub(crate) fn handler(self) -> &'static dyn FaultHandler {
        match self {
            FaultMode::Throwing => &Throwing,
            FaultMode::Filtering => &Filtering,
        }
    }
}
