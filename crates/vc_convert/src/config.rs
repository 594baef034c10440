//! Per-call options of reads and writes.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt;
use core::str::FromStr;

use chrono::FixedOffset;

use crate::error::ValueParseError;
use crate::fault::{FaultHandler, FaultMode};
use crate::hash::TypeIdMap;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Limit

/// A budget that is either a fixed count or explicitly unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Limit {
    #[default]
    Unlimited,
    At(usize),
}

impl Limit {
    /// Builds a limit from a count where `0` means unlimited.
    #[inline]
    pub const fn from_count(count: usize) -> Self {
        match count {
            0 => Limit::Unlimited,
            n => Limit::At(n),
        }
    }

    /// Returns `true` if `n` is within the limit.
    #[inline]
    pub const fn allows(self, n: usize) -> bool {
        match self {
            Limit::Unlimited => true,
            Limit::At(max) => n <= max,
        }
    }

    /// The limit as a count, `usize::MAX` when unlimited.
    #[inline]
    pub const fn cap(self) -> usize {
        match self {
            Limit::Unlimited => usize::MAX,
            Limit::At(max) => max,
        }
    }
}

// -----------------------------------------------------------------------------
// DateFormat

/// How date and time values are lowered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum DateFormat {
    /// RFC 3339 / ISO-8601 text.
    #[default]
    Iso8601,
    /// A `chrono` strftime pattern.
    Pattern(String),
    /// Milliseconds since the Unix epoch, as a number.
    EpochMillis,
    /// Nanoseconds since the Unix epoch, as a number.
    EpochNanos,
}

impl DateFormat {
    /// Reads the `dateFormat` option: `ISO8601`, `time` or `millis`,
    /// `nanos`, and anything else as a pattern.
    ///
    /// ```
    /// use vc_convert::config::DateFormat;
    ///
    /// assert_eq!(DateFormat::parse("time"), DateFormat::EpochMillis);
    /// assert_eq!(DateFormat::parse("%Y"), DateFormat::Pattern("%Y".into()));
    /// ```
    pub fn parse(text: &str) -> Self {
        if text.eq_ignore_ascii_case("iso8601") {
            return DateFormat::Iso8601;
        }
        match text {
            "time" | "millis" => DateFormat::EpochMillis,
            "nanos" => DateFormat::EpochNanos,
            pattern => DateFormat::Pattern(pattern.into()),
        }
    }
}

// -----------------------------------------------------------------------------
// Zone

/// The time zone dates are rendered in, and naive values are read in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Zone {
    #[default]
    Utc,
    Local,
    Fixed(FixedOffset),
}

impl FromStr for Zone {
    type Err = ValueParseError;

    /// `UTC` (or `Z`), `local`, or an offset such as `+02:00`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("utc") || s == "Z" {
            return Ok(Zone::Utc);
        }
        if s.eq_ignore_ascii_case("local") {
            return Ok(Zone::Local);
        }
        FixedOffset::from_str(s).map(Zone::Fixed).map_err(|err| {
            ValueParseError::from_text("Zone", s, Cow::Owned(alloc::format!("{err}")))
        })
    }
}

// -----------------------------------------------------------------------------
// SerializeConfig

/// Options for one read or write call.
///
/// The defaults are: no budgets, no collection cap, ISO-8601 dates in UTC,
/// fail-fast faults, no request echo, integers as numbers.
///
/// # Examples
///
/// ```
/// use vc_convert::config::{Limit, SerializeConfig};
/// use vc_convert::fault::FaultMode;
///
/// let config = SerializeConfig::default()
///     .with_max_depth(Limit::At(3))
///     .with_fault_mode(FaultMode::Filtering);
/// assert_eq!(config.max_depth, Limit::At(3));
/// ```
#[derive(Clone, Default)]
pub struct SerializeConfig {
    pub max_depth: Limit,
    pub max_objects: Limit,
    pub max_collection_size: Limit,
    pub date_format: DateFormat,
    pub date_zone: Zone,
    pub fault_mode: FaultMode,
    pub include_request_echo: bool,
    /// Render integers beyond ±(2^53 − 1) as strings.
    pub large_integers_as_string: bool,
    type_formats: TypeIdMap<DateFormat>,
    fault_handler: Option<Arc<dyn FaultHandler>>,
}

impl SerializeConfig {
    #[inline]
    pub fn with_max_depth(mut self, limit: Limit) -> Self {
        self.max_depth = limit;
        self
    }

    #[inline]
    pub fn with_max_objects(mut self, limit: Limit) -> Self {
        self.max_objects = limit;
        self
    }

    #[inline]
    pub fn with_max_collection_size(mut self, limit: Limit) -> Self {
        self.max_collection_size = limit;
        self
    }

    #[inline]
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.date_format = format;
        self
    }

    #[inline]
    pub fn with_date_zone(mut self, zone: Zone) -> Self {
        self.date_zone = zone;
        self
    }

    #[inline]
    pub fn with_fault_mode(mut self, mode: FaultMode) -> Self {
        self.fault_mode = mode;
        self
    }

    #[inline]
    pub fn with_request_echo(mut self, echo: bool) -> Self {
        self.include_request_echo = echo;
        self
    }

    #[inline]
    pub fn with_large_integers_as_string(mut self, enabled: bool) -> Self {
        self.large_integers_as_string = enabled;
        self
    }

    /// Overrides the date format for values of type `T` only.
    ///
    /// ```
    /// use vc_convert::config::{DateFormat, SerializeConfig};
    /// use core::any::TypeId;
    ///
    /// let config = SerializeConfig::default()
    ///     .with_type_format::<chrono::NaiveDate>(DateFormat::Pattern("%d.%m.%Y".into()));
    /// assert_eq!(config.date_format_for(TypeId::of::<chrono::NaiveTime>()), &DateFormat::Iso8601);
    /// ```
    pub fn with_type_format<T: Any>(mut self, format: DateFormat) -> Self {
        self.type_formats.insert(TypeId::of::<T>(), format);
        self
    }

    /// Replaces the handler chosen by [`fault_mode`](Self::fault_mode).
    pub fn with_fault_handler(mut self, handler: impl FaultHandler + 'static) -> Self {
        self.fault_handler = Some(Arc::new(handler));
        self
    }

    /// The date format for values of the given type.
    #[inline]
    pub fn date_format_for(&self, type_id: TypeId) -> &DateFormat {
        self.type_formats.get(&type_id).unwrap_or(&self.date_format)
    }

    /// The active fault handler.
    #[inline]
    pub fn fault_handler(&self) -> &dyn FaultHandler {
        match &self.fault_handler {
            Some(handler) => &**handler,
            None => self.fault_mode.handler(),
        }
    }

    /// Reads processing options as a management request carries them.
    ///
    /// Recognized keys: `maxDepth`, `maxObjects`, `maxCollectionSize` (`0`
    /// is unlimited), `dateFormat`, `dateZone`, `ignoreErrors`,
    /// `includeRequest`, `serializeLong` (`"string"` or `"number"`). Numbers
    /// and booleans may also be given as strings. Other keys are ignored.
    ///
    /// ```
    /// use vc_convert::config::{Limit, SerializeConfig};
    /// use vc_convert::fault::FaultMode;
    ///
    /// let options = serde_json::from_str(
    ///     r#"{"maxDepth": 2, "maxCollectionSize": "0", "ignoreErrors": "true"}"#,
    /// )
    /// .unwrap();
    /// let config = SerializeConfig::from_options(&options).unwrap();
    ///
    /// assert_eq!(config.max_depth, Limit::At(2));
    /// assert_eq!(config.max_collection_size, Limit::Unlimited);
    /// assert_eq!(config.fault_mode, FaultMode::Filtering);
    /// ```
    pub fn from_options(options: &Value) -> Result<Self, ValueParseError> {
        let mut config = SerializeConfig::default();
        let map = match options {
            Value::Null => return Ok(config),
            Value::Object(map) => map,
            other => {
                return Err(ValueParseError::new(
                    "SerializeConfig",
                    other,
                    "processing options must be an object",
                ));
            }
        };

        for (key, value) in map.iter() {
            match key {
                "maxDepth" => config.max_depth = option_limit(value)?,
                "maxObjects" => config.max_objects = option_limit(value)?,
                "maxCollectionSize" => config.max_collection_size = option_limit(value)?,
                "dateFormat" => config.date_format = DateFormat::parse(&value.to_text()),
                "dateZone" => config.date_zone = value.to_text().parse()?,
                "ignoreErrors" => {
                    config.fault_mode = match option_bool(value)? {
                        true => FaultMode::Filtering,
                        false => FaultMode::Throwing,
                    };
                }
                "includeRequest" => config.include_request_echo = option_bool(value)?,
                "serializeLong" => {
                    config.large_integers_as_string = match value {
                        Value::String(s) if s == "string" => true,
                        Value::String(s) if s == "number" => false,
                        other => option_bool(other)?,
                    };
                }
                _ => {}
            }
        }
        Ok(config)
    }
}

fn option_limit(value: &Value) -> Result<Limit, ValueParseError> {
    let count = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    count
        .and_then(|n| usize::try_from(n).ok())
        .map(Limit::from_count)
        .ok_or_else(|| ValueParseError::new("Limit", value, "expected a non-negative integer"))
}

fn option_bool(value: &Value) -> Result<bool, ValueParseError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(ValueParseError::new("bool", other, "expected a boolean")),
    }
}

impl fmt::Debug for SerializeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializeConfig")
            .field("max_depth", &self.max_depth)
            .field("max_objects", &self.max_objects)
            .field("max_collection_size", &self.max_collection_size)
            .field("date_format", &self.date_format)
            .field("date_zone", &self.date_zone)
            .field("fault_mode", &self.fault_mode)
            .field("include_request_echo", &self.include_request_echo)
            .field("large_integers_as_string", &self.large_integers_as_string)
            .field("type_formats", &self.type_formats)
            .field("custom_fault_handler", &self.fault_handler.is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::{Limit, SerializeConfig, Zone};
    use crate::value::Value;

    #[test]
    fn zero_is_unlimited() {
        assert_eq!(Limit::from_count(0), Limit::Unlimited);
        assert!(Limit::Unlimited.allows(usize::MAX));
        assert!(Limit::At(2).allows(2));
        assert!(!Limit::At(2).allows(3));
    }

    #[test]
    fn zones_parse() {
        assert_eq!("UTC".parse::<Zone>().unwrap(), Zone::Utc);
        assert_eq!("local".parse::<Zone>().unwrap(), Zone::Local);
        assert_eq!(
            "+02:00".parse::<Zone>().unwrap(),
            Zone::Fixed(FixedOffset::east_opt(7200).unwrap())
        );
        assert!("Mars/Olympus".parse::<Zone>().is_err());
    }

    #[test]
    fn bad_options_are_rejected() {
        let options: Value = serde_json::from_str(r#"{"maxDepth": -1}"#).unwrap();
        assert!(SerializeConfig::from_options(&options).is_err());

        let options: Value = serde_json::from_str(r#"{"serializeLong": "string"}"#).unwrap();
        assert!(SerializeConfig::from_options(&options).unwrap().large_integers_as_string);

        assert!(SerializeConfig::from_options(&Value::from(3_u8)).is_err());
    }
}
