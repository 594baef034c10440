use alloc::format;
use alloc::string::{String, ToString};
use core::any::TypeId;
use core::fmt::{Display, Write};
use core::time::Duration;
use std::time::SystemTime;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc};
use vc_reflect::Reflect;

use super::terminal::integer_value;
use super::{Accessor, Nesting};
use crate::config::{DateFormat, SerializeConfig, Zone};
use crate::context::SerializeContext;
use crate::error::ConvertError;
use crate::parse::{in_zone, localize};
use crate::registry::AccessorRegistry;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Helpers

/// Renders through `Display`, `None` if the pattern is invalid.
fn formatted(display: impl Display) -> Option<String> {
    let mut text = String::new();
    write!(text, "{display}").ok()?;
    Some(text)
}

fn epoch_nanos(instant: &DateTime<FixedOffset>) -> i128 {
    i128::from(instant.timestamp()) * 1_000_000_000 + i128::from(instant.timestamp_subsec_nanos())
}

/// `naive` in `zone`, or read as UTC when the zone skips that local time.
fn localized(naive: NaiveDateTime, zone: Zone) -> DateTime<FixedOffset> {
    localize(naive, zone).unwrap_or_else(|| naive.and_utc().fixed_offset())
}

fn instant(instant: DateTime<Utc>, format: &DateFormat, config: &SerializeConfig) -> Value {
    let shown = in_zone(instant, config.date_zone);
    match format {
        DateFormat::Iso8601 => Value::String(shown.to_rfc3339()),
        DateFormat::Pattern(pattern) => {
            Value::String(formatted(shown.format(pattern)).unwrap_or_else(|| shown.to_rfc3339()))
        }
        DateFormat::EpochMillis => integer_value(i128::from(shown.timestamp_millis()), config),
        DateFormat::EpochNanos => integer_value(epoch_nanos(&shown), config),
    }
}

fn date(date: NaiveDate, format: &DateFormat, config: &SerializeConfig) -> Value {
    match format {
        DateFormat::Iso8601 => Value::String(date.to_string()),
        DateFormat::Pattern(pattern) => {
            Value::String(formatted(date.format(pattern)).unwrap_or_else(|| date.to_string()))
        }
        DateFormat::EpochMillis | DateFormat::EpochNanos => {
            let midnight = localized(date.and_time(NaiveTime::MIN), config.date_zone);
            instant(midnight.to_utc(), format, config)
        }
    }
}

fn time(time: NaiveTime, format: &DateFormat, config: &SerializeConfig) -> Value {
    let nanos = i128::from(time.num_seconds_from_midnight()) * 1_000_000_000 + i128::from(time.nanosecond());
    match format {
        DateFormat::Iso8601 => Value::String(time.to_string()),
        DateFormat::Pattern(pattern) => {
            Value::String(formatted(time.format(pattern)).unwrap_or_else(|| time.to_string()))
        }
        DateFormat::EpochMillis => integer_value(nanos / 1_000_000, config),
        DateFormat::EpochNanos => integer_value(nanos, config),
    }
}

/// ISO-8601 seconds text: `PT90S`, `PT1.5S`, `-PT0.25S`.
fn iso_duration(negative: bool, secs: u64, nanos: u32) -> String {
    let sign = if negative { "-" } else { "" };
    if nanos == 0 {
        return format!("{sign}PT{secs}S");
    }
    let frac = format!("{nanos:09}");
    format!("{sign}PT{secs}.{}S", frac.trim_end_matches('0'))
}

fn duration(negative: bool, secs: u64, nanos: u32, format: &DateFormat, config: &SerializeConfig) -> Value {
    let total = i128::from(secs) * 1_000_000_000 + i128::from(nanos);
    let total = if negative { -total } else { total };
    match format {
        DateFormat::EpochMillis => integer_value(total / 1_000_000, config),
        DateFormat::EpochNanos => integer_value(total, config),
        DateFormat::Iso8601 | DateFormat::Pattern(_) => Value::String(iso_duration(negative, secs, nanos)),
    }
}

// -----------------------------------------------------------------------------
// DateTimeAccessor

/// Lowers dates, times and durations per the configured
/// [`DateFormat`] and [`Zone`].
///
/// Durations ignore patterns and render as ISO-8601 seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeAccessor;

impl DateTimeAccessor {
    const TYPES: [fn() -> TypeId; 9] = [
        TypeId::of::<DateTime<Utc>>,
        TypeId::of::<DateTime<FixedOffset>>,
        TypeId::of::<DateTime<Local>>,
        TypeId::of::<NaiveDateTime>,
        TypeId::of::<NaiveDate>,
        TypeId::of::<NaiveTime>,
        TypeId::of::<SystemTime>,
        TypeId::of::<Duration>,
        TypeId::of::<TimeDelta>,
    ];
}

impl Accessor for DateTimeAccessor {
    fn name(&self) -> &'static str {
        "date_time"
    }

    fn accepts(&self, _: &AccessorRegistry, value: &dyn Reflect) -> bool {
        let id = value.ty_id();
        Self::TYPES.iter().any(|of| of() == id)
    }

    #[inline]
    fn nesting(&self, _: &dyn Reflect) -> Nesting {
        Nesting::Leaf
    }

    fn read(&self, cx: &mut SerializeContext<'_>, value: &dyn Reflect) -> Result<Value, ConvertError> {
        let config = cx.config();
        let format = config.date_format_for(value.ty_id());

        if let Some(dt) = value.downcast_ref::<DateTime<Utc>>() {
            return Ok(instant(*dt, format, config));
        }
        if let Some(dt) = value.downcast_ref::<DateTime<FixedOffset>>() {
            return Ok(instant(dt.to_utc(), format, config));
        }
        if let Some(dt) = value.downcast_ref::<DateTime<Local>>() {
            return Ok(instant(dt.to_utc(), format, config));
        }
        if let Some(st) = value.downcast_ref::<SystemTime>() {
            return Ok(instant(DateTime::<Utc>::from(*st), format, config));
        }
        if let Some(naive) = value.downcast_ref::<NaiveDateTime>() {
            return Ok(instant(localized(*naive, config.date_zone).to_utc(), format, config));
        }
        if let Some(d) = value.downcast_ref::<NaiveDate>() {
            return Ok(date(*d, format, config));
        }
        if let Some(t) = value.downcast_ref::<NaiveTime>() {
            return Ok(time(*t, format, config));
        }
        if let Some(d) = value.downcast_ref::<Duration>() {
            return Ok(duration(false, d.as_secs(), d.subsec_nanos(), format, config));
        }
        if let Some(delta) = value.downcast_ref::<TimeDelta>() {
            let negative = *delta < TimeDelta::zero();
            let abs = delta.abs();
            let secs = u64::try_from(abs.num_seconds()).unwrap_or(u64::MAX);
            let nanos = u32::try_from(abs.subsec_nanos()).unwrap_or_default();
            return Ok(duration(negative, secs, nanos, format, config));
        }
        Ok(Value::Null)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use core::time::Duration;
    use std::time::UNIX_EPOCH;

    use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta, Utc};

    use crate::config::{DateFormat, SerializeConfig, Zone};
    use crate::value::Value;
    use crate::{Converter, Path};

    fn read(value: &dyn vc_reflect::Reflect, config: &SerializeConfig) -> Value {
        Converter::new().serialize(value, &Path::root(), config).unwrap()
    }

    fn instant() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(1_700_000_000_123).unwrap()
    }

    #[test]
    fn instants_follow_format_and_zone() {
        let config = SerializeConfig::default();
        assert_eq!(read(&instant(), &config), Value::from("2023-11-14T22:13:20.123+00:00"));

        let millis = config.clone().with_date_format(DateFormat::EpochMillis);
        assert_eq!(read(&instant(), &millis), Value::from(1_700_000_000_123_i64));

        let system = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        assert_eq!(read(&system, &millis), Value::from(1_700_000_000_123_i64));

        let plus_two = Zone::Fixed(FixedOffset::east_opt(2 * 3600).unwrap());
        let pattern = config
            .with_date_format(DateFormat::Pattern(String::from("%Y-%m-%d %H:%M")))
            .with_date_zone(plus_two);
        assert_eq!(read(&instant(), &pattern), Value::from("2023-11-15 00:13"));
    }

    #[test]
    fn per_type_format_wins() {
        let config = SerializeConfig::default()
            .with_date_format(DateFormat::EpochMillis)
            .with_type_format::<NaiveDate>(DateFormat::Pattern(String::from("%d.%m.%Y")));
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(read(&day, &config), Value::from("29.02.2024"));
        assert_eq!(read(&instant(), &config), Value::from(1_700_000_000_123_i64));
    }

    #[test]
    fn naive_values() {
        let config = SerializeConfig::default();
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let noon = NaiveTime::from_hms_milli_opt(12, 0, 1, 500).unwrap();
        assert_eq!(read(&day, &config), Value::from("2024-01-02"));
        assert_eq!(read(&noon, &config), Value::from("12:00:01.500"));
        assert_eq!(read(&day.and_time(noon), &config), Value::from("2024-01-02T12:00:01.500+00:00"));

        let millis = config.with_date_format(DateFormat::EpochMillis);
        assert_eq!(read(&noon, &millis), Value::from(43_201_500_i64));
        assert_eq!(read(&day, &millis), Value::from(1_704_153_600_000_i64));
    }

    #[test]
    fn durations() {
        let config = SerializeConfig::default();
        assert_eq!(read(&Duration::from_secs(90), &config), Value::from("PT90S"));
        assert_eq!(read(&Duration::from_millis(1500), &config), Value::from("PT1.5S"));
        assert_eq!(read(&TimeDelta::milliseconds(-250), &config), Value::from("-PT0.25S"));

        let millis = config.with_date_format(DateFormat::EpochMillis);
        assert_eq!(read(&Duration::from_millis(1500), &millis), Value::from(1500_i64));
        assert_eq!(read(&TimeDelta::milliseconds(-250), &millis), Value::from(-250_i64));
    }

    #[test]
    fn bad_pattern_falls_back() {
        let config = SerializeConfig::default().with_date_format(DateFormat::Pattern(String::from("%Q")));
        assert_eq!(read(&instant(), &config), Value::from("2023-11-14T22:13:20.123+00:00"));
    }
}
