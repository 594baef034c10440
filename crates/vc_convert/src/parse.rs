//! Built-in parsers: [`Value`] → typed leaf values for writes.
//!
//! Integers accept numbers and numeric strings and fail when out of range.
//! Dates accept the configured pattern, RFC 3339 text or epoch
//! milliseconds; naive input is read in the configured zone.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use core::any::{TypeId, type_name};
use core::time::Duration;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc,
};
use vc_reflect::Reflect;

use crate::config::{DateFormat, SerializeConfig, Zone};
use crate::error::ValueParseError;
use crate::registry::AccessorRegistry;
use crate::value::Value;

type Parsed = Result<Box<dyn Reflect>, ValueParseError>;

pub(crate) fn register_builtin(registry: &mut AccessorRegistry) {
    macro_rules! integers {
        ($($ty:ty),*) => {$(
            registry.register_parser::<$ty>(parse_integer::<$ty>);
        )*};
    }
    integers!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

    registry.register_parser::<f32>(parse_f32);
    registry.register_parser::<f64>(parse_f64);
    registry.register_parser::<bool>(parse_bool);
    registry.register_parser::<char>(parse_char);
    registry.register_parser::<()>(parse_unit);
    registry.register_parser::<String>(parse_string);
    registry.register_parser::<Cow<'static, str>>(parse_cow);
    registry.register_parser::<PathBuf>(parse_path_buf);
    registry.register_parser::<Value>(parse_value);

    registry.register_parser::<DateTime<Utc>>(parse_date_time_utc);
    registry.register_parser::<DateTime<FixedOffset>>(parse_date_time_fixed);
    registry.register_parser::<DateTime<Local>>(parse_date_time_local);
    registry.register_parser::<NaiveDateTime>(parse_naive_date_time);
    registry.register_parser::<NaiveDate>(parse_naive_date);
    registry.register_parser::<NaiveTime>(parse_naive_time);
    registry.register_parser::<SystemTime>(parse_system_time);
    registry.register_parser::<Duration>(parse_duration);
    registry.register_parser::<TimeDelta>(parse_time_delta);
}

#[inline]
fn fail<T>(value: &Value, reason: &'static str) -> Parsed {
    Err(ValueParseError::new(type_name::<T>(), value, reason))
}

// -----------------------------------------------------------------------------
// Scalars

fn parse_integer<T>(value: &Value, _: &SerializeConfig) -> Parsed
where
    T: TryFrom<i128> + Reflect,
{
    let wide = match value {
        Value::Number(n) => n.as_i128(),
        Value::String(s) => s.trim().parse::<i128>().ok(),
        _ => None,
    };
    let Some(wide) = wide else {
        return fail::<T>(value, "expected an integer");
    };
    match T::try_from(wide) {
        Ok(parsed) => Ok(Box::new(parsed)),
        Err(_) => fail::<T>(value, "integer out of range"),
    }
}

fn float_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(n.as_f64()),
        Value::String(s) => match s.trim() {
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            other => other.parse::<f64>().ok(),
        },
        _ => None,
    }
}

fn parse_f64(value: &Value, _: &SerializeConfig) -> Parsed {
    match float_of(value) {
        Some(n) => Ok(Box::new(n)),
        None => fail::<f64>(value, "expected a number"),
    }
}

fn parse_f32(value: &Value, _: &SerializeConfig) -> Parsed {
    match float_of(value) {
        Some(n) => Ok(Box::new(n as f32)),
        None => fail::<f32>(value, "expected a number"),
    }
}

fn parse_bool(value: &Value, _: &SerializeConfig) -> Parsed {
    match value {
        Value::Bool(b) => Ok(Box::new(*b)),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Box::new(true)),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Box::new(false)),
        _ => Err(ValueParseError::new("bool", value, "expected a boolean")),
    }
}

fn parse_char(value: &Value, _: &SerializeConfig) -> Parsed {
    let mut chars = value.as_str().unwrap_or_default().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Box::new(c)),
        _ => Err(ValueParseError::new("char", value, "expected a single character")),
    }
}

fn parse_unit(value: &Value, _: &SerializeConfig) -> Parsed {
    match value {
        Value::Null => Ok(Box::new(())),
        _ => Err(ValueParseError::new("()", value, "expected null")),
    }
}

/// Text of a scalar; numbers and booleans are rendered.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) | Value::Bool(_) => Some(value.to_text().into_owned()),
        _ => None,
    }
}

fn parse_string(value: &Value, _: &SerializeConfig) -> Parsed {
    match text_of(value) {
        Some(text) => Ok(Box::new(text)),
        None => Err(ValueParseError::new("String", value, "expected a string")),
    }
}

fn parse_cow(value: &Value, _: &SerializeConfig) -> Parsed {
    match text_of(value) {
        Some(text) => Ok(Box::new(Cow::<'static, str>::Owned(text))),
        None => Err(ValueParseError::new("Cow<str>", value, "expected a string")),
    }
}

fn parse_path_buf(value: &Value, _: &SerializeConfig) -> Parsed {
    match value {
        Value::String(s) => Ok(Box::new(PathBuf::from(s))),
        _ => Err(ValueParseError::new("PathBuf", value, "expected a string")),
    }
}

fn parse_value(value: &Value, _: &SerializeConfig) -> Parsed {
    Ok(Box::new(value.clone()))
}

// -----------------------------------------------------------------------------
// Dates

/// The instant `naive` names in `zone`, if it names exactly one.
pub(crate) fn localize(naive: NaiveDateTime, zone: Zone) -> Option<DateTime<FixedOffset>> {
    match zone {
        Zone::Utc => Some(naive.and_utc().fixed_offset()),
        Zone::Local => Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.fixed_offset()),
        Zone::Fixed(offset) => offset.from_local_datetime(&naive).single(),
    }
}

/// Moves an instant into `zone`.
pub(crate) fn in_zone(instant: DateTime<Utc>, zone: Zone) -> DateTime<FixedOffset> {
    match zone {
        Zone::Utc => instant.fixed_offset(),
        Zone::Local => instant.with_timezone(&Local).fixed_offset(),
        Zone::Fixed(offset) => instant.with_timezone(&offset),
    }
}

fn millis_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i128().and_then(|n| i64::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Reads an instant for a value of type `target`.
fn instant_of(value: &Value, config: &SerializeConfig, target: TypeId) -> Option<DateTime<FixedOffset>> {
    let zone = config.date_zone;
    if let Some(millis) = millis_of(value) {
        return DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| in_zone(dt, zone));
    }
    let text = value.as_str()?.trim();
    if let DateFormat::Pattern(pattern) = config.date_format_for(target) {
        if let Ok(parsed) = DateTime::parse_from_str(text, pattern) {
            return Some(parsed);
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, pattern) {
            return localize(naive, zone);
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed);
    }
    let naive = text.parse::<NaiveDateTime>().ok()?;
    localize(naive, zone)
}

fn parse_date_time_fixed(value: &Value, config: &SerializeConfig) -> Parsed {
    match instant_of(value, config, TypeId::of::<DateTime<FixedOffset>>()) {
        Some(instant) => Ok(Box::new(instant)),
        None => fail::<DateTime<FixedOffset>>(value, "expected a date"),
    }
}

fn parse_date_time_utc(value: &Value, config: &SerializeConfig) -> Parsed {
    match instant_of(value, config, TypeId::of::<DateTime<Utc>>()) {
        Some(instant) => Ok(Box::new(instant.with_timezone(&Utc))),
        None => fail::<DateTime<Utc>>(value, "expected a date"),
    }
}

fn parse_date_time_local(value: &Value, config: &SerializeConfig) -> Parsed {
    match instant_of(value, config, TypeId::of::<DateTime<Local>>()) {
        Some(instant) => Ok(Box::new(instant.with_timezone(&Local))),
        None => fail::<DateTime<Local>>(value, "expected a date"),
    }
}

fn parse_system_time(value: &Value, config: &SerializeConfig) -> Parsed {
    match instant_of(value, config, TypeId::of::<SystemTime>()) {
        Some(instant) => Ok(Box::new(SystemTime::from(instant))),
        None => fail::<SystemTime>(value, "expected a date"),
    }
}

fn parse_naive_date_time(value: &Value, config: &SerializeConfig) -> Parsed {
    let target = TypeId::of::<NaiveDateTime>();
    let naive = match (value.as_str(), config.date_format_for(target)) {
        (Some(text), DateFormat::Pattern(pattern)) => NaiveDateTime::parse_from_str(text.trim(), pattern).ok(),
        (Some(text), _) => text.trim().parse::<NaiveDateTime>().ok(),
        (None, _) => None,
    };
    match naive.or_else(|| instant_of(value, config, target).map(|dt| dt.naive_local())) {
        Some(naive) => Ok(Box::new(naive)),
        None => fail::<NaiveDateTime>(value, "expected a date"),
    }
}

fn parse_naive_date(value: &Value, config: &SerializeConfig) -> Parsed {
    let target = TypeId::of::<NaiveDate>();
    let date = value.as_str().map(str::trim).and_then(|text| {
        if let DateFormat::Pattern(pattern) = config.date_format_for(target)
            && let Ok(date) = NaiveDate::parse_from_str(text, pattern)
        {
            return Some(date);
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
    });
    match date.or_else(|| instant_of(value, config, target).map(|dt| dt.date_naive())) {
        Some(date) => Ok(Box::new(date)),
        None => fail::<NaiveDate>(value, "expected a date"),
    }
}

fn parse_naive_time(value: &Value, config: &SerializeConfig) -> Parsed {
    let target = TypeId::of::<NaiveTime>();
    let time = value.as_str().map(str::trim).and_then(|text| {
        if let DateFormat::Pattern(pattern) = config.date_format_for(target)
            && let Ok(time) = NaiveTime::parse_from_str(text, pattern)
        {
            return Some(time);
        }
        NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
            .ok()
    });
    match time {
        Some(time) => Ok(Box::new(time)),
        None => fail::<NaiveTime>(value, "expected a time of day"),
    }
}

// -----------------------------------------------------------------------------
// Durations

/// Splits ISO-8601 seconds text such as `PT1.5S` or `-PT2S` into sign,
/// whole seconds and nanoseconds.
fn iso_seconds(text: &str) -> Option<(bool, u64, u32)> {
    let (negative, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let body = text.strip_prefix("PT")?.strip_suffix('S')?;
    let (secs, frac) = body.split_once('.').unwrap_or((body, ""));
    if frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let secs = secs.parse::<u64>().ok()?;
    let nanos = match frac {
        "" => 0,
        digits => format!("{digits:0<9}").parse::<u32>().ok()?,
    };
    Some((negative, secs, nanos))
}

fn parse_duration(value: &Value, _: &SerializeConfig) -> Parsed {
    if let Some(millis) = millis_of(value) {
        return match u64::try_from(millis) {
            Ok(millis) => Ok(Box::new(Duration::from_millis(millis))),
            Err(_) => Err(ValueParseError::new("Duration", value, "duration is negative")),
        };
    }
    match value.as_str().map(str::trim).and_then(iso_seconds) {
        Some((false, secs, nanos)) => Ok(Box::new(Duration::new(secs, nanos))),
        Some((true, ..)) => Err(ValueParseError::new("Duration", value, "duration is negative")),
        None => Err(ValueParseError::new("Duration", value, "expected milliseconds or `PT<seconds>S`")),
    }
}

fn parse_time_delta(value: &Value, _: &SerializeConfig) -> Parsed {
    if let Some(millis) = millis_of(value) {
        return match TimeDelta::try_milliseconds(millis) {
            Some(delta) => Ok(Box::new(delta)),
            None => Err(ValueParseError::new("TimeDelta", value, "duration out of range")),
        };
    }
    let Some((negative, secs, nanos)) = value.as_str().map(str::trim).and_then(iso_seconds) else {
        return Err(ValueParseError::new("TimeDelta", value, "expected milliseconds or `PT<seconds>S`"));
    };
    let delta = i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| delta.checked_add(&TimeDelta::nanoseconds(i64::from(nanos))));
    match delta {
        Some(delta) if negative => Ok(Box::new(-delta)),
        Some(delta) => Ok(Box::new(delta)),
        None => Err(ValueParseError::new("TimeDelta", value, "duration out of range")),
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use core::any::TypeId;
    use core::time::Duration;

    use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta, Utc};
    use vc_reflect::Reflect;

    use crate::config::{DateFormat, SerializeConfig, Zone};
    use crate::registry::AccessorRegistry;
    use crate::value::Value;

    fn parse<T: Reflect>(value: Value, config: &SerializeConfig) -> Option<T> {
        let registry = AccessorRegistry::new();
        let parse = registry.parser(TypeId::of::<T>())?;
        let parsed = parse(&value, config).ok()?;
        parsed.take::<T>().ok()
    }

    #[test]
    fn integers_check_range() {
        let config = SerializeConfig::default();
        assert_eq!(parse::<u8>(Value::from(255_u64), &config), Some(255));
        assert_eq!(parse::<u8>(Value::from(256_u64), &config), None);
        assert_eq!(parse::<i32>(Value::from("-12"), &config), Some(-12));
        assert_eq!(parse::<i64>(Value::from(3.0_f64), &config), Some(3));
        assert_eq!(parse::<i64>(Value::from(3.5_f64), &config), None);
        assert_eq!(parse::<u32>(Value::from(true), &config), None);
    }

    #[test]
    fn text_and_scalars() {
        let config = SerializeConfig::default();
        assert_eq!(parse::<String>(Value::from(42_u8), &config).as_deref(), Some("42"));
        assert_eq!(parse::<bool>(Value::from("TRUE"), &config), Some(true));
        assert_eq!(parse::<char>(Value::from("x"), &config), Some('x'));
        assert_eq!(parse::<char>(Value::from("xy"), &config), None);
        assert_eq!(parse::<f64>(Value::from("-Infinity"), &config), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn dates_accept_rfc3339_millis_and_pattern() {
        let config = SerializeConfig::default();
        let expected = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap();

        assert_eq!(
            parse::<DateTime<Utc>>(Value::from("2023-11-14T22:13:20Z"), &config),
            Some(expected)
        );
        assert_eq!(
            parse::<DateTime<Utc>>(Value::from(1_700_000_000_000_u64), &config),
            Some(expected)
        );

        let config = SerializeConfig::default().with_date_format(DateFormat::Pattern("%d.%m.%Y %H:%M".into()));
        let parsed = parse::<NaiveDateTime>(Value::from("14.11.2023 22:13"), &config).unwrap();
        assert_eq!(parsed.to_string(), "2023-11-14 22:13:00");

        assert_eq!(parse::<DateTime<Utc>>(Value::from("yesterday"), &config), None);
    }

    #[test]
    fn naive_input_uses_configured_zone() {
        let zone: Zone = "+02:00".parse().unwrap();
        let config = SerializeConfig::default().with_date_zone(zone);

        let parsed = parse::<DateTime<FixedOffset>>(Value::from("2024-05-01T12:00:00"), &config).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-05-01T12:00:00+02:00");

        let utc = parse::<DateTime<Utc>>(Value::from("2024-05-01T12:00:00"), &config).unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn dates_and_durations() {
        let config = SerializeConfig::default();
        assert_eq!(
            parse::<NaiveDate>(Value::from("2024-02-29"), &config),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(parse::<Duration>(Value::from(1500_u64), &config), Some(Duration::from_millis(1500)));
        assert_eq!(parse::<Duration>(Value::from("PT1.5S"), &config), Some(Duration::from_millis(1500)));
        assert_eq!(parse::<Duration>(Value::from(-1_i64), &config), None);
        assert_eq!(
            parse::<TimeDelta>(Value::from("-PT2.25S"), &config),
            Some(-TimeDelta::milliseconds(2250))
        );
    }
}
