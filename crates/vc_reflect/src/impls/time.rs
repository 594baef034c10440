use core::time::Duration;
use std::time::SystemTime;

crate::impl_reflect_opaque!(Duration, SystemTime);

#[cfg(feature = "chrono")]
crate::impl_reflect_opaque!(
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::FixedOffset>,
    chrono::DateTime<chrono::Local>,
    chrono::NaiveDateTime,
    chrono::NaiveDate,
    chrono::NaiveTime,
    chrono::TimeDelta,
);
