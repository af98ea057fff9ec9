use chrono::{DateTime, TimeZone};

/// Seconds since the unix epoch, as `since`/`until` parameters expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(pub i64);

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Timestamp(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(value: DateTime<Tz>) -> Self {
        Timestamp(value.timestamp())
    }
}

pub fn prepare_timestamp<T: Into<Timestamp>>(value: Option<T>) -> Option<i64> {
    value.map(|value| value.into().0)
}
