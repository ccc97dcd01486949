//! Conversions from raw column values shared by the SQL backends.

use glimpse_core::repository::Result;
use glimpse_core::{Code, Entry, StorageError};
use jiff::Timestamp;

pub(crate) fn now_unix_seconds() -> i64 {
    Timestamp::now().as_second()
}

pub(crate) fn parse_count(column: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        StorageError::InvalidData(format!("{column} out of range: {value}"))
    })
}

pub(crate) fn parse_last_viewed_at(seconds: Option<i64>) -> Result<Option<Timestamp>> {
    seconds
        .map(|value| {
            Timestamp::from_second(value).map_err(|e| {
                StorageError::InvalidData(format!(
                    "invalid last_viewed_at timestamp '{}': {e}",
                    value
                ))
            })
        })
        .transpose()
}

/// Views left after a row reports `views` out of `max_views`.
pub(crate) fn remaining(max_views: i64, views: i64) -> Result<u32> {
    if views > max_views {
        return Err(StorageError::InvalidData(format!(
            "views {views} exceed maxviews {max_views}"
        )));
    }
    parse_count("remaining views", max_views - views)
}

pub(crate) fn entry_from_columns(
    code: &Code,
    payload: String,
    max_views: i64,
    views: i64,
    last_viewed_at: Option<i64>,
) -> Result<Entry> {
    Ok(Entry {
        code: code.clone(),
        payload,
        max_views: parse_count("maxviews", max_views)?,
        views: parse_count("views", views)?,
        last_viewed_at: parse_last_viewed_at(last_viewed_at)?,
    })
}
