// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Wall clock formatting for commit messages and logs.
//!
//! The mirror is operated from Vietnam, so timestamps are always rendered in
//! Indochina Time (UTC+07:00) regardless of the host's local zone. The zone
//! observes no daylight saving, so a fixed offset is exact.

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};

const ICT_OFFSET_SECS: i32 = 7 * 60 * 60;

/// Timestamp layout: `YYYY-MM-DD_HH-MM-SS`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Current time formatted as a sync timestamp.
pub fn sync_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Format any instant as a sync timestamp in UTC+07:00.
pub fn format_timestamp<Tz: TimeZone>(instant: DateTime<Tz>) -> String {
    // INVARIANT: 7 hours is always within the valid offset range.
    let zone = FixedOffset::east_opt(ICT_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    instant
        .with_timezone(&zone)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}
