// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Timestamp formatting for stored records.

use chrono::{DateTime, SecondsFormat, Utc};

/// RFC3339 with a `Z` suffix and whole seconds, e.g. `2025-03-01T09:30:00Z`.
///
/// Profile `updated_at` values are stored in this form.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}
