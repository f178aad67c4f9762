//! The time window a query covers.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, TimeZone};
use chrono_tz::Tz;

use crate::error::{CalRefError, CalRefResult};

/// Inclusive `[start, end]` window passed to every event fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl QueryWindow {
    /// Build a window from `--since` / `--until` style input.
    ///
    /// Each bound is either empty, `YYYY-MM-DD` (interpreted in `tz`), or
    /// RFC3339. A bare `since` date starts at 00:00 and a bare `until` date
    /// ends at 23:59. An empty bound takes the other bound's day; both empty
    /// means `today`.
    pub fn parse(since: &str, until: &str, tz: Tz, today: NaiveDate) -> CalRefResult<Self> {
        let since = since.trim();
        let until = until.trim();

        let start = match (since.is_empty(), until.is_empty()) {
            (false, _) => parse_bound(since, tz, Bound::Start)?,
            (true, false) => {
                let end_day = parse_bound(until, tz, Bound::End)?
                    .with_timezone(&tz)
                    .date_naive();
                day_at(end_day, start_of_day(), tz, since)?
            }
            (true, true) => day_at(today, start_of_day(), tz, since)?,
        };

        let end = if until.is_empty() {
            day_at(start.with_timezone(&tz).date_naive(), end_of_day(), tz, until)?
        } else {
            parse_bound(until, tz, Bound::End)?
        };

        Ok(QueryWindow { start, end })
    }

    /// `timeMin` as sent to the API.
    pub fn time_min(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    /// `timeMax` as sent to the API.
    pub fn time_max(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Secs, false)
    }
}

/// Resolve a zone name, falling back to `fallback` when it is unknown.
pub fn parse_timezone(name: &str, fallback: Tz) -> Tz {
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            tracing::warn!(timezone = name, fallback = %fallback, "Unknown timezone, using fallback");
            fallback
        }
    }
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

fn start_of_day() -> NaiveTime {
    NaiveTime::MIN
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

fn parse_bound(input: &str, tz: Tz, bound: Bound) -> CalRefResult<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt);
    }

    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| CalRefError::Parse(input.to_string()))?;

    let time = match bound {
        Bound::Start => start_of_day(),
        Bound::End => end_of_day(),
    };

    day_at(date, time, tz, input)
}

/// `date` at `time` in `tz`; a time skipped by a DST jump takes the earliest valid mapping.
fn day_at(
    date: NaiveDate,
    time: NaiveTime,
    tz: Tz,
    input: &str,
) -> CalRefResult<DateTime<FixedOffset>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| CalRefError::Parse(input.to_string()))
}
