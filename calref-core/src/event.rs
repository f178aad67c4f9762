//! Calendar event records.
//!
//! The field names follow the hosted Calendar API exactly, so an `Event`
//! deserialized from an API response serializes back to the same JSON shape.
//! Fields calref does not interpret are carried in `extra` untouched.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One calendar occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,

    #[serde(default)]
    pub status: EventStatus,

    /// Empty when the event is redacted for the caller.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Visibility::is_default")]
    pub visibility: Visibility,

    pub start: EventDateTime,
    pub end: EventDateTime,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<Attendee>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    /// The caller's own response, if the caller is among the attendees.
    pub fn self_response(&self) -> Option<ResponseStatus> {
        self.attendees
            .iter()
            .find(|a| a.is_self)
            .map(|a| a.response_status)
    }

    pub fn declined_by_self(&self) -> bool {
        self.self_response() == Some(ResponseStatus::Declined)
    }

    /// A private event whose details are hidden from the caller.
    pub fn is_redacted(&self) -> bool {
        self.visibility == Visibility::Private && self.summary.is_empty()
    }

    /// The start as a sortable string: `YYYY-MM-DD` or an RFC3339 timestamp.
    pub fn start_key(&self) -> String {
        self.start.time.to_string()
    }
}

/// Start or end of an event, plus the optional IANA zone name the API sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(flatten)]
    pub time: EventTime,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl From<EventTime> for EventDateTime {
    fn from(time: EventTime) -> Self {
        EventDateTime {
            time,
            time_zone: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    /// All-day event.
    #[serde(rename = "date")]
    Date(NaiveDate),
    /// Timed event, keeping the offset it was reported with.
    #[serde(rename = "dateTime")]
    DateTime(DateTime<FixedOffset>),
}

impl EventTime {
    pub fn date(&self) -> NaiveDate {
        match self {
            EventTime::Date(d) => *d,
            EventTime::DateTime(dt) => dt.date_naive(),
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTime(dt) => {
                write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    #[serde(default)]
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Whether this entry is the account that fetched the event.
    #[serde(rename = "self", default, skip_serializing_if = "is_false")]
    pub is_self: bool,

    #[serde(default)]
    pub response_status: ResponseStatus,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Default,
    Public,
    Private,
    Confidential,
}

impl Visibility {
    fn is_default(&self) -> bool {
        *self == Visibility::Default
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    Accepted,
    Declined,
    Tentative,
    #[default]
    NeedsAction,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventStatus::Confirmed => "confirmed",
            EventStatus::Tentative => "tentative",
            EventStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}
