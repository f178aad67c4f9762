//! Calendar list entries and directory calendar resources.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of the caller's calendar list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub id: String,

    #[serde(default)]
    pub summary: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Set on the caller's own calendar, whose id is the account email.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A bookable resource (room, equipment) from the organization directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarResource {
    #[serde(default)]
    pub resource_id: String,

    #[serde(default)]
    pub resource_name: String,

    /// The resource's calendar id. Some directory entries have none.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_email: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub building_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_visible_description: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Resources located in `building_id`; an empty building keeps everything.
pub fn filter_by_building<'a>(
    resources: &'a [CalendarResource],
    building_id: &str,
) -> Vec<&'a CalendarResource> {
    resources
        .iter()
        .filter(|r| building_id.is_empty() || r.building_id == building_id)
        .collect()
}

/// The account email, taken from the primary calendar's id.
pub fn primary_calendar_email(entries: &[CalendarEntry]) -> Option<&str> {
    entries
        .iter()
        .find(|c| c.primary && !c.id.is_empty())
        .map(|c| c.id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resources() -> Vec<CalendarResource> {
        serde_json::from_value(json!([
            { "resourceId": "r1", "resourceName": "Room A", "resourceEmail": "room-a@resource.example", "buildingId": "tokyo" },
            { "resourceId": "r2", "resourceName": "Room B", "resourceEmail": "room-b@resource.example", "buildingId": "osaka" },
            { "resourceId": "r3", "resourceName": "Projector", "buildingId": "tokyo" }
        ]))
        .unwrap()
    }

    #[test]
    fn test_filter_by_building() {
        let all = resources();
        let tokyo = filter_by_building(&all, "tokyo");

        assert_eq!(tokyo.len(), 2);
        assert!(tokyo.iter().all(|r| r.building_id == "tokyo"));
        assert_eq!(filter_by_building(&all, "").len(), 3);
        assert!(filter_by_building(&all, "nagoya").is_empty());
    }

    #[test]
    fn test_primary_calendar_email() {
        let entries: Vec<CalendarEntry> = serde_json::from_value(json!([
            { "id": "team@group.calendar.example", "summary": "Team" },
            { "id": "me@example.com", "summary": "Me", "primary": true }
        ]))
        .unwrap();

        assert_eq!(primary_calendar_email(&entries), Some("me@example.com"));
        assert_eq!(primary_calendar_email(&entries[..1]), None);
    }
}
