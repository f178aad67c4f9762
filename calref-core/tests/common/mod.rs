#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use calref_core::directory::{CalendarEntry, CalendarResource};
use calref_core::gateway::CalendarGateway;
use calref_core::window::QueryWindow;
use calref_core::{CalRefError, CalRefResult, Event};
use serde_json::{Value, json};

/// In-memory gateway with scripted calendars and failures.
#[derive(Default)]
pub struct FakeGateway {
    pub calendars: HashMap<String, Vec<Event>>,
    pub failing: HashSet<String>,
    pub calendar_list: Option<Vec<CalendarEntry>>,
    pub resources: Option<Vec<CalendarResource>>,
    pub email: Option<String>,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn with_calendar(mut self, id: &str, events: Vec<Event>) -> Self {
        self.calendars.insert(id.to_string(), events);
        self
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarGateway for FakeGateway {
    async fn fetch_events(&self, calendar_id: &str, _window: &QueryWindow) -> CalRefResult<Vec<Event>> {
        self.fetched.lock().unwrap().push(calendar_id.to_string());

        if self.failing.contains(calendar_id) {
            return Err(CalRefError::fetch(calendar_id, "403 Forbidden"));
        }

        Ok(self.calendars.get(calendar_id).cloned().unwrap_or_default())
    }

    async fn fetch_calendar_list(&self) -> CalRefResult<Vec<CalendarEntry>> {
        self.calendar_list
            .clone()
            .ok_or_else(|| CalRefError::fetch("calendarList", "500 Internal Server Error"))
    }

    async fn fetch_resources(&self, customer_id: &str) -> CalRefResult<Vec<CalendarResource>> {
        self.resources
            .clone()
            .ok_or_else(|| CalRefError::fetch(customer_id, "403 Forbidden"))
    }

    async fn authenticated_email(&self) -> CalRefResult<String> {
        self.email
            .clone()
            .ok_or_else(|| CalRefError::Auth("no account email".into()))
    }
}

pub fn event(value: Value) -> Event {
    serde_json::from_value(value).unwrap()
}

pub fn timed(id: &str, summary: &str, start: &str) -> Event {
    event(json!({
        "id": id,
        "summary": summary,
        "start": { "dateTime": start },
        "end": { "dateTime": start }
    }))
}

pub fn private(id: &str, start: &str) -> Event {
    event(json!({
        "id": id,
        "visibility": "private",
        "start": { "dateTime": start },
        "end": { "dateTime": start }
    }))
}

pub fn declined(id: &str, summary: &str, start: &str) -> Event {
    event(json!({
        "id": id,
        "summary": summary,
        "start": { "dateTime": start },
        "end": { "dateTime": start },
        "attendees": [{ "email": "me@example.com", "self": true, "responseStatus": "declined" }]
    }))
}
